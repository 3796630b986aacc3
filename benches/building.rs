use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

use maildoc::index::batch::{build_batch, BatchItem};
use maildoc::{DefaultTextExtractor, DocumentBuilder, IndexAttachments, MessageUid, RawMessage};

fn load(name: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(path).unwrap()
}

fn bench_build_document(c: &mut Criterion) {
    let message = RawMessage::new("INBOX", MessageUid(1), load("withAttachments.eml"));
    let users = vec!["user".to_string()];

    let plain = DocumentBuilder::new(DefaultTextExtractor, chrono_tz::UTC, IndexAttachments::No);
    c.bench_function("build_document", |b| b.iter(|| plain.build(&message, &users)));

    let extracting =
        DocumentBuilder::new(DefaultTextExtractor, chrono_tz::UTC, IndexAttachments::Yes);
    c.bench_function("build_document_with_attachments", |b| {
        b.iter(|| extracting.build(&message, &users))
    });
}

fn bench_build_batch(c: &mut Criterion) {
    let content = load("mailWithHeaders.eml");
    let items: Vec<BatchItem> = (0..256)
        .map(|uid| BatchItem {
            message: RawMessage::new("INBOX", MessageUid(uid), content.clone()),
            users: vec!["user".to_string()],
        })
        .collect();
    let builder = DocumentBuilder::new(DefaultTextExtractor, chrono_tz::UTC, IndexAttachments::No);

    c.bench_function("build_batch_256", |b| {
        b.iter(|| build_batch(&builder, &items, 4, None))
    });
}

criterion_group!(benches, bench_build_document, bench_build_batch);
criterion_main!(benches);
