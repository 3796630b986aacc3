//! Building many documents concurrently.
//!
//! Each message is built independently on a rayon pool; workers share only
//! the builder (and through it the stateless extractor).

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::extractor::TextExtractor;
use crate::index::builder::DocumentBuilder;
use crate::model::document::IndexableDocument;
use crate::model::message::RawMessage;

/// One message occurrence to index, with the owners of its mailbox.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub message: RawMessage,
    pub users: Vec<String>,
}

/// Progress callback: receives `(built, total)` and returns `false` to stop
/// scheduling further messages.
pub type Progress<'a> = &'a (dyn Fn(usize, usize) -> bool + Sync);

/// Build documents for `items` on a pool of `threads` workers.
///
/// The output has one slot per input item, in input order. A slot is `None`
/// when building that message panicked, or when the progress callback asked
/// to stop before the message was reached.
pub fn build_batch<E: TextExtractor>(
    builder: &DocumentBuilder<E>,
    items: &[BatchItem],
    threads: usize,
    progress: Option<Progress<'_>>,
) -> Vec<Option<IndexableDocument>> {
    run_batch(items, threads, progress, |item| {
        builder.build(&item.message, &item.users)
    })
}

fn run_batch<F>(
    items: &[BatchItem],
    threads: usize,
    progress: Option<Progress<'_>>,
    build: F,
) -> Vec<Option<IndexableDocument>>
where
    F: Fn(&BatchItem) -> IndexableDocument + Sync,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }

    let built = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);

    debug!(total, threads, "Building document batch");

    let work = || {
        items
            .par_iter()
            .map(|item| {
                if stop.load(Ordering::Relaxed) {
                    return None;
                }
                let doc = build_contained(item, &build);
                let done = built.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(progress) = progress {
                    if !progress(done, total) {
                        stop.store(true, Ordering::Relaxed);
                    }
                }
                doc
            })
            .collect::<Vec<_>>()
    };

    let docs = match rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
    {
        Ok(pool) => pool.install(work),
        Err(e) => {
            warn!(error = %e, "Could not start worker pool, using the global one");
            work()
        }
    };

    if stop.load(Ordering::Relaxed) {
        debug!(built = built.load(Ordering::Relaxed), total, "Batch stopped early");
    }

    docs
}

/// Build one message; a panic costs only this message.
fn build_contained<F>(item: &BatchItem, build: &F) -> Option<IndexableDocument>
where
    F: Fn(&BatchItem) -> IndexableDocument,
{
    match panic::catch_unwind(AssertUnwindSafe(|| build(item))) {
        Ok(doc) => Some(doc),
        Err(_) => {
            warn!(
                mailbox = %item.message.mailbox_id,
                uid = %item.message.uid,
                "Document build panicked, message skipped"
            );
            None
        }
    }
}
