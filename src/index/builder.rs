//! Document construction: one raw message in, one indexable document out.
//!
//! The builder parses the message once, hands the header block to the
//! [`HeaderCollector`] and the MIME tree to the walker, optionally runs the
//! attachments through a [`TextExtractor`], and assembles the result. It never
//! fails: unreadable content yields an empty `text`, and a bad attachment
//! only loses its own text.

use std::panic::{self, AssertUnwindSafe};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MaildocError, Result};
use crate::extractor::TextExtractor;
use crate::index::collector::{HeaderCategory, HeaderCollector};
use crate::model::attachment::{AttachmentPart, AttachmentText};
use crate::model::document::IndexableDocument;
use crate::model::message::RawMessage;
use crate::parser::{header, mime};

/// Default ceiling for payloads handed to the extractor (50 MiB).
pub const DEFAULT_MAX_ATTACHMENT_SIZE: u64 = 50 * 1024 * 1024;

/// Whether attachment text is extracted into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexAttachments {
    Yes,
    #[default]
    No,
}

impl From<bool> for IndexAttachments {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// Resolve an IANA zone name such as `"Europe/Paris"`.
pub fn parse_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| MaildocError::InvalidTimeZone(name.to_string()))
}

/// Builds [`IndexableDocument`]s with a fixed extractor, zone and attachment
/// policy. Holds no per-message state, so one builder can be shared across
/// threads.
#[derive(Debug, Clone)]
pub struct DocumentBuilder<E> {
    extractor: E,
    zone: Tz,
    policy: IndexAttachments,
    max_attachment_size: u64,
}

impl<E: TextExtractor> DocumentBuilder<E> {
    pub fn new(extractor: E, zone: Tz, policy: IndexAttachments) -> Self {
        Self {
            extractor,
            zone,
            policy,
            max_attachment_size: DEFAULT_MAX_ATTACHMENT_SIZE,
        }
    }

    /// Payloads above `bytes` are not handed to the extractor; they are
    /// recorded with empty text.
    pub fn with_max_attachment_size(mut self, bytes: u64) -> Self {
        self.max_attachment_size = bytes;
        self
    }

    /// Build the document for one message occurrence.
    ///
    /// `users` are the owners of the mailbox the message lives in.
    pub fn build(&self, message: &RawMessage, users: &[String]) -> IndexableDocument {
        let content = mime::strip_envelope_line(&message.content);
        let parsed = mime::parse(content);

        let (raw_headers, _) = header::split_header_block(content);
        let headers = HeaderCollector::collect(raw_headers);
        let parts = mime::walk(parsed.as_ref(), content);

        let has_attachment = !parts.attachments.is_empty();
        let attachments = match self.policy {
            IndexAttachments::Yes => parts
                .attachments
                .iter()
                .map(|part| self.extract_attachment(message, part))
                .collect(),
            IndexAttachments::No => Vec::new(),
        };

        let text = assemble_text(&headers, parts.body_text.as_deref());

        let date = message.internal_date.with_timezone(&self.zone).fixed_offset();
        let sent_date = headers
            .sent_date()
            .map(|d| d.with_timezone(&self.zone).fixed_offset())
            .unwrap_or(date);

        debug!(
            mailbox = %message.mailbox_id,
            uid = %message.uid,
            attachments = parts.attachments.len(),
            text_len = text.len(),
            "Built document"
        );

        IndexableDocument {
            mailbox_id: message.mailbox_id.clone(),
            uid: message.uid,
            mod_seq: message.mod_seq,
            users: users.iter().cloned().collect(),
            flags: message.flags.clone(),
            date,
            sent_date,
            size: message.size(),
            media_type: parts.media_type,
            sub_type: parts.sub_type,
            message_id: headers.message_id().map(String::from),
            from: headers.addresses(HeaderCategory::From),
            to: headers.addresses(HeaderCategory::To),
            cc: headers.addresses(HeaderCategory::Cc),
            bcc: headers.addresses(HeaderCategory::Bcc),
            reply_to: headers.reply_to(),
            subjects: headers.subjects(),
            body_text: parts.body_text,
            body_html: parts.body_html,
            has_attachment,
            attachments,
            text,
        }
    }

    /// Run one attachment through the extractor. Every failure, including a
    /// panicking extractor, becomes empty text.
    fn extract_attachment(&self, message: &RawMessage, part: &AttachmentPart<'_>) -> AttachmentText {
        if part.size() > self.max_attachment_size {
            debug!(
                uid = %message.uid,
                index = part.index,
                size = part.size(),
                "Attachment too large, not extracted"
            );
            return AttachmentText::new(part, String::new());
        }

        let media_type = part.media_type();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.extractor.extract(part.content, &media_type)
        }));

        let text = match outcome {
            Ok(Ok(parsed)) => parsed.text,
            Ok(Err(e)) => {
                debug!(
                    uid = %message.uid,
                    index = part.index,
                    media_type = %media_type,
                    error = %e,
                    "No text extracted from attachment"
                );
                String::new()
            }
            Err(_) => {
                warn!(
                    uid = %message.uid,
                    index = part.index,
                    media_type = %media_type,
                    "Extractor panicked on attachment"
                );
                String::new()
            }
        };

        AttachmentText::new(part, text)
    }
}

/// Build a single document without keeping a builder around.
pub fn build_document(
    message: &RawMessage,
    users: &[String],
    extractor: &dyn TextExtractor,
    zone: Tz,
    policy: IndexAttachments,
) -> IndexableDocument {
    DocumentBuilder::new(extractor, zone, policy).build(message, users)
}

/// Join non-empty category texts and the body with single spaces, in the
/// order From, To, Cc, Bcc, Subject, Body.
fn assemble_text(headers: &HeaderCollector, body: Option<&str>) -> String {
    HeaderCategory::ALL
        .iter()
        .filter_map(|category| headers.category_text(*category))
        .chain(body.map(String::from))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{DefaultTextExtractor, ExtractError, NoopExtractor, ParsedContent};
    use crate::model::message::MessageUid;
    use chrono::{TimeZone, Utc};

    struct Panicking;

    impl TextExtractor for Panicking {
        fn extract(&self, _: &[u8], _: &str) -> std::result::Result<ParsedContent, ExtractError> {
            panic!("extractor bug");
        }
    }

    const WITH_ATTACHMENT: &[u8] = b"Subject: report\n\
Content-Type: multipart/mixed; boundary=b1\n\
\n\
--b1\n\
Content-Type: text/plain\n\
\n\
See attached\n\
--b1\n\
Content-Type: text/plain; name=a.txt\n\
Content-Disposition: attachment; filename=a.txt\n\
\n\
quarterly numbers\n\
--b1--\n";

    fn message(content: &[u8]) -> RawMessage {
        RawMessage::new("1", MessageUid(154), content.to_vec())
    }

    fn users() -> Vec<String> {
        vec!["username".to_string()]
    }

    #[test]
    fn test_parse_zone() {
        assert_eq!(parse_zone("Europe/Paris").unwrap(), chrono_tz::Europe::Paris);
        assert!(matches!(
            parse_zone("Mars/Olympus"),
            Err(MaildocError::InvalidTimeZone(_))
        ));
    }

    #[test]
    fn test_text_concatenation_order() {
        let raw = b"Subject: s\nBcc: d@test\nCc: c@test\nTo: b@test\nFrom: a@test\n\nbody";
        let doc = build_document(
            &message(raw),
            &users(),
            &NoopExtractor,
            chrono_tz::UTC,
            IndexAttachments::No,
        );
        assert_eq!(
            doc.text(),
            "a@test a@test b@test b@test c@test c@test d@test d@test s body"
        );
    }

    #[test]
    fn test_empty_content() {
        let doc = build_document(
            &message(b""),
            &users(),
            &NoopExtractor,
            chrono_tz::UTC,
            IndexAttachments::No,
        );
        assert_eq!(doc.text(), "");
        assert!(doc.body_text().is_none());
        assert!(!doc.has_attachment());
        assert_eq!(doc.media_type(), "text");
    }

    #[test]
    fn test_attachments_skipped_when_not_asked() {
        let doc = build_document(
            &message(WITH_ATTACHMENT),
            &users(),
            &DefaultTextExtractor,
            chrono_tz::UTC,
            IndexAttachments::No,
        );
        assert!(doc.has_attachment());
        assert!(doc.attachments().is_empty());
    }

    #[test]
    fn test_attachments_extracted_when_asked() {
        let doc = build_document(
            &message(WITH_ATTACHMENT),
            &users(),
            &DefaultTextExtractor,
            chrono_tz::UTC,
            IndexAttachments::Yes,
        );
        assert_eq!(doc.attachments().len(), 1);
        assert!(doc.attachments()[0].text.contains("quarterly numbers"));
        assert_eq!(doc.attachments()[0].filename.as_deref(), Some("a.txt"));
        assert!(!doc.text().contains("quarterly"));
    }

    #[test]
    fn test_panicking_extractor_is_contained() {
        let doc = build_document(
            &message(WITH_ATTACHMENT),
            &users(),
            &Panicking,
            chrono_tz::UTC,
            IndexAttachments::Yes,
        );
        assert_eq!(doc.attachments().len(), 1);
        assert!(doc.attachments()[0].text.is_empty());
        assert!(doc.text().starts_with("report See attached"));
    }

    #[test]
    fn test_oversized_attachment_not_extracted() {
        let builder =
            DocumentBuilder::new(DefaultTextExtractor, chrono_tz::UTC, IndexAttachments::Yes)
                .with_max_attachment_size(4);
        let doc = builder.build(&message(WITH_ATTACHMENT), &users());
        assert_eq!(doc.attachments().len(), 1);
        assert!(doc.attachments()[0].text.is_empty());
    }

    #[test]
    fn test_dates_follow_zone() {
        let internal = Utc.with_ymd_and_hms(2024, 1, 4, 10, 0, 0).unwrap();
        let raw = b"Date: Wed, 03 Jan 2024 23:30:00 +0000\nSubject: s\n\nbody";
        let msg = message(raw).with_internal_date(internal);
        let paris = parse_zone("Europe/Paris").unwrap();
        let builder = DocumentBuilder::new(NoopExtractor, paris, IndexAttachments::No);
        let doc = builder.build(&msg, &users());

        assert_eq!(doc.date().to_rfc3339(), "2024-01-04T11:00:00+01:00");
        assert_eq!(doc.sent_date().to_rfc3339(), "2024-01-04T00:30:00+01:00");
        assert_eq!(doc.text(), "s body");
    }

    #[test]
    fn test_sent_date_falls_back_to_internal_date() {
        let internal = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let msg = message(b"Subject: undated\n\nbody").with_internal_date(internal);
        let doc = build_document(
            &msg,
            &users(),
            &NoopExtractor,
            chrono_tz::UTC,
            IndexAttachments::No,
        );
        assert_eq!(doc.sent_date(), doc.date());
    }

    #[test]
    fn test_metadata_copied() {
        let msg = message(b"Message-ID: <abc@test>\n\nhi").with_mod_seq(42);
        let doc = build_document(
            &msg,
            &["alice".to_string(), "bob".to_string(), "alice".to_string()],
            &NoopExtractor,
            chrono_tz::UTC,
            IndexAttachments::No,
        );
        assert_eq!(doc.uid(), MessageUid(154));
        assert_eq!(doc.mod_seq(), 42);
        assert_eq!(doc.size(), msg.size());
        assert_eq!(doc.message_id(), Some("<abc@test>"));
        assert_eq!(doc.users().len(), 2);
    }
}
