//! `maildoc` — turn raw stored email messages into flattened, searchable
//! documents for a full-text search engine.
//!
//! The entry point is [`index::builder::DocumentBuilder`]: give it a
//! [`extractor::TextExtractor`], a time zone and an attachment policy, then
//! call `build` once per message.

pub mod config;
pub mod error;
pub mod extractor;
pub mod index;
pub mod model;
pub mod parser;

pub use error::{MaildocError, Result};
pub use extractor::{DefaultTextExtractor, NoopExtractor, TextExtractor};
pub use index::builder::{build_document, parse_zone, DocumentBuilder, IndexAttachments};
pub use model::document::IndexableDocument;
pub use model::message::{Flags, MailboxId, MessageUid, RawMessage};
