//! The flattened document handed to the search engine.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, FixedOffset};
use indexmap::IndexSet;
use serde::Serialize;

use super::address::EmailAddress;
use super::attachment::AttachmentText;
use super::message::{Flags, MailboxId, MessageUid};

/// One indexable record per message occurrence.
///
/// Built once by [`crate::index::builder::DocumentBuilder`] and never
/// modified afterwards; re-indexing a message produces a new document.
/// Two documents are equal when they share mailbox and UID.
#[derive(Debug, Clone, Serialize)]
pub struct IndexableDocument {
    pub(crate) mailbox_id: MailboxId,
    pub(crate) uid: MessageUid,
    pub(crate) mod_seq: u64,
    pub(crate) users: IndexSet<String>,
    pub(crate) flags: Flags,
    /// Internal (delivery) date, in the configured zone.
    pub(crate) date: DateTime<FixedOffset>,
    /// `Date:` header value, in the configured zone. Falls back to `date`.
    pub(crate) sent_date: DateTime<FixedOffset>,
    pub(crate) size: u64,
    pub(crate) media_type: String,
    pub(crate) sub_type: String,
    pub(crate) message_id: Option<String>,
    pub(crate) from: Vec<EmailAddress>,
    pub(crate) to: Vec<EmailAddress>,
    pub(crate) cc: Vec<EmailAddress>,
    pub(crate) bcc: Vec<EmailAddress>,
    pub(crate) reply_to: Vec<EmailAddress>,
    pub(crate) subjects: Vec<String>,
    pub(crate) body_text: Option<String>,
    pub(crate) body_html: Option<String>,
    pub(crate) has_attachment: bool,
    pub(crate) attachments: Vec<AttachmentText>,
    pub(crate) text: String,
}

impl IndexableDocument {
    pub fn mailbox_id(&self) -> &MailboxId {
        &self.mailbox_id
    }

    pub fn uid(&self) -> MessageUid {
        self.uid
    }

    pub fn mod_seq(&self) -> u64 {
        self.mod_seq
    }

    /// Users owning the mailbox this message lives in.
    pub fn users(&self) -> &IndexSet<String> {
        &self.users
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn date(&self) -> DateTime<FixedOffset> {
        self.date
    }

    pub fn sent_date(&self) -> DateTime<FixedOffset> {
        self.sent_date
    }

    /// Size of the raw message in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Top-level media type, e.g. `"multipart"` for `multipart/mixed`.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn from(&self) -> &[EmailAddress] {
        &self.from
    }

    pub fn to(&self) -> &[EmailAddress] {
        &self.to
    }

    pub fn cc(&self) -> &[EmailAddress] {
        &self.cc
    }

    pub fn bcc(&self) -> &[EmailAddress] {
        &self.bcc
    }

    pub fn reply_to(&self) -> &[EmailAddress] {
        &self.reply_to
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn body_text(&self) -> Option<&str> {
        self.body_text.as_deref()
    }

    pub fn body_html(&self) -> Option<&str> {
        self.body_html.as_deref()
    }

    pub fn has_attachment(&self) -> bool {
        self.has_attachment
    }

    /// Extraction results, empty unless attachment indexing was requested.
    pub fn attachments(&self) -> &[AttachmentText] {
        &self.attachments
    }

    /// Concatenated full-text field: From, To, Cc, Bcc, Subject, Body.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Serialize for the search backend.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl PartialEq for IndexableDocument {
    fn eq(&self, other: &Self) -> bool {
        self.mailbox_id == other.mailbox_id && self.uid == other.uid
    }
}

impl Eq for IndexableDocument {}

impl Hash for IndexableDocument {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mailbox_id.hash(state);
        self.uid.hash(state);
    }
}
