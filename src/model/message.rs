//! The raw message handed over by the storage layer, plus its identifiers.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Opaque identifier of the mailbox holding a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MailboxId(pub String);

impl fmt::Display for MailboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MailboxId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// IMAP UID of a message, unique within its mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageUid(pub u32);

impl fmt::Display for MessageUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// IMAP message flags: the system flags and the user keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flags {
    pub answered: bool,
    pub deleted: bool,
    pub draft: bool,
    pub flagged: bool,
    pub recent: bool,
    pub seen: bool,
    /// User-defined keywords, in the order they were set.
    pub user_flags: IndexSet<String>,
}

impl Flags {
    /// Parse IMAP flag atoms such as `\Seen`, `\Flagged` or `$Label1`.
    ///
    /// System flags are matched case-insensitively; anything else becomes a
    /// user keyword.
    pub fn from_atoms<'a>(atoms: impl IntoIterator<Item = &'a str>) -> Self {
        let mut flags = Self::default();
        for atom in atoms {
            let atom = atom.trim();
            if atom.is_empty() {
                continue;
            }
            match atom.to_ascii_lowercase().as_str() {
                "\\answered" => flags.answered = true,
                "\\deleted" => flags.deleted = true,
                "\\draft" => flags.draft = true,
                "\\flagged" => flags.flagged = true,
                "\\recent" => flags.recent = true,
                "\\seen" => flags.seen = true,
                _ => {
                    flags.user_flags.insert(atom.to_string());
                }
            }
        }
        flags
    }
}

/// A fully loaded message as supplied by the storage layer.
///
/// The builder only borrows it; nothing here is mutated during indexing.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub mailbox_id: MailboxId,
    pub uid: MessageUid,
    /// Modification sequence (CONDSTORE), 0 when the store does not track it.
    pub mod_seq: u64,
    pub flags: Flags,
    /// When the message was delivered to the mailbox.
    pub internal_date: DateTime<Utc>,
    /// Complete RFC 5322 content, headers and body.
    pub content: Vec<u8>,
}

impl RawMessage {
    /// Create a message with default flags, `mod_seq` 0 and the Unix epoch as
    /// internal date.
    pub fn new(mailbox_id: impl Into<MailboxId>, uid: MessageUid, content: Vec<u8>) -> Self {
        Self {
            mailbox_id: mailbox_id.into(),
            uid,
            mod_seq: 0,
            flags: Flags::default(),
            internal_date: DateTime::UNIX_EPOCH,
            content,
        }
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_internal_date(mut self, date: DateTime<Utc>) -> Self {
        self.internal_date = date;
        self
    }

    pub fn with_mod_seq(mut self, mod_seq: u64) -> Self {
        self.mod_seq = mod_seq;
        self
    }

    /// Size of the full content in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_from_atoms() {
        let flags = Flags::from_atoms(["\\Seen", "\\FLAGGED", "$Work", "", "$Work"]);
        assert!(flags.seen);
        assert!(flags.flagged);
        assert!(!flags.deleted);
        assert_eq!(flags.user_flags.len(), 1);
        assert!(flags.user_flags.contains("$Work"));
    }

    #[test]
    fn test_raw_message_defaults() {
        let msg = RawMessage::new("inbox", MessageUid(154), b"Subject: hi\n\nbody".to_vec());
        assert_eq!(msg.mailbox_id, MailboxId::from("inbox"));
        assert_eq!(msg.size(), 17);
        assert_eq!(msg.internal_date, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(msg.flags, Flags::default());
    }
}
