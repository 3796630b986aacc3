//! Header collection for the searchable text.
//!
//! Every occurrence of From, To, Cc, Bcc and Subject is decoded and merged
//! into a per-category collection. The categories do not merge the same way:
//!
//! | Category | Dedup | Order                |
//! |----------|-------|----------------------|
//! | From     | yes   | unspecified          |
//! | To       | yes   | declaration order    |
//! | Cc       | yes   | declaration order    |
//! | Bcc      | yes   | unspecified          |
//! | Subject  | no    | declaration order    |
//!
//! Callers must not rely on any particular order for From and Bcc.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;

use crate::model::address::EmailAddress;
use crate::parser::header;

/// Header categories contributing to the searchable text, in text order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderCategory {
    From,
    To,
    Cc,
    Bcc,
    Subject,
}

impl HeaderCategory {
    /// All categories, in the order they are concatenated.
    pub const ALL: [HeaderCategory; 5] = [
        HeaderCategory::From,
        HeaderCategory::To,
        HeaderCategory::Cc,
        HeaderCategory::Bcc,
        HeaderCategory::Subject,
    ];

    /// Match a lowercase header name.
    pub fn from_header_name(name: &str) -> Option<Self> {
        match name {
            "from" => Some(Self::From),
            "to" => Some(Self::To),
            "cc" => Some(Self::Cc),
            "bcc" => Some(Self::Bcc),
            "subject" => Some(Self::Subject),
            _ => None,
        }
    }

    fn is_address(self) -> bool {
        !matches!(self, Self::Subject)
    }
}

/// Value collection with the merge policy of one category.
#[derive(Debug, Clone)]
enum CategoryValues {
    /// Deduplicated, iteration order not tied to insertion.
    Unordered(HashSet<String>),
    /// Deduplicated, insertion order kept.
    Ordered(IndexSet<String>),
    /// Every value kept, insertion order kept.
    Sequence(Vec<String>),
}

impl CategoryValues {
    fn for_category(category: HeaderCategory) -> Self {
        match category {
            HeaderCategory::From | HeaderCategory::Bcc => Self::Unordered(HashSet::new()),
            HeaderCategory::To | HeaderCategory::Cc => Self::Ordered(IndexSet::new()),
            HeaderCategory::Subject => Self::Sequence(Vec::new()),
        }
    }

    fn insert(&mut self, value: String) {
        match self {
            Self::Unordered(set) => {
                set.insert(value);
            }
            Self::Ordered(set) => {
                set.insert(value);
            }
            Self::Sequence(values) => values.push(value),
        }
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Self::Unordered(set) => Box::new(set.iter().map(String::as_str)),
            Self::Ordered(set) => Box::new(set.iter().map(String::as_str)),
            Self::Sequence(values) => Box::new(values.iter().map(String::as_str)),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Unordered(set) => set.is_empty(),
            Self::Ordered(set) => set.is_empty(),
            Self::Sequence(values) => values.is_empty(),
        }
    }
}

/// Decoded header values of one message.
#[derive(Debug, Clone)]
pub struct HeaderCollector {
    from: CategoryValues,
    to: CategoryValues,
    cc: CategoryValues,
    bcc: CategoryValues,
    subject: CategoryValues,
    from_addresses: IndexSet<EmailAddress>,
    to_addresses: IndexSet<EmailAddress>,
    cc_addresses: IndexSet<EmailAddress>,
    bcc_addresses: IndexSet<EmailAddress>,
    reply_to_addresses: IndexSet<EmailAddress>,
    message_id: Option<String>,
    date: Option<String>,
}

impl Default for HeaderCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderCollector {
    pub fn new() -> Self {
        Self {
            from: CategoryValues::for_category(HeaderCategory::From),
            to: CategoryValues::for_category(HeaderCategory::To),
            cc: CategoryValues::for_category(HeaderCategory::Cc),
            bcc: CategoryValues::for_category(HeaderCategory::Bcc),
            subject: CategoryValues::for_category(HeaderCategory::Subject),
            from_addresses: IndexSet::new(),
            to_addresses: IndexSet::new(),
            cc_addresses: IndexSet::new(),
            bcc_addresses: IndexSet::new(),
            reply_to_addresses: IndexSet::new(),
            message_id: None,
            date: None,
        }
    }

    /// Collect from a raw header block (everything before the first blank line).
    pub fn collect(raw_headers: &[u8]) -> Self {
        let text = header::decode_header_bytes(raw_headers);
        let mut collector = Self::new();
        for (name, value) in header::unfold_headers(&text) {
            collector.add_header(&name, &value);
        }
        collector
    }

    /// Record one unfolded header. `name` must be lowercase.
    pub fn add_header(&mut self, name: &str, raw_value: &str) {
        match name {
            "reply-to" => {
                self.reply_to_addresses
                    .extend(EmailAddress::parse_list(raw_value));
                return;
            }
            "message-id" => {
                if self.message_id.is_none() {
                    self.message_id = Some(header::extract_angle_bracket(raw_value));
                }
                return;
            }
            "date" => {
                if self.date.is_none() {
                    self.date = Some(raw_value.to_string());
                }
                return;
            }
            _ => {}
        }

        let Some(category) = HeaderCategory::from_header_name(name) else {
            return;
        };

        if !category.is_address() {
            let subject = header::decode_encoded_words(raw_value).trim().to_string();
            if !subject.is_empty() {
                self.subject.insert(subject);
            }
            return;
        }

        for address in EmailAddress::parse_list(raw_value) {
            self.values_mut(category).insert(address.index_text());
            if let Some(set) = self.address_set_mut(category) {
                set.insert(address);
            }
        }
    }

    /// Decoded values of a category, in its iteration order.
    pub fn values(&self, category: HeaderCategory) -> Vec<&str> {
        self.values_ref(category).iter().collect()
    }

    /// Values of a category joined by single spaces, `None` when absent.
    pub fn category_text(&self, category: HeaderCategory) -> Option<String> {
        let values = self.values_ref(category);
        if values.is_empty() {
            return None;
        }
        Some(values.iter().collect::<Vec<_>>().join(" "))
    }

    /// Structured addresses for From, To, Cc or Bcc, deduplicated in
    /// declaration order. Empty for Subject.
    pub fn addresses(&self, category: HeaderCategory) -> Vec<EmailAddress> {
        match category {
            HeaderCategory::From => self.from_addresses.iter().cloned().collect(),
            HeaderCategory::To => self.to_addresses.iter().cloned().collect(),
            HeaderCategory::Cc => self.cc_addresses.iter().cloned().collect(),
            HeaderCategory::Bcc => self.bcc_addresses.iter().cloned().collect(),
            HeaderCategory::Subject => Vec::new(),
        }
    }

    pub fn reply_to(&self) -> Vec<EmailAddress> {
        self.reply_to_addresses.iter().cloned().collect()
    }

    /// Every subject occurrence, in declaration order.
    pub fn subjects(&self) -> Vec<String> {
        self.subject.iter().map(String::from).collect()
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// The first `Date:` header, if it parses.
    pub fn sent_date(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(header::parse_date)
    }

    fn values_ref(&self, category: HeaderCategory) -> &CategoryValues {
        match category {
            HeaderCategory::From => &self.from,
            HeaderCategory::To => &self.to,
            HeaderCategory::Cc => &self.cc,
            HeaderCategory::Bcc => &self.bcc,
            HeaderCategory::Subject => &self.subject,
        }
    }

    fn values_mut(&mut self, category: HeaderCategory) -> &mut CategoryValues {
        match category {
            HeaderCategory::From => &mut self.from,
            HeaderCategory::To => &mut self.to,
            HeaderCategory::Cc => &mut self.cc,
            HeaderCategory::Bcc => &mut self.bcc,
            HeaderCategory::Subject => &mut self.subject,
        }
    }

    fn address_set_mut(&mut self, category: HeaderCategory) -> Option<&mut IndexSet<EmailAddress>> {
        match category {
            HeaderCategory::From => Some(&mut self.from_addresses),
            HeaderCategory::To => Some(&mut self.to_addresses),
            HeaderCategory::Cc => Some(&mut self.cc_addresses),
            HeaderCategory::Bcc => Some(&mut self.bcc_addresses),
            HeaderCategory::Subject => None,
        }
    }
}
