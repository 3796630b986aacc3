//! Email address parsing (RFC 5322 §3.4).

use crate::parser::header::decode_encoded_words;

/// A parsed email address.
///
/// # Examples
/// - `"Juan García <juan@ejemplo.com>"` → `display_name = "Juan García"`, `address = "juan@ejemplo.com"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    /// Parse a single mailbox from a header value.
    ///
    /// Supported formats:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    /// - `"\"Display, Name\" <user@domain.com>"`
    ///
    /// RFC 2047 encoded words in the display name are decoded.
    /// If parsing fails, the raw string is stored as `address`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self {
                display_name: String::new(),
                address: String::new(),
            };
        }

        if let Some(angle_start) = trimmed.rfind('<') {
            if let Some(angle_end) = trimmed.rfind('>') {
                if angle_end > angle_start {
                    let address = trimmed[angle_start + 1..angle_end].trim().to_string();
                    let name_part = strip_quotes(&trimmed[..angle_start]);
                    return Self {
                        display_name: decode_encoded_words(&name_part).trim().to_string(),
                        address,
                    };
                }
            }
        }

        Self {
            display_name: String::new(),
            address: trimmed.to_string(),
        }
    }

    /// Parse an address list.
    ///
    /// Handles quoted commas (`"Last, First" <a@b.com>, other@c.com`) and
    /// group syntax (`Team: a@b.com, c@d.com;`), which contributes its members.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        let mut results = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut in_angle = false;

        let flush = |current: &mut String, results: &mut Vec<Self>| {
            let addr = Self::parse(current);
            if !addr.address.is_empty() {
                results.push(addr);
            }
            current.clear();
        };

        for ch in raw.chars() {
            match ch {
                '"' => {
                    in_quotes = !in_quotes;
                    current.push(ch);
                }
                '<' if !in_quotes => {
                    in_angle = true;
                    current.push(ch);
                }
                '>' if !in_quotes => {
                    in_angle = false;
                    current.push(ch);
                }
                // Group display name: discard it, members follow
                ':' if !in_quotes && !in_angle => current.clear(),
                ',' | ';' if !in_quotes && !in_angle => flush(&mut current, &mut results),
                _ => current.push(ch),
            }
        }
        flush(&mut current, &mut results);

        results
    }

    /// The form used in the searchable text: `"Display Name address"`.
    ///
    /// A mailbox without a display name repeats its address in the name slot.
    pub fn index_text(&self) -> String {
        let name = if self.display_name.is_empty() {
            &self.address
        } else {
            &self.display_name
        };
        format!("{} {}", name, self.address)
    }

    /// Format for display: `"Display Name <address>"` or just `"address"`.
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.display_name, self.address)
        }
    }
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
