//! Built-in extractor for textual payloads.

use crate::parser::header::decode_charset;
use crate::parser::mime::html_to_text;

use super::{split_media_type, ExtractError, ParsedContent, TextExtractor};

/// Handles `text/*` payloads and nothing else.
///
/// - `text/html` is reduced to plain text.
/// - Other `text/*` types are decoded with their declared charset, or as
///   UTF-8 with a Windows-1252 fallback when none is declared.
/// - Any other media type is [`ExtractError::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTextExtractor;

impl TextExtractor for DefaultTextExtractor {
    fn extract(&self, content: &[u8], media_type: &str) -> Result<ParsedContent, ExtractError> {
        let (essence, charset) = split_media_type(media_type);
        if !essence.starts_with("text/") {
            return Err(ExtractError::unsupported(&essence));
        }

        let (decoded, used_charset) = match charset {
            Some(charset) => (decode_charset(&charset, content), charset),
            None => match std::str::from_utf8(content) {
                Ok(s) => (s.to_string(), "utf-8".to_string()),
                Err(_) => {
                    let (s, _, _) = encoding_rs::WINDOWS_1252.decode(content);
                    (s.into_owned(), "windows-1252".to_string())
                }
            },
        };

        let text = if essence == "text/html" {
            html_to_text(&decoded)
        } else {
            decoded
        };

        Ok(ParsedContent::new(text).with_metadata("charset", used_charset))
    }
}
