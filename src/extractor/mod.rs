//! Pluggable text extraction for attachment payloads.
//!
//! A [`TextExtractor`] turns bytes plus a declared media type into plain
//! text. Failures are returned as [`ExtractError`] values; the document
//! builder treats every error as "no extractable text" for that attachment.

pub mod default;

pub use default::DefaultTextExtractor;

use thiserror::Error;

/// Why an extractor produced no text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The extractor does not handle this media type.
    #[error("Unsupported media type: {media_type}")]
    Unsupported { media_type: String },

    /// The payload could not be decoded as its declared type.
    #[error("Corrupt payload: {0}")]
    Corrupt(String),

    /// The extractor failed for another reason.
    #[error("Extraction failed: {0}")]
    Failed(String),
}

impl ExtractError {
    pub fn unsupported(media_type: &str) -> Self {
        Self::Unsupported {
            media_type: media_type.to_string(),
        }
    }
}

/// Text extracted from a payload, with optional metadata such as the
/// charset that was used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedContent {
    pub text: String,
    pub metadata: Vec<(String, String)>,
}

impl ParsedContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

/// Extract plain text from a binary payload.
///
/// `media_type` is the declared `Content-Type`, possibly with parameters
/// (`text/plain; charset=iso-8859-1`). Implementations must not panic on
/// malformed input and hold no mutable state, so one instance can serve
/// many concurrent builds.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, content: &[u8], media_type: &str) -> Result<ParsedContent, ExtractError>;
}

impl<T: TextExtractor + ?Sized> TextExtractor for &T {
    fn extract(&self, content: &[u8], media_type: &str) -> Result<ParsedContent, ExtractError> {
        (**self).extract(content, media_type)
    }
}

impl<T: TextExtractor + ?Sized> TextExtractor for Box<T> {
    fn extract(&self, content: &[u8], media_type: &str) -> Result<ParsedContent, ExtractError> {
        (**self).extract(content, media_type)
    }
}

/// Extractor that never produces text. For when extraction is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExtractor;

impl TextExtractor for NoopExtractor {
    fn extract(&self, _content: &[u8], media_type: &str) -> Result<ParsedContent, ExtractError> {
        Err(ExtractError::unsupported(media_type))
    }
}

/// Tries each extractor in turn; the first success wins.
pub struct ChainExtractor {
    extractors: Vec<Box<dyn TextExtractor>>,
}

impl ChainExtractor {
    pub fn new(extractors: Vec<Box<dyn TextExtractor>>) -> Self {
        Self { extractors }
    }

    pub fn push(mut self, extractor: impl TextExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }
}

impl TextExtractor for ChainExtractor {
    fn extract(&self, content: &[u8], media_type: &str) -> Result<ParsedContent, ExtractError> {
        let mut last_error = ExtractError::unsupported(media_type);
        for extractor in &self.extractors {
            match extractor.extract(content, media_type) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }
}

/// Split `type/subtype; param=value` into the lowercase essence and the
/// `charset` parameter, if any.
pub fn split_media_type(media_type: &str) -> (String, Option<String>) {
    let mut parts = media_type.split(';');
    let essence = parts.next().unwrap_or("").trim().to_ascii_lowercase();
    let charset = parts.find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    });
    (essence, charset)
}
