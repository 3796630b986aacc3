//! Attachment parts found while walking a message, and their extraction results.

/// An attachment located in the MIME tree.
///
/// `content` is already transfer-decoded (base64 / quoted-printable) and
/// borrowed from the parsed message.
#[derive(Debug, Clone)]
pub struct AttachmentPart<'a> {
    /// Depth-first position among the message's attachments (0, 1, 2, …).
    pub index: usize,

    /// Filename from `Content-Disposition` or `Content-Type; name=`, if any.
    pub filename: Option<String>,

    /// MIME content type (e.g. `"application/pdf"`).
    pub content_type: String,

    /// Charset of `content`, when known.
    pub charset: Option<String>,

    /// `Content-ID` header value, used to reference inline parts.
    pub content_id: Option<String>,

    /// Disposition type: `"attachment"`, `"inline"`, or `None` when absent.
    pub disposition: Option<String>,

    /// Decoded payload.
    pub content: &'a [u8],
}

impl AttachmentPart<'_> {
    /// Decoded size in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Content type with its charset parameter, as handed to extractors.
    pub fn media_type(&self) -> String {
        match &self.charset {
            Some(charset) => format!("{}; charset={}", self.content_type, charset),
            None => self.content_type.clone(),
        }
    }

    /// Lowercase extension taken from the filename, if it has one.
    pub fn file_extension(&self) -> Option<String> {
        let name = self.filename.as_deref()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

/// Extracted text for one attachment, as stored in the indexable document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttachmentText {
    /// Depth-first position among the message's attachments.
    pub index: usize,
    pub filename: Option<String>,
    pub file_extension: Option<String>,
    pub content_type: String,
    pub content_id: Option<String>,
    pub disposition: Option<String>,
    /// Decoded size in bytes.
    pub size: u64,
    /// Extracted text; empty when the extractor could not handle the payload.
    pub text: String,
}

impl AttachmentText {
    /// Pair an attachment's identity with the text extracted from it.
    pub fn new(part: &AttachmentPart<'_>, text: String) -> Self {
        Self {
            index: part.index,
            filename: part.filename.clone(),
            file_extension: part.file_extension(),
            content_type: part.content_type.clone(),
            content_id: part.content_id.clone(),
            disposition: part.disposition.clone(),
            size: part.size(),
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(filename: Option<&str>) -> AttachmentPart<'static> {
        AttachmentPart {
            index: 2,
            filename: filename.map(String::from),
            content_type: "text/plain".to_string(),
            charset: None,
            content_id: None,
            disposition: Some("attachment".to_string()),
            content: b"hello",
        }
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(part(Some("Report.PDF")).file_extension().as_deref(), Some("pdf"));
        assert_eq!(part(Some(".bashrc")).file_extension(), None);
        assert_eq!(part(Some("README")).file_extension(), None);
        assert_eq!(part(None).file_extension(), None);
    }

    #[test]
    fn test_media_type_with_charset() {
        let mut p = part(None);
        assert_eq!(p.media_type(), "text/plain");
        p.charset = Some("utf-8".to_string());
        assert_eq!(p.media_type(), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_attachment_text_copies_identity() {
        let result = AttachmentText::new(&part(Some("notes.txt")), "hello".to_string());
        assert_eq!(result.index, 2);
        assert_eq!(result.size, 5);
        assert_eq!(result.file_extension.as_deref(), Some("txt"));
        assert_eq!(result.text, "hello");
    }
}
