//! MIME walking: body extraction, attachment listing, HTML-to-text conversion.

use mail_parser::{Message, MessageParser, MessagePart, MimeHeaders, PartType};

use crate::model::attachment::AttachmentPart;
use crate::parser::header;

/// What the walker found in a message body.
#[derive(Debug, Clone, Default)]
pub struct MessageParts<'a> {
    /// Plain text of the first text-bearing part. `mail-parser` reduces HTML
    /// to text when there is no `text/plain` alternative. `None` when empty.
    pub body_text: Option<String>,

    /// First `text/html` part, if any.
    pub body_html: Option<String>,

    /// Top-level media type (`"text"`, `"multipart"`, …).
    pub media_type: String,

    /// Top-level subtype (`"plain"`, `"mixed"`, …).
    pub sub_type: String,

    /// Attachments in depth-first structural order.
    pub attachments: Vec<AttachmentPart<'a>>,
}

/// Parse a complete message into a MIME tree.
///
/// Returns `None` when `mail-parser` cannot make sense of the bytes at all.
pub fn parse(raw_message: &[u8]) -> Option<Message<'_>> {
    MessageParser::default().parse(raw_message)
}

/// Walk a parsed message (or, when parsing failed, the raw bytes) and
/// separate the body from the attachments.
pub fn walk<'a>(parsed: Option<&'a Message<'_>>, raw_message: &[u8]) -> MessageParts<'a> {
    match parsed {
        Some(msg) => walk_parsed(msg),
        None => walk_unparsed(raw_message),
    }
}

fn walk_parsed<'a>(msg: &'a Message<'_>) -> MessageParts<'a> {
    let body_html = msg
        .body_html(0)
        .map(|s| s.into_owned())
        .filter(|s| !s.is_empty());

    let body_text = msg
        .body_text(0)
        .map(|s| s.into_owned())
        .filter(|s| !s.is_empty());

    let (media_type, sub_type) = msg
        .parts
        .first()
        .and_then(|root| root.content_type())
        .map(|ct| {
            (
                ct.ctype().to_ascii_lowercase(),
                ct.subtype().unwrap_or("").to_ascii_lowercase(),
            )
        })
        .unwrap_or_else(default_media_type);

    let attachments = msg
        .attachments()
        .enumerate()
        .map(|(index, part)| attachment_part(index, part))
        .collect();

    MessageParts {
        body_text,
        body_html,
        media_type,
        sub_type,
        attachments,
    }
}

/// Everything after the first blank line is the body; no attachments.
fn walk_unparsed(raw_message: &[u8]) -> MessageParts<'static> {
    let (_, body) = header::split_header_block(raw_message);
    let text = header::decode_header_bytes(body);
    let (media_type, sub_type) = default_media_type();
    MessageParts {
        body_text: Some(text).filter(|s| !s.is_empty()),
        media_type,
        sub_type,
        ..MessageParts::default()
    }
}

fn default_media_type() -> (String, String) {
    ("text".to_string(), "plain".to_string())
}

fn attachment_part<'a>(index: usize, part: &'a MessagePart<'_>) -> AttachmentPart<'a> {
    let content_type = part
        .content_type()
        .map(|ct| match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub),
            None => ct.ctype().to_string(),
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
        .to_ascii_lowercase();

    // Text bodies come out of mail-parser already decoded to UTF-8.
    let charset = match part.body {
        PartType::Text(_) | PartType::Html(_) => Some("utf-8".to_string()),
        _ => part
            .content_type()
            .and_then(|ct| ct.attribute("charset"))
            .map(String::from),
    };

    AttachmentPart {
        index,
        filename: part.attachment_name().map(String::from),
        content_type,
        charset,
        content_id: part.content_id().map(header::extract_angle_bracket),
        disposition: part
            .content_disposition()
            .map(|d| d.ctype().to_ascii_lowercase()),
        content: part.contents(),
    }
}

/// Drop a leading byte-order mark and mbox `From ` separator line, which
/// some stores keep in front of the message.
pub fn strip_envelope_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);
    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}

/// Convert HTML to plain text for indexing.
///
/// - Block elements (`<p>`, `<div>`, `<br>`, `<li>`, headings, rows) become line breaks
/// - `<script>` and `<style>` blocks are removed
/// - Common entities are decoded
/// - Runs of blank lines collapse to one
///
/// Used for `text/html` attachments; message bodies are reduced by `mail-parser`.
pub fn html_to_text(html: &str) -> String {
    let html = remove_tag_block(&remove_tag_block(html, "script"), "style");

    const BLOCK_TAGS: [&str; 11] = [
        "br", "p", "div", "tr", "li", "h1", "h2", "h3", "h4", "h5", "h6",
    ];

    let mut stripped = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name: String = tag
                    .trim_start_matches('/')
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_ascii_lowercase();
                if BLOCK_TAGS.contains(&name.as_str()) {
                    stripped.push('\n');
                }
            }
            _ if in_tag => tag.push(ch),
            _ => stripped.push(ch),
        }
    }

    let decoded = decode_entities(&stripped);

    let mut cleaned = String::with_capacity(decoded.len());
    let mut prev_blank = false;
    for line in decoded.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !prev_blank && !cleaned.is_empty() {
                cleaned.push('\n');
            }
            prev_blank = true;
        } else {
            cleaned.push_str(line);
            cleaned.push('\n');
            prev_blank = false;
        }
    }

    cleaned.trim().to_string()
}

fn decode_entities(text: &str) -> String {
    const ENTITIES: [(&str, &str); 8] = [
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&apos;", "'"),
        ("&nbsp;", " "),
        ("&#160;", " "),
        // Last, so "&amp;lt;" stays "&lt;"
        ("&amp;", "&"),
    ];
    let mut result = text.to_string();
    for (entity, replacement) in ENTITIES {
        result = result.replace(entity, replacement);
    }
    result
}

/// Remove an entire tag block (e.g. `<script>…</script>`), case-insensitively.
fn remove_tag_block(html: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let lower = html.to_ascii_lowercase();

    let mut result = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(start) = lower[pos..].find(&open).map(|i| pos + i) {
        result.push_str(&html[pos..start]);
        match lower[start..].find(&close) {
            Some(end) => pos = start + end + close.len(),
            None => return result,
        }
    }
    result.push_str(&html[pos..]);
    result
}
