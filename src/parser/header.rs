//! RFC 5322 header block handling: splitting, unfolding, encoded-words
//! (RFC 2047), and lenient date parsing.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

/// Encoded words in the wild frequently drop their `=` padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Split raw message bytes into the header block and the body.
///
/// The blank line separating them belongs to neither side. A message that
/// starts with a blank line has no headers; one without any blank line is all
/// headers.
pub fn split_header_block(data: &[u8]) -> (&[u8], &[u8]) {
    let data = strip_bom(data);

    if let Some(body) = data.strip_prefix(b"\r\n") {
        return (&[], body);
    }
    if let Some(body) = data.strip_prefix(b"\n") {
        return (&[], body);
    }

    for i in 0..data.len() {
        if data[i] != b'\n' {
            continue;
        }
        let rest = &data[i + 1..];
        if rest.starts_with(b"\n") {
            return (&data[..=i], &rest[1..]);
        }
        if rest.starts_with(b"\r\n") {
            return (&data[..=i], &rest[2..]);
        }
    }
    (data, &[])
}

fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

/// Decode raw header bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
pub fn decode_header_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Unfold headers: continuation lines (leading space or tab) are joined to
/// the previous header with a single space.
///
/// Returns `(lowercase_name, raw_value)` pairs in declaration order.
/// Lines that are neither a header nor a continuation are dropped.
pub fn unfold_headers(text: &str) -> Vec<(String, String)> {
    let mut result: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(last) = result.last_mut() {
                if !last.1.is_empty() {
                    last.1.push(' ');
                }
                last.1.push_str(line.trim());
            }
        } else if let Some(colon_pos) = line.find(':') {
            let name = line[..colon_pos].trim();
            if name.is_empty() || name.contains(' ') {
                continue;
            }
            let value = line[colon_pos + 1..].trim().to_string();
            result.push((name.to_ascii_lowercase(), value));
        }
    }

    result
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// Whitespace between two adjacent encoded words is dropped (RFC 2047 §6.2).
/// Tokens that fail to decode are kept verbatim.
pub fn decode_encoded_words(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_start = &remaining[start + 2..];
        match decode_one_word(after_start) {
            Some((text, consumed)) => {
                result.push_str(&text);
                remaining = &after_start[consumed..];
                last_was_encoded = true;
            }
            None => {
                result.push_str("=?");
                remaining = after_start;
                last_was_encoded = false;
            }
        }
    }

    result.push_str(remaining);
    result
}

/// Decode `charset?encoding?text?=` and report how many bytes were consumed.
fn decode_one_word(s: &str) -> Option<(String, usize)> {
    let (charset, rest) = s.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let encoded = &rest[..end];

    if charset.is_empty() || encoded.contains(char::is_whitespace) {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => LENIENT_BASE64.decode(encoded).ok()?,
        "Q" | "q" => decode_q_encoding(encoded),
        _ => return None,
    };

    let consumed = charset.len() + 1 + encoding.len() + 1 + end + 2;
    Some((decode_charset(charset, &bytes), consumed))
}

/// Decode Q-encoding (RFC 2047): underscores → spaces, `=XX` → byte.
fn decode_q_encoding(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        result.push(byte);
                        i += 3;
                    }
                    None => {
                        result.push(b'=');
                        i += 1;
                    }
                }
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    result
}

/// Decode bytes using a named charset (RFC 2231 language suffix ignored).
pub fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    let label = charset.split('*').next().unwrap_or(charset);
    if label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8") {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    match encoding_rs::Encoding::for_label(label.as_bytes()) {
        Some(encoding) => {
            let (decoded, _, _) = encoding.decode(bytes);
            decoded.into_owned()
        }
        None => {
            warn!(charset = label, "Unknown charset, falling back to UTF-8 lossy");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Extract the first `<…>` token (Message-ID, In-Reply-To).
pub fn extract_angle_bracket(s: &str) -> String {
    let trimmed = s.trim();
    if let Some(start) = trimmed.find('<') {
        if let Some(end) = trimmed[start..].find('>') {
            return trimmed[start..=start + end].to_string();
        }
    }
    trimmed.to_string()
}

/// Parse an email date string.
///
/// Accepts RFC 2822, RFC 3339 and the usual broken variants (missing
/// day-of-week, named zones, no zone at all). Returns `None` when nothing
/// matches.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let without_dow = strip_day_of_week(trimmed);
    let candidates = [without_dow.to_string(), replace_named_tz(without_dow)];

    const FORMATS: [&str; 6] = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M %z",
        "%Y-%m-%d %H:%M:%S %z",
        "%d %b %Y %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%b %d %H:%M:%S %Y",
    ];

    for candidate in &candidates {
        for fmt in FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(candidate, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(candidate, fmt) {
                return Some(Utc.from_utc_datetime(&ndt));
            }
        }
    }

    if let Some(dt) = mail_parser_date(trimmed) {
        return Some(dt);
    }

    warn!(date = trimmed, "Could not parse date");
    None
}

/// Last resort: let `mail-parser` try its own date grammar.
fn mail_parser_date(input: &str) -> Option<DateTime<Utc>> {
    let wrapped = format!("Date: {input}\n\n");
    let parsed = mail_parser::MessageParser::default().parse(wrapped.as_bytes())?;
    let rfc3339 = parsed.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&rfc3339)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn strip_day_of_week(s: &str) -> &str {
    const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    for day in DAYS {
        if let Some(rest) = s.strip_prefix(day) {
            return rest.trim_start_matches(',').trim_start();
        }
    }
    s
}

/// Replace a trailing zone abbreviation with its numeric offset.
fn replace_named_tz(s: &str) -> String {
    const ZONES: [(&str, &str); 13] = [
        ("CEST", "+0200"),
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("CET", "+0100"),
        ("JST", "+0900"),
    ];
    let s = s.trim_end();
    for (name, offset) in ZONES {
        if let Some(head) = s.strip_suffix(name) {
            return format!("{head}{offset}");
        }
    }
    s.to_string()
}
