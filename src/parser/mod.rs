//! Email parsing: header block decoding and MIME walking.

pub mod header;
pub mod mime;
