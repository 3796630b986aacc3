//! Core data model: raw input messages, addresses, attachments, and the
//! indexable document.

pub mod address;
pub mod attachment;
pub mod document;
pub mod message;
