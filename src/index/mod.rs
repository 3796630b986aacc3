//! Document construction: header collection, the document builder, and
//! concurrent batch building.

pub mod batch;
pub mod builder;
pub mod collector;
