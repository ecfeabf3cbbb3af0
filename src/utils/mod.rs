//! Utility functions shared by the index and query layers.
//!
//! - [`encoding`] - varint/delta postings encoding and little-endian helpers
//! - [`tokenizer`] - keyword and standard analyzers

pub mod encoding;
pub mod tokenizer;

pub use encoding::*;
pub use tokenizer::*;
