//! Read-only segmented document index.
//!
//! - [`reader`] - opens one or more index directories as a list of segments
//! - [`writer`] - writes fixture indexes in the same layout
//! - [`types`] - shared document, field and posting types

pub mod reader;
pub mod types;
pub mod writer;

pub use reader::{IndexReader, SegmentReader};
pub use types::*;
pub use writer::IndexWriter;
