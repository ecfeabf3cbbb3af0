//! # lqt - query tool for read-only search indexes
//!
//! lqt opens one or more segmented indexes, runs a query or one of a small set
//! of `%` directives against them, and prints the resulting documents in a
//! chosen format.
//!
//! ## Architecture
//!
//! - [`index`] - On-disk segments, the reader, and a writer for fixtures
//! - [`query`] - Query-string parsing, multi-term rewriting and ranked search
//! - [`catalog`] - Field-name validation against the opened index
//! - [`config`] - Validated per-run settings
//! - [`dispatch`] - Directive parsing and execution
//! - [`projection`] / [`output`] - Document rows and their formatters
//! - [`aggregate`] - Field and term statistics merged across segments
//! - [`script`] - Batch files of queries with per-line output redirection
//!
//! ## Quick Start
//!
//! ```ignore
//! use lqt::catalog::FieldCatalog;
//! use lqt::config::RunConfiguration;
//! use lqt::dispatch::QueryTool;
//! use lqt::index::IndexReader;
//! use std::path::Path;
//!
//! let reader = IndexReader::open(Path::new("/path/to/index"))?;
//! let catalog = FieldCatalog::from_reader(&reader);
//! let mut config = RunConfiguration::default();
//! config.set_field_names(&catalog, vec!["title".into()])?;
//!
//! let tool = QueryTool::new(&reader, &catalog, &config);
//! tool.run(&["title:rust".to_string()], &mut std::io::stdout())?;
//! ```

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod index;
pub mod output;
pub mod projection;
pub mod query;
pub mod script;
pub mod settings;
pub mod utils;

pub use error::{ErrorKind, LqtError, Result};
