//! Query parsing and execution

pub mod executor;
pub mod parser;

pub use executor::QueryExecutor;
pub use parser::{parse_query, Clause, Occur, Query, Term};
