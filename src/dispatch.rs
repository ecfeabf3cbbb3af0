//! Directive parsing and dispatch.
//!
//! The query argument is either a free query string or one of the `%`
//! directives. Each run starts a fresh printed-documents counter, so the
//! output limit applies per run (and per script line).

use crate::aggregate::{count_fields, enumerate_terms};
use crate::catalog::FieldCatalog;
use crate::config::RunConfiguration;
use crate::error::{LqtError, Result};
use crate::index::types::DocId;
use crate::index::IndexReader;
use crate::output::DocumentPrinter;
use crate::projection::Projection;
use crate::query::{parse_query, Query, QueryExecutor};
use crate::script;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// What a single invocation asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    FreeQuery(String),
    All,
    ByIds(Vec<u64>),
    ByIdFile(PathBuf),
    EnumerateFields,
    CountFields,
    EnumerateTerms(String),
    Script(PathBuf),
}

impl Directive {
    /// Parse the tokens given to `-q`
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((first, rest)) = args.split_first() else {
            return Err(LqtError::Directive("a query or directive is required".to_string()));
        };

        if !first.starts_with('%') {
            return Ok(Directive::FreeQuery(args.join(" ")));
        }

        let directive = first.as_str();
        match directive {
            "%all" => no_args(directive, rest).map(|_| Directive::All),
            "%enumerate-fields" => no_args(directive, rest).map(|_| Directive::EnumerateFields),
            "%count-fields" => no_args(directive, rest).map(|_| Directive::CountFields),
            "%enumerate-terms" => one_arg(directive, rest, "field").map(Directive::EnumerateTerms),
            "%script" => one_arg(directive, rest, "file").map(|p| Directive::Script(p.into())),
            "%id-file" => one_arg(directive, rest, "file").map(|p| Directive::ByIdFile(p.into())),
            "%ids" => {
                if rest.is_empty() {
                    return Err(LqtError::Directive("%ids requires at least one id".to_string()));
                }
                let ids = parse_ids(rest.iter().map(String::as_str))?;
                Ok(Directive::ByIds(ids))
            }
            other => Err(LqtError::Directive(format!("Unknown directive: {}", other))),
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Directive::FreeQuery(_) => "query",
            Directive::All => "all",
            Directive::ByIds(_) => "ids",
            Directive::ByIdFile(_) => "id-file",
            Directive::EnumerateFields => "enumerate-fields",
            Directive::CountFields => "count-fields",
            Directive::EnumerateTerms(_) => "enumerate-terms",
            Directive::Script(_) => "script",
        }
    }
}

fn no_args(directive: &str, rest: &[String]) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(LqtError::Directive(format!("{} takes no arguments", directive)))
    }
}

fn one_arg(directive: &str, rest: &[String], what: &str) -> Result<String> {
    match rest {
        [arg] => Ok(arg.clone()),
        _ => Err(LqtError::Directive(format!("{} requires exactly one {}", directive, what))),
    }
}

/// Whitespace-separated non-negative integers
fn parse_ids<'a>(chunks: impl Iterator<Item = &'a str>) -> Result<Vec<u64>> {
    chunks
        .flat_map(str::split_whitespace)
        .map(|s| s.parse::<u64>().map_err(|_| LqtError::MalformedId(s.to_string())))
        .collect()
}

/// Runs directives against one reader with a fixed configuration
pub struct QueryTool<'a> {
    reader: &'a IndexReader,
    catalog: &'a FieldCatalog,
    config: &'a RunConfiguration,
}

impl<'a> QueryTool<'a> {
    pub fn new(reader: &'a IndexReader, catalog: &'a FieldCatalog, config: &'a RunConfiguration) -> Self {
        Self {
            reader,
            catalog,
            config,
        }
    }

    /// Parse and run the `-q` tokens, writing results to `out`
    pub fn run(&self, args: &[String], out: &mut dyn Write) -> Result<()> {
        self.config.check()?;
        let directive = Directive::parse(args)?;
        self.dispatch(&directive, out)
    }

    pub fn dispatch(&self, directive: &Directive, out: &mut dyn Write) -> Result<()> {
        let _span = tracing::info_span!("dispatch", directive = directive.name()).entered();

        match directive {
            Directive::FreeQuery(text) => {
                self.run_query(Some(text.as_str()), out)?;
            }
            Directive::All => {
                self.run_query(None, out)?;
            }
            Directive::ByIds(ids) => {
                self.dump_ids(ids, out)?;
            }
            Directive::ByIdFile(path) => {
                let content = fs::read_to_string(path).map_err(|e| LqtError::file(path, e))?;
                let ids = parse_ids(content.lines())?;
                self.dump_ids(&ids, out)?;
            }
            Directive::EnumerateFields => {
                for name in self.catalog.names() {
                    writeln!(out, "{}", name)?;
                }
            }
            Directive::CountFields => {
                for (field, count) in count_fields(self.reader, self.catalog) {
                    writeln!(out, "{}: {}", field, count)?;
                }
            }
            Directive::EnumerateTerms(field) => {
                for (term, freq) in enumerate_terms(self.reader, self.catalog, field)? {
                    writeln!(out, "{} ({})", term, freq)?;
                }
            }
            Directive::Script(path) => script::run_script(self, path, out)?,
        }

        out.flush()?;
        Ok(())
    }

    /// Search and print hits; `None` matches every document.
    ///
    /// Returns the number of documents printed.
    pub fn run_query(&self, text: Option<&str>, out: &mut dyn Write) -> Result<usize> {
        let query = match text {
            None => Query::MatchAll,
            Some(text) => self.prepare_query(text)?,
        };

        let top = QueryExecutor::new(self.reader).search(&query, self.config.query_limit())?;
        if self.config.show_hits() {
            writeln!(out, "totalHits: {}", top.total_hits)?;
            writeln!(out)?;
        }

        let projection = Projection::new(self.config);
        let subset = self.field_subset(&projection);
        let mut printer = DocumentPrinter::new(self.config.format(), self.config.suppress_names());

        for hit in &top.score_docs {
            if printer.docs_printed() >= self.config.output_limit() {
                break;
            }
            let doc = self.reader.document(hit.doc, subset.as_ref())?;
            if let Some(filter) = self.config.regex() {
                if !filter.matches(&doc) {
                    continue;
                }
            }
            let row = projection.project(&doc, hit.doc, hit.score)?;
            printer.print(&row, out)?;
        }

        tracing::debug!(
            total_hits = top.total_hits,
            printed = printer.docs_printed(),
            "query finished"
        );
        Ok(printer.docs_printed())
    }

    /// Parse, expand and validate a query string
    fn prepare_query(&self, text: &str) -> Result<Query> {
        if !text.contains(':') && self.config.default_field().is_none() {
            return Err(LqtError::AmbiguousQuery);
        }

        let parsed = parse_query(text, self.config.default_field(), self.config.analyzer())?;
        let query = QueryExecutor::new(self.reader).rewrite(parsed)?;
        self.catalog.validate(query.fields())?;
        tracing::debug!(?query, "prepared query");
        Ok(query)
    }

    /// Documents by ordinal, score fixed at 1.0, no regex filter
    fn dump_ids(&self, ids: &[u64], out: &mut dyn Write) -> Result<usize> {
        let projection = Projection::new(self.config);
        let subset = self.field_subset(&projection);
        let mut printer = DocumentPrinter::new(self.config.format(), self.config.suppress_names());

        for &id in ids {
            if printer.docs_printed() >= self.config.output_limit() {
                break;
            }
            let doc_id = DocId::try_from(id).map_err(|_| LqtError::NoSuchDocument {
                id,
                max_doc: self.reader.max_doc(),
            })?;
            let doc = self.reader.document(doc_id, subset.as_ref())?;
            let row = projection.project(&doc, doc_id, 1.0)?;
            printer.print(&row, out)?;
        }
        Ok(printer.docs_printed())
    }

    /// Stored fields to load; None loads everything
    fn field_subset(&self, projection: &Projection) -> Option<HashSet<String>> {
        let selection = projection.selection();
        (!selection.is_empty()).then(|| selection.iter().cloned().collect())
    }
}
