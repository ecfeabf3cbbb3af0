//! Run configuration.
//!
//! Every setter that names a field validates it against the [`FieldCatalog`]
//! immediately, so a configuration that was accepted never refers to an
//! unknown field.

use crate::catalog::FieldCatalog;
use crate::error::{LqtError, Result};
use crate::filter::RegexFilter;
use crate::output::OutputFormat;
use crate::utils::Analyzer;

#[derive(Debug, Clone)]
pub struct RunConfiguration {
    /// Requested fields in the order given; empty selects every stored field
    field_names: Vec<String>,
    query_limit: usize,
    output_limit: usize,
    regex: Option<RegexFilter>,
    show_id: bool,
    show_score: bool,
    show_hits: bool,
    sort_fields: bool,
    suppress_names: bool,
    format: OutputFormat,
    analyzer: Analyzer,
    default_field: Option<String>,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            field_names: Vec::new(),
            query_limit: usize::MAX,
            output_limit: usize::MAX,
            regex: None,
            show_id: false,
            show_score: false,
            show_hits: false,
            sort_fields: false,
            suppress_names: false,
            format: OutputFormat::default(),
            analyzer: Analyzer::default(),
            default_field: None,
        }
    }
}

impl RunConfiguration {
    /// Replace the field selection; repeated names are kept once, first occurrence wins
    pub fn set_field_names(&mut self, catalog: &FieldCatalog, names: Vec<String>) -> Result<()> {
        catalog.validate(&names)?;
        let mut unique: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        let names = unique;
        if let Some(regex) = &self.regex {
            if !names.is_empty() && !names.iter().any(|n| n == regex.field()) {
                return Err(LqtError::RegexFieldNotSelected(regex.field().to_string()));
            }
        }
        self.field_names = names;
        Ok(())
    }

    /// Install the post-retrieval filter, replacing any previous one
    pub fn set_regex(&mut self, catalog: &FieldCatalog, filter: RegexFilter) -> Result<()> {
        catalog.validate([filter.field()])?;
        if !self.field_names.is_empty() && !self.field_names.iter().any(|n| n == filter.field()) {
            return Err(LqtError::RegexFieldNotSelected(filter.field().to_string()));
        }
        self.regex = Some(filter);
        Ok(())
    }

    pub fn set_default_field(&mut self, catalog: &FieldCatalog, field: &str) -> Result<()> {
        catalog.validate([field])?;
        self.default_field = Some(field.to_string());
        Ok(())
    }

    pub fn set_analyzer(&mut self, name: &str) -> Result<()> {
        self.analyzer = name.parse()?;
        Ok(())
    }

    /// Maximum number of hits a search collects; must be positive
    pub fn set_query_limit(&mut self, limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(LqtError::InvalidLimit {
                name: "query-limit",
                reason: "must be at least 1".to_string(),
            });
        }
        self.query_limit = limit;
        Ok(())
    }

    /// Maximum number of documents printed per run
    pub fn set_output_limit(&mut self, limit: usize) -> Result<()> {
        self.output_limit = limit;
        Ok(())
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = format;
    }

    /// `--tabular` is shorthand for the tabular format
    pub fn set_tabular(&mut self, tabular: bool) {
        if tabular {
            self.format = OutputFormat::Tabular;
        } else if self.format.is_tabular() {
            self.format = OutputFormat::Multiline;
        }
    }

    pub fn set_show_id(&mut self, show: bool) {
        self.show_id = show;
    }

    pub fn set_show_score(&mut self, show: bool) {
        self.show_score = show;
    }

    pub fn set_show_hits(&mut self, show: bool) {
        self.show_hits = show;
    }

    pub fn set_sort_fields(&mut self, sort: bool) {
        self.sort_fields = sort;
    }

    pub fn set_suppress_names(&mut self, suppress: bool) {
        self.suppress_names = suppress;
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Selection in output order: sorted when sort-fields is on
    pub fn selection(&self) -> Vec<String> {
        let mut names = self.field_names.clone();
        if self.sort_fields {
            names.sort();
        }
        names
    }

    pub fn query_limit(&self) -> usize {
        self.query_limit
    }

    pub fn output_limit(&self) -> usize {
        self.output_limit
    }

    pub fn regex(&self) -> Option<&RegexFilter> {
        self.regex.as_ref()
    }

    pub fn show_id(&self) -> bool {
        self.show_id
    }

    pub fn show_score(&self) -> bool {
        self.show_score
    }

    pub fn show_hits(&self) -> bool {
        self.show_hits
    }

    pub fn sort_fields(&self) -> bool {
        self.sort_fields
    }

    pub fn suppress_names(&self) -> bool {
        self.suppress_names
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn analyzer(&self) -> Analyzer {
        self.analyzer
    }

    pub fn default_field(&self) -> Option<&str> {
        self.default_field.as_deref()
    }

    /// Cross-setting checks made before each run
    pub fn check(&self) -> Result<()> {
        if self.format.is_tabular() && self.field_names.is_empty() {
            return Err(LqtError::TabularWithoutFields);
        }
        Ok(())
    }
}
