use crate::config::RunConfiguration;
use crate::error::{LqtError, Result};
use crate::index::types::{DocId, StoredDocument};
use crate::output::NULL_VALUE;
use std::collections::HashMap;

/// Pseudo-field carrying the document ordinal
pub const ID_FIELD: &str = "<id>";
/// Pseudo-field carrying the hit score
pub const SCORE_FIELD: &str = "<score>";

/// Ordered (name, value) pairs of one output document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectedRow {
    entries: Vec<(String, String)>,
}

impl ProjectedRow {
    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs.into_iter().map(|(n, v)| (n.into(), v.into())).collect(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct names in first-seen order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in &self.entries {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    pub fn values_by_name(&self) -> HashMap<&str, Vec<&str>> {
        let mut values: HashMap<&str, Vec<&str>> = HashMap::new();
        for (name, value) in &self.entries {
            values.entry(name.as_str()).or_default().push(value.as_str());
        }
        values
    }
}

/// Turns stored documents into output rows for one run
#[derive(Debug, Clone)]
pub struct Projection {
    /// Requested fields, already in output order; empty means every stored field
    selection: Vec<String>,
    show_id: bool,
    show_score: bool,
    sort_fields: bool,
    tabular: bool,
}

impl Projection {
    pub fn new(config: &RunConfiguration) -> Self {
        Self {
            selection: config.selection(),
            show_id: config.show_id(),
            show_score: config.show_score(),
            sort_fields: config.sort_fields(),
            tabular: config.format().is_tabular(),
        }
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Build the row for `doc`: `<id>`, `<score>`, then field values.
    ///
    /// A selected field without values yields a single `null`; a selected field with
    /// several values yields one pair each, which tabular output refuses.
    pub fn project(&self, doc: &StoredDocument, id: DocId, score: f32) -> Result<ProjectedRow> {
        let mut row = ProjectedRow::default();
        if self.show_id {
            row.push(ID_FIELD, id.to_string());
        }
        if self.show_score {
            row.push(SCORE_FIELD, format!("{:?}", f64::from(score)));
        }

        if self.selection.is_empty() {
            let mut fields: Vec<(&str, &str)> = doc
                .fields
                .iter()
                .map(|f| (f.name.as_str(), f.value.as_str()))
                .collect();
            if self.sort_fields {
                fields.sort();
            }
            for (name, value) in fields {
                row.push(name, value);
            }
            return Ok(row);
        }

        for name in &self.selection {
            let values = doc.values(name);
            match values.len() {
                0 => row.push(name.as_str(), NULL_VALUE),
                1 => row.push(name.as_str(), values[0]),
                _ if self.tabular => return Err(LqtError::MultivaluedTabular(name.clone())),
                _ => {
                    for value in values {
                        row.push(name.as_str(), value);
                    }
                }
            }
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldCatalog;
    use crate::index::types::StoredField;
    use crate::output::OutputFormat;

    fn doc3() -> StoredDocument {
        StoredDocument {
            fields: [("bbb", "foo"), ("bbb", "bar"), ("aaa", "foo"), ("zzz", "foo")]
                .iter()
                .map(|(n, v)| StoredField {
                    name: n.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    fn catalog() -> FieldCatalog {
        FieldCatalog::from_names(["aaa", "bbb", "zzz", "context"])
    }

    #[test]
    fn test_all_fields_natural_order() {
        let projection = Projection::new(&RunConfiguration::default());
        let row = projection.project(&doc3(), 3, 1.0).unwrap();
        assert_eq!(row.names(), vec!["bbb", "aaa", "zzz"]);
        assert_eq!(row.len(), 4);
    }

    #[test]
    fn test_sort_fields_orders_by_name_then_value() {
        let mut config = RunConfiguration::default();
        config.set_sort_fields(true);
        let row = Projection::new(&config).project(&doc3(), 3, 1.0).unwrap();
        let pairs: Vec<(&str, &str)> = row
            .entries()
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("aaa", "foo"), ("bbb", "bar"), ("bbb", "foo"), ("zzz", "foo")]
        );
    }

    #[test]
    fn test_id_and_score_come_first() {
        let mut config = RunConfiguration::default();
        config.set_show_id(true);
        config.set_show_score(true);
        config.set_field_names(&catalog(), vec!["aaa".into()]).unwrap();
        let row = Projection::new(&config).project(&doc3(), 3, 1.0).unwrap();
        assert_eq!(row.names(), vec![ID_FIELD, SCORE_FIELD, "aaa"]);
        assert_eq!(row.entries()[0].1, "3");
        assert_eq!(row.entries()[1].1, "1.0");
    }

    #[test]
    fn test_score_rendered_as_double() {
        let mut config = RunConfiguration::default();
        config.set_show_score(true);
        config.set_field_names(&catalog(), vec!["aaa".into()]).unwrap();
        let projection = Projection::new(&config);
        let row = projection.project(&doc3(), 3, 0.1).unwrap();
        assert_eq!(row.entries()[0].1, "0.10000000149011612");
        let row = projection.project(&doc3(), 3, 2.5).unwrap();
        assert_eq!(row.entries()[0].1, "2.5");
    }

    #[test]
    fn test_missing_selected_field_is_null() {
        let mut config = RunConfiguration::default();
        config.set_field_names(&catalog(), vec!["context".into()]).unwrap();
        let row = Projection::new(&config).project(&doc3(), 3, 1.0).unwrap();
        assert_eq!(row.entries(), &[("context".to_string(), "null".to_string())]);
    }

    #[test]
    fn test_multivalued_selection() {
        let mut config = RunConfiguration::default();
        config.set_field_names(&catalog(), vec!["bbb".into()]).unwrap();
        let row = Projection::new(&config).project(&doc3(), 3, 1.0).unwrap();
        assert_eq!(row.values_by_name()["bbb"], vec!["foo", "bar"]);

        config.set_format(OutputFormat::Tabular);
        let err = Projection::new(&config).project(&doc3(), 3, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "Multivalued field 'bbb' not allowed with tabular format");
    }

    #[test]
    fn test_empty_document_projects_to_empty_row() {
        let projection = Projection::new(&RunConfiguration::default());
        assert!(projection.project(&StoredDocument::default(), 0, 1.0).unwrap().is_empty());
    }
}
