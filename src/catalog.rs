use crate::error::{LqtError, Result};
use crate::index::IndexReader;
use std::collections::BTreeSet;

/// Every field name the opened index knows about, unindexed fields included
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: BTreeSet<String>,
}

impl FieldCatalog {
    pub fn from_reader(reader: &IndexReader) -> Self {
        Self::from_names(reader.field_names())
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    /// Field names in lexicographic order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check names against the catalog, reporting every unknown one at once.
    ///
    /// Offending names keep the order they were given in, duplicates dropped.
    pub fn validate<I, S>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut invalid: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref();
            if !self.contains(name) && !invalid.iter().any(|n| n == name) {
                invalid.push(name.to_string());
            }
        }

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(LqtError::InvalidFieldNames(invalid))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FieldCatalog {
        FieldCatalog::from_names(["longest-mention", "context", "aaa", "bbb", "zzz"])
    }

    #[test]
    fn test_names_are_sorted() {
        let binding = catalog();
        let names: Vec<&str> = binding.names().collect();
        assert_eq!(names, vec!["aaa", "bbb", "context", "longest-mention", "zzz"]);
    }

    #[test]
    fn test_validate_accepts_known() {
        assert!(catalog().validate(["aaa", "zzz"]).is_ok());
        assert!(catalog().validate(Vec::<String>::new()).is_ok());
    }

    #[test]
    fn test_validate_reports_all_offenders() {
        let err = catalog().validate(["aaa", "nope", "bad", "nope"]).unwrap_err();
        match err {
            LqtError::InvalidFieldNames(names) => assert_eq!(names, vec!["nope", "bad"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_message() {
        let err = catalog().validate(["x", "y"]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid field names: [x, y]");
    }
}
