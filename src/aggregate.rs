use crate::catalog::FieldCatalog;
use crate::error::{LqtError, Result};
use crate::index::IndexReader;
use std::collections::BTreeMap;

/// Documents with at least one indexed value, per field in catalog order.
///
/// A field without a term dictionary in any segment counts 0.
pub fn count_fields(reader: &IndexReader, catalog: &FieldCatalog) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for field in catalog.names() {
        let count: u64 = reader
            .leaves()
            .iter()
            .filter_map(|leaf| leaf.field_doc_count(field))
            .map(u64::from)
            .sum();
        counts.insert(field.to_string(), count);
    }
    counts
}

/// Every term of `field` with its document frequency summed across segments
pub fn enumerate_terms(
    reader: &IndexReader,
    catalog: &FieldCatalog,
    field: &str,
) -> Result<BTreeMap<String, u64>> {
    catalog.validate([field])?;

    let mut terms: BTreeMap<String, u64> = BTreeMap::new();
    let mut indexed = false;
    for leaf in reader.leaves() {
        let Some(iter) = leaf.terms(field) else {
            continue;
        };
        indexed = true;
        for (term, doc_freq) in iter {
            *terms.entry(term.to_string()).or_insert(0) += u64::from(doc_freq);
        }
    }

    if !indexed {
        return Err(LqtError::UnindexedField(field.to_string()));
    }
    tracing::debug!(field, terms = terms.len(), "enumerated terms");
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::{FieldType, InputField};
    use crate::index::IndexWriter;
    use tempfile::TempDir;

    /// Two segments so per-segment statistics have to be merged
    fn fixture() -> (TempDir, IndexReader) {
        let dir = TempDir::new().unwrap();
        let mut writer = IndexWriter::create(dir.path()).unwrap();
        writer.add_document(vec![
            InputField::new("context", "Texas Laura Bush", FieldType::TEXT_NOT_STORED),
            InputField::new("zzz", "foo", FieldType::STORED_ONLY),
        ]);
        writer.commit().unwrap();
        writer.add_document(vec![InputField::new(
            "context",
            "Barbara Bush Texas",
            FieldType::TEXT_NOT_STORED,
        )]);
        writer.add_document(vec![InputField::new("aaa", "foo", FieldType::STRING_STORED)]);
        writer.close().unwrap();
        let reader = IndexReader::open(dir.path()).unwrap();
        (dir, reader)
    }

    #[test]
    fn test_count_fields_sums_segments() {
        let (_dir, reader) = fixture();
        let catalog = FieldCatalog::from_reader(&reader);
        let counts = count_fields(&reader, &catalog);
        assert_eq!(counts["context"], 2);
        assert_eq!(counts["aaa"], 1);
        assert_eq!(counts["zzz"], 0);
        assert_eq!(counts.keys().collect::<Vec<_>>(), vec!["aaa", "context", "zzz"]);
    }

    #[test]
    fn test_enumerate_terms_merges_frequencies() {
        let (_dir, reader) = fixture();
        let catalog = FieldCatalog::from_reader(&reader);
        let terms = enumerate_terms(&reader, &catalog, "context").unwrap();
        let listed: Vec<(&str, u64)> = terms.iter().map(|(t, f)| (t.as_str(), *f)).collect();
        assert_eq!(
            listed,
            vec![("barbara", 1), ("bush", 2), ("laura", 1), ("texas", 2)]
        );
    }

    #[test]
    fn test_enumerate_terms_errors() {
        let (_dir, reader) = fixture();
        let catalog = FieldCatalog::from_reader(&reader);
        assert!(matches!(
            enumerate_terms(&reader, &catalog, "zzz"),
            Err(LqtError::UnindexedField(f)) if f == "zzz"
        ));
        assert!(matches!(
            enumerate_terms(&reader, &catalog, "nope"),
            Err(LqtError::InvalidFieldNames(_))
        ));
    }
}
