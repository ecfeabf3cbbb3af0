use crate::error::{LqtError, Result};
use crate::index::types::StoredDocument;
use regex::Regex;

/// Post-retrieval filter on the first stored value of one field
#[derive(Debug, Clone)]
pub struct RegexFilter {
    field: String,
    pattern: String,
    regex: Regex,
}

impl RegexFilter {
    /// Parse `field:/pattern/`; the field ends at the first `:/`
    pub fn parse(text: &str) -> Result<Self> {
        let (field, pattern) = text
            .split_once(":/")
            .and_then(|(field, rest)| Some((field, rest.strip_suffix('/')?)))
            .ok_or_else(|| LqtError::InvalidRegexSyntax(text.to_string()))?;
        Self::new(field, pattern)
    }

    pub fn new(field: &str, pattern: &str) -> Result<Self> {
        // Whole-value match, not a substring search
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self {
            field: field.to_string(),
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// A document without a value for the field never passes
    pub fn matches(&self, doc: &StoredDocument) -> bool {
        doc.get(&self.field).is_some_and(|value| self.regex.is_match(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::StoredField;

    fn doc(pairs: &[(&str, &str)]) -> StoredDocument {
        StoredDocument {
            fields: pairs
                .iter()
                .map(|(n, v)| StoredField {
                    name: n.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_parse_splits_on_first_colon() {
        let filter = RegexFilter::parse("longest-mention:/Bill.*/").unwrap();
        assert_eq!(filter.field(), "longest-mention");
        assert_eq!(filter.pattern(), "Bill.*");

        let filter = RegexFilter::parse("url:/https?://.*/").unwrap();
        assert_eq!(filter.field(), "url");
        assert_eq!(filter.pattern(), "https?://.*");
    }

    #[test]
    fn test_parse_rejects_bad_syntax() {
        for bad in ["aaa:foo", "aaa/foo/", "aaa:/foo", ""] {
            assert!(matches!(
                RegexFilter::parse(bad),
                Err(LqtError::InvalidRegexSyntax(_))
            ));
        }
        assert!(matches!(RegexFilter::parse("aaa:/(/"), Err(LqtError::Regex(_))));
    }

    #[test]
    fn test_full_match_on_first_value() {
        let filter = RegexFilter::parse("bbb:/fo+/").unwrap();
        assert!(filter.matches(&doc(&[("bbb", "foo"), ("bbb", "bar")])));
        assert!(!filter.matches(&doc(&[("bbb", "bar"), ("bbb", "foo")])));
        assert!(!filter.matches(&doc(&[("bbb", "food")])));
        assert!(!filter.matches(&doc(&[("aaa", "foo")])));
    }
}
