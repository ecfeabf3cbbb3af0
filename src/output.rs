//! Output formatting for projected documents
//!
//! A [`Formatter`] turns one document's ordered names and values into text;
//! [`DocumentPrinter`] owns the per-run state around it (header, separators,
//! the printed-documents counter).

use crate::error::{LqtError, Result};
use crate::projection::ProjectedRow;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Placeholder written for a field without values
pub const NULL_VALUE: &str = "null";

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Multiline,
    Tabular,
    Json,
    JsonPretty,
}

impl OutputFormat {
    pub fn is_tabular(&self) -> bool {
        matches!(self, OutputFormat::Tabular)
    }
}

impl FromStr for OutputFormat {
    type Err = LqtError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "multiline" => Ok(OutputFormat::Multiline),
            "tabular" => Ok(OutputFormat::Tabular),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" => Ok(OutputFormat::JsonPretty),
            other => Err(LqtError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Multiline => "multiline",
            OutputFormat::Tabular => "tabular",
            OutputFormat::Json => "json",
            OutputFormat::JsonPretty => "json-pretty",
        })
    }
}

/// Renders one document.
///
/// `names` fixes the output order. Every name is emitted even when
/// `values` holds none or several entries for it.
pub trait Formatter {
    fn format(&self, names: &[&str], values: &HashMap<&str, Vec<&str>>) -> String;

    /// Line printed once before the first document
    fn header(&self, _names: &[&str]) -> Option<String> {
        None
    }

    /// Whether consecutive documents are separated by a blank line
    fn separate_documents(&self) -> bool {
        true
    }
}

/// `name: value`, one line per value
pub struct MultilineFormatter {
    suppress_names: bool,
}

impl MultilineFormatter {
    pub fn new(suppress_names: bool) -> Self {
        Self { suppress_names }
    }

    fn push_line(&self, out: &mut Vec<String>, name: &str, value: &str) {
        if self.suppress_names {
            out.push(value.to_string());
        } else {
            out.push(format!("{}: {}", name, value));
        }
    }
}

impl Formatter for MultilineFormatter {
    fn format(&self, names: &[&str], values: &HashMap<&str, Vec<&str>>) -> String {
        let mut lines = Vec::new();
        for name in names {
            match values.get(name).map(Vec::as_slice) {
                None | Some([]) => self.push_line(&mut lines, name, NULL_VALUE),
                Some(vals) => {
                    for value in vals {
                        self.push_line(&mut lines, name, value);
                    }
                }
            }
        }
        lines.join("\n")
    }
}

/// Tab-separated rows under a single header row
pub struct TabularFormatter {
    suppress_names: bool,
}

impl TabularFormatter {
    pub fn new(suppress_names: bool) -> Self {
        Self { suppress_names }
    }
}

impl Formatter for TabularFormatter {
    fn format(&self, names: &[&str], values: &HashMap<&str, Vec<&str>>) -> String {
        names
            .iter()
            .map(|name| match values.get(name) {
                Some(vals) if !vals.is_empty() => vals.join("\t"),
                _ => NULL_VALUE.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\t")
    }

    fn header(&self, names: &[&str]) -> Option<String> {
        (!self.suppress_names).then(|| names.join("\t"))
    }

    fn separate_documents(&self) -> bool {
        false
    }
}

/// One JSON object per document; single values are scalars, repeated values arrays
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, names: &[&str], values: &HashMap<&str, Vec<&str>>) -> String {
        let mut object = Map::new();
        for name in names {
            let value = match values.get(name).map(Vec::as_slice) {
                None | Some([]) => Value::String(NULL_VALUE.to_string()),
                Some([single]) => Value::String(single.to_string()),
                Some(many) => Value::Array(many.iter().map(|v| Value::String(v.to_string())).collect()),
            };
            object.insert(name.to_string(), value);
        }

        let object = Value::Object(object);
        if self.pretty {
            serde_json::to_string_pretty(&object).unwrap_or_default()
        } else {
            object.to_string()
        }
    }
}

/// Formatter for `format`; JSON formatters never suppress names
pub fn new_formatter(format: OutputFormat, suppress_names: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Multiline => Box::new(MultilineFormatter::new(suppress_names)),
        OutputFormat::Tabular => Box::new(TabularFormatter::new(suppress_names)),
        OutputFormat::Json => Box::new(JsonFormatter::new(false)),
        OutputFormat::JsonPretty => Box::new(JsonFormatter::new(true)),
    }
}

/// Writes formatted documents and counts them against the output limit
pub struct DocumentPrinter {
    formatter: Box<dyn Formatter>,
    docs_printed: usize,
}

impl DocumentPrinter {
    pub fn new(format: OutputFormat, suppress_names: bool) -> Self {
        Self {
            formatter: new_formatter(format, suppress_names),
            docs_printed: 0,
        }
    }

    pub fn docs_printed(&self) -> usize {
        self.docs_printed
    }

    /// Print one document. Rows without entries are skipped and not counted.
    pub fn print(&mut self, row: &ProjectedRow, out: &mut dyn Write) -> Result<bool> {
        if row.is_empty() {
            return Ok(false);
        }

        let names = row.names();
        let values = row.values_by_name();

        if self.docs_printed == 0 {
            if let Some(header) = self.formatter.header(&names) {
                writeln!(out, "{}", header)?;
            }
        } else if self.formatter.separate_documents() {
            writeln!(out)?;
        }

        writeln!(out, "{}", self.formatter.format(&names, &values))?;
        self.docs_printed += 1;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<'a>(pairs: &[(&'a str, &'a str)]) -> HashMap<&'a str, Vec<&'a str>> {
        let mut map: HashMap<&str, Vec<&str>> = HashMap::new();
        for &(name, value) in pairs {
            map.entry(name).or_default().push(value);
        }
        map
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!("json-pretty".parse::<OutputFormat>().unwrap(), OutputFormat::JsonPretty);
        assert_eq!("tabular".parse::<OutputFormat>().unwrap(), OutputFormat::Tabular);
        let err = "xml".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported format: xml");
    }

    #[test]
    fn test_multiline() {
        let f = MultilineFormatter::new(false);
        let vals = values(&[("bbb", "foo"), ("bbb", "bar"), ("aaa", "x")]);
        assert_eq!(
            f.format(&["aaa", "bbb", "zzz"], &vals),
            "aaa: x\nbbb: foo\nbbb: bar\nzzz: null"
        );
    }

    #[test]
    fn test_multiline_suppress_names() {
        let f = MultilineFormatter::new(true);
        assert_eq!(f.format(&["aaa"], &values(&[("aaa", "x")])), "x");
    }

    #[test]
    fn test_tabular_header_and_row() {
        let f = TabularFormatter::new(false);
        let vals = values(&[("a", "1"), ("b", "2")]);
        assert_eq!(f.header(&["a", "b"]).as_deref(), Some("a\tb"));
        assert_eq!(f.format(&["a", "b", "c"], &vals), "1\t2\tnull");
        assert!(TabularFormatter::new(true).header(&["a"]).is_none());
    }

    #[test]
    fn test_json_shapes() {
        let f = JsonFormatter::new(false);
        let vals = values(&[("one", "x"), ("many", "a"), ("many", "b")]);
        assert_eq!(
            f.format(&["one", "many", "none"], &vals),
            r#"{"one":"x","many":["a","b"],"none":"null"}"#
        );
    }

    #[test]
    fn test_json_pretty_parses_back() {
        let f = JsonFormatter::new(true);
        let text = f.format(&["aaa"], &values(&[("aaa", "foo")]));
        assert!(text.contains('\n'));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["aaa"], "foo");
    }

    #[test]
    fn test_printer_separates_and_counts() {
        let mut printer = DocumentPrinter::new(OutputFormat::Multiline, false);
        let mut out = Vec::new();
        let row = ProjectedRow::from_pairs([("aaa", "foo")]);
        assert!(printer.print(&row, &mut out).unwrap());
        assert!(printer.print(&row, &mut out).unwrap());
        assert!(!printer.print(&ProjectedRow::default(), &mut out).unwrap());
        assert_eq!(printer.docs_printed(), 2);
        assert_eq!(String::from_utf8(out).unwrap(), "aaa: foo\n\naaa: foo\n");
    }

    #[test]
    fn test_printer_tabular_header_once() {
        let mut printer = DocumentPrinter::new(OutputFormat::Tabular, false);
        let mut out = Vec::new();
        printer.print(&ProjectedRow::from_pairs([("a", "1")]), &mut out).unwrap();
        printer.print(&ProjectedRow::from_pairs([("a", "2")]), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a\n1\n2\n");
    }
}
