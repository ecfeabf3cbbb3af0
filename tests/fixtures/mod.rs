//! Shared four-document fixture index.
//!
//! Documents 0-2 carry a stored keyword field and an analyzed, unstored
//! context. Document 3 has a multi-valued field and an unindexed one. The
//! first two documents are committed as their own segment.

#![allow(dead_code)]

use lqt::index::types::{FieldType, InputField};
use lqt::index::IndexWriter;
use std::path::Path;
use tempfile::TempDir;

pub const PEOPLE: [(&str, &str); 3] = [
    ("Bill Clinton", "Hillary Clinton Arkansas"),
    ("George W. Bush", "Texas Laura Bush"),
    ("George H. W. Bush", "Barbara Bush Texas"),
];

pub fn write_fixture(path: &Path) {
    let mut writer = IndexWriter::create(path).unwrap();
    for (i, (mention, context)) in PEOPLE.iter().enumerate() {
        writer.add_document(vec![
            InputField::new("longest-mention", *mention, FieldType::STRING_STORED),
            InputField::new("context", *context, FieldType::TEXT_NOT_STORED),
        ]);
        if i == 1 {
            writer.commit().unwrap();
        }
    }
    writer.add_document(vec![
        InputField::new("bbb", "foo", FieldType::STRING_STORED),
        InputField::new("bbb", "bar", FieldType::STRING_STORED),
        InputField::new("aaa", "foo", FieldType::STRING_STORED),
        InputField::new("zzz", "foo", FieldType::STORED_ONLY),
    ]);
    writer.close().unwrap();
}

pub fn fixture_index() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    dir
}

/// Non-empty output lines
pub fn lines(output: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(output)
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
