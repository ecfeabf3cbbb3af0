use serde::{Deserialize, Serialize};

/// Document ordinal across the whole (possibly multi-index) reader
pub type DocId = u32;

/// Document ordinal within one segment
pub type LocalDocId = u32;

/// Segment identifier
pub type SegmentId = u16;

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

/// How a field is indexed and stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    /// Terms go into the term dictionary
    pub indexed: bool,
    /// Value is run through the standard analyzer before indexing
    pub tokenized: bool,
    /// Value is retrievable verbatim
    pub stored: bool,
}

impl FieldType {
    /// Indexed as a single untouched term, stored
    pub const STRING_STORED: FieldType = FieldType {
        indexed: true,
        tokenized: false,
        stored: true,
    };

    /// Indexed as analyzed text, stored
    pub const TEXT_STORED: FieldType = FieldType {
        indexed: true,
        tokenized: true,
        stored: true,
    };

    /// Indexed as analyzed text, not retrievable
    pub const TEXT_NOT_STORED: FieldType = FieldType {
        indexed: true,
        tokenized: true,
        stored: false,
    };

    /// Retrievable but not searchable
    pub const STORED_ONLY: FieldType = FieldType {
        indexed: false,
        tokenized: false,
        stored: true,
    };
}

/// Field metadata recorded in meta.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub field_type: FieldType,
}

/// Per-segment entry in meta.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub id: SegmentId,
    pub doc_count: u32,
}

/// Index metadata stored in meta.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    /// Every field ever added, including unindexed ones
    pub fields: Vec<FieldInfo>,
    pub segments: Vec<SegmentMeta>,
    pub created_at: u64,
}

impl Default for IndexMeta {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            fields: Vec::new(),
            segments: Vec::new(),
            created_at: 0,
        }
    }
}

/// Posting entry - one document containing a term, with token positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub doc: LocalDocId,
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn freq(&self) -> u32 {
        self.positions.len() as u32
    }
}

/// A single stored (name, value) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredField {
    pub name: String,
    pub value: String,
}

/// Stored fields of one document, in the order they were added
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredDocument {
    pub fields: Vec<StoredField>,
}

impl StoredDocument {
    /// First value of a field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Every value of a field, in stored order
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.name == name)
            .map(|f| f.value.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A field to be written by the fixture writer
#[derive(Debug, Clone)]
pub struct InputField {
    pub name: String,
    pub value: String,
    pub field_type: FieldType,
}

impl InputField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            field_type,
        }
    }
}

/// One (docId, score) hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreDoc {
    pub doc: DocId,
    pub score: f32,
}

/// Ranked hits plus the number of documents that matched
#[derive(Debug, Clone, Default)]
pub struct TopDocs {
    pub total_hits: usize,
    pub score_docs: Vec<ScoreDoc>,
}
