//! Fixture writer.
//!
//! Produces the on-disk layout read by [`IndexReader`](super::IndexReader). Each
//! [`IndexWriter::commit`] seals the buffered documents into a new segment; nothing
//! is ever updated or merged afterwards.
//!
//! ```text
//! <index>/meta.json
//! <index>/segments/seg_0001/stored.bin
//! <index>/segments/seg_0001/terms.dict
//! <index>/segments/seg_0001/terms.postings
//! ```

use crate::error::{LqtError, Result};
use crate::index::types::*;
use crate::utils::{
    encode_postings, write_short_str, write_u32_le, write_u64_le, write_varint, Analyzer,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) const META_FILE: &str = "meta.json";
pub(crate) const SEGMENTS_DIR: &str = "segments";
pub(crate) const STORED_FILE: &str = "stored.bin";
pub(crate) const DICT_FILE: &str = "terms.dict";
pub(crate) const POSTINGS_FILE: &str = "terms.postings";

pub(crate) fn segment_dir_name(id: SegmentId) -> String {
    format!("seg_{:04}", id)
}

/// Term -> postings for one field of one segment
type FieldPostings = BTreeMap<String, Vec<Posting>>;

/// Index writer for building fixture indexes
pub struct IndexWriter {
    index_path: PathBuf,
    meta: IndexMeta,
    /// field name -> ordinal in `meta.fields`
    field_ordinals: HashMap<String, u32>,
    /// Documents buffered for the next segment
    pending: Vec<Vec<InputField>>,
    next_doc: DocId,
}

impl IndexWriter {
    /// Create an empty index at `index_path`, replacing any previous metadata
    pub fn create(index_path: &Path) -> Result<Self> {
        fs::create_dir_all(index_path.join(SEGMENTS_DIR))
            .map_err(|e| LqtError::file(index_path, e))?;

        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Ok(Self {
            index_path: index_path.to_path_buf(),
            meta: IndexMeta {
                created_at,
                ..Default::default()
            },
            field_ordinals: HashMap::new(),
            pending: Vec::new(),
            next_doc: 0,
        })
    }

    /// Buffer a document; returns the ordinal it will have in the index
    pub fn add_document(&mut self, fields: Vec<InputField>) -> DocId {
        for field in &fields {
            self.register_field(&field.name, field.field_type);
        }
        self.pending.push(fields);

        let doc_id = self.next_doc;
        self.next_doc += 1;
        doc_id
    }

    /// Register field metadata; flags of repeated registrations are merged
    fn register_field(&mut self, name: &str, field_type: FieldType) {
        if let Some(&ord) = self.field_ordinals.get(name) {
            let existing = &mut self.meta.fields[ord as usize].field_type;
            existing.indexed |= field_type.indexed;
            existing.tokenized |= field_type.tokenized;
            existing.stored |= field_type.stored;
            return;
        }

        let ord = self.meta.fields.len() as u32;
        self.meta.fields.push(FieldInfo {
            name: name.to_string(),
            field_type,
        });
        self.field_ordinals.insert(name.to_string(), ord);
    }

    /// Seal buffered documents into a new segment
    pub fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let segment_id = self.meta.segments.len() as SegmentId + 1;
        let segment_path = self
            .index_path
            .join(SEGMENTS_DIR)
            .join(segment_dir_name(segment_id));
        fs::create_dir_all(&segment_path).map_err(|e| LqtError::file(&segment_path, e))?;

        let docs = std::mem::take(&mut self.pending);
        self.write_stored(&segment_path, &docs)?;
        let (postings, doc_counts) = invert(&docs);
        write_terms(&segment_path, &postings, &doc_counts)?;

        tracing::debug!(
            segment = segment_id,
            docs = docs.len(),
            fields = postings.len(),
            "committed segment"
        );

        self.meta.segments.push(SegmentMeta {
            id: segment_id,
            doc_count: docs.len() as u32,
        });
        Ok(())
    }

    /// Commit pending documents and write meta.json
    pub fn close(mut self) -> Result<()> {
        self.commit()?;

        let meta_path = self.index_path.join(META_FILE);
        let file = File::create(&meta_path).map_err(|e| LqtError::file(&meta_path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.meta)
            .map_err(|e| LqtError::CorruptIndex(format!("cannot serialize meta.json: {}", e)))?;
        Ok(())
    }

    /// Write stored field values: doc count, then per doc
    /// `varint(n) { varint(field ordinal) varint(len) bytes }*`
    fn write_stored(&self, segment_path: &Path, docs: &[Vec<InputField>]) -> Result<()> {
        let path = segment_path.join(STORED_FILE);
        let mut file = BufWriter::new(File::create(&path).map_err(|e| LqtError::file(&path, e))?);
        write_u32_le(&mut file, docs.len() as u32)?;

        let mut buf = Vec::new();
        for doc in docs {
            buf.clear();
            let stored: Vec<&InputField> = doc.iter().filter(|f| f.field_type.stored).collect();
            write_varint(stored.len() as u64, &mut buf);
            for field in stored {
                write_varint(u64::from(self.field_ordinals[&field.name]), &mut buf);
                write_varint(field.value.len() as u64, &mut buf);
                buf.extend_from_slice(field.value.as_bytes());
            }
            file.write_all(&buf)?;
        }

        file.flush()?;
        Ok(())
    }
}

/// Build per-field postings and per-field document counts for one segment
fn invert(docs: &[Vec<InputField>]) -> (BTreeMap<String, FieldPostings>, BTreeMap<String, u32>) {
    let mut postings: BTreeMap<String, FieldPostings> = BTreeMap::new();
    let mut doc_counts: BTreeMap<String, u32> = BTreeMap::new();

    for (local, doc) in docs.iter().enumerate() {
        let local = local as LocalDocId;
        // Positions continue across the values of a multi-valued field
        let mut next_position: HashMap<&str, u32> = HashMap::new();
        let mut seen_fields: HashSet<&str> = HashSet::new();

        for field in doc.iter().filter(|f| f.field_type.indexed) {
            let analyzer = if field.field_type.tokenized {
                Analyzer::Standard
            } else {
                Analyzer::Keyword
            };
            let tokens = analyzer.analyze(&field.value);
            let base = next_position.get(field.name.as_str()).copied().unwrap_or(0);

            let mut last = None;
            for token in tokens {
                let position = base + token.position;
                last = Some(position);

                let list = postings
                    .entry(field.name.clone())
                    .or_default()
                    .entry(token.text)
                    .or_default();
                if list.last().is_some_and(|p| p.doc == local) {
                    if let Some(p) = list.last_mut() {
                        p.positions.push(position);
                    }
                } else {
                    list.push(Posting {
                        doc: local,
                        positions: vec![position],
                    });
                }
            }

            if let Some(last) = last {
                next_position.insert(field.name.as_str(), last + 1);
                if seen_fields.insert(field.name.as_str()) {
                    *doc_counts.entry(field.name.clone()).or_insert(0) += 1;
                }
            }
        }
    }

    (postings, doc_counts)
}

/// Write the term dictionary and the postings it points into
fn write_terms(
    segment_path: &Path,
    postings: &BTreeMap<String, FieldPostings>,
    doc_counts: &BTreeMap<String, u32>,
) -> Result<()> {
    let dict_path = segment_path.join(DICT_FILE);
    let postings_path = segment_path.join(POSTINGS_FILE);
    let mut dict = BufWriter::new(File::create(&dict_path).map_err(|e| LqtError::file(&dict_path, e))?);
    let mut data = BufWriter::new(
        File::create(&postings_path).map_err(|e| LqtError::file(&postings_path, e))?,
    );

    write_u32_le(&mut dict, postings.len() as u32)?;

    let mut offset = 0u64;
    let mut buf = Vec::new();
    for (field, terms) in postings {
        write_short_str(&mut dict, field)?;
        write_u32_le(&mut dict, doc_counts.get(field).copied().unwrap_or(0))?;
        write_u32_le(&mut dict, terms.len() as u32)?;

        for (term, list) in terms {
            buf.clear();
            encode_postings(list, &mut buf);
            data.write_all(&buf)?;

            write_short_str(&mut dict, term)?;
            write_u64_le(&mut dict, offset)?;
            write_u32_le(&mut dict, buf.len() as u32)?;
            write_u32_le(&mut dict, list.len() as u32)?;
            offset += buf.len() as u64;
        }
    }

    dict.flush()?;
    data.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invert_counts_docs_once_per_field() {
        let docs = vec![
            vec![
                InputField::new("bbb", "foo", FieldType::STRING_STORED),
                InputField::new("bbb", "bar", FieldType::STRING_STORED),
            ],
            vec![InputField::new("zzz", "foo", FieldType::STORED_ONLY)],
        ];
        let (postings, counts) = invert(&docs);
        assert_eq!(counts.get("bbb"), Some(&1));
        assert!(!counts.contains_key("zzz"));
        assert!(!postings.contains_key("zzz"));
        assert_eq!(postings["bbb"].len(), 2);
    }

    #[test]
    fn test_invert_tokenizes_text_fields() {
        let docs = vec![vec![InputField::new(
            "context",
            "Texas Laura Bush Texas",
            FieldType::TEXT_NOT_STORED,
        )]];
        let (postings, _) = invert(&docs);
        let texas = &postings["context"]["texas"];
        assert_eq!(texas.len(), 1);
        assert_eq!(texas[0].positions, vec![0, 3]);
    }

    #[test]
    fn test_multi_valued_positions_do_not_overlap() {
        let docs = vec![vec![
            InputField::new("body", "red fox", FieldType::TEXT_STORED),
            InputField::new("body", "blue fox", FieldType::TEXT_STORED),
        ]];
        let (postings, _) = invert(&docs);
        assert_eq!(postings["body"]["fox"][0].positions, vec![1, 3]);
    }
}
