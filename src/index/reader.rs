use crate::error::{LqtError, Result};
use crate::index::types::*;
use crate::index::writer::{
    segment_dir_name, DICT_FILE, META_FILE, POSTINGS_FILE, SEGMENTS_DIR, STORED_FILE,
};
use crate::utils::{decode_postings, read_short_str, read_u32_le, read_u64_le, read_varint};
use memmap2::Mmap;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Term dictionary entry
struct TermEntry {
    term: String,
    offset: u64,
    length: u32,
    doc_freq: u32,
}

/// Term dictionary of one field in one segment, sorted by term
struct FieldTerms {
    /// Documents with at least one term in this field
    doc_count: u32,
    entries: Vec<TermEntry>,
}

impl FieldTerms {
    fn lookup(&self, term: &str) -> Option<&TermEntry> {
        self.entries
            .binary_search_by(|e| e.term.as_str().cmp(term))
            .ok()
            .map(|i| &self.entries[i])
    }
}

/// Reader for a single segment ("leaf")
pub struct SegmentReader {
    id: SegmentId,
    /// Ordinal of this segment's first document in the whole reader
    doc_base: DocId,
    documents: Vec<StoredDocument>,
    dictionary: BTreeMap<String, FieldTerms>,
    /// None when the segment holds no postings at all
    postings: Option<Mmap>,
}

impl SegmentReader {
    fn open(segment_path: &Path, id: SegmentId, doc_base: DocId, field_names: &[String]) -> Result<Self> {
        let documents = read_stored(&segment_path.join(STORED_FILE), field_names)?;
        let dictionary = read_dictionary(&segment_path.join(DICT_FILE))?;

        let postings_path = segment_path.join(POSTINGS_FILE);
        let postings = match File::open(&postings_path) {
            Ok(file) => {
                let len = file.metadata().map_err(|e| LqtError::file(&postings_path, e))?.len();
                if len == 0 {
                    None
                } else {
                    // SAFETY: index files are never modified after the writer closes them
                    Some(unsafe { Mmap::map(&file) }.map_err(|e| LqtError::file(&postings_path, e))?)
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(LqtError::file(&postings_path, e)),
        };

        Ok(Self {
            id,
            doc_base,
            documents,
            dictionary,
            postings,
        })
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn doc_base(&self) -> DocId {
        self.doc_base
    }

    /// Number of documents in this segment
    pub fn max_doc(&self) -> u32 {
        self.documents.len() as u32
    }

    /// Documents with at least one indexed value for `field`; None if unindexed here
    pub fn field_doc_count(&self, field: &str) -> Option<u32> {
        self.dictionary.get(field).map(|t| t.doc_count)
    }

    /// (term, doc_freq) pairs for `field` in lexicographic order
    pub fn terms(&self, field: &str) -> Option<impl Iterator<Item = (&str, u32)> + '_> {
        self.dictionary
            .get(field)
            .map(|t| t.entries.iter().map(|e| (e.term.as_str(), e.doc_freq)))
    }

    pub fn doc_freq(&self, field: &str, term: &str) -> u32 {
        self.dictionary
            .get(field)
            .and_then(|t| t.lookup(term))
            .map(|e| e.doc_freq)
            .unwrap_or(0)
    }

    /// Decode the postings of one term; empty when the term is absent
    pub fn postings(&self, field: &str, term: &str) -> Result<Vec<Posting>> {
        let Some(entry) = self.dictionary.get(field).and_then(|t| t.lookup(term)) else {
            return Ok(Vec::new());
        };

        let data = self.postings.as_deref().unwrap_or(&[]);
        let start = entry.offset as usize;
        let end = start + entry.length as usize;
        if end > data.len() {
            return Err(LqtError::CorruptIndex(format!(
                "postings for {}:{} out of bounds in segment {}",
                field, term, self.id
            )));
        }

        decode_postings(&data[start..end]).ok_or_else(|| {
            LqtError::CorruptIndex(format!(
                "undecodable postings for {}:{} in segment {}",
                field, term, self.id
            ))
        })
    }

    pub fn document(&self, local: LocalDocId) -> Option<&StoredDocument> {
        self.documents.get(local as usize)
    }
}

/// Read-only view over one or more indexes
pub struct IndexReader {
    /// Field names across all opened indexes
    fields: BTreeSet<String>,
    leaves: Vec<SegmentReader>,
    max_doc: u32,
}

impl IndexReader {
    /// Open a single index directory
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_all(&[path.to_path_buf()])
    }

    /// Open several indexes as one; documents are numbered index after index
    pub fn open_all(paths: &[PathBuf]) -> Result<Self> {
        let mut fields = BTreeSet::new();
        let mut leaves = Vec::new();
        let mut doc_base: DocId = 0;

        for path in paths {
            let meta = read_meta(path)?;
            let field_names: Vec<String> = meta.fields.iter().map(|f| f.name.clone()).collect();

            fields.extend(field_names.iter().cloned());

            for segment in &meta.segments {
                let segment_path = path.join(SEGMENTS_DIR).join(segment_dir_name(segment.id));
                let leaf = SegmentReader::open(&segment_path, segment.id, doc_base, &field_names)?;
                if leaf.max_doc() != segment.doc_count {
                    return Err(LqtError::CorruptIndex(format!(
                        "segment {} of {} holds {} documents, meta.json says {}",
                        segment.id,
                        path.display(),
                        leaf.max_doc(),
                        segment.doc_count
                    )));
                }
                doc_base += leaf.max_doc();
                leaves.push(leaf);
            }

            tracing::info!(
                index = %path.display(),
                segments = meta.segments.len(),
                fields = meta.fields.len(),
                "opened index"
            );
        }

        Ok(Self {
            fields,
            leaves,
            max_doc: doc_base,
        })
    }

    /// All field names, including unindexed ones, sorted
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn leaves(&self) -> &[SegmentReader] {
        &self.leaves
    }

    /// Total number of documents
    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    /// Total doc frequency of a term across all segments
    pub fn doc_freq(&self, field: &str, term: &str) -> u32 {
        self.leaves.iter().map(|l| l.doc_freq(field, term)).sum()
    }

    /// Segment holding `doc` and the document's ordinal inside it
    pub fn leaf_for(&self, doc: DocId) -> Option<(&SegmentReader, LocalDocId)> {
        let idx = self.leaves.partition_point(|l| l.doc_base <= doc).checked_sub(1)?;
        let leaf = &self.leaves[idx];
        let local = doc - leaf.doc_base;
        (local < leaf.max_doc()).then_some((leaf, local))
    }

    /// Load a document's stored fields, optionally restricted to a field subset
    pub fn document(&self, doc: DocId, fields: Option<&HashSet<String>>) -> Result<StoredDocument> {
        let (leaf, local) = self.leaf_for(doc).ok_or(LqtError::NoSuchDocument {
            id: u64::from(doc),
            max_doc: self.max_doc,
        })?;
        let stored = leaf.document(local).cloned().unwrap_or_default();

        Ok(match fields {
            Some(subset) => StoredDocument {
                fields: stored
                    .fields
                    .into_iter()
                    .filter(|f| subset.contains(&f.name))
                    .collect(),
            },
            None => stored,
        })
    }
}

fn read_meta(index_path: &Path) -> Result<IndexMeta> {
    let meta_path = index_path.join(META_FILE);
    let file = File::open(&meta_path).map_err(|e| LqtError::file(&meta_path, e))?;
    let meta: IndexMeta = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| LqtError::CorruptIndex(format!("{}: {}", meta_path.display(), e)))?;

    if meta.version != FORMAT_VERSION {
        return Err(LqtError::CorruptIndex(format!(
            "{}: unsupported format version {} (expected {})",
            meta_path.display(),
            meta.version,
            FORMAT_VERSION
        )));
    }
    Ok(meta)
}

/// Read stored documents from stored.bin
fn read_stored(path: &Path, field_names: &[String]) -> Result<Vec<StoredDocument>> {
    let bytes = fs::read(path).map_err(|e| LqtError::file(path, e))?;
    let corrupt = || LqtError::CorruptIndex(format!("truncated stored fields in {}", path.display()));

    let mut header = bytes.get(..4).ok_or_else(corrupt)?;
    let count = read_u32_le(&mut header)? as usize;

    let mut pos = 4;
    // Every document takes at least one byte
    let mut documents = Vec::with_capacity(count.min(bytes.len()));
    for _ in 0..count {
        let field_count = read_varint(&bytes, &mut pos).ok_or_else(corrupt)?;
        let mut fields = Vec::new();

        for _ in 0..field_count {
            let ord = read_varint(&bytes, &mut pos).ok_or_else(corrupt)? as usize;
            let len = read_varint(&bytes, &mut pos).ok_or_else(corrupt)? as usize;
            let end = pos.checked_add(len).ok_or_else(corrupt)?;
            let value = bytes.get(pos..end).ok_or_else(corrupt)?;
            pos = end;

            let name = field_names.get(ord).ok_or_else(|| {
                LqtError::CorruptIndex(format!("unknown field ordinal {} in {}", ord, path.display()))
            })?;
            fields.push(StoredField {
                name: name.clone(),
                value: String::from_utf8(value.to_vec()).map_err(|_| {
                    LqtError::CorruptIndex(format!(
                        "invalid UTF-8 in stored field {} in {}",
                        name,
                        path.display()
                    ))
                })?,
            });
        }

        documents.push(StoredDocument { fields });
    }

    Ok(documents)
}

/// Read the term dictionary; a missing file means no indexed fields
fn read_dictionary(path: &Path) -> Result<BTreeMap<String, FieldTerms>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(LqtError::file(path, e)),
    };
    let mut reader = BufReader::new(file);

    let field_count = read_u32_le(&mut reader)?;
    let mut dictionary = BTreeMap::new();

    for _ in 0..field_count {
        let field = read_short_str(&mut reader)?;
        let doc_count = read_u32_le(&mut reader)?;
        let term_count = read_u32_le(&mut reader)? as usize;

        let mut entries = Vec::new();
        for _ in 0..term_count {
            let term = read_short_str(&mut reader)?;
            let offset = read_u64_le(&mut reader)?;
            let length = read_u32_le(&mut reader)?;
            let doc_freq = read_u32_le(&mut reader)?;
            entries.push(TermEntry {
                term,
                offset,
                length,
                doc_freq,
            });
        }

        // Written from a BTreeMap, so already sorted
        dictionary.insert(field, FieldTerms { doc_count, entries });
    }

    Ok(dictionary)
}
