use crate::error::{LqtError, Result};
use crate::index::reader::{IndexReader, SegmentReader};
use crate::index::types::{LocalDocId, ScoreDoc, TopDocs};
use crate::query::parser::{Clause, Occur, Query, Term};
use crate::utils::Token;
use globset::GlobBuilder;
use regex::Regex;
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Documents matched within one segment, with their scores
#[derive(Default)]
struct LeafMatches {
    docs: RoaringBitmap,
    scores: FxHashMap<LocalDocId, f32>,
}

impl LeafMatches {
    fn insert(&mut self, doc: LocalDocId, score: f32) {
        self.docs.insert(doc);
        *self.scores.entry(doc).or_insert(0.0) += score;
    }

    fn score(&self, doc: LocalDocId) -> f32 {
        self.scores.get(&doc).copied().unwrap_or(0.0)
    }
}

/// Query executor
pub struct QueryExecutor<'a> {
    reader: &'a IndexReader,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(reader: &'a IndexReader) -> Self {
        Self { reader }
    }

    /// Run a query and keep the `limit` best hits.
    ///
    /// `total_hits` counts every matching document, not only the kept ones.
    pub fn search(&self, query: &Query, limit: usize) -> Result<TopDocs> {
        let _span = tracing::debug_span!("search", limit).entered();
        let query = if query.is_multi_term() {
            self.rewrite(query.clone())?
        } else {
            query.clone()
        };

        let mut hits = Vec::new();
        for leaf in self.reader.leaves() {
            let matches = self.score_leaf(&query, leaf)?;
            hits.extend(matches.docs.iter().map(|local| ScoreDoc {
                doc: leaf.doc_base() + local,
                score: matches.score(local),
            }));
        }

        let total_hits = hits.len();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.doc.cmp(&b.doc))
        });
        hits.truncate(limit);

        tracing::debug!(total_hits, returned = hits.len(), "search complete");
        Ok(TopDocs {
            total_hits,
            score_docs: hits,
        })
    }

    /// Expand prefix, wildcard and regex clauses into the index terms they match
    pub fn rewrite(&self, query: Query) -> Result<Query> {
        Ok(match query {
            Query::Prefix(Term { field, text }) => {
                let terms = self.expand(&field, |term| term.starts_with(text.as_str()));
                Query::TermSet { field, terms }
            }
            Query::Wildcard(Term { field, text }) => {
                let matcher = GlobBuilder::new(&text)
                    .literal_separator(false)
                    .backslash_escape(true)
                    .build()
                    .map_err(|e| LqtError::QueryParse(format!("invalid wildcard '{}': {}", text, e)))?
                    .compile_matcher();
                let terms = self.expand(&field, |term| matcher.is_match(term));
                Query::TermSet { field, terms }
            }
            Query::Regex(Term { field, text }) => {
                let re = Regex::new(&format!("^(?:{})$", text))
                    .map_err(|e| LqtError::QueryParse(format!("invalid regex /{}/: {}", text, e)))?;
                let terms = self.expand(&field, |term| re.is_match(term));
                Query::TermSet { field, terms }
            }
            Query::Boolean(clauses) => Query::Boolean(
                clauses
                    .into_iter()
                    .map(|c| {
                        Ok(Clause {
                            occur: c.occur,
                            query: self.rewrite(c.query)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            Query::Boost { query, boost } => Query::Boost {
                query: Box::new(self.rewrite(*query)?),
                boost,
            },
            other => other,
        })
    }

    /// Distinct terms of `field` across all segments accepted by `accept`
    fn expand<F: Fn(&str) -> bool>(&self, field: &str, accept: F) -> Vec<String> {
        let mut terms = BTreeSet::new();
        for leaf in self.reader.leaves() {
            if let Some(iter) = leaf.terms(field) {
                terms.extend(iter.filter(|&(t, _)| accept(t)).map(|(t, _)| t.to_string()));
            }
        }
        tracing::debug!(field, expanded = terms.len(), "rewrote multi-term query");
        terms.into_iter().collect()
    }

    fn score_leaf(&self, query: &Query, leaf: &SegmentReader) -> Result<LeafMatches> {
        let mut matches = LeafMatches::default();

        match query {
            Query::MatchAll => {
                for doc in 0..leaf.max_doc() {
                    matches.insert(doc, 1.0);
                }
            }
            Query::Term(term) => {
                let idf = self.idf(&term.field, &term.text);
                for posting in leaf.postings(&term.field, &term.text)? {
                    matches.insert(posting.doc, (posting.freq() as f32).sqrt() * idf);
                }
            }
            Query::Phrase { field, tokens } => self.score_phrase(field, tokens, leaf, &mut matches)?,
            Query::TermSet { field, terms } => {
                for term in terms {
                    for posting in leaf.postings(field, term)? {
                        matches.docs.insert(posting.doc);
                        matches.scores.insert(posting.doc, 1.0);
                    }
                }
            }
            Query::Boolean(clauses) => return self.score_boolean(clauses, leaf),
            Query::Boost { query, boost } => {
                let mut inner = self.score_leaf(query, leaf)?;
                for score in inner.scores.values_mut() {
                    *score *= *boost;
                }
                return Ok(inner);
            }
            Query::Prefix(_) | Query::Wildcard(_) | Query::Regex(_) => {
                let rewritten = self.rewrite(query.clone())?;
                return self.score_leaf(&rewritten, leaf);
            }
        }

        Ok(matches)
    }

    fn score_boolean(&self, clauses: &[Clause], leaf: &SegmentReader) -> Result<LeafMatches> {
        let mut required: Option<RoaringBitmap> = None;
        let mut optional = RoaringBitmap::new();
        let mut excluded = RoaringBitmap::new();
        let mut scoring = Vec::new();

        for clause in clauses {
            let sub = self.score_leaf(&clause.query, leaf)?;
            match clause.occur {
                Occur::Must => {
                    required = Some(match required {
                        Some(docs) => docs & &sub.docs,
                        None => sub.docs.clone(),
                    });
                    scoring.push(sub);
                }
                Occur::Should => {
                    optional |= &sub.docs;
                    scoring.push(sub);
                }
                Occur::MustNot => excluded |= &sub.docs,
            }
        }

        // Purely negative queries match nothing
        let mut docs = required.unwrap_or(optional);
        docs -= excluded;

        let mut matches = LeafMatches::default();
        for doc in &docs {
            let score: f32 = scoring
                .iter()
                .filter(|s| s.docs.contains(doc))
                .map(|s| s.score(doc))
                .sum();
            matches.insert(doc, score);
        }
        Ok(matches)
    }

    /// Documents where the tokens occur at their relative positions
    fn score_phrase(
        &self,
        field: &str,
        tokens: &[Token],
        leaf: &SegmentReader,
        matches: &mut LeafMatches,
    ) -> Result<()> {
        let mut lists = Vec::with_capacity(tokens.len());
        for token in tokens {
            let postings = leaf.postings(field, &token.text)?;
            if postings.is_empty() {
                return Ok(());
            }
            lists.push(
                postings
                    .into_iter()
                    .map(|p| (p.doc, p.positions))
                    .collect::<FxHashMap<_, _>>(),
            );
        }

        let idf: f32 = tokens.iter().map(|t| self.idf(field, &t.text)).sum();
        let Some((first, rest)) = lists.split_first() else {
            return Ok(());
        };

        for (&doc, starts) in first {
            let freq = starts
                .iter()
                .filter(|&&start| {
                    rest.iter().zip(&tokens[1..]).all(|(list, token)| {
                        list.get(&doc).is_some_and(|positions| {
                            positions.contains(&(start + token.position - tokens[0].position))
                        })
                    })
                })
                .count();
            if freq > 0 {
                matches.insert(doc, (freq as f32).sqrt() * idf);
            }
        }
        Ok(())
    }

    /// Inverse document frequency over the whole reader
    fn idf(&self, field: &str, term: &str) -> f32 {
        let num_docs = self.reader.max_doc() as f32;
        let doc_freq = self.reader.doc_freq(field, term) as f32;
        1.0 + (num_docs / (doc_freq + 1.0)).ln()
    }
}
