//! Query-string parser.
//!
//! Accepts the classic Lucene syntax subset:
//!
//! ```text
//! query    := clause*
//! clause   := [AND | OR | && | ||]? [+ | - | ! | NOT]? (field ':')? value ['^' boost]?
//! value    := '(' query ')' | '"' phrase '"' | '/' regex '/' | term
//! term     := chars with '\' escapes; unescaped '*' / '?' make it a wildcard
//! ```
//!
//! `*:*` matches every document. Adjacent clauses default to OR.

use crate::error::{LqtError, Result};
use crate::utils::{Analyzer, Token};
use std::collections::BTreeSet;

/// A (field, text) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub field: String,
    pub text: String,
}

impl Term {
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            text: text.into(),
        }
    }
}

/// How a clause participates in a boolean query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub occur: Occur,
    pub query: Query,
}

/// Parsed query tree
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Every document, constant score
    MatchAll,
    /// Exact term
    Term(Term),
    /// Tokens at fixed relative positions
    Phrase { field: String, tokens: Vec<Token> },
    /// Terms starting with the text
    Prefix(Term),
    /// Glob over terms (`*` any run, `?` one char)
    Wildcard(Term),
    /// Full-match regex over terms
    Regex(Term),
    /// Expansion of a multi-term query: any of these terms, constant score
    TermSet { field: String, terms: Vec<String> },
    Boolean(Vec<Clause>),
    Boost { query: Box<Query>, boost: f32 },
}

impl Query {
    /// Every field the query refers to
    pub fn fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, out: &mut BTreeSet<String>) {
        match self {
            Query::MatchAll => {}
            Query::Term(t) | Query::Prefix(t) | Query::Wildcard(t) | Query::Regex(t) => {
                out.insert(t.field.clone());
            }
            Query::Phrase { field, .. } | Query::TermSet { field, .. } => {
                out.insert(field.clone());
            }
            Query::Boolean(clauses) => {
                for clause in clauses {
                    clause.query.collect_fields(out);
                }
            }
            Query::Boost { query, .. } => query.collect_fields(out),
        }
    }

    /// Whether any clause still needs expansion against the index
    pub fn is_multi_term(&self) -> bool {
        match self {
            Query::Prefix(_) | Query::Wildcard(_) | Query::Regex(_) => true,
            Query::Boolean(clauses) => clauses.iter().any(|c| c.query.is_multi_term()),
            Query::Boost { query, .. } => query.is_multi_term(),
            _ => false,
        }
    }
}

/// Parse a query string.
///
/// Unqualified terms go to `default_field`; without one they are an error.
pub fn parse_query(input: &str, default_field: Option<&str>, analyzer: Analyzer) -> Result<Query> {
    let mut parser = QueryParser {
        input,
        pos: 0,
        default_field,
        analyzer,
    };
    parser.parse()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conjunction {
    None,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    None,
    Required,
    Prohibited,
}

/// A raw term as written, escapes resolved
struct RawTerm {
    text: String,
    /// Pattern for glob matching, with literal metacharacters escaped
    glob: String,
    has_wildcard: bool,
    /// Only wildcard is a single trailing unescaped '*'
    is_prefix: bool,
}

struct QueryParser<'a> {
    input: &'a str,
    pos: usize,
    default_field: Option<&'a str>,
    analyzer: Analyzer,
}

impl<'a> QueryParser<'a> {
    fn parse(&mut self) -> Result<Query> {
        self.skip_whitespace();
        if self.is_eof() {
            return Err(self.error("empty query"));
        }

        let query = self.parse_clauses(self.default_field.map(str::to_string))?;
        self.skip_whitespace();
        if !self.is_eof() {
            return Err(self.error(&format!("unexpected '{}'", self.remaining())));
        }
        Ok(query)
    }

    /// Parse clauses until end of input or a closing parenthesis
    fn parse_clauses(&mut self, field: Option<String>) -> Result<Query> {
        let mut clauses: Vec<Clause> = Vec::new();
        let mut parsed_any = false;

        loop {
            self.skip_whitespace();
            if self.is_eof() || self.peek_char() == Some(')') {
                break;
            }

            let conj = self.parse_conjunction();
            let modifier = self.parse_modifier();
            let query = self.parse_clause(field.as_deref())?;
            parsed_any = true;
            add_clause(&mut clauses, conj, modifier, query);
        }

        if !parsed_any {
            return Err(self.error("expected a query clause"));
        }

        if clauses.len() == 1 && clauses[0].occur != Occur::MustNot {
            return Ok(clauses.remove(0).query);
        }
        Ok(Query::Boolean(clauses))
    }

    fn parse_conjunction(&mut self) -> Conjunction {
        for (word, conj) in [
            ("AND", Conjunction::And),
            ("&&", Conjunction::And),
            ("OR", Conjunction::Or),
            ("||", Conjunction::Or),
        ] {
            if self.consume_keyword(word) {
                self.skip_whitespace();
                return conj;
            }
        }
        Conjunction::None
    }

    fn parse_modifier(&mut self) -> Modifier {
        if self.consume_char('+') {
            Modifier::Required
        } else if self.consume_char('-') || self.consume_char('!') {
            Modifier::Prohibited
        } else if self.consume_keyword("NOT") {
            self.skip_whitespace();
            Modifier::Prohibited
        } else {
            Modifier::None
        }
    }

    /// One clause: optional `field:` then a value and an optional boost.
    /// Returns None when analysis leaves nothing to search for.
    fn parse_clause(&mut self, field: Option<&str>) -> Result<Option<Query>> {
        let start = self.pos;
        let mut field = field.map(str::to_string);

        if !matches!(self.peek_char(), Some('(' | '"' | '/')) {
            let raw = self.read_term()?;
            if !raw.text.is_empty() && self.consume_char(':') {
                if raw.text == "*" && self.remaining().starts_with('*') {
                    let after = self.pos + 1;
                    let ends = self.input[after..]
                        .chars()
                        .next()
                        .is_none_or(|c| c.is_whitespace() || c == ')' || c == '^');
                    if ends {
                        self.pos = after;
                        return self.parse_boost(Some(Query::MatchAll));
                    }
                }
                field = Some(raw.text);
            } else {
                // Plain term on the inherited field
                self.pos = start;
            }
        }

        let query = match self.peek_char() {
            Some('(') => {
                self.advance();
                let inner = self.parse_clauses(field)?;
                if !self.consume_char(')') {
                    return Err(self.error("missing ')'"));
                }
                Some(inner)
            }
            Some('"') => {
                let field = self.require_field(field, "phrase")?;
                let text = self.read_delimited('"')?;
                self.phrase_query(field, &text)
            }
            Some('/') => {
                let field = self.require_field(field, "regex")?;
                let pattern = self.read_delimited('/')?;
                Some(Query::Regex(Term::new(field, pattern)))
            }
            Some('[' | '{') => return Err(self.error("range queries are not supported")),
            Some(_) => {
                let raw = self.read_term()?;
                if raw.text.is_empty() {
                    return Err(self.error(&format!("unexpected '{}'", self.remaining())));
                }
                let field = self.require_field(field, &raw.text)?;
                self.term_query(field, raw)
            }
            None => return Err(self.error("expected a value")),
        };

        if self.peek_char() == Some('~') {
            return Err(self.error("fuzzy and proximity queries are not supported"));
        }
        self.parse_boost(query)
    }

    fn parse_boost(&mut self, query: Option<Query>) -> Result<Option<Query>> {
        if !self.consume_char('^') {
            return Ok(query);
        }

        let start = self.pos;
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.advance();
        }
        let boost: f32 = self.input[start..self.pos]
            .parse()
            .map_err(|_| self.error("invalid boost"))?;

        Ok(query.map(|q| Query::Boost {
            query: Box::new(q),
            boost,
        }))
    }

    fn require_field(&self, field: Option<String>, what: &str) -> Result<String> {
        field.ok_or_else(|| self.error(&format!("no field for '{}' and no default field", what)))
    }

    fn term_query(&self, field: String, raw: RawTerm) -> Option<Query> {
        // Expanded terms are matched as written, never analyzed
        if raw.is_prefix {
            let mut prefix = raw.text;
            prefix.pop();
            return Some(Query::Prefix(Term::new(field, prefix)));
        }
        if raw.has_wildcard {
            return Some(Query::Wildcard(Term::new(field, raw.glob)));
        }

        let mut terms = self.analyzer.terms(&raw.text);
        match terms.len() {
            0 => None,
            1 => terms.pop().map(|t| Query::Term(Term::new(field, t))),
            _ => Some(Query::Boolean(
                terms
                    .into_iter()
                    .map(|t| Clause {
                        occur: Occur::Should,
                        query: Query::Term(Term::new(field.clone(), t)),
                    })
                    .collect(),
            )),
        }
    }

    fn phrase_query(&self, field: String, text: &str) -> Option<Query> {
        let mut tokens = self.analyzer.analyze(text);
        match tokens.len() {
            0 => None,
            1 => tokens.pop().map(|t| Query::Term(Term::new(field, t.text))),
            _ => {
                let first = tokens[0].position;
                for token in &mut tokens {
                    token.position -= first;
                }
                Some(Query::Phrase { field, tokens })
            }
        }
    }

    /// Read a bare term, resolving backslash escapes
    fn read_term(&mut self) -> Result<RawTerm> {
        let mut text = String::new();
        let mut glob = String::new();
        let mut wildcards = 0usize;
        let mut trailing_star = false;

        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() || matches!(ch, '(' | ')' | ':' | '^' | '[' | ']' | '"' | '{' | '}' | '~' | '/') {
                break;
            }
            self.advance();

            if ch == '\\' {
                let escaped = self
                    .peek_char()
                    .ok_or_else(|| self.error("dangling escape at end of query"))?;
                self.advance();
                text.push(escaped);
                if matches!(escaped, '*' | '?' | '[' | ']' | '{' | '}' | '\\' | ',' | '!') {
                    glob.push('\\');
                }
                glob.push(escaped);
                trailing_star = false;
                continue;
            }

            text.push(ch);
            match ch {
                '*' | '?' => {
                    wildcards += 1;
                    trailing_star = ch == '*';
                    glob.push(ch);
                }
                '[' | ']' | '{' | '}' | ',' | '!' => {
                    glob.push('\\');
                    glob.push(ch);
                    trailing_star = false;
                }
                _ => {
                    glob.push(ch);
                    trailing_star = false;
                }
            }
        }

        Ok(RawTerm {
            is_prefix: wildcards == 1 && trailing_star,
            has_wildcard: wildcards > 0,
            text,
            glob,
        })
    }

    /// Read text up to an unescaped closing `delim`; `\delim` yields the delimiter
    fn read_delimited(&mut self, delim: char) -> Result<String> {
        self.consume_char(delim);
        let mut text = String::new();

        loop {
            match self.peek_char() {
                None => return Err(self.error(&format!("unterminated {}", delim))),
                Some(c) if c == delim => {
                    self.advance();
                    return Ok(text);
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some(c) if c == delim => text.push(c),
                        // Regex escapes pass through untouched
                        Some(c) if delim == '/' => {
                            text.push('\\');
                            text.push(c);
                        }
                        Some(c) => text.push(c),
                        None => return Err(self.error("dangling escape at end of query")),
                    }
                    self.advance();
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Consume `word` if it stands alone (followed by whitespace or a group)
    fn consume_keyword(&mut self, word: &str) -> bool {
        let rest = self.remaining();
        if !rest.starts_with(word) {
            return false;
        }
        let next = rest[word.len()..].chars().next();
        if matches!(next, Some(c) if c.is_whitespace() || c == '(' || c == '"') {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    fn error(&self, message: &str) -> LqtError {
        LqtError::QueryParse(format!("Cannot parse '{}': {}", self.input, message))
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn remaining(&self) -> &str {
        &self.input[self.pos..]
    }
}

/// Attach a clause, applying classic OR-default conjunction rules
fn add_clause(clauses: &mut Vec<Clause>, conj: Conjunction, modifier: Modifier, query: Option<Query>) {
    if conj == Conjunction::And {
        if let Some(last) = clauses.last_mut() {
            if last.occur != Occur::MustNot {
                last.occur = Occur::Must;
            }
        }
    }

    let Some(query) = query else {
        return;
    };

    let occur = match modifier {
        Modifier::Prohibited => Occur::MustNot,
        Modifier::Required => Occur::Must,
        Modifier::None if conj == Conjunction::And => Occur::Must,
        Modifier::None => Occur::Should,
    };
    clauses.push(Clause { occur, query });
}
