use crate::error::{LqtError, Result};
use std::fmt;
use std::str::FromStr;

/// Tokens longer than this are dropped by the standard analyzer
const MAX_TOKEN_LENGTH: usize = 255;

/// English stop words removed by [`Analyzer::Standard`]
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Text analysis applied to tokenized fields and to query terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Analyzer {
    /// Whole input is a single token, unchanged
    #[default]
    Keyword,
    /// Alphanumeric runs, lowercased, stop words removed
    Standard,
}

/// A token and its position within the analyzed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub position: u32,
}

impl Analyzer {
    /// Split text into tokens.
    ///
    /// Stop words still consume a position so phrase matching sees the gap.
    pub fn analyze(&self, text: &str) -> Vec<Token> {
        match self {
            Analyzer::Keyword => vec![Token {
                text: text.to_string(),
                position: 0,
            }],
            Analyzer::Standard => {
                let mut tokens = Vec::new();
                let mut position = 0u32;
                for word in text
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                {
                    let lower = word.to_lowercase();
                    if lower.len() <= MAX_TOKEN_LENGTH && !STOP_WORDS.contains(&lower.as_str()) {
                        tokens.push(Token {
                            text: lower,
                            position,
                        });
                    }
                    position += 1;
                }
                tokens
            }
        }
    }

    /// Token texts only
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.analyze(text).into_iter().map(|t| t.text).collect()
    }
}

impl FromStr for Analyzer {
    type Err = LqtError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "KeywordAnalyzer" | "keyword" => Ok(Analyzer::Keyword),
            "StandardAnalyzer" | "standard" => Ok(Analyzer::Standard),
            other => Err(LqtError::InvalidAnalyzer(other.to_string())),
        }
    }
}

impl fmt::Display for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Analyzer::Keyword => write!(f, "KeywordAnalyzer"),
            Analyzer::Standard => write!(f, "StandardAnalyzer"),
        }
    }
}
