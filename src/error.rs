use std::path::PathBuf;
use thiserror::Error;

/// Broad failure class of an [`LqtError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid settings or a request that contradicts them
    Configuration,
    /// Malformed line in a `%script` file
    ScriptSyntax,
    /// Unreadable input, bad ids, corrupt index files
    DataAccess,
    /// Query string that the parser rejects
    Query,
}

/// Main error type for lqt operations
#[derive(Error, Debug)]
pub enum LqtError {
    #[error("Invalid field names: [{}]", .0.join(", "))]
    InvalidFieldNames(Vec<String>),

    #[error("Invalid analyzer {0}: Only KeywordAnalyzer and StandardAnalyzer currently supported")]
    InvalidAnalyzer(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid {name}: {reason}")]
    InvalidLimit { name: &'static str, reason: String },

    #[error("Invalid regex, should be field:/regex/: {0}")]
    InvalidRegexSyntax(String),

    #[error("Invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Attempted to apply regex to field not in results: {0}")]
    RegexFieldNotSelected(String),

    #[error("query has no ':' and no query-field defined")]
    AmbiguousQuery,

    #[error("--tabular requires --fields to be passed")]
    TabularWithoutFields,

    #[error("Multivalued field '{0}' not allowed with tabular format")]
    MultivaluedTabular(String),

    #[error("Unindexed field: {0}")]
    UnindexedField(String),

    #[error("{0}")]
    Directive(String),

    #[error("{}:{line}: {message}", path.display())]
    Script {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid document id: '{0}'")]
    MalformedId(String),

    #[error("Document id {id} out of range (index holds {max_doc} documents)")]
    NoSuchDocument { id: u64, max_doc: u32 },

    #[error("Query parse error: {0}")]
    QueryParse(String),

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("Invalid configuration file {}: {message}", path.display())]
    ConfigFile { path: PathBuf, message: String },

    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for lqt operations
pub type Result<T> = std::result::Result<T, LqtError>;

impl LqtError {
    /// Wrap an I/O error with the path that produced it
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LqtError::File {
            path: path.into(),
            source,
        }
    }

    pub fn script(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        LqtError::Script {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LqtError::InvalidFieldNames(_)
            | LqtError::InvalidAnalyzer(_)
            | LqtError::UnsupportedFormat(_)
            | LqtError::InvalidLimit { .. }
            | LqtError::InvalidRegexSyntax(_)
            | LqtError::Regex(_)
            | LqtError::RegexFieldNotSelected(_)
            | LqtError::AmbiguousQuery
            | LqtError::TabularWithoutFields
            | LqtError::MultivaluedTabular(_)
            | LqtError::UnindexedField(_)
            | LqtError::Directive(_)
            | LqtError::ConfigFile { .. } => ErrorKind::Configuration,
            LqtError::Script { .. } => ErrorKind::ScriptSyntax,
            LqtError::QueryParse(_) => ErrorKind::Query,
            LqtError::MalformedId(_)
            | LqtError::NoSuchDocument { .. }
            | LqtError::CorruptIndex(_)
            | LqtError::File { .. }
            | LqtError::Io(_) => ErrorKind::DataAccess,
        }
    }
}
