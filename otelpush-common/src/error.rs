use thiserror::Error;

/// Common error type for otelpush components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    MalformedLine(#[from] MalformedLine),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A metric line that could not be parsed.
///
/// `column` is the 0-based index, in Unicode scalar values, of the character
/// that was rejected. It equals the line length when the line ended early, and
/// the start of the value for number errors.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("malformed metric line at column {column}: {kind} (line: {line:?})")]
pub struct MalformedLine {
    pub line: String,
    pub column: usize,
    pub kind: LineErrorKind,
}

impl MalformedLine {
    pub(crate) fn new(line: &str, column: usize, kind: LineErrorKind) -> Self {
        Self {
            line: line.to_string(),
            column,
            kind,
        }
    }
}

/// Reason a metric line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineErrorKind {
    #[error("metric name is empty")]
    EmptyName,

    #[error("line ended before '{{' or ' ' terminated the metric name")]
    UnterminatedName,

    #[error("line ended inside the label block")]
    UnterminatedLabels,

    #[error("label cannot start with '{0}'")]
    UnexpectedLabelStart(char),

    #[error("line ended before '=' terminated the label key")]
    UnterminatedLabelKey,

    #[error("expected '\"' but found '{0}'")]
    ExpectedQuote(char),

    #[error("line ended inside a label value")]
    UnterminatedLabelValue,

    #[error("expected ' ' but found '{0}'")]
    ExpectedSpace(char),

    #[error("missing metric value")]
    MissingValue,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("non-finite number '{0}'")]
    NonFiniteNumber(String),
}

/// Result type alias using otelpush's Error.
pub type Result<T> = std::result::Result<T, Error>;
