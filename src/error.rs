use thiserror::Error;

use crate::data_type::DataType;

/// Every failure the engine reports. All errors are raised synchronously by the call that
/// triggered them; no operation retries or returns partial results.
#[derive(Debug, Error)]
pub enum Error {
    // --- Schema errors ---
    #[error("column {0:?} does not exist")]
    ColumnNotFound(String),
    #[error("column {0:?} already exists")]
    DuplicateColumn(String),
    #[error("column {0:?} appears on both sides of the join, supply distinct suffixes")]
    AmbiguousColumn(String),
    #[error("column {column:?} has {actual} rows while the table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("row has {actual} values while the table has {expected} columns")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("row index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    // --- Type errors ---
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("cannot parse {text:?} as {kind}")]
    Parse { kind: DataType, text: String },

    // --- Compile errors ---
    #[error("query error at position {position} near {token:?}: {message}")]
    Compile {
        message: String,
        token: String,
        position: usize,
    },
    #[error("invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    // --- Configuration errors ---
    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    pub(crate) fn compile(message: impl Into<String>, token: impl Into<String>, position: usize) -> Self {
        Self::Compile {
            message: message.into(),
            token: token.into(),
            position,
        }
    }
}
