use thiserror::Error;

/// Error type for the PIR engine.
///
/// Dimension, index and parameter errors are programmer or configuration
/// errors: retrying with the same inputs cannot succeed.
#[derive(Error, Debug)]
pub enum Error {
    /// Two matrices with incompatible shapes were combined.
    #[error("dimension mismatch in {op}: {left:?} vs. {right:?}")]
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    /// An element or row range outside of the matrix was requested.
    #[error("index ({row}, {col}) out of range for {rows}-by-{cols} matrix")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    /// A parameter combination the protocol does not support.
    #[error("unsupported parameter: {0}")]
    UnsupportedParameter(String),
    /// The random source failed or is exhausted.
    #[error("randomness failure: {0}")]
    RandomnessFailure(String),
    /// A malformed configuration record.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn dims(op: &'static str, left: (usize, usize), right: (usize, usize)) -> Self {
        Error::DimensionMismatch { op, left, right }
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedParameter(msg.into())
    }
}

/// Result type for the PIR engine.
pub type Result<T> = std::result::Result<T, Error>;
