//! Error types for the prediction pipeline
//!
//! Vocabulary errors are startup failures and must stop the process.
//! Everything else is per-request and gets absorbed by the facade.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised anywhere in the prediction pipeline.
#[derive(Debug, Error)]
pub enum PredictError {
    /// Vocabulary file could not be read.
    #[error("failed to read vocabulary {path}: {source}")]
    VocabIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Vocabulary file is not a `{ "token": id }` JSON object.
    #[error("malformed vocabulary {path}: {source}")]
    VocabMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Two tokens share one id, so the table cannot be inverted.
    #[error("vocabulary id {id} is assigned to both {first:?} and {second:?}")]
    DuplicateId {
        id: u32,
        first: String,
        second: String,
    },

    /// One token listed twice with different ids.
    #[error("vocabulary token {token:?} is assigned ids {first} and {second}")]
    DuplicateToken {
        token: String,
        first: u32,
        second: u32,
    },

    /// One of `[PAD]`, `[UNK]`, `[CLS]`, `[SEP]`, `[MASK]` is absent.
    #[error("vocabulary is missing special token {0}")]
    MissingSpecialToken(&'static str),

    /// Encoder settings leave no room for content.
    #[error("max_seq_len {max_seq_len} is too small, need at least {required}")]
    SequenceTooShort { max_seq_len: usize, required: usize },

    /// Tensor operation failed inside a score source.
    #[error("score source failed: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Score source returned a tensor of the wrong shape.
    #[error("score matrix has shape {actual:?}, expected [1, {seq_len}, vocab]")]
    ScoreShape { actual: Vec<usize>, seq_len: usize },

    /// Encoded token id is outside the scorer's vocabulary range.
    #[error("token id {id} exceeds scorer vocabulary size {vocab_size}")]
    TokenOutOfRange { id: u32, vocab_size: usize },

    /// Mask position points past the end of the score matrix.
    #[error("mask position {position} is outside a score matrix of {seq_len} positions")]
    MaskOutOfRange { position: usize, seq_len: usize },

    /// Weights file could not be read or written.
    #[error("failed to access weights {path}: {source}")]
    WeightsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Weights file could not be decoded.
    #[error("malformed weights {path}: {reason}")]
    WeightsMalformed { path: PathBuf, reason: String },
}

impl PredictError {
    /// True for errors that must prevent the service from starting.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PredictError::VocabIo { .. }
                | PredictError::VocabMalformed { .. }
                | PredictError::DuplicateId { .. }
                | PredictError::DuplicateToken { .. }
                | PredictError::MissingSpecialToken(_)
                | PredictError::SequenceTooShort { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PredictError>;
