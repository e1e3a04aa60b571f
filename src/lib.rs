//! Next-word suggestions for assistive sentence building
//!
//! Given a partially typed sentence, proposes up to 15 ranked words by
//! querying a masked language model at a `[MASK]` placed after the text.
//!
//! ```text
//! sentence → SequenceEncoder → ScoreSource → CandidateRanker → WordFilter → [WordPrediction]
//! ```

pub mod config;
pub mod error;
pub mod llm;
pub mod predict;

pub use config::PredictorConfig;
pub use error::{PredictError, Result};
pub use llm::{EncodedSequence, ScoreMatrix, ScoreSource, Vocab};
pub use predict::{PredictionOutcome, WordPrediction, WordPredictor};
