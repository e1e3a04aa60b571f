//! LLM Module: masked-LM query building, scoring, and word resolution
//!
//! # Components
//! - `vocab.rs`: Word-piece ↔ id table with special tokens
//! - `encoder.rs`: Sentence → fixed-length `[MASK]` query
//! - `model.rs`: `ScoreSource` seam and the Candle-backed scorer
//! - `ranking.rs`: Softmax and top-N candidates at the mask position
//! - `filter.rs`: Token → display word cleanup, validation, dedup

pub mod encoder;
pub mod filter;
pub mod model;
pub mod ranking;
pub mod vocab;

pub use encoder::{EncodedSequence, SequenceEncoder};
pub use filter::WordFilter;
pub use model::{EmbeddingScorer, ScoreMatrix, ScoreSource};
pub use ranking::{CandidateRanker, TokenCandidate};
pub use vocab::Vocab;
