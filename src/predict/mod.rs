//! Prediction facade: sentence text in, ranked words out
//!
//! # Components
//! - `outcome.rs`: `WordPrediction` and the per-request `PredictionOutcome`
//! - `service.rs`: `WordPredictor`, which runs encoder → score source →
//!   ranker → word filter

pub mod outcome;
pub mod service;

pub use outcome::{PredictionOutcome, WordPrediction};
pub use service::WordPredictor;
