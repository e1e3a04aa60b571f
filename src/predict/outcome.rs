//! Per-request prediction results

use crate::error::PredictError;

/// Display-ready word with the model probability it came from
#[derive(Clone, Debug, PartialEq)]
pub struct WordPrediction {
    pub word: String,
    /// `0.0` marks a static suggestion with no model confidence
    pub probability: f32,
}

impl WordPrediction {
    pub fn new(word: impl Into<String>, probability: f32) -> Self {
        WordPrediction {
            word: word.into(),
            probability,
        }
    }

    /// Static suggestion (starter word) rather than a model prediction
    pub fn is_static(&self) -> bool {
        self.probability == 0.0
    }

    /// Probability as a percentage for display
    pub fn percent(&self) -> f32 {
        self.probability * 100.0
    }
}

/// What happened for one request.
///
/// Callers that only need words use [`PredictionOutcome::into_predictions`];
/// the variants let them tell "the model had nothing useful" apart from
/// "the model is broken".
#[derive(Debug)]
pub enum PredictionOutcome {
    /// Empty sentence: fixed starter words, model not consulted
    Starters(Vec<WordPrediction>),
    /// Model ran and at least one word survived filtering
    Predicted(Vec<WordPrediction>),
    /// Model ran but every candidate was filtered out
    NoPredictions,
    /// No score source was loaded
    Unavailable,
    /// The pipeline failed for this request
    Failed(PredictError),
}

impl PredictionOutcome {
    /// Words to show; empty for every non-success variant
    pub fn into_predictions(self) -> Vec<WordPrediction> {
        match self {
            PredictionOutcome::Starters(words) | PredictionOutcome::Predicted(words) => words,
            PredictionOutcome::NoPredictions
            | PredictionOutcome::Unavailable
            | PredictionOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PredictionOutcome::Unavailable | PredictionOutcome::Failed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_projection() {
        let words = vec![WordPrediction::new("Go", 0.5)];
        assert_eq!(
            PredictionOutcome::Predicted(words.clone()).into_predictions(),
            words
        );
        assert!(PredictionOutcome::NoPredictions.into_predictions().is_empty());
        assert!(!PredictionOutcome::NoPredictions.is_failure());
        assert!(PredictionOutcome::Unavailable.is_failure());
    }

    #[test]
    fn test_static_marker() {
        assert!(WordPrediction::new("I", 0.0).is_static());
        assert!(!WordPrediction::new("Go", 0.25).is_static());
        assert_eq!(WordPrediction::new("Go", 0.25).percent(), 25.0);
    }
}
