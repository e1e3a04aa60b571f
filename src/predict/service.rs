//! `WordPredictor`: the per-request pipeline
//!
//! Stateless across requests. The vocabulary and score source are shared
//! read-only; each call builds its own sequence and candidate lists.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::PredictorConfig;
use crate::error::Result;
use crate::llm::encoder::SequenceEncoder;
use crate::llm::filter::WordFilter;
use crate::llm::model::{EmbeddingScorer, ScoreSource};
use crate::llm::ranking::CandidateRanker;
use crate::llm::vocab::Vocab;
use crate::predict::outcome::{PredictionOutcome, WordPrediction};

/// Next-word prediction facade
pub struct WordPredictor {
    vocab: Arc<Vocab>,
    encoder: SequenceEncoder,
    ranker: CandidateRanker,
    filter: WordFilter,
    source: Option<Arc<dyn ScoreSource>>,
    starters: Vec<WordPrediction>,
}

impl WordPredictor {
    /// Build a predictor with default settings
    pub fn new(vocab: Arc<Vocab>, source: Option<Arc<dyn ScoreSource>>) -> Result<Self> {
        Self::with_config(vocab, source, &PredictorConfig::default())
    }

    /// Build a predictor from explicit settings
    pub fn with_config(
        vocab: Arc<Vocab>,
        source: Option<Arc<dyn ScoreSource>>,
        config: &PredictorConfig,
    ) -> Result<Self> {
        let encoder =
            SequenceEncoder::new(&vocab, config.encoder.max_seq_len, config.context_word())?;
        let ranker = CandidateRanker::new(
            config.ranking.probability_threshold,
            config.ranking.candidate_count,
        );
        let filter = WordFilter::new(config.display.max_predictions, config.display.max_word_len);
        let starters = config
            .display
            .starter_words
            .iter()
            .take(config.display.max_predictions)
            .map(|word| WordPrediction::new(word.as_str(), 0.0))
            .collect();

        Ok(WordPredictor {
            vocab,
            encoder,
            ranker,
            filter,
            source,
            starters,
        })
    }

    /// Load vocabulary and scorer from the configured paths.
    ///
    /// A vocabulary failure is returned; a scorer failure is logged once and
    /// leaves the predictor without a score source.
    pub fn from_config(config: &PredictorConfig) -> Result<Self> {
        let vocab = Arc::new(Vocab::load(&config.vocab.path)?);

        let source: Option<Arc<dyn ScoreSource>> = match EmbeddingScorer::load(&config.model.path)
        {
            Ok(scorer) => Some(Arc::new(scorer)),
            Err(error) => {
                warn!(
                    path = %config.model.path.display(),
                    "failed to load scorer, predictions disabled: {error}"
                );
                None
            }
        };

        Self::with_config(vocab, source, config)
    }

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    /// Whether a score source is loaded
    pub fn is_available(&self) -> bool {
        self.source.is_some()
    }

    /// Run one request and report what happened
    pub fn predict_outcome(&self, sentence: &str) -> PredictionOutcome {
        let trimmed = sentence.trim();
        if trimmed.is_empty() {
            return PredictionOutcome::Starters(self.starters.clone());
        }

        let Some(source) = self.source.as_deref() else {
            return PredictionOutcome::Unavailable;
        };

        let started = Instant::now();
        match self.run_pipeline(source, trimmed) {
            Ok(words) if words.is_empty() => {
                debug!(sentence = trimmed, "no valid word predictions");
                PredictionOutcome::NoPredictions
            }
            Ok(words) => {
                debug!(
                    sentence = trimmed,
                    count = words.len(),
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "predicted words"
                );
                PredictionOutcome::Predicted(words)
            }
            Err(error) => {
                warn!(sentence = trimmed, "prediction failed: {error}");
                PredictionOutcome::Failed(error)
            }
        }
    }

    /// Ranked words for a sentence; empty when nothing can be predicted
    pub fn predict(&self, sentence: &str) -> Vec<WordPrediction> {
        self.predict_outcome(sentence).into_predictions()
    }

    /// Words only, in the same order as [`WordPredictor::predict`]
    pub fn predict_words(&self, sentence: &str) -> Vec<String> {
        self.predict(sentence).into_iter().map(|p| p.word).collect()
    }

    fn run_pipeline(
        &self,
        source: &dyn ScoreSource,
        sentence: &str,
    ) -> Result<Vec<WordPrediction>> {
        let sequence = self.encoder.encode(&self.vocab, sentence);
        let scores = source.score(&sequence)?;
        let candidates = self.ranker.rank(&scores, &sequence)?;
        Ok(self.filter.resolve(&self.vocab, &candidates))
    }
}
