//! Candidate ranking at the masked position
//!
//! Converts the mask row of a score matrix into probabilities with a
//! max-shifted softmax and keeps the top candidates.

use std::cmp::Ordering;
use tracing::warn;

use crate::error::Result;
use crate::llm::encoder::EncodedSequence;
use crate::llm::model::ScoreMatrix;

/// Used when a sequence carries no recorded mask position.
/// Reaching it means the encoder broke its own invariant.
pub const FALLBACK_MASK_POSITION: usize = 2;

/// Probabilities at or below this are dropped before sorting
pub const DEFAULT_PROBABILITY_THRESHOLD: f32 = 1e-5;

/// Token candidates pulled from the model per request
pub const DEFAULT_CANDIDATE_COUNT: usize = 20;

/// One vocabulary id with its softmax probability
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TokenCandidate {
    pub token_id: u32,
    pub probability: f32,
}

/// Numerically stable softmax.
///
/// NaN scores get zero probability. Infinite scores share all of the mass;
/// a row with no usable score is all zeros.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return vec![];
    }

    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    if max == f32::INFINITY {
        let winners = logits.iter().filter(|&&x| x == f32::INFINITY).count() as f32;
        warn!(winners, "score row contains +inf, giving it all probability mass");
        return logits
            .iter()
            .map(|&x| if x == f32::INFINITY { 1.0 / winners } else { 0.0 })
            .collect();
    }
    if !max.is_finite() {
        warn!(len = logits.len(), "score row has no finite values");
        return vec![0.0; logits.len()];
    }

    let exps: Vec<f32> = logits
        .iter()
        .map(|&x| if x.is_nan() { 0.0 } else { (x - max).exp() })
        .collect();
    let sum: f32 = exps.iter().sum();

    exps.iter().map(|&x| x / sum).collect()
}

/// Picks the most probable tokens at the mask position
#[derive(Clone, Debug)]
pub struct CandidateRanker {
    threshold: f32,
    count: usize,
}

impl CandidateRanker {
    pub fn new(threshold: f32, count: usize) -> Self {
        CandidateRanker { threshold, count }
    }

    /// Rank one score row: softmax, threshold, sort, truncate
    pub fn rank_row(&self, logits: &[f32]) -> Vec<TokenCandidate> {
        let mut ranked: Vec<TokenCandidate> = softmax(logits)
            .into_iter()
            .enumerate()
            .filter(|&(_, p)| p > self.threshold)
            .map(|(id, probability)| TokenCandidate {
                token_id: id as u32,
                probability,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(Ordering::Equal)
                .then(a.token_id.cmp(&b.token_id))
        });
        ranked.truncate(self.count);
        ranked
    }

    /// Rank the row at the sequence's mask position
    pub fn rank(
        &self,
        scores: &ScoreMatrix,
        sequence: &EncodedSequence,
    ) -> Result<Vec<TokenCandidate>> {
        let position = mask_position_or_fallback(sequence);
        let row = scores.row(position)?;
        Ok(self.rank_row(&row))
    }
}

impl Default for CandidateRanker {
    fn default() -> Self {
        Self::new(DEFAULT_PROBABILITY_THRESHOLD, DEFAULT_CANDIDATE_COUNT)
    }
}

/// Recorded mask position, or the fallback index with a warning
pub fn mask_position_or_fallback(sequence: &EncodedSequence) -> usize {
    sequence.mask_position().unwrap_or_else(|| {
        warn!(
            fallback = FALLBACK_MASK_POSITION,
            seq_len = sequence.len(),
            "mask position missing from encoded sequence, using fallback index"
        );
        FALLBACK_MASK_POSITION
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn test_softmax_sums_to_one() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let logits: Vec<f32> = (0..500).map(|_| rng.gen_range(-30.0..30.0)).collect();
            let sum: f32 = softmax(&logits).iter().sum();
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_softmax_is_stable_for_extreme_scores() {
        let probs = softmax(&[1000.0, 1000.0, -1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!((probs[1] - 0.5).abs() < 1e-6);
        assert_eq!(probs[2], 0.0);

        let probs = softmax(&[-900.0, -901.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[0] > probs[1]);
    }

    #[test]
    fn test_softmax_degenerate_rows() {
        assert!(softmax(&[]).is_empty());
        assert_eq!(
            softmax(&[f32::NEG_INFINITY, f32::NEG_INFINITY]),
            vec![0.0, 0.0]
        );
        assert_eq!(softmax(&[f32::NAN, f32::NAN]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_infinite_score_takes_all_mass() {
        assert_eq!(softmax(&[0.0, f32::INFINITY, 1.0]), vec![0.0, 1.0, 0.0]);
        assert_eq!(
            softmax(&[f32::INFINITY, 2.0, f32::INFINITY]),
            vec![0.5, 0.0, 0.5]
        );

        let ranked = CandidateRanker::default().rank_row(&[0.0, f32::INFINITY, 1.0]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].token_id, 1);
        assert_eq!(ranked[0].probability, 1.0);
    }

    #[test]
    fn test_nan_scores_are_ignored() {
        let probs = softmax(&[1.0, f32::NAN, 1.0]);
        assert_eq!(probs[1], 0.0);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rank_orders_and_truncates() {
        let ranker = CandidateRanker::new(DEFAULT_PROBABILITY_THRESHOLD, 3);
        let ranked = ranker.rank_row(&[0.0, 5.0, 1.0, 5.0, 3.0, -2.0]);

        let ids: Vec<u32> = ranked.iter().map(|c| c.token_id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(ranked[0].probability, ranked[1].probability);
    }

    #[test]
    fn test_rank_drops_noise() {
        let ranker = CandidateRanker::new(DEFAULT_PROBABILITY_THRESHOLD, 10);
        let ranked = ranker.rank_row(&[20.0, 0.0, -5.0, 19.0]);
        let ids: Vec<u32> = ranked.iter().map(|c| c.token_id).collect();
        assert_eq!(ids, vec![0, 3]);
    }

    #[test]
    fn test_rank_ordering_invariants_on_random_rows() {
        let mut rng = rand::thread_rng();
        let ranker = CandidateRanker::new(DEFAULT_PROBABILITY_THRESHOLD, 20);
        for _ in 0..50 {
            // Coarse buckets force plenty of ties
            let logits: Vec<f32> = (0..300).map(|_| rng.gen_range(0..8) as f32).collect();
            let ranked = ranker.rank_row(&logits);
            assert!(ranked.len() <= 20);
            for pair in ranked.windows(2) {
                assert!(pair[0].probability >= pair[1].probability);
                if pair[0].probability == pair[1].probability {
                    assert!(pair[0].token_id <= pair[1].token_id);
                }
            }
        }
    }

    #[test]
    fn test_rank_uses_recorded_mask_position() {
        let scores = ScoreMatrix::from_rows(vec![
            vec![9.0, 0.0, 0.0],
            vec![0.0, 0.0, 9.0],
            vec![0.0, 9.0, 0.0],
        ])
        .unwrap();
        let ranker = CandidateRanker::default();

        let mut sequence = EncodedSequence::from_parts(vec![2, 4, 3], vec![1, 1, 1]);
        assert_eq!(ranker.rank(&scores, &sequence).unwrap()[0].token_id, 1);

        // Built by the encoder: mask at index 1
        let vocab = crate::llm::vocab::tests::sample_vocab();
        let encoder = crate::llm::encoder::SequenceEncoder::new(&vocab, 5, None).unwrap();
        sequence = encoder.encode(&vocab, "");
        assert_eq!(sequence.mask_position(), Some(1));
        assert_eq!(ranker.rank(&scores, &sequence).unwrap()[0].token_id, 2);
    }

    /// Collects formatted log output for assertions
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let value = tracing::subscriber::with_default(subscriber, f);
        (value, logs.contents())
    }

    #[test]
    fn test_mask_fallback_logs_warning() {
        let sequence = EncodedSequence::from_parts(vec![2, 5, 4, 3], vec![1, 1, 1, 1]);
        let (position, logs) = with_captured_logs(|| mask_position_or_fallback(&sequence));

        assert_eq!(position, FALLBACK_MASK_POSITION);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("mask position missing"));
        assert!(logs.contains("seq_len=4"));
    }

    #[test]
    fn test_recorded_mask_position_is_silent() {
        let vocab = crate::llm::vocab::tests::sample_vocab();
        let encoder = crate::llm::encoder::SequenceEncoder::new(&vocab, 8, None).unwrap();
        let sequence = encoder.encode(&vocab, "i want");
        let (position, logs) = with_captured_logs(|| mask_position_or_fallback(&sequence));

        assert_eq!(position, 3);
        assert!(logs.is_empty());
    }

    #[test]
    fn test_rank_reports_out_of_range_mask() {
        let scores = ScoreMatrix::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        let sequence = EncodedSequence::from_parts(vec![2, 4, 3], vec![1, 1, 1]);
        assert!(CandidateRanker::default().rank(&scores, &sequence).is_err());
    }
}
