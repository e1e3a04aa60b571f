//! End-to-end tests of the prediction pipeline through the public API

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};
use std::thread;

use word_predict::llm::model::{ScorerConfig, ScorerWeights, TensorData};
use word_predict::{
    EncodedSequence, PredictError, PredictionOutcome, PredictorConfig, ScoreMatrix, ScoreSource,
    Vocab, WordPredictor,
};

const VOCAB_JSON: &str = r###"{
    "[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3, "[MASK]": 4,
    "i": 5, "want": 6, "and": 7, "to": 8, "go": 9, "eat": 10,
    "play": 11, "##s": 12, ".": 13, ",": 14, "drink": 15, "Go": 16, "sleep": 17
}"###;

fn vocab() -> Arc<Vocab> {
    let entries: HashMap<String, u32> = serde_json::from_str(VOCAB_JSON).unwrap();
    Arc::new(Vocab::from_entries(entries).unwrap())
}

/// Scores only the recorded mask position; remembers the sequences it saw
struct MaskPeaks {
    peaks: Vec<(usize, f32)>,
    vocab_size: usize,
    seen: Mutex<Vec<EncodedSequence>>,
}

impl MaskPeaks {
    fn new(peaks: Vec<(usize, f32)>) -> Self {
        MaskPeaks {
            peaks,
            vocab_size: 18,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl ScoreSource for MaskPeaks {
    fn score(&self, sequence: &EncodedSequence) -> word_predict::Result<ScoreMatrix> {
        self.seen.lock().unwrap().push(sequence.clone());
        let mask = sequence.mask_position().unwrap();

        let mut rows = vec![vec![0.0; self.vocab_size]; sequence.len()];
        rows[mask] = vec![-20.0; self.vocab_size];
        for &(id, score) in &self.peaks {
            rows[mask][id] = score;
        }
        ScoreMatrix::from_rows(rows)
    }
}

#[test]
fn encodes_i_want_and_ranks_mask_row() {
    let source = Arc::new(MaskPeaks::new(vec![
        (13, 9.0), // "."
        (8, 8.0),  // to
        (9, 7.5),  // go
        (16, 7.0), // Go
        (12, 6.0), // ##s
        (4, 5.5),  // [MASK]
        (10, 5.0), // eat
    ]));
    let predictor = WordPredictor::new(vocab(), Some(source.clone())).unwrap();

    let words = predictor.predict("I want");
    let names: Vec<&str> = words.iter().map(|w| w.word.as_str()).collect();
    assert_eq!(names, vec!["To", "Go", "Eat"]);
    assert!(words.iter().all(|w| w.probability > 0.0 && w.probability <= 1.0));

    let seen = source.seen.lock().unwrap();
    let sequence = &seen[0];
    assert_eq!(sequence.len(), 128);
    assert_eq!(&sequence.token_ids()[..6], &[2, 5, 6, 4, 7, 3]);
    assert!(sequence.token_ids()[6..].iter().all(|&id| id == 0));
    assert_eq!(sequence.mask_position(), Some(3));
    assert_eq!(sequence.attended_len(), 6);
}

#[test]
fn empty_sentence_skips_the_model() {
    let source = Arc::new(MaskPeaks::new(vec![(9, 5.0)]));
    let predictor = WordPredictor::new(vocab(), Some(source.clone())).unwrap();

    let words = predictor.predict("");
    assert_eq!(words.len(), 15);
    assert_eq!(words[0].word, "I");
    assert_eq!(words[14].word, "She");
    assert!(words.iter().all(|w| w.probability == 0.0));
    assert!(source.seen.lock().unwrap().is_empty());
}

#[test]
fn results_are_capped_and_case_insensitively_unique() {
    let peaks = (5..18).map(|id| (id, 10.0 - id as f32 * 0.1)).collect();
    let config = PredictorConfig::from_toml_str("[display]\nmax_predictions = 4\n").unwrap();
    let predictor =
        WordPredictor::with_config(vocab(), Some(Arc::new(MaskPeaks::new(peaks))), &config)
            .unwrap();

    let words = predictor.predict("I");
    assert_eq!(words.len(), 4);
    let mut lowered: Vec<String> = words.iter().map(|w| w.word.to_lowercase()).collect();
    lowered.sort();
    lowered.dedup();
    assert_eq!(lowered.len(), 4);
}

#[test]
fn missing_model_degrades_to_empty_list() {
    let dir = tempfile::tempdir().unwrap();
    let vocab_path = dir.path().join("vocab.json");
    fs::write(&vocab_path, VOCAB_JSON).unwrap();

    let mut config = PredictorConfig::default();
    config.vocab.path = vocab_path;
    config.model.path = dir.path().join("missing.bin");

    let predictor = WordPredictor::from_config(&config).unwrap();
    assert!(!predictor.is_available());
    assert!(predictor.predict("I want").is_empty());
    assert_eq!(predictor.predict("").len(), 15);
}

#[test]
fn missing_vocabulary_is_fatal() {
    let mut config = PredictorConfig::default();
    config.vocab.path = "/nonexistent/vocab.json".into();
    let err = WordPredictor::from_config(&config).err().unwrap();
    assert!(err.is_fatal());
    assert!(matches!(err, PredictError::VocabIo { .. }));
}

#[test]
fn loaded_scorer_runs_the_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let vocab_path = dir.path().join("vocab.json");
    let model_path = dir.path().join("scorer.bin");
    fs::write(&vocab_path, VOCAB_JSON).unwrap();

    // Output bias alone decides the ranking: go > eat > "." > everything else
    let vocab_size = 18;
    let hidden_size = 2;
    let mut bias = vec![-10.0; vocab_size];
    bias[9] = 6.0;
    bias[10] = 5.0;
    bias[13] = 7.0;
    ScorerWeights {
        config: ScorerConfig {
            vocab_size,
            hidden_size,
        },
        tensors: vec![
            TensorData {
                name: "embedding.weight".into(),
                shape: vec![vocab_size, hidden_size],
                data: vec![0.0; vocab_size * hidden_size],
            },
            TensorData {
                name: "output.weight".into(),
                shape: vec![vocab_size, hidden_size],
                data: vec![0.0; vocab_size * hidden_size],
            },
            TensorData {
                name: "output.bias".into(),
                shape: vec![vocab_size],
                data: bias,
            },
        ],
    }
    .save(&model_path)
    .unwrap();

    let mut config = PredictorConfig::default();
    config.vocab.path = vocab_path;
    config.model.path = model_path;

    let predictor = WordPredictor::from_config(&config).unwrap();
    assert!(predictor.is_available());
    match predictor.predict_outcome("I want to") {
        PredictionOutcome::Predicted(words) => {
            let names: Vec<&str> = words.iter().map(|w| w.word.as_str()).collect();
            assert_eq!(names, vec!["Go", "Eat"]);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn concurrent_requests_share_one_predictor() {
    let source = Arc::new(MaskPeaks::new(vec![(9, 6.0), (10, 5.0)]));
    let predictor = Arc::new(WordPredictor::new(vocab(), Some(source)).unwrap());

    let handles: Vec<_> = ["I want", "I want to", "to", ""]
        .into_iter()
        .map(|sentence| {
            let predictor = Arc::clone(&predictor);
            thread::spawn(move || predictor.predict(sentence))
        })
        .collect();

    for handle in handles {
        let words = handle.join().unwrap();
        assert!(!words.is_empty());
    }
}
