use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::llm::encoder::{DEFAULT_CONTEXT_WORD, DEFAULT_MAX_SEQ_LEN};
use crate::llm::filter::{DEFAULT_MAX_PREDICTIONS, DEFAULT_MAX_WORD_LEN};
use crate::llm::ranking::{DEFAULT_CANDIDATE_COUNT, DEFAULT_PROBABILITY_THRESHOLD};

const CONFIG_ENV: &str = "WORD_PREDICT_CONFIG";

/// Most common English sentence openers, shown for an empty sentence
pub const DEFAULT_STARTER_WORDS: [&str; 15] = [
    "I", "The", "It", "You", "We", "What", "This", "Can", "How", "There", "When", "My", "If", "He",
    "She",
];

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PredictorConfig {
    #[serde(default)]
    pub vocab: VocabConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl PredictorConfig {
    /// Load from the resolved config path, or defaults if there is none
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path();
        if config_path.exists() {
            return Self::from_file(&config_path);
        }

        Ok(PredictorConfig::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("failed to parse TOML from {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Post-mask context word; empty disables it
    pub fn context_word(&self) -> Option<&str> {
        let word = self.encoder.context_word.trim();
        (!word.is_empty()).then_some(word)
    }
}

fn resolve_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Path::new(&path).to_path_buf();
    }

    if let Some(base) = dirs::config_dir() {
        return base.join("word-predict").join("config.toml");
    }

    Path::new("word-predict.toml").to_path_buf()
}

#[derive(Debug, Clone, Deserialize)]
pub struct VocabConfig {
    #[serde(default = "default_vocab_path")]
    pub path: PathBuf,
}

impl Default for VocabConfig {
    fn default() -> Self {
        Self {
            path: default_vocab_path(),
        }
    }
}

fn default_vocab_path() -> PathBuf {
    Path::new("data/vocab.json").to_path_buf()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

fn default_model_path() -> PathBuf {
    Path::new("models/scorer.bin").to_path_buf()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EncoderConfig {
    #[serde(default = "default_max_seq_len")]
    pub max_seq_len: usize,
    #[serde(default = "default_context_word")]
    pub context_word: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_seq_len: default_max_seq_len(),
            context_word: default_context_word(),
        }
    }
}

fn default_max_seq_len() -> usize {
    DEFAULT_MAX_SEQ_LEN
}

fn default_context_word() -> String {
    DEFAULT_CONTEXT_WORD.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_candidate_count")]
    pub candidate_count: usize,
    #[serde(default = "default_probability_threshold")]
    pub probability_threshold: f32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            candidate_count: default_candidate_count(),
            probability_threshold: default_probability_threshold(),
        }
    }
}

fn default_candidate_count() -> usize {
    DEFAULT_CANDIDATE_COUNT
}

fn default_probability_threshold() -> f32 {
    DEFAULT_PROBABILITY_THRESHOLD
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_max_predictions")]
    pub max_predictions: usize,
    #[serde(default = "default_max_word_len")]
    pub max_word_len: usize,
    #[serde(default = "default_starter_words")]
    pub starter_words: Vec<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_predictions: default_max_predictions(),
            max_word_len: default_max_word_len(),
            starter_words: default_starter_words(),
        }
    }
}

fn default_max_predictions() -> usize {
    DEFAULT_MAX_PREDICTIONS
}

fn default_max_word_len() -> usize {
    DEFAULT_MAX_WORD_LEN
}

fn default_starter_words() -> Vec<String> {
    DEFAULT_STARTER_WORDS.iter().map(|w| w.to_string()).collect()
}
