//! Word resolution: ranked token ids to display-ready words
//!
//! Handles:
//! - Reverse lookup of token ids, skipping special tokens
//! - Cleanup of subword and byte-level space markers
//! - Validity rules for what can be shown as a word button
//! - Case-insensitive deduplication and the final display cap
//! - Starting-letter filtering for the selection screen

use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

use crate::llm::ranking::TokenCandidate;
use crate::llm::vocab::{Vocab, SPECIAL_TOKENS};
use crate::predict::WordPrediction;

/// Words shown to the user per request
pub const DEFAULT_MAX_PREDICTIONS: usize = 15;

/// Longest word accepted for display
pub const DEFAULT_MAX_WORD_LEN: usize = 25;

/// WordPiece "attached to previous token" marker
const SUBWORD_PREFIX: &str = "##";

/// Byte-level BPE space marker (Ġ)
const BPE_SPACE: char = '\u{0120}';

const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Single tokens that are never words
const PUNCTUATION_ONLY: &[&str] = &[
    "\"", "'", ".", ",", "!", "?", ";", ":", "-", "_", "(", ")", "[", "]", "{", "}", "/", "\\",
    "|", "&", "%", "$", "#", "@", "*", "+", "=", "<", ">", "~", "`",
];

/// Strip formatting artifacts from a raw vocabulary entry
pub fn clean_token(token: &str) -> String {
    let token = token.strip_prefix(SUBWORD_PREFIX).unwrap_or(token);
    token
        .replace(BPE_SPACE, " ")
        .trim()
        .trim_end_matches(TRAILING_PUNCTUATION)
        .trim_end()
        .to_string()
}

/// Check if a cleaned word may be shown
pub fn is_valid_word(word: &str, max_len: usize) -> bool {
    let trimmed = word.trim();
    if trimmed.is_empty() {
        return false;
    }

    let len = trimmed.chars().count();
    if len == 1 {
        return matches!(trimmed, "i" | "I" | "a" | "A");
    }
    if len > max_len {
        return false;
    }

    let letters = trimmed.chars().filter(|c| c.is_alphabetic()).count();
    if letters * 2 < len {
        return false;
    }

    if PUNCTUATION_ONLY.contains(&trimmed) {
        return false;
    }

    !trimmed.chars().all(|c| c.is_ascii_digit())
}

/// Uppercase the first letter, lowercase the rest
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Turns ranked token candidates into the final word list
#[derive(Clone, Debug)]
pub struct WordFilter {
    max_predictions: usize,
    max_word_len: usize,
}

impl WordFilter {
    pub fn new(max_predictions: usize, max_word_len: usize) -> Self {
        WordFilter {
            max_predictions,
            max_word_len,
        }
    }

    /// Resolve, clean, validate and deduplicate candidates in rank order.
    ///
    /// An empty result means nothing survived filtering, not a failure.
    pub fn resolve(&self, vocab: &Vocab, candidates: &[TokenCandidate]) -> Vec<WordPrediction> {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut words = Vec::with_capacity(self.max_predictions);

        for candidate in candidates {
            if words.len() >= self.max_predictions {
                break;
            }
            if vocab.is_special(candidate.token_id) {
                continue;
            }
            let Some(raw) = vocab.lookup_word(candidate.token_id) else {
                continue;
            };
            if SPECIAL_TOKENS.contains(&raw) {
                continue;
            }

            let cleaned = clean_token(raw);
            if !is_valid_word(&cleaned, self.max_word_len) {
                continue;
            }

            let word = capitalize(&cleaned);
            if !seen.insert(word.to_lowercase()) {
                continue;
            }
            words.push(WordPrediction::new(word, candidate.probability));
        }

        words
    }
}

impl Default for WordFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PREDICTIONS, DEFAULT_MAX_WORD_LEN)
    }
}

/// Keep words starting with `letter` (case-insensitive); empty letter keeps all
pub fn filter_by_letter<'a>(
    predictions: &'a [WordPrediction],
    letter: &str,
) -> Vec<&'a WordPrediction> {
    let letter = letter.trim().to_lowercase();
    predictions
        .iter()
        .filter(|p| letter.is_empty() || p.word.to_lowercase().starts_with(&letter))
        .collect()
}

/// Distinct uppercase first letters, sorted
pub fn starting_letters(predictions: &[WordPrediction]) -> Vec<char> {
    predictions
        .iter()
        .filter_map(|p| p.word.chars().next())
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
