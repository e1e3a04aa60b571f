//! Sentence builder state
//!
//! Tracks:
//! - The sentence assembled so far
//! - The optional starting-letter filter
//! - Which visible prediction is highlighted

use word_predict::llm::filter::{capitalize, filter_by_letter};
use word_predict::WordPrediction;

#[derive(Clone, Debug, Default)]
pub struct SentenceBuilder {
    sentence: String,
    letter: Option<char>,
    selected: usize,
}

impl SentenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    pub fn letter(&self) -> Option<char> {
        self.letter
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Predictions left after the letter filter
    pub fn visible<'a>(&self, predictions: &'a [WordPrediction]) -> Vec<&'a WordPrediction> {
        let letter = self.letter.map(String::from).unwrap_or_default();
        filter_by_letter(predictions, &letter)
    }

    /// Append a chosen word; the first word is capitalized, later ones lowercased except "I"
    pub fn add_word(&mut self, word: &str) {
        let word = word.trim();
        if word.is_empty() {
            return;
        }

        if self.sentence.is_empty() {
            self.sentence = capitalize(word);
        } else if word.eq_ignore_ascii_case("i") {
            self.sentence.push_str(" I");
        } else {
            self.sentence.push(' ');
            self.sentence.push_str(&word.to_lowercase());
        }
        self.letter = None;
        self.selected = 0;
    }

    /// Drop the last word of the sentence
    pub fn remove_last_word(&mut self) {
        match self.sentence.trim_end().rfind(' ') {
            Some(idx) => self.sentence.truncate(idx),
            None => self.sentence.clear(),
        }
        self.letter = None;
        self.selected = 0;
    }

    /// Set the letter filter, or clear it when the same letter is pressed again
    pub fn toggle_letter(&mut self, letter: char) {
        let letter = letter.to_ascii_uppercase();
        self.letter = if self.letter == Some(letter) {
            None
        } else {
            Some(letter)
        };
        self.selected = 0;
    }

    /// Move the highlight by `delta`, wrapping within `len` entries
    pub fn move_selection(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let current = self.selected.min(len - 1) as isize;
        self.selected = (current + delta).rem_euclid(len as isize) as usize;
    }
}
