//! Sequence encoder: sentence text to a fixed-length masked-LM query
//!
//! Layout of a non-empty query:
//! `[CLS] w1 .. wn [MASK] <context> [SEP] [PAD] ..`
//!
//! Words are looked up whole (lowercased); there is no subword splitting.
//! The mask position is recorded while building the sequence instead of
//! being searched for afterwards.

use tracing::warn;

use crate::error::{PredictError, Result};
use crate::llm::vocab::Vocab;

/// BERT maximum sequence length
pub const DEFAULT_MAX_SEQ_LEN: usize = 128;

/// Word placed right after `[MASK]` so the model predicts a word, not punctuation
pub const DEFAULT_CONTEXT_WORD: &str = "and";

/// Encoded masked-LM input
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedSequence {
    token_ids: Vec<u32>,
    attention_mask: Vec<u32>,
    mask_position: Option<usize>,
}

impl EncodedSequence {
    /// Wrap externally produced ids and mask.
    ///
    /// The mask position is not known for such input; downstream code falls
    /// back to its default index.
    pub fn from_parts(token_ids: Vec<u32>, attention_mask: Vec<u32>) -> Self {
        EncodedSequence {
            token_ids,
            attention_mask,
            mask_position: None,
        }
    }

    pub fn token_ids(&self) -> &[u32] {
        &self.token_ids
    }

    pub fn attention_mask(&self) -> &[u32] {
        &self.attention_mask
    }

    /// Index of `[MASK]`, if the sequence was built by the encoder
    pub fn mask_position(&self) -> Option<usize> {
        self.mask_position
    }

    pub fn len(&self) -> usize {
        self.token_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_ids.is_empty()
    }

    /// Number of attended (non-padding) positions
    pub fn attended_len(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

/// Builds [`EncodedSequence`]s against one vocabulary
#[derive(Clone, Debug)]
pub struct SequenceEncoder {
    max_seq_len: usize,
    cls: u32,
    sep: u32,
    mask: u32,
    pad: u32,
    unk: u32,
    /// `[MASK]`, optional context token, `[SEP]`
    trailer: Vec<u32>,
}

impl SequenceEncoder {
    /// Create an encoder.
    ///
    /// `context_word` is looked up once; if the vocabulary lacks it the
    /// query is built without post-mask context.
    pub fn new(vocab: &Vocab, max_seq_len: usize, context_word: Option<&str>) -> Result<Self> {
        let special = vocab.special();

        let context_id = match context_word.map(str::trim).filter(|w| !w.is_empty()) {
            Some(word) => {
                let id = vocab.resolve_word(&word.to_lowercase());
                if id.is_none() {
                    warn!(context_word = word, "context word not in vocabulary, omitting it");
                }
                id
            }
            None => None,
        };

        let mut trailer = vec![special.mask];
        trailer.extend(context_id);
        trailer.push(special.sep);

        // [CLS], one content token, then the trailer
        let required = trailer.len() + 2;
        if max_seq_len < required {
            return Err(PredictError::SequenceTooShort {
                max_seq_len,
                required,
            });
        }

        Ok(SequenceEncoder {
            max_seq_len,
            cls: special.cls,
            sep: special.sep,
            mask: special.mask,
            pad: special.pad,
            unk: special.unk,
            trailer,
        })
    }

    /// Encode a sentence as "predict the word that continues this text"
    pub fn encode(&self, vocab: &Vocab, text: &str) -> EncodedSequence {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return self.finish(vec![self.cls, self.mask, self.sep], 1);
        }

        // Room between [CLS] and the trailer
        let interior_room = self.max_seq_len - 1 - self.trailer.len();

        let words: Vec<u32> = trimmed
            .split_whitespace()
            .map(|word| vocab.resolve_word(&word.to_lowercase()).unwrap_or(self.unk))
            .collect();

        // Overflow drops the start of the sentence; the mask stays after the last word
        let mut tokens = Vec::with_capacity(self.max_seq_len);
        tokens.push(self.cls);
        tokens.extend_from_slice(&words[words.len().saturating_sub(interior_room)..]);

        let mask_position = tokens.len();
        tokens.extend_from_slice(&self.trailer);
        self.finish(tokens, mask_position)
    }

    /// Pad to full length and build the attention mask from the real length
    fn finish(&self, mut tokens: Vec<u32>, mask_position: usize) -> EncodedSequence {
        let real_len = tokens.len();
        tokens.resize(self.max_seq_len, self.pad);

        let mut attention_mask = vec![1; real_len];
        attention_mask.resize(self.max_seq_len, 0);

        debug_assert_eq!(tokens[mask_position], self.mask);

        EncodedSequence {
            token_ids: tokens,
            attention_mask,
            mask_position: Some(mask_position),
        }
    }
}
