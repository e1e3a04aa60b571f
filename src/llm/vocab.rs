//! Vocabulary table: word-piece to token id mapping for the masked LM
//!
//! Handles:
//! - Loading the `{ "token": id }` JSON dump of a WordPiece vocabulary
//! - Token ID to word-piece reverse mapping
//! - Resolving the special tokens by name
//! - A curated table of frequent words resolved once at startup

use rustc_hash::FxHashMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{PredictError, Result};

pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";
pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";
pub const MASK_TOKEN: &str = "[MASK]";

/// Bracketed special tokens, never valid display words
pub const SPECIAL_TOKENS: [&str; 5] = [PAD_TOKEN, UNK_TOKEN, CLS_TOKEN, SEP_TOKEN, MASK_TOKEN];

/// Frequent words looked up before the full table
const COMMON_WORDS: &[&str] = &[
    "i", "the", "a", "want", "like", "can", "have", "need", "go", "see", "play", "eat", "drink",
    "help", "to", "and", "or", "but", "is", "am", "are", "was", "were", "be", "do", "does", "did",
    "will", "would", "could", "should", "this", "that", "it", "you", "we", "they", "he", "she",
    "me", "my", "your", "our", "their", "his", "her", "some", "more", "many", "much", "most",
    "all", "in", "on", "at", "with", "for", "from", "by", "as", "if", "when", "where", "what",
    "who", "why", "how", "yes", "no", "not", "very", "really", "just", "now", "then", "here",
    "there", "good", "bad", "big", "small", "hot", "cold", "fast", "slow",
];

/// Ids of the reserved tokens
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpecialTokens {
    pub pad: u32,
    pub unk: u32,
    pub cls: u32,
    pub sep: u32,
    pub mask: u32,
}

impl SpecialTokens {
    fn contains(&self, id: u32) -> bool {
        id == self.pad || id == self.unk || id == self.cls || id == self.sep || id == self.mask
    }
}

/// Immutable bidirectional word-piece table
#[derive(Debug)]
pub struct Vocab {
    /// Word-piece → Token ID mapping
    token_to_id: FxHashMap<String, u32>,
    /// Token ID → Word-piece reverse mapping
    id_to_token: FxHashMap<u32, String>,
    /// Curated subset of `token_to_id`
    common: FxHashMap<&'static str, u32>,
    special: SpecialTokens,
}

impl Vocab {
    /// Build a vocabulary from `(token, id)` pairs.
    ///
    /// Fails if the pairs do not form a bijection or a special token is
    /// missing.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut token_to_id = FxHashMap::default();
        let mut id_to_token: FxHashMap<u32, String> = FxHashMap::default();

        for (token, id) in entries {
            let token = token.into();
            if let Some(&first) = token_to_id.get(&token) {
                if first != id {
                    return Err(PredictError::DuplicateToken {
                        token,
                        first,
                        second: id,
                    });
                }
                continue;
            }
            if let Some(first) = id_to_token.get(&id) {
                return Err(PredictError::DuplicateId {
                    id,
                    first: first.clone(),
                    second: token,
                });
            }
            id_to_token.insert(id, token.clone());
            token_to_id.insert(token, id);
        }

        let special_id = |name: &'static str| {
            token_to_id
                .get(name)
                .copied()
                .ok_or(PredictError::MissingSpecialToken(name))
        };
        let special = SpecialTokens {
            pad: special_id(PAD_TOKEN)?,
            unk: special_id(UNK_TOKEN)?,
            cls: special_id(CLS_TOKEN)?,
            sep: special_id(SEP_TOKEN)?,
            mask: special_id(MASK_TOKEN)?,
        };

        let common = COMMON_WORDS
            .iter()
            .filter_map(|&word| token_to_id.get(word).map(|&id| (word, id)))
            .collect();

        Ok(Vocab {
            token_to_id,
            id_to_token,
            common,
            special,
        })
    }

    /// Load vocabulary from a JSON object file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| PredictError::VocabIo {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: FxHashMap<String, u32> =
            serde_json::from_str(&content).map_err(|source| PredictError::VocabMalformed {
                path: path.to_path_buf(),
                source,
            })?;

        let vocab = Vocab::from_entries(entries)?;
        info!(
            path = %path.display(),
            tokens = vocab.size(),
            common_words = vocab.common.len(),
            "loaded vocabulary"
        );
        Ok(vocab)
    }

    /// Exact, case-sensitive token lookup
    pub fn lookup_id(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    /// Convert token ID to its raw word-piece
    pub fn lookup_word(&self, token_id: u32) -> Option<&str> {
        self.id_to_token.get(&token_id).map(String::as_str)
    }

    /// Curated table first, full table second
    pub fn resolve_word(&self, word: &str) -> Option<u32> {
        self.common
            .get(word)
            .copied()
            .or_else(|| self.lookup_id(word))
    }

    pub fn special(&self) -> SpecialTokens {
        self.special
    }

    /// Check whether an id is one of the reserved tokens
    pub fn is_special(&self, token_id: u32) -> bool {
        self.special.contains(token_id)
    }

    /// Get vocabulary size
    pub fn size(&self) -> usize {
        self.token_to_id.len()
    }

    /// Number of curated words present in this vocabulary
    pub fn common_len(&self) -> usize {
        self.common.len()
    }

    /// Largest id in the table; score rows need at least `max_id + 1` columns
    pub fn max_id(&self) -> u32 {
        self.id_to_token.keys().copied().max().unwrap_or(0)
    }
}
