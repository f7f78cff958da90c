// ============================================================
// Layer 4 — Vocabulary & Token Encoder
// ============================================================
// Maps word tokens to dense integer ids.
//
// Id layout:
//   0 .. 4              reserved tokens (<pad> <unk> <s> </s>)
//   4 .. word_count     most frequent corpus words
//   word_count .. len   character n-grams (fallback table)
//
// Lookup is two-level:
//   1. exact match in the word table
//   2. otherwise the word is decomposed into n-grams of
//      "#word#" (boundary-marked), each n-gram looked up in the
//      n-gram table, unseen n-grams resolving to <unk>
//
// Every input word therefore contributes at least one id, and
// both tables are immutable once built, so encoding the same
// text always yields the same ids.
//
// Reference: Sennrich et al. (2016) subword units
//            Huang et al. (2013) DSSM letter-trigram hashing

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::preprocessor::Preprocessor;
use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::TokenEncoder;

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;
pub const BOS_ID: u32 = 2;
pub const EOS_ID: u32 = 3;

pub const PAD_TOKEN: &str = "<pad>";
pub const UNK_TOKEN: &str = "<unk>";
pub const BOS_TOKEN: &str = "<s>";
pub const EOS_TOKEN: &str = "</s>";

/// Reserved tokens in id order.
pub const RESERVED_TOKENS: [&str; 4] = [PAD_TOKEN, UNK_TOKEN, BOS_TOKEN, EOS_TOKEN];

/// Boundary marker wrapped around a word before n-gram splitting.
const BOUNDARY: char = '#';

pub const DEFAULT_NGRAM_WIDTH: usize = 3;

// ─── FrequencyTable ───────────────────────────────────────────────────────────
/// Word counts in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, u64)>", into = "Vec<(String, u64)>")]
pub struct FrequencyTable {
    entries: Vec<(String, u64)>,
    index:   HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `token`.
    pub fn add(&mut self, token: &str) {
        self.add_count(token, 1);
    }

    pub fn add_count(&mut self, token: &str, count: u64) {
        match self.index.get(token) {
            Some(&i) => self.entries[i].1 += count,
            None => {
                self.index.insert(token.to_string(), self.entries.len());
                self.entries.push((token.to_string(), count));
            }
        }
    }

    /// Tokenise `text` and count every token.
    pub fn add_text(&mut self, preprocessor: &Preprocessor, text: &str) {
        for token in preprocessor.tokenize(text) {
            self.add(&token);
        }
    }

    pub fn count(&self, token: &str) -> u64 {
        self.index.get(token).map_or(0, |&i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(t, c)| (t.as_str(), *c))
    }

    /// The `k` most frequent tokens not listed in `exclude`.
    /// Ties keep first-seen order.
    fn top_k(&self, k: usize, exclude: &[&str]) -> Vec<String> {
        let mut ranked: Vec<&(String, u64)> = self
            .entries
            .iter()
            .filter(|(t, _)| !exclude.contains(&t.as_str()))
            .collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().take(k).map(|(t, _)| t.clone()).collect()
    }
}

impl From<Vec<(String, u64)>> for FrequencyTable {
    fn from(pairs: Vec<(String, u64)>) -> Self {
        let mut table = Self::new();
        for (token, count) in pairs {
            table.add_count(&token, count);
        }
        table
    }
}

impl From<FrequencyTable> for Vec<(String, u64)> {
    fn from(table: FrequencyTable) -> Self {
        table.entries
    }
}

/// Boundary-marked character n-grams of one word.
/// A marked word shorter than `width` is a single n-gram.
pub fn char_ngrams(word: &str, width: usize) -> Vec<String> {
    let marked: Vec<char> = std::iter::once(BOUNDARY)
        .chain(word.chars())
        .chain(std::iter::once(BOUNDARY))
        .collect();

    if width == 0 || marked.len() <= width {
        return vec![marked.into_iter().collect()];
    }
    marked.windows(width).map(|w| w.iter().collect()).collect()
}

// ─── VocabularyFile ───────────────────────────────────────────────────────────
/// On-disk form of a vocabulary: both tables in id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyFile {
    pub words:       Vec<String>,
    pub ngrams:      Vec<String>,
    pub ngram_width: usize,
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct Vocabulary {
    words:        HashMap<String, u32>,
    ngrams:       HashMap<String, u32>,
    id_to_token:  Vec<String>,
    word_count:   usize,
    ngram_width:  usize,
    preprocessor: Preprocessor,
}

impl Vocabulary {
    /// Keep the `max_size - reserved.len()` most frequent words.
    /// Reserved tokens get ids `0..reserved.len()` in the given order.
    pub fn build(freq: &FrequencyTable, max_size: usize, reserved: &[&str]) -> Result<Self> {
        if max_size < reserved.len() {
            return Err(PipelineError::config(format!(
                "max_vocabulary_size ({}) is smaller than the {} reserved tokens",
                max_size,
                reserved.len()
            )));
        }

        let mut tokens: Vec<String> = reserved.iter().map(|t| t.to_string()).collect();
        tokens.extend(freq.top_k(max_size - reserved.len(), reserved));

        Self::from_tables(tokens, Vec::new(), DEFAULT_NGRAM_WIDTH)
    }

    /// Add an n-gram fallback table built from the same counts:
    /// each n-gram is weighted by the count of every word it
    /// occurs in, and the `max_ngrams` heaviest are kept.
    pub fn with_ngrams(self, freq: &FrequencyTable, max_ngrams: usize, width: usize) -> Result<Self> {
        if width == 0 {
            return Err(PipelineError::config("ngram_width must be > 0"));
        }

        let mut gram_freq = FrequencyTable::new();
        for (word, count) in freq.iter() {
            if RESERVED_TOKENS.contains(&word) {
                continue;
            }
            for gram in char_ngrams(word, width) {
                gram_freq.add_count(&gram, count);
            }
        }
        let grams = gram_freq.top_k(max_ngrams, &[]);

        let words = self.id_to_token[..self.word_count].to_vec();
        Self::from_tables(words, grams, width)
    }

    /// Rebuild from a persisted file.
    pub fn from_file(file: VocabularyFile) -> Result<Self> {
        if file.words.len() < RESERVED_TOKENS.len()
            || file.words[..RESERVED_TOKENS.len()] != RESERVED_TOKENS
        {
            return Err(PipelineError::config(
                "vocabulary file does not start with the reserved tokens",
            ));
        }
        if file.ngram_width == 0 {
            return Err(PipelineError::config("vocabulary file has ngram_width 0"));
        }
        Self::from_tables(file.words, file.ngrams, file.ngram_width)
    }

    pub fn to_file(&self) -> VocabularyFile {
        VocabularyFile {
            words:       self.id_to_token[..self.word_count].to_vec(),
            ngrams:      self.id_to_token[self.word_count..].to_vec(),
            ngram_width: self.ngram_width,
        }
    }

    fn from_tables(words: Vec<String>, grams: Vec<String>, ngram_width: usize) -> Result<Self> {
        let word_count = words.len();
        let mut word_ids  = HashMap::with_capacity(word_count);
        let mut ngram_ids = HashMap::with_capacity(grams.len());

        for (id, word) in words.iter().enumerate() {
            if word_ids.insert(word.clone(), id as u32).is_some() {
                return Err(PipelineError::config(format!("duplicate vocabulary word '{word}'")));
            }
        }
        for (offset, gram) in grams.iter().enumerate() {
            if ngram_ids.insert(gram.clone(), (word_count + offset) as u32).is_some() {
                return Err(PipelineError::config(format!("duplicate n-gram '{gram}'")));
            }
        }

        let mut id_to_token = words;
        id_to_token.extend(grams);

        Ok(Self {
            words: word_ids,
            ngrams: ngram_ids,
            id_to_token,
            word_count,
            ngram_width,
            preprocessor: Preprocessor::new(),
        })
    }

    /// Total number of ids (words + n-grams).
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn ngram_count(&self) -> usize {
        self.id_to_token.len() - self.word_count
    }

    pub fn ngram_width(&self) -> usize {
        self.ngram_width
    }

    /// Exact word lookup, without fallback.
    pub fn word_id(&self, word: &str) -> Option<u32> {
        self.words.get(word).copied()
    }

    /// Ids for one already-tokenised word.
    pub fn encode_word(&self, word: &str) -> Vec<u32> {
        if let Some(id) = self.word_id(word) {
            return vec![id];
        }
        char_ngrams(word, self.ngram_width)
            .iter()
            .map(|g| self.ngrams.get(g).copied().unwrap_or(UNK_ID))
            .collect()
    }

    /// Inverse table lookup; out-of-range ids read as <unk>.
    pub fn decode(&self, ids: &[u32]) -> Vec<&str> {
        ids.iter()
            .map(|&id| {
                self.id_to_token
                    .get(id as usize)
                    .map_or(UNK_TOKEN, String::as_str)
            })
            .collect()
    }
}

impl TokenEncoder for Vocabulary {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.preprocessor
            .tokenize(text)
            .iter()
            .flat_map(|w| self.encode_word(w))
            .collect()
    }
}
