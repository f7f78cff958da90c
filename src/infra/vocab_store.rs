// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Persists the two artifacts the stream depends on:
//
//   {dir}/words_freq_counter.json   strategy + word counts, first-seen order
//   {dir}/vocabulary.json           build parameters + word list
//                                   + n-gram list + width
//
// Both are built once from the corpus and reused by later runs,
// so training and any downstream consumer see the same id space.
// A saved artifact is only reused while the settings it was built
// with still match; otherwise it is rebuilt.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::synthesizer::Strategy;
use crate::data::vocabulary::{FrequencyTable, Vocabulary, VocabularyFile};
use crate::domain::error::{PipelineError, Result};

pub const FREQ_FILE: &str = "words_freq_counter.json";
pub const VOCAB_FILE: &str = "vocabulary.json";

/// Settings a saved vocabulary was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabParams {
    pub strategy:            Strategy,
    pub max_vocabulary_size: usize,
    pub max_ngram_size:      usize,
    pub ngram_width:         usize,
}

#[derive(Serialize, Deserialize)]
struct FreqFile {
    strategy: Strategy,
    counts:   FrequencyTable,
}

#[derive(Serialize, Deserialize)]
struct StoredVocabulary {
    params: VocabParams,
    #[serde(flatten)]
    tables: VocabularyFile,
}

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn freq_path(&self) -> PathBuf {
        self.dir.join(FREQ_FILE)
    }

    pub fn vocab_path(&self) -> PathBuf {
        self.dir.join(VOCAB_FILE)
    }

    /// Load the frequency table counted for `strategy`, or count a
    /// new one with `build` and save it. A table counted for the
    /// other strategy, or one that no longer parses, is recounted.
    pub fn load_or_build_freq<F>(&self, strategy: Strategy, build: F) -> Result<FrequencyTable>
    where
        F: FnOnce() -> Result<FrequencyTable>,
    {
        if self.freq_path().exists() {
            match self.read_freq() {
                Ok(file) if file.strategy == strategy => {
                    tracing::info!(
                        "Loading existing frequency table from '{}'",
                        self.freq_path().display()
                    );
                    return Ok(file.counts);
                }
                Ok(file) => tracing::info!(
                    "Frequency table was counted for {}, recounting for {}",
                    file.strategy,
                    strategy
                ),
                Err(PipelineError::Json(e)) => tracing::warn!(
                    "Ignoring unreadable frequency table '{}': {}",
                    self.freq_path().display(),
                    e
                ),
                Err(e) => return Err(e),
            }
        }
        let freq = build()?;
        self.save_freq(strategy, &freq)?;
        Ok(freq)
    }

    pub fn load_freq(&self) -> Result<FrequencyTable> {
        Ok(self.read_freq()?.counts)
    }

    fn read_freq(&self) -> Result<FreqFile> {
        let json = fs::read_to_string(self.freq_path())?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_freq(&self, strategy: Strategy, freq: &FrequencyTable) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let file = FreqFile { strategy, counts: freq.clone() };
        fs::write(self.freq_path(), serde_json::to_string(&file)?)?;
        tracing::info!("Saved {} word counts to '{}'", freq.len(), self.freq_path().display());
        Ok(())
    }

    /// The saved vocabulary, if there is one and it was built with
    /// `params`. A stale or unreadable file yields `None`.
    pub fn load_vocab_if_current(&self, params: &VocabParams) -> Result<Option<Vocabulary>> {
        if !self.vocab_path().exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(self.vocab_path())?;
        let stored: StoredVocabulary = match serde_json::from_str(&json) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable vocabulary '{}': {}",
                    self.vocab_path().display(),
                    e
                );
                return Ok(None);
            }
        };
        if stored.params != *params {
            tracing::info!(
                "Saved vocabulary was built with {:?}, rebuilding for {:?}",
                stored.params,
                params
            );
            return Ok(None);
        }

        let vocab = Vocabulary::from_file(stored.tables)?;
        tracing::info!(
            "Loaded vocabulary: {} words, {} n-grams",
            vocab.word_count(),
            vocab.ngram_count()
        );
        Ok(Some(vocab))
    }

    pub fn save_vocab(&self, vocab: &Vocabulary, params: &VocabParams) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let stored = StoredVocabulary { params: *params, tables: vocab.to_file() };
        fs::write(self.vocab_path(), serde_json::to_string_pretty(&stored)?)?;
        tracing::info!(
            "Vocabulary built with {} words and {} n-grams, saved to '{}'",
            vocab.word_count(),
            vocab.ngram_count(),
            self.vocab_path().display()
        );
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::Preprocessor;
    use crate::data::vocabulary::RESERVED_TOKENS;
    use crate::domain::traits::TokenEncoder;

    fn table() -> FrequencyTable {
        let mut freq = FrequencyTable::new();
        freq.add_text(&Preprocessor::new(), "red shoes red hat");
        freq
    }

    fn params() -> VocabParams {
        VocabParams {
            strategy:            Strategy::TitleReservoir,
            max_vocabulary_size: 10,
            max_ngram_size:      50,
            ngram_width:         3,
        }
    }

    fn vocab(p: &VocabParams) -> Vocabulary {
        Vocabulary::build(&table(), p.max_vocabulary_size, &RESERVED_TOKENS)
            .unwrap()
            .with_ngrams(&table(), p.max_ngram_size, p.ngram_width)
            .unwrap()
    }

    #[test]
    fn test_freq_is_built_once_then_reused() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path());

        let first = store
            .load_or_build_freq(Strategy::TitleReservoir, || Ok(table()))
            .unwrap();
        assert_eq!(first.count("red"), 2);
        assert!(store.freq_path().exists());

        // The builder must not run again
        let second = store
            .load_or_build_freq(Strategy::TitleReservoir, || Err(PipelineError::config("rebuilt")))
            .unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_freq_of_other_strategy_is_recounted() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path());
        store.save_freq(Strategy::TitleReservoir, &table()).unwrap();

        let mut phrases = FrequencyTable::new();
        phrases.add("suede");
        let recounted = store
            .load_or_build_freq(Strategy::QueryPair, || Ok(phrases.clone()))
            .unwrap();
        assert_eq!(recounted, phrases);

        // Now saved under the new strategy
        let reused = store
            .load_or_build_freq(Strategy::QueryPair, || Err(PipelineError::config("rebuilt")))
            .unwrap();
        assert_eq!(reused, phrases);
    }

    #[test]
    fn test_untagged_freq_file_is_recounted() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path());
        fs::write(store.freq_path(), r#"[["red", 2]]"#).unwrap();

        let freq = store
            .load_or_build_freq(Strategy::TitleReservoir, || Ok(table()))
            .unwrap();
        assert_eq!(freq, table());
    }

    #[test]
    fn test_vocab_round_trip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().join("nested"));

        let vocab = vocab(&params());
        store.save_vocab(&vocab, &params()).unwrap();

        let loaded = store.load_vocab_if_current(&params()).unwrap().unwrap();
        assert_eq!(loaded.len(), vocab.len());
        assert_eq!(loaded.encode("red hats"), vocab.encode("red hats"));
    }

    #[test]
    fn test_vocab_with_other_params_is_not_current() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path());
        store.save_vocab(&vocab(&params()), &params()).unwrap();

        let wider = VocabParams { ngram_width: 4, ..params() };
        assert!(store.load_vocab_if_current(&wider).unwrap().is_none());

        let smaller = VocabParams { max_vocabulary_size: 5, ..params() };
        assert!(store.load_vocab_if_current(&smaller).unwrap().is_none());

        let other = VocabParams { strategy: Strategy::QueryPair, ..params() };
        assert!(store.load_vocab_if_current(&other).unwrap().is_none());
    }

    #[test]
    fn test_missing_or_unstamped_vocab_is_not_current() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path());
        assert!(store.load_vocab_if_current(&params()).unwrap().is_none());

        let bare = serde_json::to_string(&vocab(&params()).to_file()).unwrap();
        fs::write(store.vocab_path(), bare).unwrap();
        assert!(store.load_vocab_if_current(&params()).unwrap().is_none());
    }
}
