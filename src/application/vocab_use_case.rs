// ============================================================
// Layer 2 — VocabUseCase
// ============================================================
// Builds the id space the stream encodes with:
//
//   Step 1: Count words in the corpus    (Layer 4 - data)
//           reused from words_freq_counter.json if it was
//           counted for the same strategy
//   Step 2: Keep the most frequent words (Layer 4 - data)
//   Step 3: Build the n-gram fallback    (Layer 4 - data)
//   Step 4: Save vocabulary.json         (Layer 6 - infra)
//
// Which text is counted depends on the strategy:
//   title-reservoir  query and title of well-formed records
//   query-pair       every phrase of every line
//
// load_or_build reuses vocabulary.json only when it was built
// with the current strategy, size caps and n-gram width.

use anyhow::{Context, Result};

use crate::application::config::PipelineConfig;
use crate::data::corpus::CorpusReader;
use crate::data::preprocessor::Preprocessor;
use crate::data::synthesizer::Strategy;
use crate::data::vocabulary::{FrequencyTable, Vocabulary, RESERVED_TOKENS};
use crate::domain::record::{AksisRecord, QueryPairLine};
use crate::infra::vocab_store::{VocabParams, VocabStore};

pub struct VocabUseCase {
    config: PipelineConfig,
}

impl VocabUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Build the vocabulary and save it, overwriting any
    /// previous vocabulary.json.
    pub fn execute(&self) -> Result<Vocabulary> {
        let cfg = &self.config;
        cfg.validate()?;

        let params = vocab_params(cfg)?;
        let store  = VocabStore::new(&cfg.vocab_dir);
        let freq   = store
            .load_or_build_freq(params.strategy, || count_words(cfg))
            .with_context(|| format!("Cannot prepare word counts in '{}'", cfg.vocab_dir.display()))?;

        let vocab = Vocabulary::build(&freq, cfg.max_vocabulary_size, &RESERVED_TOKENS)?
            .with_ngrams(&freq, cfg.max_ngram_size, cfg.ngram_width)?;

        store
            .save_vocab(&vocab, &params)
            .with_context(|| format!("Cannot write '{}'", store.vocab_path().display()))?;
        Ok(vocab)
    }

    /// Load the saved vocabulary if it matches the current
    /// settings, building a new one otherwise.
    pub fn load_or_build(&self) -> Result<Vocabulary> {
        let cfg    = &self.config;
        let params = vocab_params(cfg)?;
        let store  = VocabStore::new(&cfg.vocab_dir);
        if let Some(vocab) = store
            .load_vocab_if_current(&params)
            .with_context(|| format!("Cannot load '{}'", store.vocab_path().display()))?
        {
            return Ok(vocab);
        }
        tracing::info!("No current vocabulary in '{}', building one", store.dir().display());
        self.execute()
    }
}

fn vocab_params(cfg: &PipelineConfig) -> crate::domain::error::Result<VocabParams> {
    Ok(VocabParams {
        strategy:            cfg.strategy()?,
        max_vocabulary_size: cfg.max_vocabulary_size,
        max_ngram_size:      cfg.max_ngram_size,
        ngram_width:         cfg.ngram_width,
    })
}

/// One pass over the corpus, counting the words the chosen
/// strategy will later encode.
fn count_words(cfg: &PipelineConfig) -> crate::domain::error::Result<FrequencyTable> {
    let strategy     = cfg.strategy()?;
    let preprocessor = Preprocessor::new();
    let mut freq     = FrequencyTable::new();
    let mut skipped  = 0u64;

    tracing::info!("Counting words in {} corpus file(s)", cfg.corpus.len());

    let limit = cfg.record_limit.unwrap_or(u64::MAX);
    for (n, line) in CorpusReader::new(&cfg.corpus).enumerate() {
        let n = n as u64;
        if n >= limit {
            break;
        }
        if cfg.log_every > 0 && n % cfg.log_every == 0 {
            tracing::info!("  reading data line {}", n);
        }

        match strategy {
            Strategy::TitleReservoir => match AksisRecord::parse(&line) {
                Ok(record) => freq.add_text(&preprocessor, &record.vocabulary_text()),
                Err(e) => {
                    skipped += 1;
                    tracing::debug!("Skipping line {}: {}", n + 1, e);
                }
            },
            Strategy::QueryPair => {
                for phrase in QueryPairLine::parse(&line).phrases {
                    freq.add_text(&preprocessor, &phrase);
                }
            }
        }
    }

    tracing::info!("Counted {} distinct words ({} malformed lines skipped)", freq.len(), skipped);
    Ok(freq)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::domain::traits::TokenEncoder;
    use crate::infra::vocab_store::{FREQ_FILE, VOCAB_FILE};

    fn config(lines: &[&str], dir: &tempfile::TempDir) -> PipelineConfig {
        let corpus = dir.path().join("corpus.tsv");
        let mut f  = std::fs::File::create(&corpus).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        PipelineConfig {
            corpus: vec![corpus],
            vocab_dir: dir.path().join("vocab"),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_counts_query_and_title_of_valid_records() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(
            &[
                "m\tasin\tRed Shoes\t0.9\t1\t2020\trunning shoes",
                "a\tb",
                "m\tasin\that\t0.1\t1\t2020\tred hat",
            ],
            &dir,
        );

        let vocab = VocabUseCase::new(cfg.clone()).execute().unwrap();
        assert!(cfg.vocab_dir.join(FREQ_FILE).exists());
        assert!(cfg.vocab_dir.join(VOCAB_FILE).exists());

        let freq = VocabStore::new(&cfg.vocab_dir).load_freq().unwrap();
        assert_eq!(freq.count("shoes"), 2);
        assert_eq!(freq.count("red"), 2);
        // Fields other than query and title are not counted
        assert_eq!(freq.count("asin"), 0);

        assert!(vocab.word_id("shoes").is_some());
        assert!(vocab.ngram_count() > 0);
    }

    #[test]
    fn test_query_pair_counts_every_phrase() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&["(17\tblue suede shoes\tsuede boots)"], &dir);
        cfg.strategy = "query-pair".into();

        VocabUseCase::new(cfg.clone()).execute().unwrap();
        let freq = VocabStore::new(&cfg.vocab_dir).load_freq().unwrap();
        assert_eq!(freq.count("suede"), 2);
        assert_eq!(freq.count("17"), 0);
    }

    #[test]
    fn test_load_or_build_reuses_saved_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&["m\tasin\tred\t0.9\t1\t2020\that"], &dir);

        let built  = VocabUseCase::new(cfg.clone()).load_or_build().unwrap();
        let loaded = VocabUseCase::new(cfg).load_or_build().unwrap();
        assert_eq!(built.len(), loaded.len());
        assert_eq!(built.encode("red hat"), loaded.encode("red hat"));
    }

    #[test]
    fn test_changed_settings_rebuild_saved_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(
            &["m\tasin\tred blue green\t0.9\t1\t2020\tbig small tall short wide"],
            &dir,
        );

        let first = VocabUseCase::new(cfg.clone()).load_or_build().unwrap();
        assert_eq!(first.word_count(), 12);
        assert_eq!(first.ngram_width(), 3);

        let narrow = PipelineConfig { max_vocabulary_size: 5, ngram_width: 4, ..cfg.clone() };
        let second = VocabUseCase::new(narrow).load_or_build().unwrap();
        assert_eq!(second.word_count(), 5);
        assert_eq!(second.ngram_width(), 4);

        // Back to the first settings: rebuilt from the cached counts
        let third = VocabUseCase::new(cfg).load_or_build().unwrap();
        assert_eq!(third.word_count(), 12);
        assert_eq!(third.encode("red tall"), first.encode("red tall"));
    }

    #[test]
    fn test_strategy_change_recounts_words() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&["1\tblue suede shoes\tsuede boots"], &dir);

        // Not a valid title-reservoir record: nothing counted
        let first = VocabUseCase::new(cfg.clone()).load_or_build().unwrap();
        assert!(first.word_id("suede").is_none());

        let pairs  = PipelineConfig { strategy: "query-pair".into(), ..cfg };
        let second = VocabUseCase::new(pairs.clone()).load_or_build().unwrap();
        assert!(second.word_id("suede").is_some());
        assert_eq!(VocabStore::new(&pairs.vocab_dir).load_freq().unwrap().count("suede"), 2);
    }

    #[test]
    fn test_invalid_config_fails_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&[], &dir);
        cfg.max_vocabulary_size = 2;
        assert!(VocabUseCase::new(cfg.clone()).execute().is_err());
        assert!(!cfg.vocab_dir.exists());
    }
}
