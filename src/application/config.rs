// ============================================================
// Layer 2 — Pipeline Configuration
// ============================================================
// Every tunable of a run in one serialisable struct.
// Saved next to the vocabulary as pipeline_config.json so a
// run can be reproduced with `--config`.
//
// validate() is called before any file is opened: a bad value
// fails the run at startup with the offending field named.
//
// Reference: Rust Book §5 (Structs)
//            serde docs (Derive)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::data::padding::PaddingPolicy;
use crate::data::reservoir::DEFAULT_CAPACITY;
use crate::data::stream::DEFAULT_LOG_EVERY;
use crate::data::synthesizer::{
    Strategy, DEFAULT_DRAIN_PER_LINE, DEFAULT_PHRASES_PER_LINE, DEFAULT_WARMUP_MARGIN,
};
use crate::data::vocabulary::{DEFAULT_NGRAM_WIDTH, EOS_ID, RESERVED_TOKENS};
use crate::domain::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Corpus files, read in this order
    pub corpus:                Vec<PathBuf>,
    /// Where the frequency table, vocabulary and config live
    pub vocab_dir:             PathBuf,

    pub max_vocabulary_size:   usize,
    pub max_ngram_size:        usize,
    pub ngram_width:           usize,

    pub batch_size:            usize,
    pub source_max_seq_length: usize,
    pub target_max_seq_length: usize,
    pub padding:               String,
    pub truncating:            String,

    pub strategy:              String,
    pub neg_number:            usize,
    /// Score dropout threshold; negative disables
    pub dropout:               f64,
    pub reservoir_capacity:    usize,
    pub warmup_margin:         usize,
    pub drain_per_line:        usize,
    pub phrases_per_line:      usize,
    pub skip_self_negatives:   bool,
    pub seed:                  Option<u64>,

    /// Passes over the corpus; 0 cycles forever
    pub passes:                usize,
    pub record_limit:          Option<u64>,
    pub log_every:             u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            corpus:                Vec::new(),
            vocab_dir:             PathBuf::from("vocab"),
            max_vocabulary_size:   50_000,
            max_ngram_size:        20_000,
            ngram_width:           DEFAULT_NGRAM_WIDTH,
            batch_size:            128,
            source_max_seq_length: 50,
            target_max_seq_length: 150,
            padding:               "pre".to_string(),
            truncating:            "pre".to_string(),
            strategy:              Strategy::TitleReservoir.to_string(),
            neg_number:            1,
            dropout:               -1.0,
            reservoir_capacity:    DEFAULT_CAPACITY,
            warmup_margin:         DEFAULT_WARMUP_MARGIN,
            drain_per_line:        DEFAULT_DRAIN_PER_LINE,
            phrases_per_line:      DEFAULT_PHRASES_PER_LINE,
            skip_self_negatives:   false,
            seed:                  None,
            passes:                1,
            record_limit:          None,
            log_every:             DEFAULT_LOG_EVERY,
        }
    }
}

impl PipelineConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PipelineError::config("batch_size must be > 0"));
        }
        if self.source_max_seq_length == 0 {
            return Err(PipelineError::config("source_max_seq_length must be > 0"));
        }
        if self.target_max_seq_length == 0 {
            return Err(PipelineError::config("target_max_seq_length must be > 0"));
        }
        if self.reservoir_capacity == 0 {
            return Err(PipelineError::config("reservoir_capacity must be > 0"));
        }
        if self.drain_per_line == 0 {
            return Err(PipelineError::config("drain_per_line must be > 0"));
        }
        if self.phrases_per_line == 0 {
            return Err(PipelineError::config("phrases_per_line must be > 0"));
        }
        if self.dropout.is_nan() || self.dropout >= 1.0 {
            return Err(PipelineError::config(format!(
                "dropout must be < 1.0 (negative disables it), got {}",
                self.dropout
            )));
        }
        if self.max_vocabulary_size < RESERVED_TOKENS.len() {
            return Err(PipelineError::config(format!(
                "max_vocabulary_size must be at least {}, got {}",
                RESERVED_TOKENS.len(),
                self.max_vocabulary_size
            )));
        }
        if self.ngram_width == 0 {
            return Err(PipelineError::config("ngram_width must be > 0"));
        }
        self.padding_policy()?;
        self.strategy()?;
        Ok(())
    }

    pub fn padding_policy(&self) -> Result<PaddingPolicy> {
        PaddingPolicy::from_names(&self.padding, &self.truncating, EOS_ID)
    }

    pub fn strategy(&self) -> Result<Strategy> {
        self.strategy.parse()
    }
}
