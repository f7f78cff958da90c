// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `build-vocab` and `stream`,
// and all their configurable flags.
//
// Defaults mirror PipelineConfig::default(). `--config` loads
// a saved pipeline_config.json instead; corpus files given on
// the command line still replace the saved list.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::config::PipelineConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count corpus words and build the vocabulary
    BuildVocab(CorpusArgs),

    /// Stream training batches from the corpus
    Stream(StreamArgs),
}

/// Arguments shared by both commands.
#[derive(Args, Debug)]
pub struct CorpusArgs {
    /// Corpus files, read in the given order
    pub corpus: Vec<PathBuf>,

    /// Load every setting from a saved pipeline_config.json
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the frequency table, vocabulary and config
    #[arg(long, default_value = "vocab")]
    pub vocab_dir: PathBuf,

    /// Pairing strategy: title-reservoir or query-pair
    #[arg(long, default_value = "title-reservoir")]
    pub strategy: String,

    /// Vocabulary size, reserved tokens included
    #[arg(long, default_value_t = 50_000)]
    pub max_vocabulary_size: usize,

    /// Size of the n-gram fallback table
    #[arg(long, default_value_t = 20_000)]
    pub max_ngram_size: usize,

    /// Characters per n-gram
    #[arg(long, default_value_t = 3)]
    pub ngram_width: usize,

    /// Stop after this many corpus lines
    #[arg(long)]
    pub record_limit: Option<u64>,

    /// Log progress every N lines (0 = never)
    #[arg(long, default_value_t = 1_000)]
    pub log_every: u64,
}

/// All arguments for the `stream` command
#[derive(Args, Debug)]
pub struct StreamArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Examples per batch
    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Token cap for the query side
    #[arg(long, default_value_t = 50)]
    pub source_max_seq_length: usize,

    /// Token cap for the candidate side
    #[arg(long, default_value_t = 150)]
    pub target_max_seq_length: usize,

    /// Padding side: pre or post
    #[arg(long, default_value = "pre")]
    pub padding: String,

    /// Truncation side: pre or post
    #[arg(long, default_value = "pre")]
    pub truncating: String,

    /// Negatives sampled per positive
    #[arg(long, default_value_t = 1)]
    pub neg_number: usize,

    /// Score dropout threshold; negative disables it
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    pub dropout: f64,

    /// Items held by each reservoir
    #[arg(long, default_value_t = 65_536)]
    pub reservoir_capacity: usize,

    /// query-pair: start emitting this close to a full reservoir
    #[arg(long, default_value_t = 100)]
    pub warmup_margin: usize,

    /// query-pair: pairs emitted per line at most
    #[arg(long, default_value_t = 5)]
    pub drain_per_line: usize,

    /// query-pair: phrases from each line added to the reservoir
    #[arg(long, default_value_t = 1)]
    pub phrases_per_line: usize,

    /// title-reservoir: drop negatives equal to the positive title
    #[arg(long)]
    pub skip_self_negatives: bool,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Passes over the corpus (0 = forever)
    #[arg(long, default_value_t = 1)]
    pub passes: usize,

    /// Stop after this many batches
    #[arg(long)]
    pub max_batches: Option<u64>,
}

/// Convert CLI CorpusArgs into the application-layer PipelineConfig.
/// The application layer never sees clap types.
impl From<CorpusArgs> for PipelineConfig {
    fn from(a: CorpusArgs) -> Self {
        PipelineConfig {
            corpus:              a.corpus,
            vocab_dir:           a.vocab_dir,
            strategy:            a.strategy,
            max_vocabulary_size: a.max_vocabulary_size,
            max_ngram_size:      a.max_ngram_size,
            ngram_width:         a.ngram_width,
            record_limit:        a.record_limit,
            log_every:           a.log_every,
            ..PipelineConfig::default()
        }
    }
}

impl From<StreamArgs> for PipelineConfig {
    fn from(a: StreamArgs) -> Self {
        PipelineConfig {
            batch_size:            a.batch_size,
            source_max_seq_length: a.source_max_seq_length,
            target_max_seq_length: a.target_max_seq_length,
            padding:               a.padding,
            truncating:            a.truncating,
            neg_number:            a.neg_number,
            dropout:               a.dropout,
            reservoir_capacity:    a.reservoir_capacity,
            warmup_margin:         a.warmup_margin,
            drain_per_line:        a.drain_per_line,
            phrases_per_line:      a.phrases_per_line,
            skip_self_negatives:   a.skip_self_negatives,
            seed:                  a.seed,
            passes:                a.passes,
            ..PipelineConfig::from(a.corpus)
        }
    }
}
