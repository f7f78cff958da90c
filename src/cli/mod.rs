// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All pipeline logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `build-vocab` — counts corpus words, saves the vocabulary
//   2. `stream`      — streams padded batches from the corpus
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, CorpusArgs, StreamArgs};

use crate::application::config::PipelineConfig;
use crate::infra::config_store::load_config;

#[derive(Parser, Debug)]
#[command(
    name = "qt-pairs",
    version,
    about = "Stream query/title training pairs with reservoir-sampled negatives."
)]
pub struct Cli {
    /// The subcommand to run (build-vocab or stream)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::BuildVocab(args) => run_build_vocab(args),
            Commands::Stream(args)     => run_stream(args),
        }
    }
}

fn run_build_vocab(args: CorpusArgs) -> Result<()> {
    use crate::application::vocab_use_case::VocabUseCase;

    let cfg = resolve_config(args.config.clone(), args.corpus.clone(), || args.into())?;
    tracing::info!("Building vocabulary in '{}'", cfg.vocab_dir.display());

    let vocab = VocabUseCase::new(cfg).execute()?;
    println!(
        "Vocabulary saved: {} words, {} n-grams.",
        vocab.word_count(),
        vocab.ngram_count()
    );
    Ok(())
}

fn run_stream(args: StreamArgs) -> Result<()> {
    use crate::application::stream_use_case::StreamUseCase;

    let max_batches = args.max_batches;
    let cfg = resolve_config(args.corpus.config.clone(), args.corpus.corpus.clone(), || args.into())?;

    let stats = StreamUseCase::new(cfg).with_max_batches(max_batches).execute()?;
    println!(
        "Streamed {} batches ({} lines, {} malformed, {} filtered, {} pairs, {} discarded).",
        stats.batches, stats.lines, stats.malformed, stats.filtered, stats.pairs, stats.discarded
    );
    Ok(())
}

/// A saved config file wins over flags; corpus files given on
/// the command line replace the saved list.
fn resolve_config(
    config_file: Option<PathBuf>,
    corpus:      Vec<PathBuf>,
    from_flags:  impl FnOnce() -> PipelineConfig,
) -> Result<PipelineConfig> {
    let Some(path) = config_file else {
        return Ok(from_flags());
    };
    let mut cfg = load_saved(&path)?;
    if !corpus.is_empty() {
        cfg.corpus = corpus;
    }
    Ok(cfg)
}

fn load_saved(path: &Path) -> Result<PipelineConfig> {
    load_config(path).with_context(|| format!("Cannot load config from '{}'", path.display()))
}
