// ============================================================
// Layer 2 — StreamUseCase
// ============================================================
// Runs the batch stream end to end:
//
//   Step 1: Validate and save the config   (Layer 6 - infra)
//   Step 2: Load or build the vocabulary   (Layer 6 - infra)
//   Step 3: Build the chosen synthesizer   (Layer 4 - data)
//   Step 4: Open the corpus                (Layer 4 - data)
//   Step 5: Pull batches, move them onto
//           the CPU backend as tensors     (Layer 4 - data)
//
// The model itself lives outside this crate; here every batch
// is converted and its shapes logged.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §13 (Iterators)

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use burn::backend::{ndarray::NdArrayDevice, NdArray};
use rand::{rngs::StdRng, SeedableRng};

use crate::application::config::PipelineConfig;
use crate::application::vocab_use_case::VocabUseCase;
use crate::data::batcher::BatchAssembler;
use crate::data::corpus::CorpusReader;
use crate::data::stream::{BatchStream, StreamStats};
use crate::data::synthesizer::{
    QueryPairSynthesizer, ScoreDropout, Strategy, TitleReservoirSynthesizer,
};
use crate::domain::traits::PairSynthesizer;
use crate::infra::config_store::save_config;

/// CPU backend the batches are converted for.
type StreamBackend = NdArray;

pub struct StreamUseCase {
    config:      PipelineConfig,
    max_batches: Option<u64>,
}

impl StreamUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, max_batches: None }
    }

    /// Stop after this many batches.
    pub fn with_max_batches(mut self, max_batches: Option<u64>) -> Self {
        self.max_batches = max_batches;
        self
    }

    pub fn execute(&self) -> Result<StreamStats> {
        let cfg = &self.config;

        // ── Step 1: Config ────────────────────────────────────────────────────
        cfg.validate()?;
        if cfg.corpus.is_empty() {
            bail!("No corpus files given");
        }
        save_config(&cfg.vocab_dir, cfg)
            .with_context(|| format!("Cannot save config to '{}'", cfg.vocab_dir.display()))?;

        // ── Step 2: Vocabulary ────────────────────────────────────────────────
        let vocab = Arc::new(VocabUseCase::new(cfg.clone()).load_or_build()?);
        tracing::info!("Vocabulary holds {} ids", vocab.len());

        // ── Step 3: Synthesizer and assembler ─────────────────────────────────
        let synthesizer = build_synthesizer(cfg)?;
        let assembler   = BatchAssembler::new(
            vocab,
            cfg.batch_size,
            cfg.source_max_seq_length,
            cfg.target_max_seq_length,
            cfg.padding_policy()?,
        )?;

        // ── Step 4: Corpus ────────────────────────────────────────────────────
        let reader = CorpusReader::new(&cfg.corpus).with_passes(cfg.passes);
        let mut stream = BatchStream::new(reader, synthesizer, assembler)
            .with_record_limit(cfg.record_limit)
            .with_log_every(cfg.log_every);

        // ── Step 5: Pull batches ──────────────────────────────────────────────
        let device = NdArrayDevice::default();
        while let Some(batch) = stream.next() {
            let tensors = batch.to_tensors::<StreamBackend>(&device);
            tracing::debug!(
                "Batch: sources {:?}, targets {:?}, {} positive",
                tensors.sources.dims(),
                tensors.targets.dims(),
                batch.positives()
            );

            if self
                .max_batches
                .is_some_and(|max| stream.stats().batches >= max)
            {
                tracing::info!("Reached the batch limit");
                break;
            }
        }

        let stats = stream.stats();
        tracing::info!(
            "Streamed {} batches from {} lines ({} malformed, {} filtered)",
            stats.batches,
            stats.lines,
            stats.malformed,
            stats.filtered
        );
        Ok(stats)
    }
}

/// Build the configured strategy. A seed makes the run
/// reproducible; without one the generator is seeded from the OS.
pub fn build_synthesizer(cfg: &PipelineConfig) -> Result<Box<dyn PairSynthesizer>> {
    let rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let synthesizer: Box<dyn PairSynthesizer> = match cfg.strategy()? {
        Strategy::TitleReservoir => Box::new(
            TitleReservoirSynthesizer::new(
                cfg.reservoir_capacity,
                cfg.neg_number,
                ScoreDropout::new(cfg.dropout)?,
                rng,
            )?
            .with_skip_self_negatives(cfg.skip_self_negatives),
        ),
        Strategy::QueryPair => {
            if cfg.dropout >= 0.0 {
                tracing::warn!("Score dropout does not apply to the query-pair strategy");
            }
            Box::new(
                QueryPairSynthesizer::new(cfg.reservoir_capacity, cfg.neg_number, rng)?
                    .with_warmup_margin(cfg.warmup_margin)
                    .with_drain_per_line(cfg.drain_per_line)
                    .with_phrases_per_line(cfg.phrases_per_line),
            )
        }
    };
    tracing::info!("Using the {} strategy", cfg.strategy);
    Ok(synthesizer)
}
