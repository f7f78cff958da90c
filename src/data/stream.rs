// ============================================================
// Layer 4 — Batch Stream
// ============================================================
// The pull-driven end of the pipeline:
//
//   corpus lines
//       │
//       ▼
//   PairSynthesizer   → labelled pairs (positives + negatives)
//       │
//       ▼
//   BatchAssembler    → encode, truncate, drop empty sides
//       │
//       ▼
//   Batch             → yielded once batch_size examples are held
//
// next() pulls as many lines as it needs to fill one batch and
// returns None when the line source is exhausted (or the record
// limit is reached). A trailing partial batch is dropped.
//
// A bad line never ends the stream: its error is logged, the
// line counts as malformed and produces no pairs.
//
// Reference: Rust Book §13 (Iterators)

use std::collections::VecDeque;

use crate::data::batcher::{Batch, BatchAssembler};
use crate::domain::example::LabeledPair;
use crate::domain::traits::PairSynthesizer;

pub const DEFAULT_LOG_EVERY: u64 = 1_000;

// ─── StreamStats ──────────────────────────────────────────────────────────────
/// Counters kept while the stream runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Corpus lines pulled from the source
    pub lines: u64,
    /// Lines rejected by the synthesizer
    pub malformed: u64,
    /// Well-formed records dropped by score dropout
    pub filtered: u64,
    /// Labelled pairs produced by the synthesizer
    pub pairs: u64,
    /// Pairs dropped because one side encoded to nothing
    pub discarded: u64,
    /// Full batches yielded
    pub batches: u64,
}

// ─── BatchStream ──────────────────────────────────────────────────────────────
pub struct BatchStream<I, S> {
    lines:        I,
    synthesizer:  S,
    assembler:    BatchAssembler,
    pending:      VecDeque<LabeledPair>,
    scratch:      Vec<LabeledPair>,
    stats:        StreamStats,
    record_limit: Option<u64>,
    log_every:    u64,
    finished:     bool,
}

impl<I, S> BatchStream<I, S>
where
    I: Iterator<Item = String>,
    S: PairSynthesizer,
{
    pub fn new(lines: I, synthesizer: S, assembler: BatchAssembler) -> Self {
        Self {
            lines,
            synthesizer,
            assembler,
            pending: VecDeque::new(),
            scratch: Vec::new(),
            stats: StreamStats::default(),
            record_limit: None,
            log_every: DEFAULT_LOG_EVERY,
            finished: false,
        }
    }

    /// Stop after reading this many corpus lines.
    pub fn with_record_limit(mut self, limit: Option<u64>) -> Self {
        self.record_limit = limit;
        self
    }

    /// Progress log interval in lines; 0 disables progress logs.
    pub fn with_log_every(mut self, every: u64) -> Self {
        self.log_every = every;
        self
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Pull one line into the pending queue. False once the
    /// source is exhausted.
    fn pull_line(&mut self) -> bool {
        if self.record_limit.is_some_and(|limit| self.stats.lines >= limit) {
            return false;
        }
        let Some(line) = self.lines.next() else {
            return false;
        };

        if self.log_every > 0 && self.stats.lines % self.log_every == 0 {
            tracing::info!("  reading data line {}", self.stats.lines);
        }
        self.stats.lines += 1;

        self.scratch.clear();
        match self.synthesizer.feed(&line, &mut self.scratch) {
            Ok(()) => {
                self.stats.pairs += self.scratch.len() as u64;
                self.pending.extend(self.scratch.drain(..));
            }
            Err(e) => {
                self.stats.malformed += 1;
                tracing::debug!("Skipping line {}: {}", self.stats.lines, e);
            }
        }
        self.stats.filtered = self.synthesizer.filtered();
        true
    }

    fn finish(&mut self) {
        self.finished = true;
        if !self.assembler.is_empty() {
            tracing::debug!(
                "Dropping partial batch of {} examples at end of stream",
                self.assembler.len()
            );
        }
        tracing::info!(
            "Stream finished: {} lines, {} malformed, {} filtered, {} pairs, {} discarded, {} batches",
            self.stats.lines,
            self.stats.malformed,
            self.stats.filtered,
            self.stats.pairs,
            self.stats.discarded,
            self.stats.batches,
        );
    }
}

impl<I, S> Iterator for BatchStream<I, S>
where
    I: Iterator<Item = String>,
    S: PairSynthesizer,
{
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.finished {
            return None;
        }

        loop {
            if let Some(pair) = self.pending.pop_front() {
                if !self.assembler.insert(&pair.query, &pair.candidate, pair.label) {
                    self.stats.discarded += 1;
                    continue;
                }
                if self.assembler.is_full() {
                    self.stats.batches += 1;
                    return Some(self.assembler.current_batch());
                }
                continue;
            }

            if !self.pull_line() {
                self.finish();
                return None;
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rand::{rngs::StdRng, SeedableRng};

    use crate::data::padding::PaddingPolicy;
    use crate::data::preprocessor::Preprocessor;
    use crate::data::synthesizer::{ScoreDropout, TitleReservoirSynthesizer};
    use crate::data::vocabulary::{FrequencyTable, Vocabulary, RESERVED_TOKENS};
    use crate::domain::traits::TokenEncoder;

    fn vocabulary() -> Arc<Vocabulary> {
        let mut freq = FrequencyTable::new();
        freq.add_text(&Preprocessor::new(), "shoe shoes extra red hat");
        Arc::new(Vocabulary::build(&freq, 100, &RESERVED_TOKENS).unwrap())
    }

    fn stream(
        lines: Vec<&str>,
        batch_size: usize,
    ) -> BatchStream<std::vec::IntoIter<String>, TitleReservoirSynthesizer<StdRng>> {
        stream_with_dropout(lines, batch_size, ScoreDropout::disabled())
    }

    fn stream_with_dropout(
        lines: Vec<&str>,
        batch_size: usize,
        dropout: ScoreDropout,
    ) -> BatchStream<std::vec::IntoIter<String>, TitleReservoirSynthesizer<StdRng>> {
        let vocab = vocabulary();
        let assembler =
            BatchAssembler::new(vocab, batch_size, 10, 10, PaddingPolicy::default()).unwrap();
        let synth = TitleReservoirSynthesizer::new(8, 1, dropout, StdRng::seed_from_u64(3))
            .unwrap();
        let lines: Vec<String> = lines.into_iter().map(str::to_string).collect();
        BatchStream::new(lines.into_iter(), synth, assembler)
    }

    #[test]
    fn test_two_records_fill_one_batch() {
        let mut s = stream(
            vec![
                "m\tasin\tshoe\t0.9\t1\t2020\textra",
                "m\tasin\tshoes\t0.9\t1\t2020\textra",
            ],
            4,
        );

        let batch = s.next().expect("one full batch");
        let vocab = vocabulary();
        let shoe  = vocab.encode("shoe")[0] as i32;
        let shoes = vocab.encode("shoes")[0] as i32;
        let extra = vocab.encode("extra")[0] as i32;

        assert_eq!(batch.len(), 4);
        assert_eq!(batch.labels, vec![1, 0, 1, 0]);
        assert_eq!(batch.sources, vec![vec![shoe], vec![shoe], vec![shoes], vec![shoes]]);
        // The reservoir only ever holds "extra"
        assert!(batch.targets.iter().all(|t| t == &vec![extra]));

        assert!(s.next().is_none());
        assert_eq!(s.stats().batches, 1);
    }

    #[test]
    fn test_malformed_lines_do_not_stop_the_stream() {
        let mut s = stream(
            vec![
                "a\tb",
                "m\tasin\tshoe\t0.9\t1\t2020\textra",
                "",
                "m\tasin\tred\t0.9\t1\t2020\that",
            ],
            2,
        );

        assert_eq!(s.by_ref().count(), 2);
        let stats = s.stats();
        assert_eq!(stats.lines, 4);
        assert_eq!(stats.malformed, 2);
    }

    #[test]
    fn test_dropped_records_are_counted_as_filtered() {
        let mut s = stream_with_dropout(
            vec![
                "m\tasin\tshoe\t0.0\t1\t2020\textra",
                "m\tasin\tshoe\t1.0\t1\t2020\textra",
                "m\tasin\tred\t0.0\t1\t2020\that",
            ],
            2,
            ScoreDropout::new(0.9).unwrap(),
        );

        assert_eq!(s.by_ref().count(), 1);
        let stats = s.stats();
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.filtered, 2);
        assert_eq!(stats.malformed, 0);
    }

    #[test]
    fn test_boxed_synthesizer_reports_filtered() {
        let synth: Box<dyn PairSynthesizer> = Box::new(
            TitleReservoirSynthesizer::new(8, 1, ScoreDropout::new(0.9).unwrap(), StdRng::seed_from_u64(3))
                .unwrap(),
        );
        let assembler =
            BatchAssembler::new(vocabulary(), 2, 10, 10, PaddingPolicy::default()).unwrap();
        let lines = vec!["m\tasin\tshoe\t0.0\t1\t2020\textra".to_string()];

        let mut s = BatchStream::new(lines.into_iter(), synth, assembler);
        assert!(s.next().is_none());
        assert_eq!(s.stats().filtered, 1);
    }

    #[test]
    fn test_partial_batch_is_not_yielded() {
        let mut s = stream(vec!["m\tasin\tshoe\t0.9\t1\t2020\textra"], 3);
        assert!(s.next().is_none());
        assert!(s.next().is_none());
        assert_eq!(s.stats().pairs, 2);
    }

    #[test]
    fn test_record_limit_stops_reading() {
        let line = "m\tasin\tshoe\t0.9\t1\t2020\textra";
        let mut s = stream(vec![line; 10], 2).with_record_limit(Some(3));
        assert_eq!(s.by_ref().count(), 3);
        assert_eq!(s.stats().lines, 3);
    }

    #[test]
    fn test_examples_with_empty_side_are_counted() {
        // Title is all punctuation: every pair has an empty target
        let mut s = stream(vec!["m\tasin\tshoe\t0.9\t1\t2020\t!!!"], 1);
        assert!(s.next().is_none());
        assert_eq!(s.stats().discarded, 2);
    }

    #[test]
    fn test_every_batch_is_full_and_capped() {
        let lines: Vec<String> = (0..50)
            .map(|i| format!("m\tasin\tshoe {i}\t0.9\t1\t2020\tred hat extra {i}"))
            .collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();

        for batch in stream(refs, 8) {
            assert_eq!(batch.len(), 8);
            assert!(batch.source_lengths.iter().all(|&l| l <= 10));
            assert!(batch.target_lengths.iter().all(|&l| l <= 10));
        }
    }
}
