// ============================================================
// Layer 4 — Negative-Pair Synthesizers
// ============================================================
// Turn the positive-only corpus into labelled pairs by drawing
// negatives from a reservoir of recently seen text.
//
// Strategy A — title reservoir (Aksis feed)
//   For each accepted (query, title) record:
//     1. add the title to the reservoir
//     2. emit (query, title, positive)
//     3. emit (query, t, negative) for each of neg_number
//        titles t sampled from the reservoir
//
// Strategy B — query pair (siamese feed)
//   Each line carries several related phrases. Every unordered
//   pair of phrases with at least two words each is a positive.
//   Once the phrase reservoir is within `warmup_margin` of full:
//     - the pair is queued as a positive
//     - for each of neg_number sampled phrases, one side of the
//       pair (chosen at random) is queued against it as a
//       negative, unless they are equal
//   After the line, `phrases_per_line` distinct random phrases
//   touched by the line enter the phrase reservoir (if the line
//   touched more than one).
//   Finally up to `drain_per_line` queued pairs are emitted.
//
// Score dropout (Strategy A):
//   accept when threshold < 0, or score > U(threshold, 1).
//   Higher-scored records are more likely to pass.

use std::fmt;
use std::str::FromStr;

use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::reservoir::ReservoirSampler;
use crate::domain::error::{PipelineError, Result};
use crate::domain::example::LabeledPair;
use crate::domain::record::{AksisRecord, QueryPairLine};
use crate::domain::traits::PairSynthesizer;

pub const DEFAULT_WARMUP_MARGIN: usize = 100;
pub const DEFAULT_DRAIN_PER_LINE: usize = 5;
pub const DEFAULT_PHRASES_PER_LINE: usize = 1;

/// Phrases shorter than this many words never form a pair.
const MIN_PHRASE_WORDS: usize = 2;

// ─── Strategy ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    TitleReservoir,
    QueryPair,
}

impl FromStr for Strategy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "title-reservoir" => Ok(Self::TitleReservoir),
            "query-pair" => Ok(Self::QueryPair),
            other => Err(PipelineError::config(format!(
                "strategy '{other}' not understood (expected 'title-reservoir' or 'query-pair')"
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TitleReservoir => f.write_str("title-reservoir"),
            Self::QueryPair => f.write_str("query-pair"),
        }
    }
}

// ─── ScoreDropout ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreDropout {
    threshold: f64,
}

impl ScoreDropout {
    /// A negative threshold disables filtering. Thresholds of 1.0
    /// and above would reject every record and are refused.
    pub fn new(threshold: f64) -> Result<Self> {
        if threshold.is_nan() || threshold >= 1.0 {
            return Err(PipelineError::config(format!(
                "dropout threshold must be < 1.0, got {threshold}"
            )));
        }
        Ok(Self { threshold })
    }

    pub fn disabled() -> Self {
        Self { threshold: -1.0 }
    }

    pub fn is_enabled(&self) -> bool {
        self.threshold >= 0.0
    }

    pub fn accepts<R: Rng + ?Sized>(&self, score: f64, rng: &mut R) -> bool {
        if !self.is_enabled() {
            return true;
        }
        // Uniform in [threshold, 1)
        let draw = self.threshold + (1.0 - self.threshold) * rng.gen::<f64>();
        score > draw
    }
}

// ─── Strategy A ───────────────────────────────────────────────────────────────
pub struct TitleReservoirSynthesizer<R> {
    titles:              ReservoirSampler<String>,
    neg_number:          usize,
    dropout:             ScoreDropout,
    skip_self_negatives: bool,
    rejected_by_score:   u64,
    rng:                 R,
}

impl<R: Rng> TitleReservoirSynthesizer<R> {
    pub fn new(capacity: usize, neg_number: usize, dropout: ScoreDropout, rng: R) -> Result<Self> {
        Ok(Self {
            titles: ReservoirSampler::new(capacity)?,
            neg_number,
            dropout,
            skip_self_negatives: false,
            rejected_by_score: 0,
            rng,
        })
    }

    /// Drop negatives whose candidate equals the positive title.
    pub fn with_skip_self_negatives(mut self, skip: bool) -> Self {
        self.skip_self_negatives = skip;
        self
    }

    pub fn reservoir_len(&self) -> usize {
        self.titles.len()
    }
}

impl<R: Rng> PairSynthesizer for TitleReservoirSynthesizer<R> {
    fn feed(&mut self, line: &str, out: &mut Vec<LabeledPair>) -> Result<()> {
        let record = AksisRecord::parse(line)?;

        if self.dropout.is_enabled() {
            let score = record.score_value()?;
            if !self.dropout.accepts(score, &mut self.rng) {
                self.rejected_by_score += 1;
                return Ok(());
            }
        }

        let AksisRecord { query, title, .. } = record;

        self.titles.add(title.clone(), &mut self.rng);
        let negatives = self.titles.get_n_items(self.neg_number, &mut self.rng);

        out.push(LabeledPair::positive(query.clone(), title.clone()));
        for candidate in negatives {
            if self.skip_self_negatives && candidate == title {
                continue;
            }
            out.push(LabeledPair::negative(query.clone(), candidate));
        }
        Ok(())
    }

    /// Records rejected by score dropout.
    fn filtered(&self) -> u64 {
        self.rejected_by_score
    }
}

// ─── Strategy B ───────────────────────────────────────────────────────────────
pub struct QueryPairSynthesizer<R> {
    phrases:        ReservoirSampler<String>,
    pending:        ReservoirSampler<LabeledPair>,
    neg_number:     usize,
    warmup_margin:  usize,
    drain_per_line: usize,
    phrases_per_line: usize,
    rng:            R,
}

impl<R: Rng> QueryPairSynthesizer<R> {
    /// Both the phrase reservoir and the pending-pair queue hold
    /// at most `capacity` items.
    pub fn new(capacity: usize, neg_number: usize, rng: R) -> Result<Self> {
        Ok(Self {
            phrases: ReservoirSampler::new(capacity)?,
            pending: ReservoirSampler::new(capacity)?,
            neg_number,
            warmup_margin: DEFAULT_WARMUP_MARGIN,
            drain_per_line: DEFAULT_DRAIN_PER_LINE,
            phrases_per_line: DEFAULT_PHRASES_PER_LINE,
            rng,
        })
    }

    /// Start emitting once the phrase reservoir holds more than
    /// `capacity - margin` phrases.
    pub fn with_warmup_margin(mut self, margin: usize) -> Self {
        self.warmup_margin = margin;
        self
    }

    /// Maximum pairs emitted per corpus line.
    pub fn with_drain_per_line(mut self, n: usize) -> Self {
        self.drain_per_line = n;
        self
    }

    /// Phrases from each line added to the reservoir, capped by
    /// the number of distinct phrases the line touched.
    pub fn with_phrases_per_line(mut self, n: usize) -> Self {
        self.phrases_per_line = n;
        self
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn reservoir_len(&self) -> usize {
        self.phrases.len()
    }
}

impl<R: Rng> PairSynthesizer for QueryPairSynthesizer<R> {
    fn feed(&mut self, line: &str, out: &mut Vec<LabeledPair>) -> Result<()> {
        let line = QueryPairLine::parse(line);
        let mut touched: Vec<&str> = Vec::new();

        for (a, b) in line.combinations() {
            if a.split_whitespace().count() < MIN_PHRASE_WORDS
                || b.split_whitespace().count() < MIN_PHRASE_WORDS
            {
                continue;
            }
            for phrase in [a, b] {
                if !touched.contains(&phrase) {
                    touched.push(phrase);
                }
            }

            if !self.phrases.is_nearly_full(self.warmup_margin) {
                continue;
            }
            self.pending.add(LabeledPair::positive(a, b), &mut self.rng);

            for negative in self.phrases.get_n_items(self.neg_number, &mut self.rng) {
                let query = if self.rng.gen_bool(0.5) { a } else { b };
                if query != negative {
                    self.pending.add(LabeledPair::negative(query, negative), &mut self.rng);
                }
            }
        }

        if touched.len() > 1 {
            let n = self.phrases_per_line.min(touched.len());
            for i in sample(&mut self.rng, touched.len(), n) {
                self.phrases.add(touched[i].to_string(), &mut self.rng);
            }
        }

        for _ in 0..self.drain_per_line {
            match self.pending.pop(&mut self.rng) {
                Some(pair) => out.push(pair),
                None => break,
            }
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::example::Label;
    use rand::{rngs::StdRng, SeedableRng};

    fn aksis(query: &str, title: &str, score: &str) -> String {
        format!("m\tasin\t{query}\t{score}\t1\t2020\t{title}")
    }

    fn strategy_a(neg: usize, dropout: ScoreDropout) -> TitleReservoirSynthesizer<StdRng> {
        TitleReservoirSynthesizer::new(16, neg, dropout, StdRng::seed_from_u64(11)).unwrap()
    }

    #[test]
    fn test_strategy_parses_known_names_only() {
        assert_eq!("query-pair".parse::<Strategy>().unwrap(), Strategy::QueryPair);
        assert_eq!(Strategy::TitleReservoir.to_string(), "title-reservoir");
        assert!(matches!("pairs".parse::<Strategy>(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_dropout_extremes() {
        let d       = ScoreDropout::new(0.9).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..1000 {
            assert!(d.accepts(1.0, &mut rng));
            assert!(!d.accepts(0.0, &mut rng));
        }
    }

    #[test]
    fn test_dropout_is_monotonic_in_score() {
        let d = ScoreDropout::new(0.5).unwrap();
        for seed in 0..500 {
            let low  = d.accepts(0.6, &mut StdRng::seed_from_u64(seed));
            let high = d.accepts(0.8, &mut StdRng::seed_from_u64(seed));
            assert!(!low || high);
        }
    }

    #[test]
    fn test_disabled_dropout_accepts_everything() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(ScoreDropout::disabled().accepts(0.0, &mut rng));
        assert!(ScoreDropout::new(-0.5).unwrap().accepts(0.0, &mut rng));
    }

    #[test]
    fn test_dropout_threshold_of_one_is_config_error() {
        assert!(matches!(ScoreDropout::new(1.0), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_strategy_a_emits_positive_then_min_k_negatives() {
        let mut s = strategy_a(2, ScoreDropout::disabled());
        let titles = ["red shoes", "blue hat", "green scarf", "black belt"];

        for (i, title) in titles.iter().enumerate() {
            let mut out = Vec::new();
            s.feed(&aksis("query", title, "0.5"), &mut out).unwrap();

            let expected_negatives = 2.min(s.reservoir_len());
            assert_eq!(out.len(), 1 + expected_negatives, "record {i}");
            assert_eq!(out[0], LabeledPair::positive("query", *title));
            assert!(out[1..].iter().all(|p| p.label == Label::Negative));
        }
    }

    #[test]
    fn test_strategy_a_skips_malformed_line() {
        let mut s   = strategy_a(1, ScoreDropout::disabled());
        let mut out = Vec::new();
        let err     = s.feed("a\tb", &mut out).unwrap_err();
        assert!(err.is_recoverable());
        assert!(out.is_empty());
        assert_eq!(s.reservoir_len(), 0);
    }

    #[test]
    fn test_strategy_a_dropout_rejects_low_scores() {
        let mut s   = strategy_a(1, ScoreDropout::new(0.9).unwrap());
        let mut out = Vec::new();
        s.feed(&aksis("shoe", "title", "0.0"), &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(s.filtered(), 1);

        s.feed(&aksis("shoe", "title", "1.0"), &mut out).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_strategy_a_bad_score_only_matters_with_dropout() {
        let line = aksis("shoe", "title", "high");
        let mut out = Vec::new();
        assert!(strategy_a(1, ScoreDropout::disabled()).feed(&line, &mut out).is_ok());
        assert!(strategy_a(1, ScoreDropout::new(0.1).unwrap()).feed(&line, &mut out).is_err());
    }

    #[test]
    fn test_strategy_a_skip_self_negatives() {
        let mut s = strategy_a(1, ScoreDropout::disabled()).with_skip_self_negatives(true);
        let mut out = Vec::new();
        s.feed(&aksis("shoe", "extra", "0.9"), &mut out).unwrap();
        s.feed(&aksis("shoes", "extra", "0.9"), &mut out).unwrap();
        assert_eq!(
            out,
            vec![
                LabeledPair::positive("shoe", "extra"),
                LabeledPair::positive("shoes", "extra"),
            ]
        );
    }

    fn strategy_b(capacity: usize, neg: usize) -> QueryPairSynthesizer<StdRng> {
        QueryPairSynthesizer::new(capacity, neg, StdRng::seed_from_u64(5)).unwrap()
    }

    #[test]
    fn test_strategy_b_waits_for_reservoir() {
        // 8 - 2 = 6 phrases needed before anything is queued
        let mut s   = strategy_b(8, 1).with_warmup_margin(2);
        let mut out = Vec::new();
        s.feed("1\tred running shoes\tblue running shoes", &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(s.reservoir_len(), 1);
        assert_eq!(s.pending_len(), 0);
    }

    #[test]
    fn test_strategy_b_emits_after_warmup() {
        let mut s   = strategy_b(8, 2);
        let mut out = Vec::new();
        // The default margin exceeds the capacity: warm after one phrase
        s.feed("1\tred running shoes\tblue running shoes", &mut out).unwrap();
        s.feed("2\tnike air max\tnike air force", &mut out).unwrap();

        assert!(out.contains(&LabeledPair::positive("nike air max", "nike air force")));
        assert!(out.iter().any(|p| p.label == Label::Negative));
        for pair in out.iter().filter(|p| p.label == Label::Negative) {
            assert_ne!(pair.query, pair.candidate);
        }
    }

    #[test]
    fn test_strategy_b_adds_configured_phrases_per_line() {
        let line = "1\tred running shoes\tblue running shoes\tgreen running shoes";

        let mut one = strategy_b(8, 1).with_warmup_margin(0);
        one.feed(line, &mut Vec::new()).unwrap();
        assert_eq!(one.reservoir_len(), 1);

        let mut two = strategy_b(8, 1).with_warmup_margin(0).with_phrases_per_line(2);
        two.feed(line, &mut Vec::new()).unwrap();
        assert_eq!(two.reservoir_len(), 2);

        // Capped by the three phrases the line touched
        let mut all = strategy_b(8, 1).with_warmup_margin(0).with_phrases_per_line(10);
        all.feed(line, &mut Vec::new()).unwrap();
        assert_eq!(all.reservoir_len(), 3);
    }

    #[test]
    fn test_strategy_b_skips_single_word_phrases() {
        let mut s   = strategy_b(8, 1);
        let mut out = Vec::new();
        s.feed("1\tshoes\tsneakers\trunning shoes", &mut out).unwrap();
        // No valid pair, nothing touched
        assert_eq!(s.reservoir_len(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_strategy_b_drain_is_capped_per_line() {
        let mut s = strategy_b(64, 4).with_drain_per_line(3);
        let mut out = Vec::new();
        s.feed("0\tseed phrase one\tseed phrase two", &mut out).unwrap();

        out.clear();
        s.feed("1\ta b\tc d\te f\tg h\ti j", &mut out).unwrap();
        assert_eq!(out.len(), 3);
        assert!(s.pending_len() > 0);

        // Lines without pairs still drain the queue
        let before = s.pending_len();
        out.clear();
        s.feed("single", &mut out).unwrap();
        assert_eq!(out.len(), before.min(3));
    }
}
