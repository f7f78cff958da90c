// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two seams of the pipeline:
//
//   PairSynthesizer — turns one raw corpus line into zero or
//                     more labelled pairs. Implemented by the
//                     title-reservoir and query-pair strategies.
//
//   TokenEncoder    — turns a text field into token ids.
//                     Implemented by Vocabulary.
//
// The batch stream only sees these traits, so a strategy or an
// encoder can be swapped without touching the stream.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::error::Result;
use crate::domain::example::LabeledPair;

// ─── PairSynthesizer ──────────────────────────────────────────────────────────
/// Any component that manufactures labelled pairs from corpus lines.
///
/// Implementations:
///   - TitleReservoirSynthesizer → one positive plus sampled negative titles
///   - QueryPairSynthesizer      → combinatorial phrase pairs, drained per line
pub trait PairSynthesizer {
    /// Consume one corpus line and append the pairs it produced to `out`.
    ///
    /// A malformed line returns a recoverable `PipelineError::Parse`
    /// and must leave `out` untouched.
    fn feed(&mut self, line: &str, out: &mut Vec<LabeledPair>) -> Result<()>;

    /// Well-formed records dropped by a filter so far.
    fn filtered(&self) -> u64 {
        0
    }
}

/// Lets the strategy be chosen at runtime from configuration.
impl<T: PairSynthesizer + ?Sized> PairSynthesizer for Box<T> {
    fn feed(&mut self, line: &str, out: &mut Vec<LabeledPair>) -> Result<()> {
        (**self).feed(line, out)
    }

    fn filtered(&self) -> u64 {
        (**self).filtered()
    }
}

// ─── TokenEncoder ─────────────────────────────────────────────────────────────
/// Any component that maps text to token ids.
pub trait TokenEncoder {
    /// Encode a text field. Never fails; an empty or all-punctuation
    /// field yields an empty vector.
    fn encode(&self, text: &str) -> Vec<u32>;
}
