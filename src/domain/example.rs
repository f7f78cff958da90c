// ============================================================
// Layer 3 — Training Example Types
// ============================================================
// A labelled pair is what the negative-pair synthesizers emit:
// the query, a candidate (title or phrase) and whether the
// candidate was observed with the query (positive) or drawn
// from the reservoir (negative).
//
// An encoded example is the same pair after the token encoder
// has turned both sides into id sequences. It lives only until
// the batch assembler packs it into a batch.

use serde::{Deserialize, Serialize};

// ─── Label ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Negative = 0,
    Positive = 1,
}

impl Label {
    /// Numeric label fed to the model
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

// ─── LabeledPair ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabeledPair {
    pub query:     String,
    pub candidate: String,
    pub label:     Label,
}

impl LabeledPair {
    pub fn new(query: impl Into<String>, candidate: impl Into<String>, label: Label) -> Self {
        Self {
            query:     query.into(),
            candidate: candidate.into(),
            label,
        }
    }

    pub fn positive(query: impl Into<String>, candidate: impl Into<String>) -> Self {
        Self::new(query, candidate, Label::Positive)
    }

    pub fn negative(query: impl Into<String>, candidate: impl Into<String>) -> Self {
        Self::new(query, candidate, Label::Negative)
    }
}

// ─── EncodedExample ───────────────────────────────────────────────────────────
/// Token ids for both sides, already truncated to their caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedExample {
    pub source_ids: Vec<u32>,
    pub target_ids: Vec<u32>,
    pub label:      Label,
}

impl EncodedExample {
    /// An example with an empty side carries no signal.
    pub fn is_empty(&self) -> bool {
        self.source_ids.is_empty() || self.target_ids.is_empty()
    }
}
