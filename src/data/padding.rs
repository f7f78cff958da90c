// ============================================================
// Layer 4 — Padding & Truncation
// ============================================================
// Turns variable-length id sequences into a rectangular
// matrix plus a parallel vector of true lengths.
//
//   width     = caller cap, or the longest sequence in the set
//   truncate  = keep the trailing `width` ids (pre, default)
//               or the leading ones (post)
//   pad       = fill on the left (pre, default) so sequences
//               are right-aligned, or on the right (post)
//   fill      = the </s> id by default
//
// Example, fill 0, pre-padding:
//   [[1, 2, 3], [4]]  →  [[1, 2, 3], [0, 0, 4]]
//
// Output ids are i32, matching the model's integer inputs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::vocabulary::EOS_ID;
use crate::domain::error::{PipelineError, Result};

// ─── Side ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Pre,
    Post,
}

impl FromStr for Side {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pre" => Ok(Self::Pre),
            "post" => Ok(Self::Post),
            other => Err(PipelineError::config(format!(
                "padding/truncating mode '{other}' not understood (expected 'pre' or 'post')"
            ))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre => f.write_str("pre"),
            Self::Post => f.write_str("post"),
        }
    }
}

// ─── PaddingPolicy ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddingPolicy {
    pub padding:    Side,
    pub truncating: Side,
    pub value:      u32,
}

impl Default for PaddingPolicy {
    fn default() -> Self {
        Self {
            padding:    Side::Pre,
            truncating: Side::Pre,
            value:      EOS_ID,
        }
    }
}

impl PaddingPolicy {
    /// Build from mode names; an unknown name is a config error.
    pub fn from_names(padding: &str, truncating: &str, value: u32) -> Result<Self> {
        Ok(Self {
            padding: padding.parse()?,
            truncating: truncating.parse()?,
            value,
        })
    }

    pub fn with_value(mut self, value: u32) -> Self {
        self.value = value;
        self
    }

    /// The part of `seq` kept under a cap of `width`.
    pub fn truncate<'a>(&self, seq: &'a [u32], width: usize) -> &'a [u32] {
        if seq.len() <= width {
            return seq;
        }
        match self.truncating {
            Side::Pre => &seq[seq.len() - width..],
            Side::Post => &seq[..width],
        }
    }

    /// Truncate then pad one sequence to exactly `width` ids.
    pub fn pad(&self, seq: &[u32], width: usize) -> Vec<i32> {
        let kept = self.truncate(seq, width);
        let mut row = vec![self.value as i32; width];
        let offset = match self.padding {
            Side::Pre => width - kept.len(),
            Side::Post => 0,
        };
        for (slot, &id) in row[offset..].iter_mut().zip(kept) {
            *slot = id as i32;
        }
        row
    }
}

// ─── Batch helpers ────────────────────────────────────────────────────────────
/// One padded side of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaddedBatch {
    /// `[rows, width]` id matrix
    pub ids:     Vec<Vec<i32>>,
    /// Unpadded length of each row after truncation
    pub lengths: Vec<i32>,
}

impl PaddedBatch {
    pub fn width(&self) -> usize {
        self.ids.first().map_or(0, Vec::len)
    }
}

/// Pad every sequence to `maxlen`, or to the longest sequence.
pub fn pad_sequences<S: AsRef<[u32]>>(
    seqs:   &[S],
    maxlen: Option<usize>,
    policy: &PaddingPolicy,
) -> Vec<Vec<i32>> {
    let width = maxlen.unwrap_or_else(|| seqs.iter().map(|s| s.as_ref().len()).max().unwrap_or(0));
    seqs.iter().map(|s| policy.pad(s.as_ref(), width)).collect()
}

/// Truncate to `maxlen` (if any), then pad to the longest
/// remaining sequence.
pub fn prepare_batch<S: AsRef<[u32]>>(
    seqs:   &[S],
    maxlen: Option<usize>,
    policy: &PaddingPolicy,
) -> PaddedBatch {
    let cap = maxlen.unwrap_or(usize::MAX);
    let lengths: Vec<usize> = seqs.iter().map(|s| s.as_ref().len().min(cap)).collect();
    let width = lengths.iter().copied().max().unwrap_or(0);

    PaddedBatch {
        ids:     pad_sequences(seqs, Some(width), policy),
        lengths: lengths.into_iter().map(|l| l as i32).collect(),
    }
}

/// Source and target sides of a paired batch. The two sides
/// must hold the same number of sequences.
pub fn prepare_pair_batch<S: AsRef<[u32]>, T: AsRef<[u32]>>(
    sources:       &[S],
    targets:       &[T],
    source_maxlen: Option<usize>,
    target_maxlen: Option<usize>,
    policy:        &PaddingPolicy,
) -> Result<(PaddedBatch, PaddedBatch)> {
    if sources.len() != targets.len() {
        return Err(PipelineError::validation(format!(
            "source count ({}) does not match target count ({})",
            sources.len(),
            targets.len()
        )));
    }
    Ok((
        prepare_batch(sources, source_maxlen, policy),
        prepare_batch(targets, target_maxlen, policy),
    ))
}
