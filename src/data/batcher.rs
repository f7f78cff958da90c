// ============================================================
// Layer 4 — Batch Assembler & Pair Batcher
// ============================================================
// Collects encoded (source, target, label) examples into a
// fixed-size batch and pads them into rectangular arrays.
//
// A Batch is five parallel sequences of length batch_size:
//
//   sources         [N, S]  source ids, padded
//   source_lengths  [N]     unpadded source lengths
//   targets         [N, T]  target ids, padded
//   target_lengths  [N]     unpadded target lengths
//   labels          [N]     1 = positive, 0 = negative
//
// Row i of every field describes the same example.
//
// Ring-buffer reuse:
//   insert() clears a full batch before appending, so the
//   caller must read current_batch() as soon as len() reaches
//   batch_size. BatchStream does exactly that.
//
// PairBatcher implements Burn's Batcher trait, turning the
// same examples into Int tensors for the model collaborator.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use std::sync::Arc;

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::padding::{prepare_batch, prepare_pair_batch, PaddingPolicy};
use crate::domain::error::{PipelineError, Result};
use crate::domain::example::{EncodedExample, Label};
use crate::domain::traits::TokenEncoder;

// ─── Batch ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub sources:        Vec<Vec<i32>>,
    pub source_lengths: Vec<i32>,
    pub targets:        Vec<Vec<i32>>,
    pub target_lengths: Vec<i32>,
    pub labels:         Vec<i32>,
}

impl Batch {
    /// Pad a set of encoded examples. Each side is padded to its
    /// own longest sequence.
    pub fn from_examples(examples: &[EncodedExample], policy: &PaddingPolicy) -> Self {
        let sources: Vec<&[u32]> = examples.iter().map(|e| e.source_ids.as_slice()).collect();
        let targets: Vec<&[u32]> = examples.iter().map(|e| e.target_ids.as_slice()).collect();

        // Both sides come from the same examples, so the counts match
        let src = prepare_batch(&sources, None, policy);
        let tgt = prepare_batch(&targets, None, policy);

        Self {
            sources:        src.ids,
            source_lengths: src.lengths,
            targets:        tgt.ids,
            target_lengths: tgt.lengths,
            labels:         examples.iter().map(|e| e.label.as_i32()).collect(),
        }
    }

    /// Pad raw source/target id sequences with explicit labels.
    /// Unequal counts across the three inputs are a validation error.
    pub fn from_sequences(
        sources:        &[Vec<u32>],
        targets:        &[Vec<u32>],
        labels:         &[Label],
        source_max_len: Option<usize>,
        target_max_len: Option<usize>,
        policy:         &PaddingPolicy,
    ) -> Result<Self> {
        let (src, tgt) = prepare_pair_batch(sources, targets, source_max_len, target_max_len, policy)?;
        if labels.len() != src.lengths.len() {
            return Err(PipelineError::validation(format!(
                "label count ({}) does not match sequence count ({})",
                labels.len(),
                src.lengths.len()
            )));
        }

        Ok(Self {
            sources:        src.ids,
            source_lengths: src.lengths,
            targets:        tgt.ids,
            target_lengths: tgt.lengths,
            labels:         labels.iter().map(|l| l.as_i32()).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Count of positive labels.
    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l == Label::Positive.as_i32()).count()
    }

    /// Copy the batch onto `device` as Burn tensors.
    /// The batch must not be empty.
    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> PairBatch<B> {
        PairBatch {
            sources:        int_matrix::<B>(&self.sources, device),
            source_lengths: Tensor::<B, 1, Int>::from_ints(self.source_lengths.as_slice(), device),
            targets:        int_matrix::<B>(&self.targets, device),
            target_lengths: Tensor::<B, 1, Int>::from_ints(self.target_lengths.as_slice(), device),
            labels:         Tensor::<B, 1, Int>::from_ints(self.labels.as_slice(), device),
        }
    }
}

/// Flatten a rectangular id matrix and reshape it to [rows, width].
fn int_matrix<B: Backend>(rows: &[Vec<i32>], device: &B::Device) -> Tensor<B, 2, Int> {
    let width = rows.first().map_or(0, Vec::len);
    let flat: Vec<i32> = rows.iter().flatten().copied().collect();

    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape([rows.len(), width])
}

// ─── BatchAssembler ───────────────────────────────────────────────────────────
pub struct BatchAssembler {
    encoder:        Arc<dyn TokenEncoder + Send + Sync>,
    batch_size:     usize,
    source_max_len: usize,
    target_max_len: usize,
    policy:         PaddingPolicy,
    examples:       Vec<EncodedExample>,
}

impl BatchAssembler {
    pub fn new(
        encoder:        Arc<dyn TokenEncoder + Send + Sync>,
        batch_size:     usize,
        source_max_len: usize,
        target_max_len: usize,
        policy:         PaddingPolicy,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(PipelineError::config("batch_size must be > 0"));
        }
        if source_max_len == 0 || target_max_len == 0 {
            return Err(PipelineError::config(format!(
                "max sequence lengths must be > 0 (source {source_max_len}, target {target_max_len})"
            )));
        }
        Ok(Self {
            encoder,
            batch_size,
            source_max_len,
            target_max_len,
            policy,
            examples: Vec::with_capacity(batch_size),
        })
    }

    /// Encode, truncate and append one example. Returns false
    /// when either side encodes to nothing and the example is
    /// discarded.
    pub fn insert(&mut self, source: &str, target: &str, label: Label) -> bool {
        if self.is_full() {
            self.clear();
        }

        let source_ids = self.encode_capped(source, self.source_max_len);
        let target_ids = self.encode_capped(target, self.target_max_len);
        let example    = EncodedExample { source_ids, target_ids, label };

        if example.is_empty() {
            return false;
        }
        self.examples.push(example);
        true
    }

    fn encode_capped(&self, text: &str, cap: usize) -> Vec<u32> {
        let ids = self.encoder.encode(text);
        self.policy.truncate(&ids, cap).to_vec()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.examples.len() == self.batch_size
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn clear(&mut self) {
        self.examples.clear();
    }

    /// The examples currently held, unpadded.
    pub fn examples(&self) -> &[EncodedExample] {
        &self.examples
    }

    /// Padded view of the examples inserted so far.
    pub fn current_batch(&self) -> Batch {
        Batch::from_examples(&self.examples, &self.policy)
    }
}

// ─── PairBatch / PairBatcher ──────────────────────────────────────────────────
/// A batch on a Burn device. All tensors have batch_size as
/// their first dimension.
#[derive(Debug, Clone)]
pub struct PairBatch<B: Backend> {
    /// Source ids — shape: [batch_size, source_width]
    pub sources: Tensor<B, 2, Int>,

    /// Source lengths — shape: [batch_size]
    pub source_lengths: Tensor<B, 1, Int>,

    /// Target ids — shape: [batch_size, target_width]
    pub targets: Tensor<B, 2, Int>,

    /// Target lengths — shape: [batch_size]
    pub target_lengths: Tensor<B, 1, Int>,

    /// Labels — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct PairBatcher<B: Backend> {
    /// The device to create tensors on
    pub device: B::Device,
    pub policy: PaddingPolicy,
}

impl<B: Backend> PairBatcher<B> {
    pub fn new(device: B::Device, policy: PaddingPolicy) -> Self {
        Self { device, policy }
    }
}

impl<B: Backend> Batcher<EncodedExample, PairBatch<B>> for PairBatcher<B> {
    fn batch(&self, items: Vec<EncodedExample>) -> PairBatch<B> {
        Batch::from_examples(&items, &self.policy).to_tensors(&self.device)
    }
}
