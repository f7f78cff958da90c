// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw corpus lines all the
// way to padded batches and Burn tensors.
//
// The pipeline flows in this order:
//
//   corpus files
//       │
//       ▼
//   CorpusReader      → streams normalised lines, file by file
//       │
//       ▼
//   PairSynthesizer   → positive pairs + reservoir-sampled negatives
//       │
//       ▼
//   Vocabulary        → words (or char n-grams) to token ids
//       │
//       ▼
//   BatchAssembler    → fixed-size, padded batches
//       │
//       ▼
//   BatchStream       → pull-based iterator over batches
//       │
//       ▼
//   PairBatcher       → Burn Int tensors for the model
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads corpus files line by line, over one or more passes
pub mod corpus;

/// Cleans, normalises and tokenises raw text
pub mod preprocessor;

/// Frequency table, word vocabulary and n-gram fallback
pub mod vocabulary;

/// Fixed-capacity reservoir with random eviction
pub mod reservoir;

/// Title-reservoir and query-pair negative sampling strategies
pub mod synthesizer;

/// Padding and truncation of id sequences
pub mod padding;

/// Batch assembly and Burn's Batcher trait
pub mod batcher;

/// Pull-based stream of full batches
pub mod stream;
