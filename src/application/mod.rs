// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (building a vocabulary or streaming batches).
//
// Rules for this layer:
//   - No sampling or padding logic here (that's Layer 4)
//   - No printing here (that's Layer 1)
//   - No direct file formats (that's Layer 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// Every tunable of a pipeline run
pub mod config;

/// Counts corpus words and builds the vocabulary
pub mod vocab_use_case;

/// Streams batches from the corpus
pub mod stream_use_case;
