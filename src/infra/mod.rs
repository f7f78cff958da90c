// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles persistence concerns shared by the use cases:
//
//   vocab_store.rs   — Frequency table and vocabulary files
//                      Counts words from the corpus if no table
//                      exists, or loads the saved one. Ensures
//                      every run encodes with the same ids.
//
//   config_store.rs  — Pipeline configuration as JSON
//                      Saved next to the vocabulary so a run
//                      can be reproduced exactly.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)

/// Frequency table and vocabulary persistence
pub mod vocab_store;

/// Pipeline configuration persistence
pub mod config_store;
