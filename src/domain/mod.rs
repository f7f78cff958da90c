// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define the core
// concepts of the pipeline:
//
//   - the raw records read from the corpus
//   - the labelled pairs and encoded examples built from them
//   - the error taxonomy shared by every library layer
//   - the seams (traits) the data layer implements
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O
//   - NO randomness
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Error taxonomy (config / validation / parse)
pub mod error;

// Aksis and query-pair records
pub mod record;

// Labels, labelled pairs, encoded examples
pub mod example;

// Core abstractions (traits) that the data layer implements
pub mod traits;
