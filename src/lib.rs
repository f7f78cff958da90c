// ============================================================
// qt-pairs — query/title training pair producer
// ============================================================
// Reads a relevance corpus, synthesises positive and negative
// (query, candidate) pairs with reservoir sampling and streams
// them out as padded, fixed-size batches.
//
//   Layer 1  cli/          command line
//   Layer 2  application/  use cases
//   Layer 3  domain/       records, examples, errors, traits
//   Layer 4  data/         the pipeline itself
//   Layer 6  infra/        JSON persistence

pub mod cli;
pub mod application;
pub mod domain;
pub mod data;
pub mod infra;
