//! Top-level module for word extraction.
//!
//! - Directional tries with cached branching entropy (`Trie`)
//! - Entropy and PMI lookups (`metrics`)
//! - Corpus indexing into both tries (`CorpusIndexer`)
//! - Scoring and overlap suppression (`WordExtractor`)
//! - Run configuration (`ExtractionInput`)

/// Frequency-annotated trie, walked forward or reversed.
///
/// Built mutably with `TrieBuilder`, then frozen into a read-only `Trie`
/// once every node entropy is computed.
pub mod trie;

/// Boundary entropy and pointwise mutual information.
pub mod metrics;

/// Builds both tries, the per-length counts and the candidate vocabulary.
///
/// Construction is sharded over threads and merged by a single writer.
pub mod indexer;

/// Candidate scoring, suppression of absorbed sub-words and ranking.
pub mod extractor;

/// Parameters of an extraction run.
pub mod extraction_input;
