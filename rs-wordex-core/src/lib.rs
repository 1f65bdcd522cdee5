//! Statistical word discovery for unsegmented text.
//!
//! This crate finds multi-character words without any dictionary, using:
//! - Boundary entropy: how unpredictable the characters around a span are
//! - Pointwise mutual information: how glued the parts of a span are
//! - An overlap suppression pass preferring the longest cohesive span
//!
//! The typical flow is `text::clean_text` → `CorpusIndexer::build` →
//! `WordExtractor::extract_words`, or the one-shot [`model::extractor::extract`].

/// Corpus indexing, information metrics and word extraction.
pub mod model;

/// Sentence cleaning and character n-grams.
pub mod text;

/// File helpers (corpus reading, cache paths, directory listing).
pub mod io;

/// Error type shared by the crate.
pub mod error;

pub use error::{Result, WordexError};
pub use model::extraction_input::{ExtractionInput, SuppressionPolicy};
pub use model::extractor::{extract, CandidateRecord, ResultTable, WordExtractor};
pub use model::indexer::{CorpusIndex, CorpusIndexer};
