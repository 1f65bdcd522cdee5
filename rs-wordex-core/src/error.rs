use std::path::PathBuf;

/// Result type used across the crate, defaulting to [`WordexError`].
pub type Result<T, E = WordexError> = std::result::Result<T, E>;

/// Errors raised while configuring, indexing or loading a corpus.
///
/// Lookups of unknown n-grams and degenerate metrics are *not* errors:
/// they resolve to an entropy of 0 or to [`crate::model::metrics::DEGENERATE_PMI`].
#[derive(Debug, thiserror::Error)]
pub enum WordexError {
	/// The maximum word length must be at least 1.
	#[error("max word length must be >= 1, got {0}")]
	InvalidMaxWordLen(usize),

	/// Thresholds must be finite numbers.
	#[error("threshold must be a finite number, got {0}")]
	InvalidThreshold(f64),

	/// No sentence was handed to the indexer.
	#[error("corpus contains no sentence")]
	EmptyCorpus,

	/// A sentence was not cleaned properly.
	#[error("sentence {index} is malformed: {reason}")]
	MalformedSentence { index: usize, reason: String },

	/// A sharded indexing worker did not report its partial index.
	#[error("indexing worker failed ({received}/{expected} partial indexes received)")]
	WorkerFailed { received: usize, expected: usize },

	/// Two tries built in different directions cannot be merged.
	#[error("cannot merge a {0:?} trie into a {1:?} trie")]
	DirectionMismatch(crate::model::trie::Direction, crate::model::trie::Direction),

	/// Corpus file could not be read, or the cache could not be written.
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// Cached index could not be encoded or decoded.
	#[error("index cache {}: {source}", .path.display())]
	Cache {
		path: PathBuf,
		#[source]
		source: postcard::Error,
	},
}
