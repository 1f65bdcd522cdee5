use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::trie::{Direction, Trie, TrieBuilder};
use crate::error::{Result, WordexError};
use crate::io::{build_output_path, read_file};
use crate::text::{char_ngrams, clean_text};

/// Total number of n-grams (with repetition) observed for each length.
///
/// Used as the denominator of every probability estimate.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LengthCounts {
	counts: BTreeMap<usize, u64>,
}

impl LengthCounts {
	/// Count for n-grams of `len` characters; 0 if none were seen.
	pub fn get(&self, len: usize) -> u64 {
		self.counts.get(&len).copied().unwrap_or(0)
	}

	pub fn add(&mut self, len: usize, occurrences: u64) {
		*self.counts.entry(len).or_insert(0) += occurrences;
	}

	pub fn merge(&mut self, other: LengthCounts) {
		for (len, occurrences) in other.counts {
			self.add(len, occurrences);
		}
	}

	/// `(length, count)` pairs by ascending length.
	pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
		self.counts.iter().map(|(len, occurrences)| (*len, *occurrences))
	}
}

/// Candidate pool: distinct n-grams of at least 2 characters.
///
/// Ordered by length, then lexicographically. This is the order in which
/// candidates are scored, which the suppression policy depends on.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Vocabulary {
	entries: Vec<String>,
}

impl Vocabulary {
	fn from_buckets(buckets: BTreeMap<usize, BTreeSet<String>>) -> Self {
		let entries = buckets
			.into_iter()
			.filter(|(len, _)| *len >= 2)
			.flat_map(|(_, ngrams)| ngrams)
			.collect();
		Self { entries }
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(String::as_str)
	}

	pub fn as_slice(&self) -> &[String] {
		&self.entries
	}

	pub fn contains(&self, ngram: &str) -> bool {
		let key = (ngram.chars().count(), ngram);
		self.entries
			.binary_search_by(|entry| (entry.chars().count(), entry.as_str()).cmp(&key))
			.is_ok()
	}
}

/// Frozen statistics of a corpus: both tries, length counts and vocabulary.
///
/// # Invariants
/// - Both tries hold every n-gram of length `1..=max_gram_len`
/// - Entropies are set on both tries
#[derive(Serialize, Deserialize, Debug)]
pub struct CorpusIndex {
	max_gram_len: usize,
	forward: Trie,
	reversed: Trie,
	length_counts: LengthCounts,
	vocabulary: Vocabulary,
}

impl CorpusIndex {
	/// Longest n-gram indexed (longest word + 1).
	pub fn max_gram_len(&self) -> usize {
		self.max_gram_len
	}

	/// Trie walked left to right: right context of a span.
	pub fn forward(&self) -> &Trie {
		&self.forward
	}

	/// Trie walked right to left: left context of a span.
	pub fn reversed(&self) -> &Trie {
		&self.reversed
	}

	pub fn length_counts(&self) -> &LengthCounts {
		&self.length_counts
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	/// Loads the index of a raw text file, building it if needed.
	///
	/// - The file is read line by line and cleaned with [`clean_text`].
	/// - The frozen index is cached next to the file as `<stem>.<max_word_len>.bin`
	///   (`postcard` encoding) and reused on later calls.
	/// - A cache that cannot be decoded, or that was built for another
	///   length, is rebuilt.
	///
	/// # Errors
	/// Configuration errors, I/O errors, or failure to write the cache.
	pub fn from_file<P: AsRef<Path>>(filepath: P, max_word_len: usize) -> Result<Self> {
		let indexer = CorpusIndexer::new(max_word_len)?;
		let cache_path = build_output_path(&filepath, &format!("{max_word_len}.bin"))?;

		if cache_path.exists() {
			let bytes = std::fs::read(&cache_path)?;
			match postcard::from_bytes::<CorpusIndex>(&bytes) {
				Ok(index) if index.max_gram_len == indexer.max_gram_len() => {
					info!("loaded cached index {}", cache_path.display());
					return Ok(index);
				}
				Ok(_) => warn!("cached index {} has another max length, rebuilding", cache_path.display()),
				Err(e) => warn!("cached index {} is unreadable ({e}), rebuilding", cache_path.display()),
			}
		}

		let sentences: Vec<String> = read_file(&filepath)?
			.iter()
			.flat_map(|line| clean_text(line))
			.collect();
		let index = indexer.build(&sentences)?;

		let bytes = postcard::to_stdvec(&index)
			.map_err(|source| WordexError::Cache { path: cache_path.clone(), source })?;
		std::fs::write(&cache_path, bytes)?;

		Ok(index)
	}
}

/// Statistics gathered by a single worker before merging.
struct PartialIndex {
	forward: TrieBuilder,
	reversed: TrieBuilder,
	length_counts: LengthCounts,
	buckets: BTreeMap<usize, BTreeSet<String>>,
}

impl PartialIndex {
	fn new() -> Self {
		Self {
			forward: TrieBuilder::new(Direction::Forward),
			reversed: TrieBuilder::new(Direction::Reversed),
			length_counts: LengthCounts::default(),
			buckets: BTreeMap::new(),
		}
	}

	/// Inserts every n-gram of `sentence`, for n = 1 to `max_gram_len`.
	fn add_sentence(&mut self, sentence: &str, max_gram_len: usize) {
		for n in 1..=max_gram_len {
			let ngrams = char_ngrams(sentence, n);
			if ngrams.is_empty() {
				break;
			}
			self.length_counts.add(n, ngrams.len() as u64);
			for ngram in ngrams {
				self.forward.insert(ngram, n);
				self.reversed.insert(ngram, n);
				if n >= 2 {
					self.buckets.entry(n).or_default().insert(ngram.to_owned());
				}
			}
		}
	}

	fn merge(&mut self, other: PartialIndex) -> Result<()> {
		self.forward.merge(other.forward)?;
		self.reversed.merge(other.reversed)?;
		self.length_counts.merge(other.length_counts);
		for (n, ngrams) in other.buckets {
			self.buckets.entry(n).or_default().extend(ngrams);
		}
		Ok(())
	}
}

/// Builds a [`CorpusIndex`] from cleaned sentences.
///
/// To observe both the inner cohesion and the boundary context of an
/// n-character word, (n+1)-grams are needed: the indexer stores n-grams up
/// to `max_word_len + 1`.
#[derive(Clone, Copy, Debug)]
pub struct CorpusIndexer {
	max_word_len: usize,
}

impl CorpusIndexer {
	/// # Errors
	/// Returns an error if `max_word_len` is 0.
	pub fn new(max_word_len: usize) -> Result<Self> {
		if max_word_len == 0 {
			return Err(WordexError::InvalidMaxWordLen(max_word_len));
		}
		Ok(Self { max_word_len })
	}

	pub fn max_word_len(&self) -> usize {
		self.max_word_len
	}

	pub fn max_gram_len(&self) -> usize {
		self.max_word_len + 1
	}

	/// Indexes `sentences` and freezes both tries.
	///
	/// # Behavior
	/// - Validates the whole corpus before any work starts.
	/// - Splits sentences into chunks (based on CPU cores * factor).
	/// - Spawns threads building partial indexes for each chunk.
	/// - Merges all partial indexes sequentially, then sets entropies once.
	///
	/// # Errors
	/// - [`WordexError::EmptyCorpus`] if there is no sentence.
	/// - [`WordexError::MalformedSentence`] if a sentence is empty or holds
	///   whitespace or control characters.
	/// - [`WordexError::WorkerFailed`] if a worker thread died.
	pub fn build<S: AsRef<str>>(&self, sentences: &[S]) -> Result<CorpusIndex> {
		validate_corpus(sentences)?;

		let tic = Instant::now();
		let max_gram_len = self.max_gram_len();
		info!("indexing {} sentences, n-grams up to {max_gram_len}", sentences.len());

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = sentences.len().div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		let mut expected = 0;
		for chunk in sentences.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.iter().map(|s| s.as_ref().to_owned()).collect();

			thread::spawn(move || {
				let mut partial = PartialIndex::new();
				for sentence in &chunk {
					partial.add_sentence(sentence, max_gram_len);
				}
				// Only fails if the receiver already gave up on a failed merge
				let _ = tx.send(partial);
			});
			expected += 1;
		}
		drop(tx);

		let mut merged = PartialIndex::new();
		let mut received = 0;
		for partial in rx.iter() {
			merged.merge(partial)?;
			received += 1;
		}
		if received != expected {
			return Err(WordexError::WorkerFailed { received, expected });
		}

		for (len, occurrences) in merged.length_counts.iter() {
			debug!("{len}-gram: {occurrences} occurrences");
		}

		let index = CorpusIndex {
			max_gram_len,
			forward: merged.forward.set_entropy(),
			reversed: merged.reversed.set_entropy(),
			length_counts: merged.length_counts,
			vocabulary: Vocabulary::from_buckets(merged.buckets),
		};
		info!(
			"index built in {:.2}s, {} candidates",
			tic.elapsed().as_secs_f64(),
			index.vocabulary.len()
		);
		Ok(index)
	}
}

fn validate_corpus<S: AsRef<str>>(sentences: &[S]) -> Result<()> {
	if sentences.is_empty() {
		return Err(WordexError::EmptyCorpus);
	}

	for (index, sentence) in sentences.iter().enumerate() {
		let sentence = sentence.as_ref();
		let reason = if sentence.is_empty() {
			"empty sentence"
		} else if sentence.chars().any(char::is_whitespace) {
			"contains whitespace"
		} else if sentence.chars().any(char::is_control) {
			"contains control characters"
		} else {
			continue;
		};
		return Err(WordexError::MalformedSentence { index, reason: reason.to_owned() });
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::rngs::StdRng;
	use rand::{Rng, SeedableRng};
	use std::collections::HashMap;

	#[test]
	fn ababab_vocabulary_and_frequencies() {
		let index = CorpusIndexer::new(2).unwrap().build(&["ababab"]).unwrap();

		assert_eq!(index.max_gram_len(), 3);
		let vocabulary: Vec<&str> = index.vocabulary().iter().collect();
		assert_eq!(vocabulary, vec!["ab", "ba", "aba", "bab"]);
		assert_eq!(index.forward().frequency("ab"), 3);
		assert_eq!(index.reversed().frequency("ab"), 3);
		assert_eq!(index.forward().frequency("ba"), 2);
		assert_eq!(index.forward().frequency("aba"), 2);
		assert_eq!(index.length_counts().get(1), 6);
		assert_eq!(index.length_counts().get(2), 5);
		assert_eq!(index.length_counts().get(3), 4);
		assert_eq!(index.length_counts().get(4), 0);
	}

	#[test]
	fn vocabulary_skips_unigrams() {
		let index = CorpusIndexer::new(1).unwrap().build(&["abc", "b"]).unwrap();

		assert!(index.vocabulary().contains("ab"));
		assert!(index.vocabulary().contains("bc"));
		assert!(!index.vocabulary().contains("b"));
		assert!(!index.vocabulary().contains("abc"));
		assert_eq!(index.vocabulary().len(), 2);
	}

	#[test]
	fn rejects_bad_configuration() {
		assert!(matches!(CorpusIndexer::new(0), Err(WordexError::InvalidMaxWordLen(0))));

		let indexer = CorpusIndexer::new(3).unwrap();
		let empty: [&str; 0] = [];
		assert!(matches!(indexer.build(&empty), Err(WordexError::EmptyCorpus)));
		assert!(matches!(
			indexer.build(&["ok", "not ok"]),
			Err(WordexError::MalformedSentence { index: 1, .. })
		));
		assert!(matches!(
			indexer.build(&["", "ok"]),
			Err(WordexError::MalformedSentence { index: 0, .. })
		));
		assert!(matches!(
			indexer.build(&["a\u{7}b"]),
			Err(WordexError::MalformedSentence { index: 0, .. })
		));
	}

	#[test]
	fn frequencies_match_exact_counts_on_random_corpora() {
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..5 {
			let sentences: Vec<String> = (0..rng.random_range(1..40))
				.map(|_| {
					(0..rng.random_range(1..12))
						.map(|_| ['a', 'b', 'c', '水'][rng.random_range(0..4)])
						.collect()
				})
				.collect();
			let index = CorpusIndexer::new(3).unwrap().build(&sentences).unwrap();

			let mut expected: HashMap<&str, u64> = HashMap::new();
			for n in 1..=4 {
				let mut total = 0;
				for sentence in &sentences {
					for ngram in char_ngrams(sentence, n) {
						*expected.entry(ngram).or_insert(0) += 1;
						total += 1;
					}
				}
				assert_eq!(index.length_counts().get(n), total);
			}

			for (ngram, count) in expected {
				assert_eq!(index.forward().frequency(ngram), count, "forward {ngram}");
				assert_eq!(index.reversed().frequency(ngram), count, "reversed {ngram}");
				assert!(index.forward().entropy(ngram) >= 0.0);
				assert!(index.reversed().entropy(ngram) >= 0.0);
				if ngram.chars().count() >= 2 {
					assert!(index.vocabulary().contains(ngram));
				}
			}
		}
	}

	#[test]
	fn cache_is_written_and_reused() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("corpus.txt");
		std::fs::write(&corpus, "ababab, abab\nbaba").unwrap();

		let built = CorpusIndex::from_file(&corpus, 2).unwrap();
		let cache = dir.path().join("corpus.2.bin");
		assert!(cache.exists());

		let loaded = CorpusIndex::from_file(&corpus, 2).unwrap();
		assert_eq!(loaded.vocabulary(), built.vocabulary());
		assert_eq!(loaded.length_counts(), built.length_counts());
		assert_eq!(loaded.forward().frequency("ab"), 6);

		let other = CorpusIndex::from_file(&corpus, 3).unwrap();
		assert_eq!(other.max_gram_len(), 4);
		assert!(dir.path().join("corpus.3.bin").exists());
	}

	#[test]
	fn unreadable_cache_is_rebuilt() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("corpus.txt");
		std::fs::write(&corpus, "abcabc").unwrap();
		std::fs::write(dir.path().join("corpus.2.bin"), [0xffu8; 3]).unwrap();

		let index = CorpusIndex::from_file(&corpus, 2).unwrap();
		assert_eq!(index.forward().frequency("abc"), 2);
	}
}
