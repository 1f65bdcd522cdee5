use std::collections::{BTreeMap, BTreeSet};
use std::thread;
use std::time::Instant;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::extraction_input::{check_threshold, ExtractionInput, SuppressionPolicy};
use super::indexer::{CorpusIndex, CorpusIndexer};
use super::metrics::{cal_pmi, calculate_entropy, split_at_char};
use crate::error::{Result, WordexError};

/// Score of one candidate.
///
/// `score` is the cohesion score (may be negative) and
/// `final_score = score * count`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CandidateRecord {
	pub candidate: String,
	pub count: u64,
	pub score: f64,
	#[serde(rename = "final")]
	pub final_score: f64,
}

impl CandidateRecord {
	fn new(candidate: &str, count: u64, score: f64) -> Self {
		Self {
			candidate: candidate.to_owned(),
			count,
			score,
			final_score: score * count as f64,
		}
	}
}

/// Outcome of scoring a candidate that was not rejected.
#[derive(Clone, Debug, PartialEq)]
pub struct Scored {
	pub record: CandidateRecord,
	/// Accepted sub-words absorbed by this candidate.
	pub absorbed: Vec<String>,
}

/// Words accepted so far during a thresholded extraction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AcceptedWords {
	words: BTreeMap<String, CandidateRecord>,
}

impl AcceptedWords {
	pub fn get(&self, word: &str) -> Option<&CandidateRecord> {
		self.words.get(word)
	}

	pub fn contains(&self, word: &str) -> bool {
		self.words.contains_key(word)
	}

	pub fn len(&self) -> usize {
		self.words.len()
	}

	pub fn is_empty(&self) -> bool {
		self.words.is_empty()
	}

	/// Applies one scoring outcome: absorbed sub-words are removed, then the
	/// candidate is recorded if its score exceeds `threshold`.
	fn apply(mut self, scored: Scored, threshold: f64) -> Self {
		for child in &scored.absorbed {
			debug!("{} absorbs {child}", scored.record.candidate);
			self.words.remove(child);
		}
		if scored.record.score > threshold {
			self.words.insert(scored.record.candidate.clone(), scored.record);
		}
		self
	}
}

/// Ranked extraction result, sorted by `final_score` descending then by
/// candidate.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct ResultTable {
	rows: Vec<CandidateRecord>,
}

impl ResultTable {
	fn from_records(mut rows: Vec<CandidateRecord>) -> Self {
		rows.sort_by(|a, b| {
			b.final_score
				.total_cmp(&a.final_score)
				.then_with(|| a.candidate.cmp(&b.candidate))
		});
		Self { rows }
	}

	pub fn rows(&self) -> &[CandidateRecord] {
		&self.rows
	}

	pub fn into_rows(self) -> Vec<CandidateRecord> {
		self.rows
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn get(&self, candidate: &str) -> Option<&CandidateRecord> {
		self.rows.iter().find(|row| row.candidate == candidate)
	}

	/// Rank (0 = best) of `candidate` in the table.
	pub fn rank(&self, candidate: &str) -> Option<usize> {
		self.rows.iter().position(|row| row.candidate == candidate)
	}

	/// The first `limit` rows.
	pub fn top(&self, limit: usize) -> &[CandidateRecord] {
		&self.rows[..limit.min(self.rows.len())]
	}
}

/// Scores the vocabulary of a [`CorpusIndex`] and ranks the words found.
///
/// # Responsibilities
/// - Combine PMI and boundary entropies into a cohesion score
/// - Suppress accepted sub-words once a longer candidate explains them
/// - Produce a deterministic ranked table
#[derive(Clone, Copy, Debug)]
pub struct WordExtractor<'a> {
	index: &'a CorpusIndex,
	policy: SuppressionPolicy,
}

impl<'a> WordExtractor<'a> {
	pub fn new(index: &'a CorpusIndex) -> Self {
		Self { index, policy: SuppressionPolicy::default() }
	}

	pub fn with_policy(mut self, policy: SuppressionPolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Scores `candidate` against the words accepted so far.
	///
	/// # Returns
	/// - `None` if an accepted sub-word is a better explanation (see
	///   [`SuppressionPolicy`]).
	/// - `(count, 0, 0)` with nothing absorbed if the candidate has no
	///   branching on its left or on its right: it always comes with the same
	///   neighbour and is not a free-standing word.
	/// - Otherwise the record and the accepted sub-words it absorbs.
	///
	/// # Notes
	/// The cohesion score is `pmi + min(left, right) - max_boundary` where
	/// `max_boundary` is the best inner boundary entropy over all split points
	/// and `pmi` the mutual information at that split.
	pub fn score(&self, candidate: &str, accepted: &AcceptedWords) -> Option<Scored> {
		let forward = self.index.forward();
		let reversed = self.index.reversed();

		// Right context from the forward trie, left context from the reversed one
		let (right_entropy, count) = calculate_entropy(candidate, forward);
		let (left_entropy, _) = calculate_entropy(candidate, reversed);
		if right_entropy == 0.0 || left_entropy == 0.0 {
			return Some(Scored { record: CandidateRecord::new(candidate, count, 0.0), absorbed: Vec::new() });
		}

		let mut children: BTreeSet<&str> = BTreeSet::new();
		let mut best_split: Option<(f64, f64)> = None;
		for split in 1..candidate.chars().count() {
			let Some((left, right)) = split_at_char(candidate, split) else {
				continue;
			};
			let pmi = cal_pmi(candidate, self.index.length_counts(), split, reversed);

			for part in [left, right] {
				if accepted.contains(part) {
					children.insert(part);
				}
			}

			// What follows the right part, what precedes the left part
			let (after_right, _) = calculate_entropy(right, forward);
			let (before_left, _) = calculate_entropy(left, reversed);
			let boundary = after_right.min(before_left);
			if best_split.is_none_or(|(max_boundary, _)| boundary > max_boundary) {
				best_split = Some((boundary, pmi));
			}
		}

		let Some((max_boundary, pmi)) = best_split else {
			return Some(Scored { record: CandidateRecord::new(candidate, count, 0.0), absorbed: Vec::new() });
		};
		let score = pmi + left_entropy.min(right_entropy) - max_boundary;
		let record = CandidateRecord::new(candidate, count, score);

		let mut absorbed = Vec::with_capacity(children.len());
		for child in children {
			let Some(child_record) = accepted.get(child) else {
				continue;
			};
			if self.rejects(&record, child_record) {
				debug!("{candidate} rejected in favour of {child}");
				return None;
			}
			absorbed.push(child.to_owned());
		}

		Some(Scored { record, absorbed })
	}

	fn rejects(&self, record: &CandidateRecord, child: &CandidateRecord) -> bool {
		match self.policy {
			SuppressionPolicy::PreferLonger => record.count < child.count && record.score < child.score,
			SuppressionPolicy::PreferHigherScore => record.score < child.score,
		}
	}

	/// Extracts the words of the corpus.
	///
	/// - With a threshold, candidates are scored one after the other in
	///   vocabulary order; each one absorbs its accepted sub-words and is
	///   accepted if its score exceeds the threshold.
	/// - Without a threshold, every candidate is scored independently (no
	///   suppression), in parallel.
	///
	/// # Errors
	/// Returns an error if `threshold` is not finite, or if a scoring thread
	/// panicked.
	pub fn extract_words(&self, threshold: Option<f64>) -> Result<ResultTable> {
		check_threshold(threshold)?;

		let tic = Instant::now();
		info!(
			"scoring {} candidates (threshold {threshold:?})",
			self.index.vocabulary().len()
		);
		let table = match threshold {
			Some(threshold) => ResultTable::from_records(self.accepted_words(threshold).words.into_values().collect()),
			None => ResultTable::from_records(self.score_all()?),
		};
		info!("{} words ranked in {:.2}s", table.len(), tic.elapsed().as_secs_f64());
		Ok(table)
	}

	/// Runs the suppression pass and returns the final accepted set.
	pub fn accepted_words(&self, threshold: f64) -> AcceptedWords {
		self.index
			.vocabulary()
			.iter()
			.fold(AcceptedWords::default(), |accepted, candidate| {
				match self.score(candidate, &accepted) {
					Some(scored) => accepted.apply(scored, threshold),
					None => accepted,
				}
			})
	}

	/// Scores every candidate on its own, splitting the vocabulary over
	/// CPU cores.
	fn score_all(&self) -> Result<Vec<CandidateRecord>> {
		let vocabulary = self.index.vocabulary().as_slice();
		if vocabulary.is_empty() {
			return Ok(Vec::new());
		}
		let chunk_size = vocabulary.len().div_ceil(num_cpus::get());
		let nothing_accepted = AcceptedWords::default();

		thread::scope(|scope| {
			let handles: Vec<_> = vocabulary
				.chunks(chunk_size)
				.map(|chunk| {
					let nothing_accepted = &nothing_accepted;
					scope.spawn(move || {
						chunk
							.iter()
							.filter_map(|candidate| self.score(candidate, nothing_accepted))
							.map(|scored| scored.record)
							.collect::<Vec<_>>()
					})
				})
				.collect();

			let expected = handles.len();
			let mut records = Vec::with_capacity(vocabulary.len());
			let mut received = 0;
			for handle in handles {
				if let Ok(chunk_records) = handle.join() {
					records.extend(chunk_records);
					received += 1;
				}
			}
			if received != expected {
				return Err(WordexError::WorkerFailed { received, expected });
			}
			Ok(records)
		})
	}
}

/// Indexes `sentences` and extracts their words in one call.
///
/// # Errors
/// Configuration errors are raised before any indexing work starts.
pub fn extract<S: AsRef<str>>(sentences: &[S], input: &ExtractionInput) -> Result<ResultTable> {
	input.validate()?;
	let index = CorpusIndexer::new(input.max_word_len())?.build(sentences)?;
	WordExtractor::new(&index)
		.with_policy(input.policy())
		.extract_words(input.threshold())
}
