use super::indexer::LengthCounts;
use super::trie::Trie;

/// PMI value reported when a probability cannot be estimated
/// (zero frequency or empty length bucket).
///
/// Finite so that it can be compared, summed and multiplied by a count.
pub const DEGENERATE_PMI: f64 = -1.0e9;

/// Looks `candidate` up in `trie`.
///
/// Returns the cached entropy of the reached node and the number of times
/// `candidate` was inserted as a complete n-gram. Both are 0 when the
/// candidate is absent.
pub fn calculate_entropy(candidate: &str, trie: &Trie) -> (f64, u64) {
	match trie.lookup(candidate) {
		Some(node) => (node.entropy(), node.terminal_count(candidate.chars().count())),
		None => (0.0, 0),
	}
}

/// Estimated probability of `ngram` among the n-grams of its length.
fn probability(ngram: &str, length_counts: &LengthCounts, trie: &Trie) -> Option<f64> {
	let frequency = trie.frequency(ngram);
	let total = length_counts.get(ngram.chars().count());
	if frequency == 0 || total == 0 {
		return None;
	}
	Some(frequency as f64 / total as f64)
}

/// Pointwise mutual information between the two parts of `candidate`
/// split before the character at `split_index`.
///
/// `pmi = log2(p(candidate) / (p(left) * p(right)))`, each probability being
/// estimated against the total count of n-grams of the same length.
///
/// # Notes
/// - `split_index` counts characters, not bytes, and must satisfy
///   `1 <= split_index < len(candidate)`.
/// - Out-of-range splits and zero frequencies give [`DEGENERATE_PMI`].
pub fn cal_pmi(candidate: &str, length_counts: &LengthCounts, split_index: usize, trie: &Trie) -> f64 {
	let Some((left, right)) = split_at_char(candidate, split_index) else {
		return DEGENERATE_PMI;
	};

	let joint = probability(candidate, length_counts, trie);
	let left = probability(left, length_counts, trie);
	let right = probability(right, length_counts, trie);

	match (joint, left, right) {
		(Some(joint), Some(left), Some(right)) => (joint / (left * right)).log2(),
		_ => DEGENERATE_PMI,
	}
}

/// Splits `s` before its `index`-th character.
///
/// Returns `None` unless both parts are non-empty.
pub(crate) fn split_at_char(s: &str, index: usize) -> Option<(&str, &str)> {
	if index == 0 {
		return None;
	}
	let (byte_index, _) = s.char_indices().nth(index)?;
	Some(s.split_at(byte_index))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::trie::{Direction, TrieBuilder};

	fn fixture(ngrams: &[&str]) -> (Trie, LengthCounts) {
		let mut builder = TrieBuilder::new(Direction::Reversed);
		let mut length_counts = LengthCounts::default();
		for ngram in ngrams {
			let len = ngram.chars().count();
			builder.insert(ngram, len);
			length_counts.add(len, 1);
		}
		(builder.set_entropy(), length_counts)
	}

	#[test]
	fn split_counts_characters() {
		assert_eq!(split_at_char("東京都", 1), Some(("東", "京都")));
		assert_eq!(split_at_char("東京都", 2), Some(("東京", "都")));
		assert_eq!(split_at_char("東京都", 0), None);
		assert_eq!(split_at_char("東京都", 3), None);
	}

	#[test]
	fn entropy_and_count_of_absent_candidate() {
		let (trie, _) = fixture(&["ab"]);

		assert_eq!(calculate_entropy("zz", &trie), (0.0, 0));
		assert_eq!(calculate_entropy("ab", &trie), (0.0, 1));
	}

	#[test]
	fn pmi_of_independent_parts_is_zero() {
		// p(ab) = 1/4, p(a) = 1/2, p(b) = 1/2
		let (trie, length_counts) = fixture(&["a", "b", "ab", "ba", "aa", "bb"]);

		assert!(cal_pmi("ab", &length_counts, 1, &trie).abs() < 1e-12);
	}

	#[test]
	fn pmi_of_glued_parts_is_positive() {
		// p(ab) = 1/2, p(a) = 1/4, p(b) = 1/4 -> log2(8)
		let (trie, length_counts) = fixture(&["a", "b", "c", "d", "ab", "cd"]);

		assert!((cal_pmi("ab", &length_counts, 1, &trie) - 3.0).abs() < 1e-12);
	}

	#[test]
	fn pmi_with_unseen_part_is_degenerate() {
		let (trie, length_counts) = fixture(&["ab", "b"]);

		assert_eq!(cal_pmi("ab", &length_counts, 1, &trie), DEGENERATE_PMI);
		assert_eq!(cal_pmi("ab", &length_counts, 2, &trie), DEGENERATE_PMI);
		assert_eq!(cal_pmi("ab", &LengthCounts::default(), 1, &trie), DEGENERATE_PMI);
	}
}
