use serde::{Deserialize, Serialize};

use crate::error::{Result, WordexError};

/// Longest word searched for when nothing else is configured.
pub const DEFAULT_MAX_WORD_LEN: usize = 4;

/// What to do when an accepted sub-word beats a longer candidate on score
/// but not on frequency.
///
/// # Variants
/// - `PreferLonger`: the candidate is rejected only if a sub-word is both
///   strictly more frequent and strictly better scored. Otherwise every
///   accepted sub-word is absorbed, even a better scored one.
/// - `PreferHigherScore`: the candidate is rejected as soon as a sub-word
///   has a strictly better score.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionPolicy {
	#[default]
	PreferLonger,
	PreferHigherScore,
}

/// Parameters of a word extraction run.
///
/// # Invariants
/// - `max_word_len >= 1`
/// - `threshold`, when set, is finite
///
/// Deserialized values are not checked: call [`ExtractionInput::validate`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ExtractionInput {
	/// Longest word to discover, in characters.
	max_word_len: usize,

	/// Minimum cohesion score for a word to be accepted.
	/// `None` scores every candidate without suppression.
	threshold: Option<f64>,

	/// Tie-break of the suppression policy.
	policy: SuppressionPolicy,
}

impl Default for ExtractionInput {
	fn default() -> Self {
		Self {
			max_word_len: DEFAULT_MAX_WORD_LEN,
			threshold: None,
			policy: SuppressionPolicy::default(),
		}
	}
}

impl ExtractionInput {
	/// # Errors
	/// Returns an error if `max_word_len` is 0 or `threshold` is not finite.
	pub fn new(max_word_len: usize, threshold: Option<f64>) -> Result<Self> {
		let mut input = Self::default();
		input.set_max_word_len(max_word_len)?;
		input.set_threshold(threshold)?;
		Ok(input)
	}

	pub fn max_word_len(&self) -> usize {
		self.max_word_len
	}

	pub fn threshold(&self) -> Option<f64> {
		self.threshold
	}

	pub fn policy(&self) -> SuppressionPolicy {
		self.policy
	}

	pub fn set_max_word_len(&mut self, max_word_len: usize) -> Result<()> {
		check_max_word_len(max_word_len)?;
		self.max_word_len = max_word_len;
		Ok(())
	}

	pub fn set_threshold(&mut self, threshold: Option<f64>) -> Result<()> {
		check_threshold(threshold)?;
		self.threshold = threshold;
		Ok(())
	}

	pub fn set_policy(&mut self, policy: SuppressionPolicy) {
		self.policy = policy;
	}

	/// Checks the invariants of an input built by deserialization.
	pub fn validate(&self) -> Result<()> {
		check_max_word_len(self.max_word_len)?;
		check_threshold(self.threshold)
	}
}

fn check_max_word_len(max_word_len: usize) -> Result<()> {
	if max_word_len == 0 {
		return Err(WordexError::InvalidMaxWordLen(max_word_len));
	}
	Ok(())
}

pub(crate) fn check_threshold(threshold: Option<f64>) -> Result<()> {
	match threshold {
		Some(t) if !t.is_finite() => Err(WordexError::InvalidThreshold(t)),
		_ => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let input = ExtractionInput::default();
		assert_eq!(input.max_word_len(), 4);
		assert_eq!(input.threshold(), None);
		assert_eq!(input.policy(), SuppressionPolicy::PreferLonger);
		assert!(input.validate().is_ok());
	}

	#[test]
	fn setters_reject_invalid_values() {
		let mut input = ExtractionInput::new(3, Some(1.5)).unwrap();

		assert!(input.set_max_word_len(0).is_err());
		assert!(input.set_threshold(Some(f64::NAN)).is_err());
		assert!(input.set_threshold(Some(f64::INFINITY)).is_err());
		assert_eq!(input.max_word_len(), 3);
		assert_eq!(input.threshold(), Some(1.5));

		input.set_threshold(None).unwrap();
		assert_eq!(input.threshold(), None);
		assert!(matches!(ExtractionInput::new(0, None), Err(WordexError::InvalidMaxWordLen(0))));
	}
}
