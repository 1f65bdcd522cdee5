/// Splits raw text into cleaned sentences.
///
/// Every character that is not alphanumeric (whitespace, punctuation,
/// symbols, control characters) ends the current sentence. Empty pieces
/// are dropped. Case is preserved.
pub fn clean_text(raw: &str) -> Vec<String> {
	raw.split(|c: char| !c.is_alphanumeric())
		.filter(|piece| !piece.is_empty())
		.map(str::to_owned)
		.collect()
}

/// Returns every contiguous `n`-character substring of `sentence`, in order,
/// with repetition.
///
/// UTF-8 safe: `n` counts characters. Returns nothing when `n` is 0 or
/// longer than the sentence.
pub fn char_ngrams(sentence: &str, n: usize) -> Vec<&str> {
	if n == 0 {
		return Vec::new();
	}

	let mut bounds: Vec<usize> = sentence.char_indices().map(|(i, _)| i).collect();
	bounds.push(sentence.len());
	let chars = bounds.len() - 1;
	if n > chars {
		return Vec::new();
	}

	(0..=chars - n).map(|i| &sentence[bounds[i]..bounds[i + n]]).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clean_text_splits_on_punctuation_and_spaces() {
		let sentences = clean_text("今天天气很好，我们去公园吧！\n  hello world\t");
		assert_eq!(sentences, vec!["今天天气很好", "我们去公园吧", "hello", "world"]);
	}

	#[test]
	fn clean_text_of_blank_input() {
		assert!(clean_text(" ,.;\n").is_empty());
	}

	#[test]
	fn ngrams_overlap() {
		assert_eq!(char_ngrams("ababab", 2), vec!["ab", "ba", "ab", "ba", "ab"]);
		assert_eq!(char_ngrams("ababab", 6), vec!["ababab"]);
		assert!(char_ngrams("ababab", 7).is_empty());
		assert!(char_ngrams("ababab", 0).is_empty());
	}

	#[test]
	fn ngrams_count_characters() {
		assert_eq!(char_ngrams("北京大学", 3), vec!["北京大", "京大学"]);
	}
}
