use rs_wordex_core::model::extraction_input::DEFAULT_MAX_WORD_LEN;
use rs_wordex_core::{CorpusIndex, ExtractionInput, WordExtractor};

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	// Usage: rs-wordex-exemple [corpus.txt] [max_word_len] [threshold]
	let mut args = std::env::args().skip(1);
	let corpus = args.next().unwrap_or_else(|| "./data/corpus.txt".to_owned());

	// Max word length and threshold are validated before any indexing
	let mut input = ExtractionInput::default();
	if let Some(max_word_len) = args.next() {
		input.set_max_word_len(max_word_len.parse()?)?;
	}
	if let Some(threshold) = args.next() {
		input.set_threshold(Some(threshold.parse()?))?;
	}
	println!(
		"{corpus}: words up to {} characters (default {DEFAULT_MAX_WORD_LEN}), threshold {:?}",
		input.max_word_len(),
		input.threshold()
	);

	// Builds the index, or loads "<corpus>.<max_word_len>.bin" if it already exists
	let index = CorpusIndex::from_file(&corpus, input.max_word_len())?;

	let table = WordExtractor::new(&index)
		.with_policy(input.policy())
		.extract_words(input.threshold())?;

	println!("{:<12} {:>8} {:>10} {:>12}", "candidate", "count", "score", "final");
	for row in table.top(20) {
		println!("{:<12} {:>8} {:>10.4} {:>12.4}", row.candidate, row.count, row.score, row.final_score);
	}
	println!("{} rows", table.len());

	Ok(())
}
