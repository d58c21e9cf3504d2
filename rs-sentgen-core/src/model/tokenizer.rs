use std::sync::LazyLock;

use log::debug;
use regex::Regex;

/// One source sentence: its words in order, punctuation left attached.
pub type Sentence = Vec<String>;

/// Characters that usually leave generated output unbalanced: quotes,
/// brackets, and apostrophes that open or close a quotation.
static ILL_FORMED: LazyLock<Regex> = LazyLock::new(|| {
	// Constant pattern, cannot fail to compile
	Regex::new(r#"(^')|('$)|\s'|'\s|["()\[\]]"#).expect("ill-formed pattern is valid")
});

/// Splits raw corpus text into sentences of words.
///
/// # Rules
/// - A sentence ends at `.`, `!` or `?` followed by whitespace or end of
///   input. The punctuation stays on the last word.
/// - A newline always ends the current sentence.
/// - Sentences are split into words on whitespace. Punctuation inside or at
///   the edge of a word stays attached to it.
/// - Fragments with no words are dropped.
///
/// With `well_formed` enabled, sentences containing quotes, brackets or
/// dangling apostrophes are dropped as well.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tokenizer {
	well_formed: bool,
}

impl Tokenizer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Enables or disables the well-formedness filter.
	pub fn well_formed(mut self, enabled: bool) -> Self {
		self.well_formed = enabled;
		self
	}

	/// Tokenizes `text`. An empty input yields no sentences.
	pub fn tokenize(&self, text: &str) -> Vec<Sentence> {
		let sentences = split_sentences(text);
		if !self.well_formed {
			return sentences;
		}

		let before = sentences.len();
		let kept: Vec<Sentence> = sentences.into_iter().filter(|s| is_well_formed(s)).collect();
		if kept.len() < before {
			debug!("Dropped {} ill-formed sentence(s)", before - kept.len());
		}
		kept
	}
}

/// Splits `text` into sentences without any filtering.
pub fn split_sentences(text: &str) -> Vec<Sentence> {
	let mut sentences = Vec::new();
	let mut start = 0;
	let mut chars = text.char_indices().peekable();

	while let Some((i, c)) = chars.next() {
		let boundary = match c {
			'\n' => Some((i, i + 1)),
			'.' | '!' | '?' => match chars.peek() {
				None => Some((i + 1, i + 1)),
				Some((_, next)) if next.is_whitespace() => Some((i + 1, i + 1)),
				_ => None,
			},
			_ => None,
		};

		// (end of this fragment, start of the next one)
		if let Some((end, next_start)) = boundary {
			push_fragment(&text[start..end], &mut sentences);
			start = next_start;
		}
	}
	push_fragment(&text[start..], &mut sentences);

	sentences
}

fn push_fragment(fragment: &str, sentences: &mut Vec<Sentence>) {
	let words: Sentence = fragment.split_whitespace().map(str::to_owned).collect();
	if !words.is_empty() {
		sentences.push(words);
	}
}

/// Returns `false` if the sentence contains quotes, brackets or dangling
/// apostrophes.
pub fn is_well_formed(sentence: &[String]) -> bool {
	!ILL_FORMED.is_match(&sentence.join(" "))
}
