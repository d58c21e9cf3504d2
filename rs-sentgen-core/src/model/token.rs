use std::fmt;

/// A unit of the chain: one word (punctuation attached) or a sentinel.
///
/// The derived ordering puts `Begin` first and `End` last, with words in
/// between in lexical order. Successor tables rely on it to iterate in the
/// same order on every run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
	/// Sentence-start sentinel. A state made only of `Begin` is the start state.
	Begin,
	Word(String),
	/// Sentence-end sentinel.
	End,
}

impl Token {
	/// Returns `true` for `Begin` and `End`.
	pub fn is_sentinel(&self) -> bool {
		!matches!(self, Token::Word(_))
	}

	/// Returns the word if this token is not a sentinel.
	pub fn as_word(&self) -> Option<&str> {
		match self {
			Token::Word(w) => Some(w),
			_ => None,
		}
	}
}

impl From<&str> for Token {
	fn from(word: &str) -> Self {
		Token::Word(word.to_owned())
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Token::Begin => f.write_str("<BEGIN>"),
			Token::Word(w) => f.write_str(w),
			Token::End => f.write_str("<END>"),
		}
	}
}
