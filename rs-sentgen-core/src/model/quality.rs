use std::collections::HashSet;

use super::tokenizer::Sentence;

/// Deduplicated source sentences, kept for novelty checks.
///
/// Read-only once built. Exact copies are found through a hash set, near
/// copies by a longest-common-subsequence scan.
#[derive(Clone, Debug, Default)]
pub struct SentenceSet {
	exact: HashSet<Sentence>,
	sentences: Vec<Sentence>,
}

impl SentenceSet {
	pub fn new<I: IntoIterator<Item = Sentence>>(sentences: I) -> Self {
		let mut set = Self::default();
		for sentence in sentences {
			if !sentence.is_empty() && set.exact.insert(sentence.clone()) {
				set.sentences.push(sentence);
			}
		}
		set
	}

	pub fn contains(&self, sentence: &[String]) -> bool {
		self.exact.contains(sentence)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Sentence> {
		self.sentences.iter()
	}

	pub fn len(&self) -> usize {
		self.sentences.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sentences.is_empty()
	}
}

/// Outcome of a quality check.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
	Accept,
	TooShort { words: usize, min: usize },
	TooLong { words: usize, max: usize },
	TooManyChars { chars: usize, max: usize },
	/// `shared` words of the candidate appear in order in one source sentence.
	Overlap { shared: usize, ratio: f64 },
}

impl Verdict {
	pub fn is_accept(&self) -> bool {
		matches!(self, Verdict::Accept)
	}
}

/// Accept/reject rules for generated candidates.
///
/// Candidates only reach the gate after a walk drew `END`, so every one of
/// them is a complete sentence. The gate then checks length and novelty:
/// - at least `min_words` words, at most `max_words` if set
/// - at most `max_chars` characters once joined, if set
/// - for every source sentence, `lcs / candidate_len < max_overlap_ratio`
///   and `lcs < max_overlap_total` (each check skipped when unset; the
///   absolute cap is off by default)
#[derive(Clone, Debug, PartialEq)]
pub struct QualityGate {
	pub min_words: usize,
	pub max_words: Option<usize>,
	pub max_chars: Option<usize>,
	pub max_overlap_ratio: Option<f64>,
	pub max_overlap_total: Option<usize>,
}

impl Default for QualityGate {
	fn default() -> Self {
		Self {
			min_words: 3,
			max_words: None,
			max_chars: None,
			max_overlap_ratio: Some(0.7),
			max_overlap_total: None,
		}
	}
}

impl QualityGate {
	/// Checks one candidate against the source sentences.
	pub fn check(&self, candidate: &[String], corpus: &SentenceSet) -> Verdict {
		let words = candidate.len();
		if words < self.min_words {
			return Verdict::TooShort { words, min: self.min_words };
		}
		if let Some(max) = self.max_words {
			if words > max {
				return Verdict::TooLong { words, max };
			}
		}
		if let Some(max) = self.max_chars {
			// Words plus single separating spaces
			let chars = candidate.iter().map(|w| w.chars().count()).sum::<usize>() + words.saturating_sub(1);
			if chars > max {
				return Verdict::TooManyChars { chars, max };
			}
		}
		if words == 0 || (self.max_overlap_ratio.is_none() && self.max_overlap_total.is_none()) {
			return Verdict::Accept;
		}

		if corpus.contains(candidate) {
			return Verdict::Overlap { shared: words, ratio: 1.0 };
		}

		for source in corpus.iter() {
			let shared = lcs_len(candidate, source);
			let ratio = shared as f64 / words as f64;
			let over_ratio = self.max_overlap_ratio.is_some_and(|max| ratio >= max);
			let over_total = self.max_overlap_total.is_some_and(|max| shared >= max);
			if over_ratio || over_total {
				return Verdict::Overlap { shared, ratio };
			}
		}

		Verdict::Accept
	}
}

/// Length of the longest common subsequence of two word sequences.
///
/// Classic dynamic programming kept to two rows, O(|a| * |b|) time and
/// O(|b|) memory.
pub fn lcs_len(a: &[String], b: &[String]) -> usize {
	if a.is_empty() || b.is_empty() {
		return 0;
	}

	let mut previous = vec![0usize; b.len() + 1];
	let mut current = vec![0usize; b.len() + 1];
	for word in a {
		for (j, other) in b.iter().enumerate() {
			current[j + 1] = if word == other {
				previous[j] + 1
			} else {
				current[j].max(previous[j + 1])
			};
		}
		std::mem::swap(&mut previous, &mut current);
	}
	previous[b.len()]
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(s: &str) -> Sentence {
		s.split_whitespace().map(str::to_owned).collect()
	}

	fn corpus(sentences: &[&str]) -> SentenceSet {
		SentenceSet::new(sentences.iter().map(|s| words(s)))
	}

	#[test]
	fn test_lcs_len() {
		assert_eq!(lcs_len(&words("a b c d"), &words("a c d")), 3);
		assert_eq!(lcs_len(&words("a b c"), &words("c b a")), 1);
		assert_eq!(lcs_len(&words("a b"), &[]), 0);
		assert_eq!(lcs_len(&words("x y z"), &words("a b c")), 0);
		assert_eq!(lcs_len(&words("the cat sat on the mat"), &words("the dog sat on a mat")), 4);
	}

	#[test]
	fn test_sentence_set_dedup() {
		let set = corpus(&["a b c", "a b c", "d e"]);
		assert_eq!(set.len(), 2);
		assert!(set.contains(&words("d e")));
		assert!(!set.contains(&words("d")));
	}

	#[test]
	fn test_too_short() {
		let gate = QualityGate::default();
		assert_eq!(gate.check(&words("hi there"), &corpus(&[])), Verdict::TooShort { words: 2, min: 3 });
	}

	#[test]
	fn test_too_long_and_too_many_chars() {
		let gate = QualityGate { max_words: Some(3), ..QualityGate::default() };
		assert_eq!(gate.check(&words("a b c d"), &corpus(&[])), Verdict::TooLong { words: 4, max: 3 });

		let gate = QualityGate { max_chars: Some(8), ..QualityGate::default() };
		assert_eq!(gate.check(&words("abc def ghi"), &corpus(&[])), Verdict::TooManyChars { chars: 11, max: 8 });
		assert!(gate.check(&words("ab cd ef"), &corpus(&[])).is_accept());
	}

	#[test]
	fn test_verbatim_copy_is_rejected() {
		let gate = QualityGate::default();
		let verdict = gate.check(&words("The cat sat."), &corpus(&["The cat sat."]));
		assert!(matches!(verdict, Verdict::Overlap { shared: 3, .. }));
	}

	#[test]
	fn test_overlap_ratio_threshold() {
		let gate = QualityGate { max_overlap_total: None, ..QualityGate::default() };
		let source = corpus(&["a b c d e f g h i j"]);

		// 7 of 10 in order, ratio 0.7 is at the threshold
		assert!(!gate.check(&words("a b c d e f g x y z"), &source).is_accept());
		// 6 of 10, ratio 0.6
		assert!(gate.check(&words("a b c d e f x y z w"), &source).is_accept());
	}

	#[test]
	fn test_overlap_total_threshold() {
		let gate = QualityGate { max_overlap_ratio: None, max_overlap_total: Some(3), ..QualityGate::default() };
		let source = corpus(&["a b c d"]);
		assert!(!gate.check(&words("a b c x y z w v u t"), &source).is_accept());
		assert!(gate.check(&words("a b x y z w v u t s"), &source).is_accept());
	}

	#[test]
	fn test_long_candidate_below_ratio_is_accepted() {
		// 30 words, 15 of them in order from one source sentence: ratio 0.5
		let source: Vec<String> = (0..20).map(|i| format!("s{i}")).collect();
		let candidate: Vec<String> = (0..30)
			.map(|i| if i % 2 == 0 { format!("s{}", i / 2) } else { format!("n{i}") })
			.collect();
		let set = SentenceSet::new([source.clone()]);
		assert_eq!(lcs_len(&candidate, &source), 15);

		assert!(QualityGate::default().check(&candidate, &set).is_accept());

		let capped = QualityGate { max_overlap_total: Some(15), ..QualityGate::default() };
		assert_eq!(capped.check(&candidate, &set), Verdict::Overlap { shared: 15, ratio: 0.5 });
	}

	#[test]
	fn test_novelty_disabled() {
		let gate = QualityGate { max_overlap_ratio: None, max_overlap_total: None, ..QualityGate::default() };
		assert!(gate.check(&words("The cat sat."), &corpus(&["The cat sat."])).is_accept());
	}
}
