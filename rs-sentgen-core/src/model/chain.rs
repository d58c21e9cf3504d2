use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;

use log::{debug, info};

use super::state::State;
use super::token::Token;
use super::tokenizer::Sentence;
use crate::error::{GenError, Result};

/// Below this many sentences per chunk, threads cost more than they save.
const MIN_CHUNK_SIZE: usize = 256;

/// Chunks per CPU when building in parallel.
const CHUNK_FACTOR: usize = 8;

/// Word-level Markov chain of fixed state size.
///
/// The `ChainModel` maps every observed tuple of `state_size` tokens to its
/// successors, weighted by occurrence.
///
/// # Responsibilities
/// - Build the chain from tokenized sentences (in parallel for large inputs)
/// - Accumulate transition counts for each state
/// - Expose states for sampling
/// - Merge with another chain of the same state size
///
/// # Invariants
/// - `state_size` is always >= 1
/// - Each state key holds exactly `state_size` tokens
/// - Every state reachable from the start state has at least one successor
/// - Counts do not depend on the order in which sentences were added
#[derive(Clone, Debug)]
pub struct ChainModel {
	state_size: usize,
	states: HashMap<Vec<Token>, State>,
	sentence_count: usize,
	word_count: usize,
}

impl ChainModel {
	/// Creates an empty chain of the given state size.
	///
	/// # Errors
	/// Returns an error if `state_size` is 0.
	pub fn new(state_size: usize) -> Result<Self> {
		if state_size < 1 {
			return Err(GenError::InvalidStateSize(state_size));
		}
		Ok(Self { state_size, states: HashMap::new(), sentence_count: 0, word_count: 0 })
	}

	/// Builds a compiled chain from tokenized sentences.
	///
	/// # Behavior
	/// - Splits sentences into chunks (based on CPU cores * factor).
	/// - Builds partial chains on scoped threads, collected over a channel.
	/// - Merges all partial chains by summing counts.
	/// - Small inputs are built on the calling thread.
	///
	/// # Errors
	/// - `InvalidStateSize` if `state_size` is 0.
	/// - `EmptyCorpus` if `sentences` is empty.
	pub fn build(sentences: &[Sentence], state_size: usize) -> Result<Self> {
		let mut model = Self::new(state_size)?;
		if sentences.is_empty() {
			return Err(GenError::EmptyCorpus);
		}

		let chunks = num_cpus::get() * CHUNK_FACTOR;
		let chunk_size = sentences.len().div_ceil(chunks).max(MIN_CHUNK_SIZE);

		if sentences.len() <= chunk_size {
			for sentence in sentences {
				model.add_sentence(sentence);
			}
		} else {
			let (tx, rx) = mpsc::channel();
			thread::scope(|scope| {
				for chunk in sentences.chunks(chunk_size) {
					let tx = tx.clone();
					scope.spawn(move || {
						let mut partial = ChainModel { state_size, states: HashMap::new(), sentence_count: 0, word_count: 0 };
						for sentence in chunk {
							partial.add_sentence(sentence);
						}
						// The receiver outlives the scope
						let _ = tx.send(partial);
					});
				}
			});
			drop(tx);

			let mut partials = 0;
			for partial in rx.iter() {
				model.merge(&partial)?;
				partials += 1;
			}
			debug!("Merged {} partial chains of up to {} sentences", partials, chunk_size);
		}

		model.compile();
		info!(
			"Built chain: state size {}, {} sentences, {} words, {} states",
			model.state_size,
			model.sentence_count,
			model.word_count,
			model.states.len()
		);
		Ok(model)
	}

	/// Adds one sentence to the chain.
	///
	/// # Behavior
	/// - Pads the sentence with `state_size` `BEGIN` tokens and one `END`.
	/// - Slides a window of `state_size` tokens and records the token that
	///   follows each window.
	/// - Empty sentences are ignored.
	///
	/// The chain must be compiled before sampling from it again.
	pub fn add_sentence(&mut self, sentence: &[String]) {
		if sentence.is_empty() {
			return;
		}

		let mut padded: Vec<Token> = Vec::with_capacity(self.state_size + sentence.len() + 1);
		padded.extend(std::iter::repeat_n(Token::Begin, self.state_size));
		padded.extend(sentence.iter().map(|word| Token::Word(word.clone())));
		padded.push(Token::End);

		for window in padded.windows(self.state_size + 1) {
			let (key, next) = window.split_at(self.state_size);
			let state = self.states.entry(key.to_vec()).or_insert_with(|| State::new(key));
			state.add_transition(next[0].clone());
		}

		self.sentence_count += 1;
		self.word_count += sentence.len();
	}

	/// Builds the sampling tables of every state.
	pub fn compile(&mut self) {
		for state in self.states.values_mut() {
			state.compile();
		}
	}

	/// Merges another chain into this one.
	///
	/// # Notes
	/// - Both chains must have the same state size.
	/// - Occurrence counts for matching states and transitions are summed.
	/// - The result must be compiled before sampling.
	///
	/// # Errors
	/// Returns an error if the state sizes do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.state_size != other.state_size {
			return Err(GenError::StateSizeMismatch { expected: self.state_size, found: other.state_size });
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				// Keys are equal by construction
				existing.merge(state).map_err(GenError::Internal)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}

		self.sentence_count += other.sentence_count;
		self.word_count += other.word_count;

		Ok(())
	}

	pub fn state_size(&self) -> usize {
		self.state_size
	}

	/// The canonical start key: `state_size` `BEGIN` tokens.
	pub fn start_key(&self) -> Vec<Token> {
		vec![Token::Begin; self.state_size]
	}

	/// Looks up a state by key.
	pub fn state(&self, key: &[Token]) -> Option<&State> {
		self.states.get(key)
	}

	pub fn states(&self) -> impl Iterator<Item = &State> {
		self.states.values()
	}

	/// Number of distinct states.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	pub fn sentence_count(&self) -> usize {
		self.sentence_count
	}

	pub fn word_count(&self) -> usize {
		self.word_count
	}

	/// Average number of words per source sentence, rounded up.
	pub fn average_sentence_len(&self) -> usize {
		if self.sentence_count == 0 {
			return 0;
		}
		self.word_count.div_ceil(self.sentence_count)
	}

	/// Returns the key reached from `key` after drawing `next`.
	pub fn next_key(key: &[Token], next: &Token) -> Vec<Token> {
		let mut shifted = Vec::with_capacity(key.len());
		shifted.extend_from_slice(&key[1.min(key.len())..]);
		shifted.push(next.clone());
		shifted
	}

	/// Builds the key a walk starts from when seeded with `words`.
	///
	/// With fewer words than the state size the key is padded with `BEGIN`,
	/// so the words must open a source sentence. Otherwise the last
	/// `state_size` words form the key.
	///
	/// # Errors
	/// Returns `UnknownStart` if `words` is empty or the key is not in the chain.
	pub fn seed_key(&self, words: &[String]) -> Result<Vec<Token>> {
		if words.is_empty() {
			return Err(GenError::UnknownStart(String::new()));
		}

		let key: Vec<Token> = if words.len() < self.state_size {
			std::iter::repeat_n(Token::Begin, self.state_size - words.len())
				.chain(words.iter().map(|w| Token::Word(w.clone())))
				.collect()
		} else {
			words[words.len() - self.state_size..].iter().map(|w| Token::Word(w.clone())).collect()
		};

		match self.states.get(&key) {
			Some(state) if !state.is_empty() => Ok(key),
			_ => Err(GenError::UnknownStart(words.join(" "))),
		}
	}

	/// Counts keys that are reachable by following a transition but have no
	/// successors. Always 0 for a chain built from sentences.
	pub fn dead_ends(&self) -> usize {
		self.states
			.values()
			.flat_map(|state| {
				state
					.transitions()
					.filter(|(next, _)| **next != Token::End)
					.map(move |(next, _)| Self::next_key(state.key(), next))
			})
			.filter(|key| self.states.get(key).is_none_or(State::is_empty))
			.count()
	}
}
