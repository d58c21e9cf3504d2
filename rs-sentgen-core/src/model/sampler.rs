use rand::Rng;

use super::chain::ChainModel;
use super::token::Token;
use crate::error::WalkError;

/// Multiplier applied to `state_size * average sentence length` to derive
/// the default walk cap.
pub const WALK_LENGTH_FACTOR: usize = 10;

/// Random walker over a compiled `ChainModel`.
///
/// A walk starts at a key (by default the all-`BEGIN` start key), draws one
/// weighted successor at a time and shifts the key, until `END` is drawn.
#[derive(Debug, Clone, Copy)]
pub struct Sampler<'m> {
	model: &'m ChainModel,
	max_length: usize,
}

impl<'m> Sampler<'m> {
	/// Creates a sampler that aborts walks longer than `max_length` words.
	pub fn new(model: &'m ChainModel, max_length: usize) -> Self {
		Self { model, max_length }
	}

	/// Creates a sampler with the default cap derived from the model.
	pub fn with_default_cap(model: &'m ChainModel) -> Self {
		Self::new(model, Self::default_cap(model))
	}

	/// `10 * state_size * ceil(average sentence length)`, at least 1.
	pub fn default_cap(model: &ChainModel) -> usize {
		(WALK_LENGTH_FACTOR * model.state_size() * model.average_sentence_len()).max(1)
	}

	pub fn max_length(&self) -> usize {
		self.max_length
	}

	/// Walks from the start key.
	///
	/// # Returns
	/// - `Ok(words)`: the candidate, sentinels excluded, `END` was reached.
	/// - `Err(WalkError::NoData)`: the start key has no successors.
	/// - `Err(WalkError::TooLong)`: more than `max_length` words were drawn.
	pub fn walk<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<String>, WalkError> {
		self.walk_from(&self.model.start_key(), Vec::new(), rng)
	}

	/// Walks from `key`, appending drawn words to `words`.
	///
	/// `words` is the already-known prefix of the candidate (seeded start);
	/// it does not count toward the length cap.
	pub fn walk_from<R: Rng + ?Sized>(
		&self,
		key: &[Token],
		mut words: Vec<String>,
		rng: &mut R,
	) -> Result<Vec<String>, WalkError> {
		let mut state = match self.model.state(key) {
			Some(state) if !state.is_empty() => state,
			_ => return Err(WalkError::NoData),
		};

		let mut drawn = 0;
		loop {
			// A compiled chain has no dead ends, treat one as exhausted data
			let next = state.predict(rng).ok_or(WalkError::NoData)?;

			let word = match next {
				Token::End => return Ok(words),
				Token::Word(word) => word,
				Token::Begin => return Err(WalkError::NoData),
			};

			drawn += 1;
			if drawn > self.max_length {
				return Err(WalkError::TooLong(self.max_length));
			}
			words.push(word.clone());

			let key = ChainModel::next_key(state.key(), next);
			state = self.model.state(&key).ok_or(WalkError::NoData)?;
		}
	}
}
