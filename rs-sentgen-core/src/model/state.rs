use std::collections::BTreeMap;

use rand::Rng;

use super::token::Token;

/// Represents a state of the chain.
///
/// A `State` corresponds to a fixed tuple of `state_size` tokens (`key`) and
/// stores all observed successors of that tuple.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate successor occurrences during learning
/// - Draw the next token using weighted random sampling
/// - Merge with another state having the same key (parallel learning support)
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
/// - Once compiled, `cumulative[i]` is the sum of the weights of
///   `choices[0..=i]`
#[derive(Clone, Debug)]
pub struct State {
	/// Identifier of the state (the last `state_size` tokens).
	key: Vec<Token>,
	/// Outgoing transitions indexed by the next token.
	/// The value represents how many times this transition was observed.
	/// Example: { "cat" => 42, "dog" => 3, END => 7 }
	transitions: BTreeMap<Token, usize>,
	/// Successors in `transitions` order, filled by `compile`.
	choices: Vec<Token>,
	/// Running weight totals aligned with `choices`, filled by `compile`.
	cumulative: Vec<usize>,
}

impl State {
	/// Creates a new empty state for the given key.
	pub fn new(key: &[Token]) -> Self {
		Self {
			key: key.to_vec(),
			transitions: BTreeMap::new(),
			choices: Vec::new(),
			cumulative: Vec::new(),
		}
	}

	pub fn key(&self) -> &[Token] {
		&self.key
	}

	/// Records one occurrence of a transition toward `next`.
	pub fn add_transition(&mut self, next: Token) {
		self.add_transitions(next, 1);
	}

	fn add_transitions(&mut self, next: Token, occurrence: usize) {
		*self.transitions.entry(next).or_insert(0) += occurrence;
		// Stale until the next compile
		self.choices.clear();
		self.cumulative.clear();
	}

	/// Iterates over successors and their weights, in token order.
	pub fn transitions(&self) -> impl Iterator<Item = (&Token, usize)> {
		self.transitions.iter().map(|(token, occurrence)| (token, *occurrence))
	}

	/// Sum of all transition weights.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Weight of the transition toward `next`, 0 if never observed.
	pub fn weight(&self, next: &Token) -> usize {
		self.transitions.get(next).copied().unwrap_or(0)
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Builds the cumulative-weight table used by `predict`.
	pub fn compile(&mut self) {
		self.choices.clear();
		self.cumulative.clear();

		let mut running = 0;
		for (next, occurrence) in &self.transitions {
			running += occurrence;
			self.choices.push(next.clone());
			self.cumulative.push(running);
		}
	}

	/// Draws the next token using weighted random sampling.
	///
	/// The probability of selecting a token is proportional to its
	/// occurrence count. Selection is a binary search over the cumulative
	/// weights, so the cost is O(log n) in the number of successors.
	///
	/// Returns `None` if the state has no transitions or was not compiled.
	pub fn predict<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Token> {
		let total = *self.cumulative.last()?;
		if total == 0 {
			return None;
		}

		let r = rng.random_range(0..total);
		let index = self.cumulative.partition_point(|&c| c <= r);
		self.choices.get(index)
	}

	/// Merges another state into this one.
	///
	/// Both states must represent the same key. Transition occurrence counts
	/// are summed. The merged state must be compiled again before sampling.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.key != other.key {
			return Err("Key mismatch".to_owned());
		}

		for (next, occurrence) in &other.transitions {
			self.add_transitions(next.clone(), *occurrence);
		}

		Ok(())
	}
}
