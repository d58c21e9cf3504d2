use serde::{Deserialize, Serialize};

use super::quality::QualityGate;
use crate::error::{GenError, Result};

/// Input parameters for building a corpus and generating sentences.
///
/// `GenerationConfig` groups the **model parameters** (state size,
/// well-formedness filter), the **driver parameters** (count, retry budget,
/// walk cap, seed, start words) and the **quality thresholds**.
///
/// Missing fields take their default when deserialized, so a partial JSON
/// document is a valid configuration. Deserialization bypasses the setters;
/// call `validate` afterwards.
///
/// # Invariants (checked by `validate`)
/// - `state_size >= 1`
/// - `max_overlap_ratio`, when set, is in `(0.0, 1.0]`
/// - `min_words <= max_words` when `max_words` is set
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
	/// Number of tokens in a chain state.
	pub state_size: usize,

	/// Number of sentences to generate.
	pub count: usize,

	/// Attempts per sentence before giving up on it.
	pub retry_budget: usize,

	/// Minimum number of words in an accepted sentence.
	pub min_words: usize,

	/// Maximum number of words in an accepted sentence.
	pub max_words: Option<usize>,

	/// Maximum number of characters in an accepted sentence.
	pub max_chars: Option<usize>,

	/// Reject sentences sharing at least this fraction of their words,
	/// in order, with one source sentence. `None` disables the check.
	max_overlap_ratio: Option<f64>,

	/// Reject sentences sharing at least this many words, in order, with one
	/// source sentence. `None`, the default, disables the check.
	pub max_overlap_total: Option<usize>,

	/// Maximum words drawn per walk. `None` derives it from the corpus.
	pub max_walk_length: Option<usize>,

	/// Seed for reproducible output. `None` seeds from the OS.
	pub seed: Option<u64>,

	/// Words every generated sentence starts with.
	pub start: Option<String>,

	/// Drop source sentences with quotes, brackets or dangling apostrophes.
	pub well_formed: bool,
}

impl Default for GenerationConfig {
	fn default() -> Self {
		let gate = QualityGate::default();
		Self {
			state_size: 2,
			count: 5,
			retry_budget: 50,
			min_words: gate.min_words,
			max_words: gate.max_words,
			max_chars: gate.max_chars,
			max_overlap_ratio: gate.max_overlap_ratio,
			max_overlap_total: gate.max_overlap_total,
			max_walk_length: None,
			seed: None,
			start: None,
			well_formed: false,
		}
	}
}

impl GenerationConfig {
	/// Returns the current overlap ratio threshold.
	pub fn max_overlap_ratio(&self) -> Option<f64> {
		self.max_overlap_ratio
	}

	/// Sets the overlap ratio threshold, `None` to disable it.
	///
	/// # Errors
	/// Returns an error if the value is outside `(0.0, 1.0]`.
	pub fn set_max_overlap_ratio(&mut self, ratio: Option<f64>) -> Result<()> {
		Self::check_ratio(ratio)?;
		self.max_overlap_ratio = ratio;
		Ok(())
	}

	fn check_ratio(ratio: Option<f64>) -> Result<()> {
		match ratio {
			Some(r) if !(r > 0.0 && r <= 1.0) => Err(GenError::InvalidConfig(format!(
				"max_overlap_ratio must be in (0.0, 1.0], got {}",
				r
			))),
			_ => Ok(()),
		}
	}

	/// Checks every invariant of the configuration.
	pub fn validate(&self) -> Result<()> {
		if self.state_size < 1 {
			return Err(GenError::InvalidStateSize(self.state_size));
		}
		Self::check_ratio(self.max_overlap_ratio)?;
		if let Some(max) = self.max_words {
			if max < self.min_words {
				return Err(GenError::InvalidConfig(format!(
					"max_words ({}) is lower than min_words ({})",
					max, self.min_words
				)));
			}
		}
		if self.max_walk_length == Some(0) {
			return Err(GenError::InvalidConfig("max_walk_length must be >= 1".to_owned()));
		}
		if let Some(start) = &self.start {
			if start.split_whitespace().next().is_none() {
				return Err(GenError::InvalidConfig("start must contain at least one word".to_owned()));
			}
		}
		Ok(())
	}

	/// The quality gate described by this configuration.
	pub fn quality_gate(&self) -> QualityGate {
		QualityGate {
			min_words: self.min_words,
			max_words: self.max_words,
			max_chars: self.max_chars,
			max_overlap_ratio: self.max_overlap_ratio,
			max_overlap_total: self.max_overlap_total,
		}
	}

	/// Start words split on whitespace, if any.
	pub fn start_words(&self) -> Option<Vec<String>> {
		self.start.as_ref().map(|s| s.split_whitespace().map(str::to_owned).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_are_valid() {
		let config = GenerationConfig::default();
		assert!(config.validate().is_ok());
		assert_eq!(config.state_size, 2);
		assert_eq!(config.count, 5);
		assert_eq!(config.retry_budget, 50);
		assert_eq!(config.max_overlap_ratio(), Some(0.7));
	}

	#[test]
	fn test_set_max_overlap_ratio() {
		let mut config = GenerationConfig::default();
		assert!(config.set_max_overlap_ratio(Some(1.0)).is_ok());
		assert!(config.set_max_overlap_ratio(None).is_ok());
		assert!(config.set_max_overlap_ratio(Some(0.0)).is_err());
		assert!(config.set_max_overlap_ratio(Some(1.5)).is_err());
		assert!(config.set_max_overlap_ratio(Some(f64::NAN)).is_err());
		// Unchanged by the failed calls
		assert_eq!(config.max_overlap_ratio(), None);
	}

	#[test]
	fn test_validate_rejects_bad_values() {
		let config = GenerationConfig { state_size: 0, ..GenerationConfig::default() };
		assert!(matches!(config.validate(), Err(GenError::InvalidStateSize(0))));

		let config = GenerationConfig { min_words: 5, max_words: Some(4), ..GenerationConfig::default() };
		assert!(config.validate().is_err());

		let config = GenerationConfig { max_walk_length: Some(0), ..GenerationConfig::default() };
		assert!(config.validate().is_err());

		let config = GenerationConfig { start: Some("  ".to_owned()), ..GenerationConfig::default() };
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_quality_gate_mirrors_config() {
		let config = GenerationConfig { min_words: 4, max_chars: Some(80), ..GenerationConfig::default() };
		let gate = config.quality_gate();
		assert_eq!(gate.min_words, 4);
		assert_eq!(gate.max_chars, Some(80));
		assert_eq!(gate.max_overlap_total, None);
	}

	#[test]
	fn test_start_words() {
		let config = GenerationConfig { start: Some(" The  cat ".to_owned()), ..GenerationConfig::default() };
		assert_eq!(config.start_words(), Some(vec!["The".to_owned(), "cat".to_owned()]));
	}
}
