//! Error types for corpus building and sentence generation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by model construction, configuration and extraction.
#[derive(Debug, Error)]
pub enum GenError {
	/// The corpus produced no sentences, so no model can be built.
	#[error("no usable corpus: input contains no sentences")]
	EmptyCorpus,

	/// State size must be at least 1.
	#[error("state size must be >= 1, got {0}")]
	InvalidStateSize(usize),

	/// Two models with different state sizes cannot be merged.
	#[error("state size mismatch: self={expected}, other={found}")]
	StateSizeMismatch {
		expected: usize,
		found: usize,
	},

	/// A configuration value is out of range or inconsistent.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// The requested start words do not form a state known to the model.
	#[error("start words {0:?} do not lead to any state of the chain")]
	UnknownStart(String),

	/// An invariant of the chain was broken.
	#[error("internal error: {0}")]
	Internal(String),

	#[error("failed to read {path}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to open document archive {path}")]
	Archive {
		path: PathBuf,
		#[source]
		source: zip::result::ZipError,
	},

	#[error("malformed document markup in {path}")]
	Markup {
		path: PathBuf,
		#[source]
		source: quick_xml::Error,
	},
}

/// Why a single random walk did not produce a candidate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WalkError {
	/// The starting state has no successors.
	#[error("model has no data")]
	NoData,

	/// `END` was not drawn within the allowed number of words.
	#[error("walk exceeded maximum length of {0} words")]
	TooLong(usize),
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, GenError>;
