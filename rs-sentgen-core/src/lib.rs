//! Markov-chain sentence generation library.
//!
//! This crate learns a word-level n-gram chain from plain text and samples
//! new sentences from it, including:
//! - Sentence splitting and word tokenization
//! - Chain construction (parallel for large corpora) and merging
//! - Weighted random walks with a bounded length
//! - Quality checks against the source (length, overlap ratio)
//! - Reproducible generation for a fixed seed
//! - Text extraction from input files, keyed by file format
//!
//! The usual entry points are `build_model` + `generate`, or
//! `generate_from_text` for a one-shot request.

/// Error types shared by the whole crate.
pub mod error;

/// Core chain model and generation logic.
pub mod model;

/// Per-format text extraction used to assemble a corpus from files.
pub mod extract;

/// I/O utilities (file loading, directory listing).
///
/// Not exposed
pub(crate) mod io;

pub use error::{GenError, Result, WalkError};
pub use model::config::GenerationConfig;
pub use model::generator::{
	Corpus, GenerationReport, GenerationStatus, Generator, build_model, generate, generate_from_text,
};
