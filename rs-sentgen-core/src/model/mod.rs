//! Top-level module for the sentence generation system.
//!
//! This module provides a word-level Markov sentence generator, including:
//! - Corpus tokenization (`Tokenizer`)
//! - The state -> successor chain (`ChainModel`, `State`)
//! - Weighted random walks (`Sampler`)
//! - Candidate filtering (`QualityGate`)
//! - Generation configuration (`GenerationConfig`)
//! - A high-level generation interface (`Generator`)

/// Chain tokens, including the `BEGIN` / `END` sentinels.
pub mod token;

/// Splits raw corpus text into sentences of words.
pub mod tokenizer;

/// A single chain state (key) and its weighted successors.
///
/// Tracks outgoing transitions and supports weighted random sampling.
pub mod state;

/// Word-level Markov chain of fixed state size.
///
/// Supports parallel construction, merging, and seeded start keys.
pub mod chain;

/// Weighted random walks over a chain, bounded in length.
pub mod sampler;

/// Length and novelty checks applied to generated candidates.
pub mod quality;

/// Generation parameters and their validation.
pub mod config;

/// High-level interface: build a corpus, generate N sentences.
pub mod generator;
