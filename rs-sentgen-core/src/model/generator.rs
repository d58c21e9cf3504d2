use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::chain::ChainModel;
use super::config::GenerationConfig;
use super::quality::{QualityGate, SentenceSet, Verdict};
use super::sampler::Sampler;
use super::token::Token;
use super::tokenizer::Tokenizer;
use crate::error::{GenError, Result, WalkError};

/// Odd constant spreading slot indices over the seed space.
const SLOT_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// A trained corpus: the chain and the source sentences it was built from.
///
/// Immutable once built and `Send + Sync`, so any number of generators can
/// share it.
#[derive(Clone, Debug)]
pub struct Corpus {
	model: ChainModel,
	sentences: SentenceSet,
}

impl Corpus {
	/// Tokenizes `text` and builds a chain of the given state size.
	///
	/// # Errors
	/// - `InvalidStateSize` if `state_size` is 0.
	/// - `EmptyCorpus` if the text holds no sentence.
	pub fn from_text(text: &str, state_size: usize) -> Result<Self> {
		Self::build(text, Tokenizer::new(), state_size)
	}

	/// Like `from_text`, with the state size and filters of `config`.
	pub fn with_config(text: &str, config: &GenerationConfig) -> Result<Self> {
		config.validate()?;
		Self::build(text, Tokenizer::new().well_formed(config.well_formed), config.state_size)
	}

	fn build(text: &str, tokenizer: Tokenizer, state_size: usize) -> Result<Self> {
		let sentences = tokenizer.tokenize(text);
		let model = ChainModel::build(&sentences, state_size)?;
		Ok(Self { model, sentences: SentenceSet::new(sentences) })
	}

	/// Assembles a corpus from an existing chain, e.g. several merged ones.
	///
	/// The chain is compiled again so it can be sampled.
	pub fn from_parts(mut model: ChainModel, sentences: SentenceSet) -> Self {
		model.compile();
		Self { model, sentences }
	}

	pub fn model(&self) -> &ChainModel {
		&self.model
	}

	pub fn sentences(&self) -> &SentenceSet {
		&self.sentences
	}
}

/// How a generation request ended.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
	/// Every requested sentence was produced.
	Complete,
	/// Some slots ran out of attempts.
	Partial,
	/// There was nothing to learn from.
	NoUsableCorpus,
}

/// Result of a generation request.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct GenerationReport {
	/// Accepted sentences, in generation order.
	pub sentences: Vec<String>,
	pub produced: usize,
	pub requested: usize,
	pub status: GenerationStatus,
}

impl GenerationReport {
	fn new(sentences: Vec<String>, requested: usize) -> Self {
		let produced = sentences.len();
		let status = if produced < requested { GenerationStatus::Partial } else { GenerationStatus::Complete };
		Self { sentences, produced, requested, status }
	}

	/// An empty report for a corpus without sentences.
	pub fn no_usable_corpus(requested: usize) -> Self {
		Self { sentences: Vec::new(), produced: 0, requested, status: GenerationStatus::NoUsableCorpus }
	}

	pub fn shortfall(&self) -> usize {
		self.requested - self.produced
	}
}

/// Sentence generator over a shared `Corpus`.
///
/// # Responsibilities
/// - Run sampler walks and feed candidates to the quality gate
/// - Retry each sentence up to `retry_budget` times
/// - Keep output reproducible for a given seed
///
/// Each requested sentence ("slot") draws from its own random stream,
/// derived from the base seed and the slot index. A slot therefore sees the
/// same candidates whatever happened in earlier slots, and a larger retry
/// budget only ever adds attempts at the end of a slot.
#[derive(Debug, Clone)]
pub struct Generator<'c> {
	corpus: &'c Corpus,
	sampler: Sampler<'c>,
	gate: QualityGate,
	retry_budget: usize,
	/// Start key and the words it was built from.
	start: Option<(Vec<Token>, Vec<String>)>,
}

impl<'c> Generator<'c> {
	/// Creates a generator configured by `config`.
	///
	/// The state size and filters of `config` are not used here: they
	/// belong to the corpus, which is already built.
	///
	/// # Errors
	/// - Any `validate` error of the configuration.
	/// - `UnknownStart` if `config.start` is not a state of the chain.
	pub fn new(corpus: &'c Corpus, config: &GenerationConfig) -> Result<Self> {
		config.validate()?;

		let mut generator = Self::with_gate(corpus, config.quality_gate(), config.retry_budget);
		if let Some(max_length) = config.max_walk_length {
			generator.sampler = Sampler::new(corpus.model(), max_length);
		}
		if let Some(words) = config.start_words() {
			let key = corpus.model().seed_key(&words)?;
			generator.start = Some((key, words));
		}
		Ok(generator)
	}

	/// Creates a generator with an explicit gate and the default walk cap.
	pub fn with_gate(corpus: &'c Corpus, gate: QualityGate, retry_budget: usize) -> Self {
		Self {
			corpus,
			sampler: Sampler::with_default_cap(corpus.model()),
			gate,
			retry_budget,
			start: None,
		}
	}

	/// Tries up to `retry_budget` walks and returns the first accepted one.
	///
	/// # Returns
	/// - `Ok(Some(sentence))`: words joined by single spaces.
	/// - `Ok(None)`: every attempt was rejected.
	/// - `Err(WalkError::NoData)`: the chain cannot produce anything.
	pub fn make_sentence<R: Rng + ?Sized>(&self, rng: &mut R) -> std::result::Result<Option<String>, WalkError> {
		for attempt in 1..=self.retry_budget {
			let walk = match &self.start {
				Some((key, words)) => self.sampler.walk_from(key, words.clone(), rng),
				None => self.sampler.walk(rng),
			};

			let candidate = match walk {
				Ok(words) => words,
				Err(WalkError::TooLong(limit)) => {
					debug!("Attempt {}: walk exceeded {} words", attempt, limit);
					continue;
				}
				Err(e) => return Err(e),
			};

			match self.gate.check(&candidate, self.corpus.sentences()) {
				Verdict::Accept => return Ok(Some(candidate.join(" "))),
				verdict => debug!("Attempt {}: rejected {:?}", attempt, verdict),
			}
		}
		Ok(None)
	}

	/// Generates up to `count` sentences.
	///
	/// # Behavior
	/// - Slots that exhaust their retry budget are skipped and reported
	///   through `produced < requested`.
	/// - A chain with no data ends the request with `NoUsableCorpus`.
	/// - A zero retry budget skips every slot without walking.
	/// - Without a seed, a base seed is drawn from the OS.
	pub fn generate(&self, count: usize, seed: Option<u64>) -> GenerationReport {
		let base_seed = seed.unwrap_or_else(|| rand::rng().random());
		debug!("Generating {} sentence(s) with base seed {}", count, base_seed);

		if self.retry_budget == 0 {
			warn!("No attempt allowed per sentence, skipping all {} sentence(s)", count);
			return GenerationReport::new(Vec::new(), count);
		}

		// Grows with accepted sentences only; `count` may be far above what is produced
		let mut sentences = Vec::new();
		for slot in 0..count {
			let mut rng = slot_rng(base_seed, slot);
			match self.make_sentence(&mut rng) {
				Ok(Some(sentence)) => sentences.push(sentence),
				Ok(None) => warn!("Sentence {} skipped after {} attempt(s)", slot + 1, self.retry_budget),
				Err(e) => {
					warn!("No usable corpus: {}", e);
					return GenerationReport::no_usable_corpus(count);
				}
			}
		}

		let report = GenerationReport::new(sentences, count);
		info!("Generated {}/{} sentence(s)", report.produced, report.requested);
		report
	}
}

/// Random stream of one slot.
fn slot_rng(base_seed: u64, slot: usize) -> StdRng {
	StdRng::seed_from_u64(base_seed ^ (slot as u64).wrapping_mul(SLOT_SEED_MIX))
}

/// Builds a corpus from raw text with the default tokenizer.
///
/// `GenError::EmptyCorpus` signals that the text holds no sentence.
pub fn build_model(corpus_text: &str, state_size: usize) -> Result<Corpus> {
	Corpus::from_text(corpus_text, state_size)
}

/// Generates `count` sentences with the default quality thresholds.
pub fn generate(corpus: &Corpus, count: usize, retry_budget: usize, seed: Option<u64>) -> GenerationReport {
	Generator::with_gate(corpus, QualityGate::default(), retry_budget).generate(count, seed)
}

/// Builds a corpus from `corpus_text` and generates `config.count` sentences.
///
/// An empty corpus is not an error: the report carries `NoUsableCorpus`.
///
/// # Errors
/// Invalid configuration, including unknown start words.
pub fn generate_from_text(corpus_text: &str, config: &GenerationConfig) -> Result<GenerationReport> {
	let corpus = match Corpus::with_config(corpus_text, config) {
		Ok(corpus) => corpus,
		Err(GenError::EmptyCorpus) => {
			warn!("No usable corpus: input contains no sentences");
			return Ok(GenerationReport::no_usable_corpus(config.count));
		}
		Err(e) => return Err(e),
	};

	let generator = Generator::new(&corpus, config)?;
	Ok(generator.generate(config.count, config.seed))
}

#[cfg(test)]
mod tests {
	use super::*;

	const CATS: &str = "The cat sat. The cat ran. The dog sat.";

	fn permissive(corpus: &Corpus, retry_budget: usize) -> Generator<'_> {
		let gate = QualityGate { max_overlap_ratio: None, max_overlap_total: None, ..QualityGate::default() };
		Generator::with_gate(corpus, gate, retry_budget)
	}

	#[test]
	fn test_corpus_is_send_and_sync() {
		fn assert_shared<T: Send + Sync>() {}
		assert_shared::<Corpus>();
	}

	#[test]
	fn test_build_model_empty() {
		assert!(matches!(build_model("", 2), Err(GenError::EmptyCorpus)));
		assert!(matches!(build_model(" \n\n ", 2), Err(GenError::EmptyCorpus)));
	}

	#[test]
	fn test_huge_count_without_attempts() {
		let corpus = build_model(CATS, 1).unwrap();
		let report = generate(&corpus, usize::MAX, 0, Some(1));
		assert_eq!(report.produced, 0);
		assert_eq!(report.requested, usize::MAX);
		assert_eq!(report.status, GenerationStatus::Partial);
	}

	#[test]
	fn test_report_status() {
		assert_eq!(GenerationReport::new(vec!["a".into()], 1).status, GenerationStatus::Complete);
		let partial = GenerationReport::new(vec!["a".into()], 3);
		assert_eq!(partial.status, GenerationStatus::Partial);
		assert_eq!(partial.shortfall(), 2);
		assert_eq!(GenerationReport::no_usable_corpus(4).requested, 4);
	}

	#[test]
	fn test_verbatim_only_corpus_produces_nothing() {
		// Every walk reproduces a source sentence
		let corpus = build_model(CATS, 1).unwrap();
		let report = generate(&corpus, 3, 20, Some(1));
		assert_eq!(report.produced, 0);
		assert_eq!(report.requested, 3);
		assert_eq!(report.status, GenerationStatus::Partial);
	}

	#[test]
	fn test_permissive_gate_produces_walks() {
		let corpus = build_model(CATS, 1).unwrap();
		let report = permissive(&corpus, 10).generate(4, Some(3));
		assert_eq!(report.produced, 4);
		for sentence in &report.sentences {
			assert!(["The cat sat.", "The cat ran.", "The dog sat."].contains(&sentence.as_str()));
		}
	}

	#[test]
	fn test_zero_retry_budget() {
		let corpus = build_model(CATS, 1).unwrap();
		let report = permissive(&corpus, 0).generate(2, Some(3));
		assert_eq!(report.produced, 0);
		assert_eq!(report.status, GenerationStatus::Partial);
	}

	#[test]
	fn test_same_seed_same_output() {
		let text = "a b c d. b c d e. c d e f. d e f a. e f a b. f a b c.";
		let corpus = build_model(text, 1).unwrap();
		let generator = permissive(&corpus, 50);
		assert_eq!(generator.generate(10, Some(77)), generator.generate(10, Some(77)));
	}

	#[test]
	fn test_start_words() {
		let corpus = build_model("The cat sat on the mat. The dog ran to the park.", 2).unwrap();
		let mut config = GenerationConfig::default();
		config.start = Some("The dog".to_owned());
		config.set_max_overlap_ratio(None).unwrap();
		config.max_overlap_total = None;

		let generator = Generator::new(&corpus, &config).unwrap();
		let report = generator.generate(3, Some(11));
		assert_eq!(report.produced, 3);
		for sentence in &report.sentences {
			assert!(sentence.starts_with("The dog"), "{sentence}");
		}
	}

	#[test]
	fn test_unknown_start_words() {
		let corpus = build_model(CATS, 2).unwrap();
		let mut config = GenerationConfig::default();
		config.start = Some("A horse".to_owned());
		assert!(matches!(Generator::new(&corpus, &config), Err(GenError::UnknownStart(_))));
	}

	#[test]
	fn test_walk_cap_from_config() {
		let corpus = build_model("one two three four five six seven.", 1).unwrap();
		let mut config = GenerationConfig::default();
		config.max_walk_length = Some(3);
		config.set_max_overlap_ratio(None).unwrap();
		config.max_overlap_total = None;

		let report = Generator::new(&corpus, &config).unwrap().generate(1, Some(0));
		assert_eq!(report.produced, 0);
	}

	#[test]
	fn test_generate_from_text_empty() {
		let report = generate_from_text("", &GenerationConfig::default()).unwrap();
		assert_eq!(report.status, GenerationStatus::NoUsableCorpus);
		assert_eq!(report.produced, 0);
		assert_eq!(report.requested, 5);
	}

	#[test]
	fn test_generate_from_text_invalid_config() {
		let mut config = GenerationConfig::default();
		config.state_size = 0;
		assert!(matches!(generate_from_text(CATS, &config), Err(GenError::InvalidStateSize(0))));
	}

	#[test]
	fn test_from_parts_merged_chains() {
		let left = build_model("The cat sat on the mat.", 2).unwrap();
		let right = build_model("The dog sat on the rug.", 2).unwrap();

		let mut model = left.model().clone();
		model.merge(right.model()).unwrap();
		let sentences = SentenceSet::new(left.sentences().iter().chain(right.sentences().iter()).cloned());
		let merged = Corpus::from_parts(model, sentences);

		assert_eq!(merged.sentences().len(), 2);
		let report = permissive(&merged, 10).generate(8, Some(8));
		assert_eq!(report.produced, 8);
		for sentence in &report.sentences {
			assert!(
				[
					"The cat sat on the mat.",
					"The cat sat on the rug.",
					"The dog sat on the mat.",
					"The dog sat on the rug.",
				]
				.contains(&sentence.as_str()),
				"{sentence}"
			);
		}
	}
}
