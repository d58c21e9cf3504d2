use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{LevelFilter, debug, warn};
use rs_sentgen_core::extract::build_corpus;
use rs_sentgen_core::{GenerationConfig, GenerationStatus, generate_from_text};

/// Command-line options.
///
/// Values given on the command line override the configuration file, which
/// overrides the built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "rs-sentgen", version, about = "Generate new sentences from a text corpus with a Markov chain")]
struct Cli {
	/// Input files or directories (directories are read one level deep).
	/// Reads standard input when none are given.
	inputs: Vec<PathBuf>,

	/// Specify up to three times to increase verbosity: -v warnings,
	/// -vv information messages, -vvv debug messages
	#[arg(short = 'v', long = "verbosity", action = ArgAction::Count)]
	verbosity: u8,

	/// Number of sentences to generate
	#[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
	count: Option<u64>,

	/// JSON configuration file
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Number of words in a chain state
	#[arg(short = 's', long, value_parser = clap::value_parser!(u64).range(1..))]
	state_size: Option<u64>,

	/// Attempts per sentence before skipping it
	#[arg(short = 't', long = "tries")]
	tries: Option<usize>,

	/// Minimum words per sentence
	#[arg(long)]
	min_words: Option<usize>,

	/// Maximum words per sentence
	#[arg(long)]
	max_words: Option<usize>,

	/// Maximum characters per sentence
	#[arg(long)]
	max_chars: Option<usize>,

	/// Reject sentences sharing this fraction of a source sentence, or "none"
	#[arg(long, value_name = "RATIO|none", value_parser = parse_ratio)]
	max_overlap_ratio: Option<Ratio>,

	/// Reject sentences sharing this many words with a source sentence
	#[arg(long)]
	max_overlap_total: Option<usize>,

	/// Maximum words drawn in one walk
	#[arg(long = "max-walk")]
	max_walk: Option<usize>,

	/// Seed for reproducible output
	#[arg(long)]
	seed: Option<u64>,

	/// Words every sentence starts with
	#[arg(long)]
	start: Option<String>,

	/// Ignore source sentences with quotes, brackets or dangling apostrophes
	#[arg(long)]
	well_formed: bool,

	/// Print the full report as JSON
	#[arg(long)]
	json: bool,
}

/// Overlap ratio option: a value, or explicitly disabled.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Ratio {
	Value(f64),
	Disabled,
}

fn parse_ratio(s: &str) -> std::result::Result<Ratio, String> {
	if s.eq_ignore_ascii_case("none") {
		return Ok(Ratio::Disabled);
	}
	match s.parse::<f64>() {
		Ok(r) if r > 0.0 && r <= 1.0 => Ok(Ratio::Value(r)),
		Ok(r) => Err(format!("ratio must be in (0.0, 1.0], got {r}")),
		Err(_) => Err(format!("expected a number or \"none\", got {s:?}")),
	}
}

impl Cli {
	/// Layers defaults, the configuration file and command-line values.
	fn generation_config(&self) -> Result<GenerationConfig> {
		let mut config = match &self.config {
			Some(path) => {
				let raw = fs::read_to_string(path)
					.with_context(|| format!("failed to read configuration {}", path.display()))?;
				serde_json::from_str::<GenerationConfig>(&raw)
					.with_context(|| format!("failed to parse configuration {}", path.display()))?
			}
			None => GenerationConfig::default(),
		};

		if let Some(count) = self.count {
			config.count = usize::try_from(count).context("count is too large")?;
		}
		if let Some(state_size) = self.state_size {
			config.state_size = usize::try_from(state_size).context("state size is too large")?;
		}
		if let Some(tries) = self.tries {
			config.retry_budget = tries;
		}
		if let Some(min_words) = self.min_words {
			config.min_words = min_words;
		}
		if self.max_words.is_some() {
			config.max_words = self.max_words;
		}
		if self.max_chars.is_some() {
			config.max_chars = self.max_chars;
		}
		match self.max_overlap_ratio {
			Some(Ratio::Value(r)) => config.set_max_overlap_ratio(Some(r))?,
			Some(Ratio::Disabled) => config.set_max_overlap_ratio(None)?,
			None => (),
		}
		if self.max_overlap_total.is_some() {
			config.max_overlap_total = self.max_overlap_total;
		}
		if self.max_walk.is_some() {
			config.max_walk_length = self.max_walk;
		}
		if self.seed.is_some() {
			config.seed = self.seed;
		}
		if self.start.is_some() {
			config.start = self.start.clone();
		}
		if self.well_formed {
			config.well_formed = true;
		}

		config.validate()?;
		Ok(config)
	}
}

/// Maps the `-v` count to a level: error, warn, info, debug.
fn verbosity_level(verbosity: u8) -> LevelFilter {
	match verbosity {
		0 => LevelFilter::Error,
		1 => LevelFilter::Warn,
		2 => LevelFilter::Info,
		_ => LevelFilter::Debug,
	}
}

/// Logs to stderr. Up to -vv only the message is printed; -vvv adds
/// timestamps, level and module path. `RUST_LOG` still applies on top.
fn init_logger(verbosity: u8) {
	let mut builder = env_logger::Builder::new();
	builder.filter_level(verbosity_level(verbosity));
	if verbosity <= 2 {
		builder.format(|buf, record| writeln!(buf, "{}", record.args()));
	} else {
		builder.format_timestamp_millis().format_module_path(true);
	}
	builder.parse_default_env();
	builder.init();
}

fn read_stdin() -> Result<String> {
	let stdin = io::stdin();
	if stdin.is_terminal() {
		warn!("No input files given, reading standard input");
	}
	let mut text = String::new();
	stdin.lock().read_to_string(&mut text).context("failed to read standard input")?;
	Ok(text)
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	init_logger(cli.verbosity);

	let config = cli.generation_config()?;
	debug!("Configuration: {:?}", config);

	let corpus = if cli.inputs.is_empty() { read_stdin()? } else { build_corpus(&cli.inputs) };

	let report = generate_from_text(&corpus, &config)?;

	let stdout = io::stdout();
	let mut out = stdout.lock();
	if cli.json {
		serde_json::to_writer_pretty(&mut out, &report).context("failed to write report")?;
		writeln!(out)?;
	} else {
		for sentence in &report.sentences {
			writeln!(out, "{}", sentence)?;
		}
	}

	// An empty corpus was already reported while generating
	if report.status == GenerationStatus::Partial {
		warn!("Generated {} of {} sentence(s)", report.produced, report.requested);
	}

	Ok(())
}
