//! Text extraction from input files.
//!
//! Every supported format has one `Extractor`. The closed `Format` registry
//! maps file extensions to formats; anything unrecognized resolves to
//! `Format::Unknown`, whose extractor logs a warning and yields no text.
//! A bad file never stops the assembly of a corpus.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{info, warn};
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::{Captures, Regex};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{GenError, Result};
use crate::io;

/// Input formats with a dedicated extractor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
	/// `.txt`, `.text`, `.md`, `.markdown`, `.rst`
	PlainText,
	/// `.html`, `.htm`, `.xhtml`
	Html,
	/// `.docx` (Office Open XML word processing)
	Docx,
	/// Any other extension, or none.
	Unknown,
}

impl Format {
	/// Looks up the format of a path by extension (case-insensitive).
	pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
		match io::get_extension(path).as_deref() {
			Some("txt" | "text" | "md" | "markdown" | "rst") => Format::PlainText,
			Some("html" | "htm" | "xhtml") => Format::Html,
			Some("docx") => Format::Docx,
			_ => Format::Unknown,
		}
	}

	/// The extractor registered for this format.
	pub fn extractor(self) -> &'static dyn Extractor {
		match self {
			Format::PlainText => &PlainTextExtractor,
			Format::Html => &HtmlExtractor,
			Format::Docx => &DocxExtractor,
			Format::Unknown => &UnknownExtractor,
		}
	}
}

/// Turns one file into plain corpus text.
pub trait Extractor: Send + Sync {
	/// Short name used in logs.
	fn name(&self) -> &'static str;

	/// Extracts the text of `path`.
	///
	/// # Errors
	/// `GenError::Io` if the file cannot be read.
	fn extract(&self, path: &Path) -> Result<String>;
}

fn read(path: &Path) -> Result<String> {
	io::read_file(path).map_err(|source| GenError::Io { path: path.to_path_buf(), source })
}

/// Plain text and lightweight markup, read as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
	fn name(&self) -> &'static str {
		"text"
	}

	fn extract(&self, path: &Path) -> Result<String> {
		read(path)
	}
}

/// HTML pages: scripts, styles and comments are dropped, block elements end
/// a line, remaining tags are removed and common entities decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

// Constant patterns below cannot fail to compile
static HTML_HIDDEN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>|<head\b.*?</head\s*>")
		.expect("hidden pattern is valid")
});
static HTML_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)</?(p|div|br|li|ul|ol|h[1-6]|tr|table|blockquote|section|article|title|pre)\b[^>]*>")
		.expect("block pattern is valid")
});
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));
static HTML_ENTITY: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity pattern is valid"));

impl HtmlExtractor {
	/// Converts an HTML document to plain text.
	pub fn to_text(html: &str) -> String {
		let text = HTML_HIDDEN.replace_all(html, " ");
		let text = HTML_BLOCK.replace_all(&text, "\n");
		let text = HTML_TAG.replace_all(&text, " ");
		HTML_ENTITY.replace_all(&text, |caps: &Captures| decode_entity(&caps[1], &caps[0])).into_owned()
	}
}

fn decode_entity(name: &str, raw: &str) -> String {
	let decoded = match name {
		"amp" => Some('&'),
		"lt" => Some('<'),
		"gt" => Some('>'),
		"quot" => Some('"'),
		"apos" => Some('\''),
		"nbsp" => Some(' '),
		_ => {
			let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
				u32::from_str_radix(hex, 16).ok()
			} else if let Some(dec) = name.strip_prefix('#') {
				dec.parse::<u32>().ok()
			} else {
				None
			};
			code.and_then(char::from_u32)
		}
	};

	match decoded {
		Some(c) => c.to_string(),
		None => raw.to_owned(),
	}
}

impl Extractor for HtmlExtractor {
	fn name(&self) -> &'static str {
		"html"
	}

	fn extract(&self, path: &Path) -> Result<String> {
		Ok(Self::to_text(&read(path)?))
	}
}

/// Word documents: the text runs of the main document part, one line per
/// paragraph. Tabs and line breaks inside a paragraph become spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

/// Archive entry holding the document body.
const DOCX_BODY: &str = "word/document.xml";

impl DocxExtractor {
	/// Collects the paragraphs of a WordprocessingML body.
	///
	/// Empty paragraphs are dropped.
	pub fn to_text(xml: &str) -> std::result::Result<String, quick_xml::Error> {
		let mut reader = Reader::from_str(xml);
		let mut paragraphs = Vec::new();
		let mut paragraph = String::new();
		let mut in_run_text = false;

		loop {
			match reader.read_event()? {
				Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
				Event::End(e) => match e.name().as_ref() {
					b"w:t" => in_run_text = false,
					b"w:p" => {
						let text = paragraph.trim();
						if !text.is_empty() {
							paragraphs.push(text.to_owned());
						}
						paragraph.clear();
					}
					_ => (),
				},
				Event::Empty(e) if matches!(e.name().as_ref(), b"w:tab" | b"w:br") => paragraph.push(' '),
				Event::Text(t) if in_run_text => paragraph.push_str(&t.unescape()?),
				Event::Eof => break,
				_ => (),
			}
		}

		Ok(paragraphs.join("\n"))
	}
}

impl Extractor for DocxExtractor {
	fn name(&self) -> &'static str {
		"docx"
	}

	fn extract(&self, path: &Path) -> Result<String> {
		let archive_error = |source: ZipError| GenError::Archive { path: path.to_path_buf(), source };
		let io_error = |source: std::io::Error| GenError::Io { path: path.to_path_buf(), source };

		let file = File::open(path).map_err(io_error)?;
		let mut archive = ZipArchive::new(file).map_err(archive_error)?;
		let mut body = archive.by_name(DOCX_BODY).map_err(archive_error)?;

		let mut xml = String::new();
		body.read_to_string(&mut xml).map_err(io_error)?;
		Self::to_text(&xml).map_err(|source| GenError::Markup { path: path.to_path_buf(), source })
	}
}

/// Fallback for unrecognized formats: warns and contributes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownExtractor;

impl Extractor for UnknownExtractor {
	fn name(&self) -> &'static str {
		"unknown"
	}

	fn extract(&self, path: &Path) -> Result<String> {
		warn!("Unknown file type {}", path.display());
		Ok(String::new())
	}
}

/// Extracts one file with the extractor of its format.
///
/// Read failures are logged and yield an empty string.
pub fn extract_file<P: AsRef<Path>>(path: P) -> String {
	let path = path.as_ref();
	let extractor = Format::from_path(path).extractor();

	match extractor.extract(path) {
		Ok(text) => {
			if !text.is_empty() {
				info!("Adding {} ({})", io::get_filename(path), extractor.name());
			}
			text
		}
		Err(e) => {
			warn!("Skipping {}: {}", path.display(), e);
			String::new()
		}
	}
}

/// Expands directories into the files they directly contain.
///
/// Files are kept as given; directories are listed in sorted order.
/// Unreadable directories are logged and skipped.
pub fn collect_inputs<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
	let mut files = Vec::new();
	for path in paths {
		let path = path.as_ref();
		if path.is_dir() {
			match io::list_files(path) {
				Ok(listed) => files.extend(listed),
				Err(e) => warn!("Cannot list {}: {}", path.display(), e),
			}
		} else {
			files.push(path.to_path_buf());
		}
	}
	files
}

/// Assembles a corpus from files and directories.
///
/// The text of each file is separated by a newline, so the last sentence of
/// a file never runs into the first sentence of the next.
pub fn build_corpus<P: AsRef<Path>>(paths: &[P]) -> String {
	let mut corpus = String::new();
	for file in collect_inputs(paths) {
		let text = extract_file(&file);
		if text.is_empty() {
			continue;
		}
		if !corpus.is_empty() {
			corpus.push('\n');
		}
		corpus.push_str(&text);
	}
	corpus
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_format_from_path() {
		assert_eq!(Format::from_path("a/book.txt"), Format::PlainText);
		assert_eq!(Format::from_path("NOTES.MD"), Format::PlainText);
		assert_eq!(Format::from_path("index.htm"), Format::Html);
		assert_eq!(Format::from_path("report.DOCX"), Format::Docx);
		assert_eq!(Format::from_path("slides.pptx"), Format::Unknown);
		assert_eq!(Format::from_path("Makefile"), Format::Unknown);
	}

	#[test]
	fn test_registry_names() {
		assert_eq!(Format::PlainText.extractor().name(), "text");
		assert_eq!(Format::Html.extractor().name(), "html");
		assert_eq!(Format::Docx.extractor().name(), "docx");
		assert_eq!(Format::Unknown.extractor().name(), "unknown");
	}

	#[test]
	fn test_html_to_text() {
		let html = "<html><head><title>T</title><style>p { x: 1 }</style></head>\
			<body><!-- note --><p>Fish &amp; chips.</p><script>var a = 1;</script>\
			<p>It&#39;s <b>good</b>&#x21;</p></body></html>";
		let text = HtmlExtractor::to_text(html);
		let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
		assert_eq!(lines, vec!["Fish & chips.", "It's  good !"]);
	}

	#[test]
	fn test_docx_body_to_text() {
		let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Fish &amp; chips</w:t></w:r><w:r><w:t xml:space="preserve"> are good.</w:t></w:r></w:p>
<w:p></w:p>
<w:p><w:r><w:t>One</w:t><w:tab/><w:t>two.</w:t></w:r></w:p>
<w:sectPr/></w:body></w:document>"#;
		assert_eq!(DocxExtractor::to_text(xml).unwrap(), "Fish & chips are good.\nOne two.");
	}

	#[test]
	fn test_docx_not_an_archive() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("broken.docx");
		std::fs::write(&path, b"plain bytes").unwrap();
		assert!(matches!(DocxExtractor.extract(&path), Err(GenError::Archive { .. })));
		assert_eq!(extract_file(&path), "");
	}

	#[test]
	fn test_unknown_entity_is_kept() {
		assert_eq!(HtmlExtractor::to_text("a &bogus; b"), "a &bogus; b");
	}

	#[test]
	fn test_unknown_extractor_yields_nothing() {
		assert_eq!(UnknownExtractor.extract(Path::new("whatever.bin")).unwrap(), "");
	}

	#[test]
	fn test_missing_file_yields_nothing() {
		assert_eq!(extract_file("/definitely/not/here.txt"), "");
		assert!(matches!(
			PlainTextExtractor.extract(Path::new("/definitely/not/here.txt")),
			Err(GenError::Io { .. })
		));
	}
}
