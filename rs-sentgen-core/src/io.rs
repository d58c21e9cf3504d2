use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reads a whole file into a `String`.
///
/// - Reads the entire file into memory
/// - Invalid UTF-8 sequences are replaced with U+FFFD instead of failing
pub(crate) fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	let bytes = fs::read(filename)?;
	Ok(match String::from_utf8(bytes) {
		Ok(contents) => contents,
		Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
	})
}

/// Returns the lowercase extension of a path, without the dot.
///
/// Examples:
/// - `"notes/Chapter1.TXT"` → `Some("txt")`
/// - `"README"` → `None`
pub(crate) fn get_extension<P: AsRef<Path>>(path: P) -> Option<String> {
	path.as_ref()
		.extension()
		.map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Extracts the base filename, extension included.
///
/// Falls back to the full path for paths without a filename (`".."`).
pub(crate) fn get_filename<P: AsRef<Path>>(path: P) -> String {
	let path = path.as_ref();
	match path.file_name() {
		Some(name) => name.to_string_lossy().to_string(),
		None => path.display().to_string(),
	}
}

/// Lists the files directly contained in a directory.
///
/// Subdirectories are ignored. Paths are sorted so corpora assembled from
/// a directory are identical from one run to the next.
pub(crate) fn list_files<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		if path.is_file() {
			files.push(path);
		}
	}

	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_get_extension() {
		assert_eq!(get_extension("notes/Chapter1.TXT"), Some("txt".to_owned()));
		assert_eq!(get_extension("page.html"), Some("html".to_owned()));
		assert_eq!(get_extension("README"), None);
	}

	#[test]
	fn test_get_filename() {
		assert_eq!(get_filename("./data/book.txt"), "book.txt");
		assert_eq!(get_filename(".."), "..");
	}

	#[test]
	fn test_list_files_sorted_and_flat() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("b.txt"), "b").unwrap();
		fs::write(dir.path().join("a.txt"), "a").unwrap();
		fs::create_dir(dir.path().join("nested")).unwrap();
		fs::write(dir.path().join("nested").join("c.txt"), "c").unwrap();

		let files = list_files(dir.path()).unwrap();
		let names: Vec<String> = files.iter().map(get_filename).collect();
		assert_eq!(names, vec!["a.txt", "b.txt"]);
	}

	#[test]
	fn test_read_file_lossy() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("latin1.txt");
		fs::write(&path, b"caf\xe9 au lait").unwrap();
		assert_eq!(read_file(&path).unwrap(), "caf\u{FFFD} au lait");
	}
}
