use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{fs, io};

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/corpus.txt` + `"4.bin"` → `data/corpus.4.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn output_path_replaces_extension() {
		let path = build_output_path("data/corpus.txt", "4.bin").unwrap();
		assert_eq!(path, PathBuf::from("data/corpus.4.bin"));
	}

	#[test]
	fn output_path_needs_a_filename() {
		assert!(build_output_path("/", "bin").is_err());
	}

	#[test]
	fn lists_and_reads_text_files() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("b.txt"), "one\r\ntwo\n").unwrap();
		fs::write(dir.path().join("a.txt"), "").unwrap();
		fs::write(dir.path().join("a.4.bin"), [0u8]).unwrap();

		assert_eq!(list_files(dir.path(), "txt").unwrap(), vec!["a.txt", "b.txt"]);
		assert_eq!(read_file(dir.path().join("b.txt")).unwrap(), vec!["one", "two"]);
	}
}
