#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use goembed_core::EmbedOptions;
use goembed_core::EmbedResult;
use goembed_core::FileKind;
use goembed_core::FileSystem;
use goembed_core::Manifest;
use goembed_core::OsFileSystem;
use goembed_core::load_sources;
use goembed_core::parse_source;
use tempfile::TempDir;

/// The package layout every load test starts from.
pub const TESTDATA: [(&str, &str); 5] = [
	("testdata/data1.txt", "hello data1"),
	("testdata/data2.txt", "hello data2"),
	("testdata/one/data.txt", "hello data"),
	("testdata/two/data1.txt", "sub data1"),
	("testdata/two/data2.txt", "sub data2"),
];

pub fn write_file(root: &Path, name: &str, content: &str) -> io::Result<()> {
	let path = root.join(name);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)
}

pub fn testdata_package() -> io::Result<TempDir> {
	let tmp = tempfile::tempdir()?;
	for (name, content) in TESTDATA {
		write_file(tmp.path(), name, content)?;
	}
	Ok(tmp)
}

/// A `main` package with `import <import>` whose `body` starts on line 5.
pub fn main_package(import: &str, body: &str) -> String {
	format!("package main\n\nimport {import}\n\n{body}\nfunc main() {{\n}}\n")
}

pub fn load_source(root: &Path, content: &str, options: &EmbedOptions) -> EmbedResult<Manifest> {
	let file = parse_source("./main.go", content)?;
	load_sources(root, &[file], options)
}

pub fn contents(manifest: &Manifest) -> Vec<(String, String)> {
	manifest
		.files
		.iter()
		.map(|file| {
			(
				file.name.clone(),
				String::from_utf8_lossy(&file.data).into_owned(),
			)
		})
		.collect()
}

/// Counts how often each path is read from the operating system's
/// filesystem.
#[derive(Default)]
pub struct CountingFs {
	reads: Mutex<HashMap<PathBuf, usize>>,
}

impl CountingFs {
	pub fn reads(&self, path: &Path) -> usize {
		let reads = self.reads.lock().unwrap_or_else(PoisonError::into_inner);
		reads.get(path).copied().unwrap_or_default()
	}

	pub fn total_reads(&self) -> usize {
		let reads = self.reads.lock().unwrap_or_else(PoisonError::into_inner);
		reads.values().sum()
	}
}

impl FileSystem for CountingFs {
	fn stat(&self, path: &Path) -> io::Result<FileKind> {
		OsFileSystem.stat(path)
	}

	fn lstat(&self, path: &Path) -> io::Result<FileKind> {
		OsFileSystem.lstat(path)
	}

	fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
		{
			let mut reads = self.reads.lock().unwrap_or_else(PoisonError::into_inner);
			*reads.entry(path.to_path_buf()).or_default() += 1;
		}
		OsFileSystem.read_file(path)
	}

	fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
		OsFileSystem.read_dir(path)
	}
}

/// Fails every read of a file whose name ends with `denied_suffix`.
pub struct DenyingFs {
	pub denied_suffix: &'static str,
}

impl FileSystem for DenyingFs {
	fn stat(&self, path: &Path) -> io::Result<FileKind> {
		OsFileSystem.stat(path)
	}

	fn lstat(&self, path: &Path) -> io::Result<FileKind> {
		OsFileSystem.lstat(path)
	}

	fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
		if path.to_string_lossy().ends_with(self.denied_suffix) {
			return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
		}
		OsFileSystem.read_file(path)
	}

	fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
		OsFileSystem.read_dir(path)
	}
}
