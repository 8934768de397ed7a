use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use derive_more::Deref;
use serde::Serialize;
use serde::Serializer;
use sha2::Digest;
use sha2::Sha256;

use crate::EmbedError;
use crate::EmbedResult;
use crate::PatternError;
use crate::binding::Binding;
use crate::fs::FileSystem;
use crate::fs::OsFileSystem;
use crate::resolve::DEFAULT_BOUNDARY_MARKER;
use crate::resolve::PatternResolver;
use crate::resolve::Resolution;

/// The number of digest bytes kept for each file.
pub const CONTENT_HASH_LEN: usize = 16;

/// A SHA-256 digest truncated to its first 16 bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deref)]
pub struct ContentHash([u8; CONTENT_HASH_LEN]);

impl ContentHash {
	/// Hash `data`. Empty content has the zero hash rather than the digest of
	/// the empty string.
	pub fn of(data: &[u8]) -> Self {
		if data.is_empty() {
			return Self::default();
		}

		let digest = Sha256::digest(data);
		let mut hash = [0; CONTENT_HASH_LEN];
		hash.copy_from_slice(&digest[..CONTENT_HASH_LEN]);

		Self(hash)
	}

	pub fn is_zero(&self) -> bool {
		self.0 == [0; CONTENT_HASH_LEN]
	}

	pub fn to_hex(&self) -> String {
		hex::encode(self.0)
	}
}

impl fmt::Display for ContentHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

impl fmt::Debug for ContentHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ContentHash({})", self.to_hex())
	}
}

impl Serialize for ContentHash {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_hex())
	}
}

/// One manifest entry: a loaded file, or a synthetic directory whose name
/// ends in `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbedFile {
	/// Slash separated path relative to the package directory.
	pub name: String,
	/// Absolute path on disk. Empty for directory entries.
	pub path: PathBuf,
	#[serde(skip)]
	pub data: Vec<u8>,
	pub hash: ContentHash,
	/// Why the file could not be read, if it could not.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub load_error: Option<String>,
}

impl EmbedFile {
	/// A synthetic directory entry. A trailing `/` is added when missing.
	pub fn directory(name: impl Into<String>) -> Self {
		let mut name = name.into();
		if !name.ends_with('/') {
			name.push('/');
		}

		Self {
			name,
			..Self::default()
		}
	}

	pub fn is_dir(&self) -> bool {
		self.name.ends_with('/')
	}
}

/// Split a manifest name into its directory and final element. Names without
/// a separator live in `.`.
fn split_name(name: &str) -> (&str, &str) {
	let name = name.strip_suffix('/').unwrap_or(name);
	name.rsplit_once('/').unwrap_or((".", name))
}

/// Order manifest names by directory and then by element, so that the
/// entries of one directory are contiguous.
pub fn embed_file_cmp(a: &str, b: &str) -> Ordering {
	let (a_dir, a_elem) = split_name(a);
	let (b_dir, b_elem) = split_name(b);

	a_dir.cmp(b_dir).then_with(|| a_elem.cmp(b_elem))
}

/// Whether `a` sorts before `b` in a manifest.
pub fn embed_file_less(a: &str, b: &str) -> bool {
	embed_file_cmp(a, b) == Ordering::Less
}

/// Add a directory entry for every ancestor directory of every file, once
/// each, and sort the combined list.
pub fn build_tree(files: &[Arc<EmbedFile>]) -> Vec<Arc<EmbedFile>> {
	let mut seen: HashSet<String> = files.iter().map(|file| file.name.clone()).collect();
	let mut tree = files.to_vec();

	for file in files {
		let mut name = file.name.strip_suffix('/').unwrap_or(&file.name);
		while let Some((dir, _)) = name.rsplit_once('/') {
			let entry = format!("{dir}/");
			if seen.insert(entry.clone()) {
				tree.push(Arc::new(EmbedFile::directory(entry)));
			}
			name = dir;
		}
	}

	tree.sort_by(|a, b| embed_file_cmp(&a.name, &b.name));
	tree
}

/// The files loaded for one binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedEntry {
	pub binding: Binding,
	/// Sorted with [`embed_file_cmp`].
	pub files: Vec<Arc<EmbedFile>>,
	/// The files each pattern matched.
	pub patterns: BTreeMap<String, Vec<String>>,
}

/// Loads the files of bindings, sharing one read and hash per absolute path
/// across every binding loaded through the same builder. Returned names are
/// always relative to the `base_dir` of the call.
///
/// A builder may be shared between threads. The cache lock is held while a
/// missing file is read so each path is read at most once.
pub struct ManifestBuilder<F: FileSystem = OsFileSystem> {
	fs: F,
	boundary_markers: Vec<String>,
	cache: Mutex<BTreeMap<PathBuf, Arc<EmbedFile>>>,
}

impl ManifestBuilder {
	pub fn new() -> Self {
		Self::with_fs(OsFileSystem)
	}
}

impl Default for ManifestBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl<F: FileSystem> ManifestBuilder<F> {
	pub fn with_fs(fs: F) -> Self {
		Self {
			fs,
			boundary_markers: vec![DEFAULT_BOUNDARY_MARKER.to_string()],
			cache: Mutex::new(BTreeMap::new()),
		}
	}

	#[must_use]
	pub fn with_boundary_markers(mut self, markers: Vec<String>) -> Self {
		self.boundary_markers = markers;
		self
	}

	pub fn fs(&self) -> &F {
		&self.fs
	}

	/// Resolve `patterns` against `base_dir` without reading any file.
	pub fn resolve(&self, base_dir: &Path, patterns: &[String]) -> Result<Resolution, PatternError> {
		PatternResolver::new(&self.fs)
			.with_boundary_markers(self.boundary_markers.iter().cloned())
			.resolve(base_dir, patterns)
	}

	/// Load the files of `binding` relative to `base_dir`.
	pub fn load(&self, base_dir: &Path, binding: &Binding) -> EmbedResult<Vec<Arc<EmbedFile>>> {
		self.load_embed(base_dir, binding).map(|entry| entry.files)
	}

	/// Load the files of `binding` together with the per pattern matches.
	///
	/// Fails when a pattern does not resolve, when a `string` or `[]byte`
	/// binding resolves to more than one file, or when a file cannot be read.
	pub fn load_embed(&self, base_dir: &Path, binding: &Binding) -> EmbedResult<EmbedEntry> {
		let resolution = self.resolve(base_dir, &binding.patterns).map_err(|error| {
			EmbedError::Pattern {
				position: binding.directive_position(),
				error,
			}
		})?;

		let mut files = self.read_files(base_dir, &resolution.files);

		if binding.kind.is_scalar() && files.len() > 1 {
			return Err(EmbedError::MultipleFiles {
				position: binding.declaration.clone(),
				type_name: binding.type_name.clone(),
			});
		}

		if let Some(file) = files.iter().find(|file| file.load_error.is_some()) {
			return Err(EmbedError::Read {
				position: binding.directive_position(),
				patterns: binding.patterns.join(" "),
				path: file.name.clone(),
				reason: file.load_error.clone().unwrap_or_default(),
			});
		}

		files.sort_by(|a, b| embed_file_cmp(&a.name, &b.name));

		Ok(EmbedEntry {
			binding: binding.clone(),
			files,
			patterns: resolution.by_pattern,
		})
	}

	fn read_files(&self, base_dir: &Path, names: &[String]) -> Vec<Arc<EmbedFile>> {
		let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

		names
			.iter()
			.map(|name| {
				let path = absolute_path(&base_dir.join(name));
				let Some(cached) = cache.get(&path) else {
					tracing::debug!(path = %path.display(), "reading embed file");
					let file = Arc::new(self.read_file(name, &path));
					cache.insert(path, Arc::clone(&file));
					return file;
				};

				tracing::debug!(path = %path.display(), "reusing cached embed file");
				if cached.name == *name {
					return Arc::clone(cached);
				}

				// Reached from another base directory: same content, own name.
				Arc::new(EmbedFile {
					name: name.clone(),
					..EmbedFile::clone(cached)
				})
			})
			.collect()
	}

	fn read_file(&self, name: &str, path: &Path) -> EmbedFile {
		let (data, load_error) = match self.fs.read_file(path) {
			Ok(data) => (data, None),
			Err(error) => (Vec::new(), Some(error.to_string())),
		};

		EmbedFile {
			name: name.to_string(),
			path: path.to_path_buf(),
			hash: ContentHash::of(&data),
			data,
			load_error,
		}
	}

	/// Every file loaded so far, sorted with [`embed_file_cmp`]. Each name is
	/// relative to the base directory the file was first loaded from.
	pub fn manifest(&self) -> Vec<Arc<EmbedFile>> {
		let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
		let mut files: Vec<_> = cache.values().cloned().collect();
		files.sort_by(|a, b| embed_file_cmp(&a.name, &b.name));
		files
	}
}

/// `path` made absolute against the working directory without touching the
/// filesystem, so `.` and its absolute spelling share one cache key.
fn absolute_path(path: &Path) -> PathBuf {
	std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
