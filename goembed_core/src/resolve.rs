use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use globset::GlobBuilder;
use globset::GlobMatcher;
use serde::Serialize;

use crate::EmbedResult;
use crate::EntryKind;
use crate::PatternError;
use crate::PatternErrorKind;
use crate::fs::FileKind;
use crate::fs::FileSystem;

/// The file that marks the root of a nested module.
pub const DEFAULT_BOUNDARY_MARKER: &str = "go.mod";

/// Version control directories are never part of a module.
const VCS_DIRECTORY_NAMES: [&str; 4] = [".bzr", ".hg", ".git", ".svn"];

/// The files matched by the patterns of one directive group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
	/// Every matched file relative to the base directory, slash separated,
	/// deduplicated and sorted.
	pub files: Vec<String>,
	/// The sorted files matched by each individual pattern.
	pub by_pattern: BTreeMap<String, Vec<String>>,
}

/// Expands directive patterns against a directory.
///
/// The resolver is type agnostic: it never knows whether the files end up in
/// a `string` or an `embed.FS`.
pub struct PatternResolver<'fs, F: FileSystem + ?Sized> {
	fs: &'fs F,
	boundary_markers: Vec<String>,
}

impl<'fs, F: FileSystem + ?Sized> PatternResolver<'fs, F> {
	pub fn new(fs: &'fs F) -> Self {
		Self {
			fs,
			boundary_markers: vec![DEFAULT_BOUNDARY_MARKER.to_string()],
		}
	}

	/// Replace the file names that mark a nested module root.
	#[must_use]
	pub fn with_boundary_markers<I, S>(mut self, markers: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.boundary_markers = markers.into_iter().map(Into::into).collect();
		self
	}

	/// Resolve `patterns` against `base_dir`. Every pattern must match at
	/// least one embeddable file; the first failing pattern is returned as
	/// the error.
	pub fn resolve(&self, base_dir: &Path, patterns: &[String]) -> Result<Resolution, PatternError> {
		let mut files = BTreeSet::new();
		let mut by_pattern = BTreeMap::new();
		// Directories already known to be inside the module.
		let mut dir_ok = HashSet::new();

		for pattern in patterns {
			let list = self
				.resolve_pattern(base_dir, pattern, &mut dir_ok)
				.map_err(|kind| PatternError::new(pattern.as_str(), kind))?;

			files.extend(list.iter().cloned());
			by_pattern.insert(pattern.clone(), list.into_iter().collect());
		}

		Ok(Resolution {
			files: files.into_iter().collect(),
			by_pattern,
		})
	}

	fn resolve_pattern(
		&self,
		base_dir: &Path,
		pattern: &str,
		dir_ok: &mut HashSet<PathBuf>,
	) -> Result<BTreeSet<String>, PatternErrorKind> {
		if !valid_embed_pattern(pattern) {
			return Err(PatternErrorKind::InvalidSyntax);
		}

		let matches = glob(self.fs, base_dir, pattern).map_err(|_| PatternErrorKind::InvalidSyntax)?;
		let mut list = BTreeSet::new();

		for file in matches {
			let rel = relative_path(base_dir, &file);
			let kind = self.fs.lstat(&file).map_err(|source| {
				PatternErrorKind::Io {
					path: rel.clone(),
					source,
				}
			})?;
			let what = if kind == FileKind::Directory {
				EntryKind::Directory
			} else {
				EntryKind::File
			};

			self.check_ancestors(base_dir, &file, &rel, what, dir_ok)?;

			match kind {
				FileKind::File => {
					list.insert(rel);
				}
				FileKind::Directory => {
					let mut count = 0;
					self.walk_dir(base_dir, &file, &mut list, &mut count)?;
					if count == 0 {
						return Err(PatternErrorKind::EmptyDirectory { path: rel });
					}
				}
				FileKind::Symlink | FileKind::Other => {
					return Err(PatternErrorKind::IrregularFile { path: rel });
				}
			}
		}

		if list.is_empty() {
			return Err(PatternErrorKind::NoMatch);
		}

		Ok(list)
	}

	/// Check every directory from `file` up to (but excluding) `base_dir`
	/// for module boundaries and invalid names. Checked directories are
	/// remembered in `dir_ok` for the rest of the resolution.
	fn check_ancestors(
		&self,
		base_dir: &Path,
		file: &Path,
		rel: &str,
		what: EntryKind,
		dir_ok: &mut HashSet<PathBuf>,
	) -> Result<(), PatternErrorKind> {
		let mut dir = file.to_path_buf();

		while dir != base_dir && dir.starts_with(base_dir) && !dir_ok.contains(&dir) {
			if self.has_boundary_marker(&dir) {
				return Err(PatternErrorKind::DifferentModule {
					what,
					path: rel.to_string(),
				});
			}

			if dir != file {
				if let Ok(kind) = self.fs.lstat(&dir) {
					if kind != FileKind::Directory {
						return Err(PatternErrorKind::NonDirectory {
							what,
							path: rel.to_string(),
							dir: relative_path(base_dir, &dir),
						});
					}
				}
			}

			dir_ok.insert(dir.clone());

			let name = dir
				.file_name()
				.map(|name| name.to_string_lossy().into_owned())
				.unwrap_or_default();
			if is_bad_embed_name(&name) {
				return Err(if dir == file {
					PatternErrorKind::InvalidName {
						what,
						path: rel.to_string(),
						name,
					}
				} else {
					PatternErrorKind::InvalidDirectory {
						what,
						path: rel.to_string(),
						name,
					}
				});
			}

			if !dir.pop() {
				break;
			}
		}

		Ok(())
	}

	fn has_boundary_marker(&self, dir: &Path) -> bool {
		self.boundary_markers
			.iter()
			.any(|marker| self.fs.exists(&dir.join(marker)))
	}

	/// Collect the embeddable regular files below `dir` in lexical order.
	/// Hidden (`.`) and underscore prefixed names are skipped along with
	/// their subtrees, and nested modules are not entered.
	fn walk_dir(
		&self,
		base_dir: &Path,
		dir: &Path,
		list: &mut BTreeSet<String>,
		count: &mut usize,
	) -> Result<(), PatternErrorKind> {
		if self.has_boundary_marker(dir) {
			tracing::debug!(dir = %dir.display(), "skipping nested module");
			return Ok(());
		}

		let io_error = |path: &Path, source| {
			PatternErrorKind::Io {
				path: relative_path(base_dir, path),
				source,
			}
		};

		let mut names = self.fs.read_dir(dir).map_err(|source| io_error(dir, source))?;
		names.sort();

		for name in names {
			let path = dir.join(&name);
			if is_bad_embed_name(&name) || name.starts_with('.') || name.starts_with('_') {
				tracing::trace!(path = %path.display(), "skipping hidden entry");
				continue;
			}

			let kind = self
				.fs
				.lstat(&path)
				.map_err(|source| io_error(&path, source))?;

			match kind {
				FileKind::Directory => self.walk_dir(base_dir, &path, list, count)?,
				FileKind::File => {
					*count += 1;
					list.insert(relative_path(base_dir, &path));
				}
				FileKind::Symlink | FileKind::Other => {
					tracing::trace!(path = %path.display(), "skipping irregular entry");
				}
			}
		}

		Ok(())
	}
}

/// Resolve `patterns` against `base_dir` on `fs` with the default module
/// boundary marker.
pub fn resolve_embed<F: FileSystem + ?Sized>(
	fs: &F,
	base_dir: &Path,
	patterns: &[String],
) -> Result<Vec<String>, PatternError> {
	PatternResolver::new(fs)
		.resolve(base_dir, patterns)
		.map(|resolution| resolution.files)
}

/// Reports whether `pattern` may be used in a directive: it must be a valid
/// slash separated path and not `.`.
pub fn valid_embed_pattern(pattern: &str) -> bool {
	pattern != "." && valid_path(pattern)
}

/// Reports whether `name` is an unrooted, slash separated path without empty,
/// `.` or `..` elements and without backslashes. `.` alone names the root and
/// is valid.
pub fn valid_path(name: &str) -> bool {
	if name == "." {
		return true;
	}

	name.split('/').all(|element| {
		!element.is_empty() && element != "." && element != ".." && !element.contains('\\')
	})
}

/// Whether `name` can never be part of a module and so must not be embedded.
pub fn is_bad_embed_name(name: &str) -> bool {
	name.is_empty() || VCS_DIRECTORY_NAMES.contains(&name)
}

fn relative_path(base_dir: &Path, path: &Path) -> String {
	let relative = path.strip_prefix(base_dir).unwrap_or(path);
	relative
		.components()
		.filter_map(|component| {
			match component {
				Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
				_ => None,
			}
		})
		.collect::<Vec<_>>()
		.join("/")
}

/// One slash separated element of a glob pattern.
enum GlobElement {
	Literal(String),
	Pattern(GlobMatcher),
}

fn has_meta(element: &str) -> bool {
	element.contains(['*', '?', '[', '\\'])
}

/// Translate a single path element from Go `path.Match` syntax into globset
/// syntax: braces are literal in Go, classes are negated with `^`, and a
/// leading `!` inside a class is an ordinary character.
fn translate_element(element: &str) -> String {
	let mut translated = String::with_capacity(element.len());
	let mut chars = element.chars().peekable();

	while let Some(ch) = chars.next() {
		match ch {
			'{' => translated.push_str("[{]"),
			'}' => translated.push_str("[}]"),
			'*' => {
				while chars.peek() == Some(&'*') {
					chars.next();
				}
				translated.push('*');
			}
			'[' => {
				let mut body = String::new();
				let mut closed = false;
				for class_ch in chars.by_ref() {
					if class_ch == ']' && !body.is_empty() {
						closed = true;
						break;
					}
					body.push(class_ch);
				}

				let (negated, body) = match body.strip_prefix('^') {
					Some(rest) => (true, rest.to_string()),
					None => (false, body),
				};
				let body = match body.strip_prefix('!') {
					Some("") if !negated => {
						translated.push('!');
						continue;
					}
					Some(rest) => format!("{rest}!"),
					None => body,
				};

				translated.push('[');
				if negated {
					translated.push('!');
				}
				translated.push_str(&body);
				if closed {
					translated.push(']');
				}
			}
			_ => translated.push(ch),
		}
	}

	translated
}

fn compile_element(element: &str) -> Result<GlobElement, globset::Error> {
	if !has_meta(element) {
		return Ok(GlobElement::Literal(element.to_string()));
	}

	let glob = GlobBuilder::new(&translate_element(element))
		.literal_separator(true)
		.backslash_escape(false)
		.build()?;

	Ok(GlobElement::Pattern(glob.compile_matcher()))
}

/// Expand a slash separated glob `pattern` relative to `base_dir`, mirroring
/// Go's `filepath.Glob`: matches are ordered by directory and then name, and
/// unreadable directories contribute no matches rather than failing. The only
/// error is a malformed pattern.
pub fn glob<F: FileSystem + ?Sized>(
	fs: &F,
	base_dir: &Path,
	pattern: &str,
) -> Result<Vec<PathBuf>, globset::Error> {
	let elements = pattern
		.split('/')
		.map(compile_element)
		.collect::<Result<Vec<_>, _>>()?;

	let mut current = vec![base_dir.to_path_buf()];

	for element in &elements {
		let mut next = vec![];

		for dir in &current {
			match element {
				GlobElement::Literal(name) => {
					let path = dir.join(name);
					if fs.lstat(&path).is_ok() {
						next.push(path);
					}
				}
				GlobElement::Pattern(matcher) => {
					if !matches!(fs.stat(dir), Ok(FileKind::Directory)) {
						continue;
					}
					let Ok(mut names) = fs.read_dir(dir) else {
						continue;
					};
					names.sort();
					next.extend(
						names
							.into_iter()
							.filter(|name| matcher.is_match(name))
							.map(|name| dir.join(name)),
					);
				}
			}
		}

		current = next;
	}

	Ok(current)
}

/// The `-embedcfg` document the Go compiler consumes: the files each pattern
/// matched and where each file lives on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbedCfg {
	#[serde(rename = "Patterns")]
	pub patterns: BTreeMap<String, Vec<String>>,
	#[serde(rename = "Files")]
	pub files: BTreeMap<String, String>,
}

impl EmbedCfg {
	/// Build the document from resolutions made against `base_dir`.
	pub fn new<'a>(base_dir: &Path, resolutions: impl IntoIterator<Item = &'a Resolution>) -> Self {
		let mut cfg = Self::default();

		for resolution in resolutions {
			for (pattern, files) in &resolution.by_pattern {
				cfg.patterns.insert(pattern.clone(), files.clone());
			}
			for file in &resolution.files {
				cfg.files.insert(
					file.clone(),
					base_dir.join(file).to_string_lossy().into_owned(),
				);
			}
		}

		cfg
	}

	/// Serialize as tab indented JSON, the layout `go build` writes.
	pub fn to_json(&self) -> EmbedResult<String> {
		let mut buffer = Vec::new();
		let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
		let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
		self.serialize(&mut serializer)
			.map_err(std::io::Error::from)?;

		Ok(String::from_utf8_lossy(&buffer).into_owned())
	}
}
