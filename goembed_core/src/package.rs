use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::EmbedResult;
use crate::binding::Binding;
use crate::binding::bind_directives;
use crate::config::EmbedConfig;
use crate::config::EmbedOptions;
use crate::directive::extract_directives;
use crate::fs::FileSystem;
use crate::manifest::EmbedEntry;
use crate::manifest::EmbedFile;
use crate::manifest::ManifestBuilder;
use crate::manifest::build_tree;
use crate::resolve::EmbedCfg;
use crate::resolve::Resolution;
use crate::syntax::SourceFile;
use crate::syntax::parse_source;

/// Everything a package embeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
	/// One entry per binding in source order.
	pub embeds: Vec<EmbedEntry>,
	/// Every distinct file, sorted with
	/// [`embed_file_cmp`](crate::embed_file_cmp).
	pub files: Vec<Arc<EmbedFile>>,
}

impl Manifest {
	/// The files together with an entry for each directory that contains
	/// them.
	pub fn tree(&self) -> Vec<Arc<EmbedFile>> {
		build_tree(&self.files)
	}

	/// The `-embedcfg` document for the package rooted at `root`.
	pub fn embed_cfg(&self, root: &Path) -> EmbedCfg {
		let resolutions: Vec<Resolution> = self
			.embeds
			.iter()
			.map(|entry| {
				Resolution {
					files: entry.files.iter().map(|file| file.name.clone()).collect(),
					by_pattern: entry.patterns.clone(),
				}
			})
			.collect();

		EmbedCfg::new(root, &resolutions)
	}
}

/// The Go source files of the package in `dir`, sorted by name. Names
/// starting with `_` or `.` are ignored, as are `_test.go` files unless
/// `include_tests` is set.
pub fn collect_package_files(dir: &Path, include_tests: bool) -> EmbedResult<Vec<PathBuf>> {
	let mut files = vec![];

	for entry in std::fs::read_dir(dir)? {
		let entry = entry?;
		if !entry.file_type()?.is_file() {
			continue;
		}

		let name = entry.file_name().to_string_lossy().into_owned();
		let is_source = Path::new(&name)
			.extension()
			.is_some_and(|extension| extension == "go");
		if !is_source || name.starts_with('_') || name.starts_with('.') {
			continue;
		}
		if !include_tests && name.ends_with("_test.go") {
			continue;
		}

		files.push(entry.path());
	}

	files.sort();
	Ok(files)
}

/// Read and parse `paths`. Positions name each file as `./<file name>`.
pub fn parse_package_files(paths: &[PathBuf]) -> EmbedResult<Vec<SourceFile>> {
	paths
		.iter()
		.map(|path| {
			let content = std::fs::read_to_string(path)?;
			let name = path
				.file_name()
				.map(|name| name.to_string_lossy().into_owned())
				.unwrap_or_default();
			parse_source(format!("./{name}"), &content)
		})
		.collect()
}

/// Extract and bind the directives of `files` without touching the
/// filesystem. Fails with the first error in file order.
pub fn list_directives(files: &[SourceFile], options: &EmbedOptions) -> EmbedResult<Vec<Binding>> {
	let mut bindings = vec![];

	for file in files {
		let extracted = extract_directives(file, options.directive_merge)?.into_result()?;
		for binding in bind_directives(file, &extracted.groups, options.type_policy) {
			bindings.push(binding?);
		}
	}

	tracing::debug!(bindings = bindings.len(), "bound go:embed directives");

	Ok(bindings)
}

/// Extract, bind, resolve and load every directive of `files` relative to
/// `root` using `builder`.
pub fn load_sources_with<F: FileSystem>(
	builder: &ManifestBuilder<F>,
	root: &Path,
	files: &[SourceFile],
	options: &EmbedOptions,
) -> EmbedResult<Manifest> {
	let bindings = list_directives(files, options)?;
	let embeds = bindings
		.iter()
		.map(|binding| builder.load_embed(root, binding))
		.collect::<EmbedResult<Vec<_>>>()?;

	Ok(Manifest {
		embeds,
		files: builder.manifest(),
	})
}

/// Extract, bind, resolve and load every directive of `files` relative to
/// `root` on the operating system's filesystem.
pub fn load_sources(root: &Path, files: &[SourceFile], options: &EmbedOptions) -> EmbedResult<Manifest> {
	let builder = ManifestBuilder::new().with_boundary_markers(options.boundary_markers.clone());
	load_sources_with(&builder, root, files, options)
}

/// Load the manifest of the Go package in `root`.
pub fn load_package(root: &Path, options: &EmbedOptions) -> EmbedResult<Manifest> {
	let paths = collect_package_files(root, options.include_tests)?;
	let files = parse_package_files(&paths)?;
	load_sources(root, &files, options)
}

/// Load the manifest of the Go package in `root`, reading options from a
/// `goembed.toml` in the same directory when there is one.
pub fn load_package_with_config(root: &Path) -> EmbedResult<Manifest> {
	let config = EmbedConfig::load(root)?;
	let options = EmbedOptions::from_config(config.as_ref());
	load_package(root, &options)
}
