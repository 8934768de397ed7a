use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::EmbedError;
use crate::EmbedResult;
use crate::binding::TypePolicy;
use crate::directive::DirectiveMerge;
use crate::resolve::DEFAULT_BOUNDARY_MARKER;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["goembed.toml", ".goembed.toml", ".config/goembed.toml"];

/// Configuration loaded from a `goembed.toml` file.
///
/// ```toml
/// type_policy = "alias_tolerant"
/// directive_merge = "adjacent"
/// boundary_markers = ["go.mod"]
/// include_tests = false
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EmbedConfig {
	/// Whether named types over `string` and `[]byte` may be embedded.
	#[serde(default)]
	pub type_policy: TypePolicy,
	/// How consecutive directive lines are grouped.
	#[serde(default)]
	pub directive_merge: DirectiveMerge,
	/// Files that mark a nested module. Defaults to `go.mod`.
	#[serde(default)]
	pub boundary_markers: Option<Vec<String>>,
	/// Include `_test.go` files when loading a package directory.
	#[serde(default)]
	pub include_tests: bool,
}

impl EmbedConfig {
	/// Find the first config file candidate that exists in `root`.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> EmbedResult<Option<EmbedConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: EmbedConfig =
			toml::from_str(&content).map_err(|e| EmbedError::ConfigParse(e.to_string()))?;

		tracing::debug!(path = %config_path.display(), "loaded goembed config");

		Ok(Some(config))
	}
}

/// Options that control every stage of the pipeline.
///
/// Use [`EmbedOptions::default`] for the behavior of the Go toolchain, or
/// [`EmbedOptions::from_config`] to construct from an [`EmbedConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedOptions {
	pub type_policy: TypePolicy,
	pub directive_merge: DirectiveMerge,
	/// Files that mark a nested module root.
	pub boundary_markers: Vec<String>,
	/// Whether `_test.go` files are part of the package.
	pub include_tests: bool,
}

impl Default for EmbedOptions {
	fn default() -> Self {
		Self {
			type_policy: TypePolicy::default(),
			directive_merge: DirectiveMerge::default(),
			boundary_markers: vec![DEFAULT_BOUNDARY_MARKER.to_string()],
			include_tests: false,
		}
	}
}

impl EmbedOptions {
	/// Construct [`EmbedOptions`] from an optional [`EmbedConfig`], falling
	/// back to the defaults for anything not configured.
	pub fn from_config(config: Option<&EmbedConfig>) -> Self {
		let defaults = Self::default();
		let Some(config) = config else {
			return defaults;
		};

		Self {
			type_policy: config.type_policy,
			directive_merge: config.directive_merge,
			boundary_markers: config
				.boundary_markers
				.clone()
				.unwrap_or(defaults.boundary_markers),
			include_tests: config.include_tests,
		}
	}
}
