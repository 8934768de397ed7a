//! `goembed_core` statically discovers `//go:embed` directives in Go source
//! files and resolves them into a deterministic, content hashed manifest of
//! the files a program will embed, without invoking the Go toolchain.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Go source file
//!   -> Source parser (comments, imports, package level var and type specs)
//!   -> Directive extractor (parses //go:embed lines, merges them into groups)
//!   -> Declaration matcher (binds each group to the var below it, classifies its type)
//!   -> Pattern resolver (expands patterns against the package directory)
//!   -> Manifest builder (reads and hashes files once, orders them as a tree)
//! ```
//!
//! ## Modules
//!
//! - [`config`] loads `goembed.toml` and builds [`EmbedOptions`].
//! - [`fs`] is the filesystem abstraction every stage that touches the disk
//!   goes through.
//! - [`literal`] renders embedded bytes as source literals.
//!
//! ## Key Types
//!
//! - [`DirectiveGroup`] is a run of consecutive directive lines.
//! - [`Binding`] is a group matched to its `var`, with a [`TypeKind`].
//! - [`PatternResolver`] turns patterns into [`Resolution`]s.
//! - [`ManifestBuilder`] loads [`EmbedFile`]s and caches them by path.
//! - [`Manifest`] is everything a package embeds.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use goembed_core::load_package_with_config;
//! use std::path::Path;
//!
//! let manifest = load_package_with_config(Path::new(".")).unwrap();
//!
//! for file in manifest.tree() {
//!     println!("{} {}", file.hash, file.name);
//! }
//! ```

pub use binding::*;
pub use config::*;
pub use directive::*;
pub use error::*;
pub use fs::*;
pub use manifest::*;
pub use package::*;
pub use position::*;
pub use resolve::*;
pub use syntax::*;

mod binding;
pub mod config;
mod directive;
#[allow(unused_assignments)]
mod error;
pub mod fs;
pub(crate) mod lexer;
pub mod literal;
mod manifest;
mod package;
mod position;
mod resolve;
mod syntax;

#[cfg(test)]
mod __fixtures;
