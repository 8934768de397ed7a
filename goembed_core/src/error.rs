use std::fmt::Display;

use miette::Diagnostic;
use thiserror::Error;

use crate::Position;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum EmbedError {
	#[error(transparent)]
	#[diagnostic(code(goembed::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(goembed::config_parse),
		help("check that goembed.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("{position}: go:embed only allowed in Go files that import \"embed\"")]
	#[diagnostic(
		code(goembed::missing_import),
		help("add `import _ \"embed\"` to the file")
	)]
	MissingImport { position: Position },

	#[error("{position}: invalid quoted string in //go:embed: {text}")]
	#[diagnostic(code(goembed::invalid_quoted_string))]
	InvalidQuotedString { position: Position, text: String },

	#[error("{position}: misplaced go:embed directive")]
	#[diagnostic(
		code(goembed::misplaced_directive),
		help("place the directive on the line directly above a package level var")
	)]
	MisplacedDirective { position: Position },

	#[error("{position}: go:embed cannot apply to multiple vars")]
	#[diagnostic(code(goembed::multiple_vars))]
	MultipleVars { position: Position },

	#[error("{position}: go:embed cannot apply to var with initializer")]
	#[diagnostic(code(goembed::initializer))]
	Initializer { position: Position },

	#[error("{position}: go:embed cannot apply to var of type {type_name}")]
	#[diagnostic(
		code(goembed::unsupported_type),
		help("embedded vars must be of type string, []byte or embed.FS")
	)]
	UnsupportedType {
		position: Position,
		type_name: String,
	},

	#[error("{position}: invalid go:embed: multiple files for type {type_name}")]
	#[diagnostic(
		code(goembed::multiple_files),
		help("use embed.FS to embed more than one file")
	)]
	MultipleFiles {
		position: Position,
		type_name: String,
	},

	#[error("{position}: {error}")]
	#[diagnostic(code(goembed::pattern))]
	Pattern {
		position: Position,
		error: PatternError,
	},

	#[error("{position}: pattern {patterns}: read {path}: {reason}")]
	#[diagnostic(code(goembed::read))]
	Read {
		position: Position,
		patterns: String,
		path: String,
		reason: String,
	},
}

impl EmbedError {
	/// The source position the error is reported at, if it has one.
	pub fn position(&self) -> Option<&Position> {
		match self {
			Self::Io(_) | Self::ConfigParse(_) => None,
			Self::MissingImport { position }
			| Self::InvalidQuotedString { position, .. }
			| Self::MisplacedDirective { position }
			| Self::MultipleVars { position }
			| Self::Initializer { position }
			| Self::UnsupportedType { position, .. }
			| Self::MultipleFiles { position, .. }
			| Self::Pattern { position, .. }
			| Self::Read { position, .. } => Some(position),
		}
	}
}

/// Whether a match is a file or a directory, as used in resolver messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
	File,
	Directory,
}

impl Display for EntryKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::File => write!(f, "file"),
			Self::Directory => write!(f, "directory"),
		}
	}
}

/// A failure to resolve one pattern of a directive.
#[derive(Debug, Error)]
#[error("pattern {pattern}: {kind}")]
pub struct PatternError {
	pub pattern: String,
	pub kind: PatternErrorKind,
}

impl PatternError {
	pub fn new(pattern: impl Into<String>, kind: PatternErrorKind) -> Self {
		Self {
			pattern: pattern.into(),
			kind,
		}
	}
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PatternErrorKind {
	#[error("invalid pattern syntax")]
	InvalidSyntax,

	#[error("no matching files found")]
	NoMatch,

	#[error("cannot embed {what} {path}: in different module")]
	DifferentModule { what: EntryKind, path: String },

	#[error("cannot embed {what} {path}: in non-directory {dir}")]
	NonDirectory {
		what: EntryKind,
		path: String,
		dir: String,
	},

	#[error("cannot embed {what} {path}: invalid name {name}")]
	InvalidName {
		what: EntryKind,
		path: String,
		name: String,
	},

	#[error("cannot embed {what} {path}: in invalid directory {name}")]
	InvalidDirectory {
		what: EntryKind,
		path: String,
		name: String,
	},

	#[error("cannot embed irregular file {path}")]
	IrregularFile { path: String },

	#[error("cannot embed directory {path}: contains no embeddable files")]
	EmptyDirectory { path: String },

	#[error("{path}: {source}")]
	Io {
		path: String,
		source: std::io::Error,
	},
}

pub type EmbedResult<T> = Result<T, EmbedError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
