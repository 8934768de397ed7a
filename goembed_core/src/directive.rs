use serde::Deserialize;
use serde::Serialize;

use crate::EmbedError;
use crate::EmbedResult;
use crate::Position;
use crate::lexer::DirectiveArg;
use crate::lexer::lex_directive_args;
use crate::syntax::SourceFile;

/// The comment text that introduces a directive. It must be followed by a
/// space or a tab.
pub const DIRECTIVE_PREFIX: &str = "//go:embed";

/// Columns between the start of the `go:embed` keyword and the start of the
/// argument list (`go:embed` plus the separating whitespace).
pub const DIRECTIVE_KEYWORD_OFFSET: usize = 9;

/// How consecutive directive lines are merged into one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveMerge {
	/// A line joins the current group when it is on the same line as, or
	/// the line right after, the previous directive.
	#[default]
	Adjacent,
	/// Like `Adjacent`, but a single blank line between directives is
	/// tolerated.
	AllowBlankLine,
}

impl DirectiveMerge {
	fn max_gap(self) -> usize {
		match self {
			Self::Adjacent => 1,
			Self::AllowBlankLine => 2,
		}
	}
}

/// One pattern from a directive line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
	pub pattern: String,
	/// Position of the pattern token itself.
	pub position: Position,
}

/// Consecutive directive lines that apply to the same declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveGroup {
	/// Patterns in declaration order. Duplicates are kept.
	pub patterns: Vec<String>,
	/// Start of the argument list on the last line of the group.
	pub position: Position,
}

impl DirectiveGroup {
	/// The position of the `go:embed` keyword on the last line of the group,
	/// which is where placement errors are reported.
	pub fn keyword_position(&self) -> Position {
		self.position.retreat_columns(DIRECTIVE_KEYWORD_OFFSET)
	}
}

/// The directives found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDirectives {
	pub directives: Vec<Directive>,
	pub groups: Vec<DirectiveGroup>,
}

/// The outcome of extracting directives from one file. Lines with invalid
/// quoting are reported in `errors` and do not stop the other lines from
/// being extracted.
#[derive(Debug, Default)]
pub struct Extraction {
	pub directives: Vec<Directive>,
	pub groups: Vec<DirectiveGroup>,
	pub errors: Vec<EmbedError>,
}

impl Extraction {
	/// Fail with the first line error, otherwise return the directives.
	pub fn into_result(self) -> EmbedResult<ExtractedDirectives> {
		if let Some(error) = self.errors.into_iter().next() {
			return Err(error);
		}

		Ok(ExtractedDirectives {
			directives: self.directives,
			groups: self.groups,
		})
	}
}

/// Parse the argument list of a directive. `position` is where `args` starts
/// in the file.
pub fn parse_directive_args(args: &str, position: &Position) -> EmbedResult<Vec<Directive>> {
	let mut directives = vec![];

	for arg in lex_directive_args(args) {
		match arg {
			DirectiveArg::Pattern { value, offset } => {
				directives.push(Directive {
					pattern: value,
					position: position.advance_columns(offset),
				});
			}
			DirectiveArg::Invalid { offset } => {
				return Err(EmbedError::InvalidQuotedString {
					position: position.advance_columns(offset),
					text: args[offset..].trim_end().to_string(),
				});
			}
		}
	}

	Ok(directives)
}

/// Return the argument text of a directive comment, or `None` when the comment
/// is not a directive.
fn directive_args(text: &str) -> Option<&str> {
	let rest = text.strip_prefix(DIRECTIVE_PREFIX)?;
	rest.starts_with([' ', '\t']).then(|| &rest[1..])
}

struct DirectiveLine {
	directives: Vec<Directive>,
	position: Position,
}

/// Scan the comments of `file` for directives and merge consecutive lines
/// into groups.
///
/// A file that contains a directive but does not import `"embed"` fails with
/// [`EmbedError::MissingImport`] at the first directive.
pub fn extract_directives(file: &SourceFile, merge: DirectiveMerge) -> EmbedResult<Extraction> {
	let mut extraction = Extraction::default();
	let mut current: Option<DirectiveGroup> = None;
	let mut first_keyword: Option<Position> = None;

	for comment in &file.comments {
		let Some(args) = directive_args(&comment.text) else {
			// Any other comment ends the current run.
			if let Some(group) = current.take() {
				extraction.groups.push(group);
			}
			continue;
		};

		let args_position = comment.position.advance_columns(DIRECTIVE_PREFIX.len() + 1);
		if first_keyword.is_none() {
			first_keyword = Some(args_position.retreat_columns(DIRECTIVE_KEYWORD_OFFSET));
		}

		let line = match parse_directive_args(args, &args_position) {
			Ok(directives) => {
				DirectiveLine {
					directives,
					position: args_position,
				}
			}
			Err(error) => {
				extraction.errors.push(error);
				if let Some(group) = current.take() {
					extraction.groups.push(group);
				}
				continue;
			}
		};

		// An empty directive line adds nothing and leaves the run open.
		if line.directives.is_empty() {
			continue;
		}

		let patterns: Vec<String> = line
			.directives
			.iter()
			.map(|directive| directive.pattern.clone())
			.collect();
		extraction.directives.extend(line.directives);

		match current.as_mut() {
			Some(group) if line.position.line <= group.position.line + merge.max_gap() => {
				group.patterns.extend(patterns);
				group.position = line.position;
			}
			_ => {
				if let Some(group) = current.take() {
					extraction.groups.push(group);
				}
				current = Some(DirectiveGroup {
					patterns,
					position: line.position,
				});
			}
		}
	}

	if let Some(group) = current {
		extraction.groups.push(group);
	}

	if let Some(position) = first_keyword {
		if !file.imports_embed() {
			return Err(EmbedError::MissingImport { position });
		}
	}

	tracing::trace!(
		file = %file.name,
		groups = extraction.groups.len(),
		"extracted go:embed directives"
	);

	Ok(extraction)
}
