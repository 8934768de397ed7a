use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

/// A location inside a source file. `line` and `column` are 1-indexed and
/// `column` counts bytes, matching the positions reported by the Go
/// toolchain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
	/// The file name as it was handed to the parser.
	pub file: String,
	pub line: usize,
	pub column: usize,
	/// Byte offset from the start of the file.
	pub offset: usize,
}

impl Position {
	pub fn new(file: impl Into<String>, line: usize, column: usize, offset: usize) -> Self {
		Self {
			file: file.into(),
			line,
			column,
			offset,
		}
	}

	/// Move the position `columns` bytes to the right on the same line.
	#[must_use]
	pub fn advance_columns(&self, columns: usize) -> Self {
		Self {
			file: self.file.clone(),
			line: self.line,
			column: self.column + columns,
			offset: self.offset + columns,
		}
	}

	/// Move the position `columns` bytes to the left on the same line,
	/// stopping at the first column.
	#[must_use]
	pub fn retreat_columns(&self, columns: usize) -> Self {
		let columns = columns.min(self.column.saturating_sub(1));
		Self {
			file: self.file.clone(),
			line: self.line,
			column: self.column - columns,
			offset: self.offset.saturating_sub(columns),
		}
	}
}

impl Display for Position {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}:{}", self.file, self.line, self.column)
	}
}
