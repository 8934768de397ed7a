use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use crate::EmbedError;
use crate::EmbedResult;
use crate::Position;
use crate::lexer::GoToken;
use crate::lexer::Lexeme;
use crate::lexer::LineTable;
use crate::lexer::lex_go;
use crate::lexer::unquote;

/// The import path of the embedding capability.
pub const EMBED_IMPORT_PATH: &str = "embed";

/// The syntactic shape of a declared type. Only the shapes that matter for
/// embedding are distinguished; everything else is kept as its rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TypeExpr {
	/// A plain identifier such as `string` or `T`.
	Named(String),
	/// A package qualified identifier such as `embed.FS`.
	Qualified { package: String, name: String },
	/// `[]elem`
	Slice(Box<TypeExpr>),
	/// `[len]elem`
	Array { len: String, elem: Box<TypeExpr> },
	/// `*elem`
	Pointer(Box<TypeExpr>),
	/// `map[key]value`
	Map {
		key: Box<TypeExpr>,
		value: Box<TypeExpr>,
	},
	/// Function, channel, struct, interface, generic and parenthesised types.
	Other(String),
}

impl Display for TypeExpr {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Named(name) => write!(f, "{name}"),
			Self::Qualified { package, name } => write!(f, "{package}.{name}"),
			Self::Slice(elem) => write!(f, "[]{elem}"),
			Self::Array { len, elem } => write!(f, "[{len}]{elem}"),
			Self::Pointer(elem) => write!(f, "*{elem}"),
			Self::Map { key, value } => write!(f, "map[{key}]{value}"),
			Self::Other(rendered) => write!(f, "{rendered}"),
		}
	}
}

/// A comment in the source, including its `//` or `/*` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
	pub text: String,
	pub position: Position,
}

/// An import spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
	/// The local name: an identifier, `_` or `.`. `None` when the package is
	/// imported under its own name.
	pub name: Option<String>,
	/// The unquoted import path.
	pub path: String,
	pub position: Position,
}

/// A package level `var` spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
	/// Every name declared by the `var` spec, in source order. Never empty.
	pub names: Vec<String>,
	pub type_expr: Option<TypeExpr>,
	pub has_initializer: bool,
	/// Position of the first name.
	pub position: Position,
}

impl Declaration {
	/// The first declared name.
	pub fn name(&self) -> &str {
		self.names.first().map_or("", String::as_str)
	}

	pub fn has_multiple_names(&self) -> bool {
		self.names.len() > 1
	}

	/// The declared type as Go source, empty when no type is written.
	pub fn type_name(&self) -> String {
		self.type_expr
			.as_ref()
			.map(ToString::to_string)
			.unwrap_or_default()
	}
}

/// A package level `type` spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
	pub name: String,
	/// `true` for `type T = X`.
	pub alias: bool,
	pub type_expr: TypeExpr,
	pub position: Position,
}

/// The parsed view of one Go source file that the directive pipeline needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
	/// The file name used in every position.
	pub name: String,
	pub comments: Vec<Comment>,
	pub imports: Vec<Import>,
	pub declarations: Vec<Declaration>,
	pub types: Vec<TypeDecl>,
}

impl SourceFile {
	/// Whether the file imports the embedding capability in any form.
	pub fn imports_embed(&self) -> bool {
		self.imports
			.iter()
			.any(|import| import.path == EMBED_IMPORT_PATH)
	}

	/// The local name under which `"embed"` is imported: `embed`, an alias,
	/// `_` or `.`. Empty when the file does not import it.
	pub fn embed_import_name(&self) -> &str {
		self.imports
			.iter()
			.find(|import| import.path == EMBED_IMPORT_PATH)
			.map_or("", |import| {
				import.name.as_deref().unwrap_or(EMBED_IMPORT_PATH)
			})
	}

	/// Find a package level type declaration by name.
	pub fn type_decl(&self, name: &str) -> Option<&TypeDecl> {
		self.types.iter().find(|decl| decl.name == name)
	}
}

/// Parse Go source text into a [`SourceFile`]. `name` is used verbatim as the
/// file component of every reported position.
pub fn parse_source(name: impl Into<String>, content: &str) -> EmbedResult<SourceFile> {
	let name = name.into();
	let lines = LineTable::new(content);
	let lexed = lex_go(content);

	let comments = lexed
		.comments
		.iter()
		.map(|lexeme| {
			Comment {
				text: lexeme.text.to_string(),
				position: lines.position(&name, lexeme.offset),
			}
		})
		.collect();

	let mut parser = DeclParser {
		file: &name,
		lines: &lines,
		tokens: &lexed.tokens,
		cursor: 0,
		imports: vec![],
		declarations: vec![],
		types: vec![],
	};
	parser.parse()?;

	let DeclParser {
		imports,
		declarations,
		types,
		..
	} = parser;

	Ok(SourceFile {
		name,
		comments,
		imports,
		declarations,
		types,
	})
}

/// Walks the significant tokens of a file, recording package level import,
/// var and type specs and skipping everything else.
struct DeclParser<'a, 't> {
	file: &'a str,
	lines: &'a LineTable,
	tokens: &'a [Lexeme<'t>],
	cursor: usize,
	imports: Vec<Import>,
	declarations: Vec<Declaration>,
	types: Vec<TypeDecl>,
}

#[derive(Clone, Copy)]
enum SpecKind {
	Import,
	Var,
	Type,
}

impl<'t> DeclParser<'_, 't> {
	fn peek(&self) -> Option<&Lexeme<'t>> {
		self.tokens.get(self.cursor)
	}

	fn position(&self, lexeme: &Lexeme<'_>) -> Position {
		self.lines.position(self.file, lexeme.offset)
	}

	fn skip_separators(&mut self) {
		while self
			.peek()
			.is_some_and(|lexeme| matches!(lexeme.token, GoToken::Newline | GoToken::Semicolon))
		{
			self.cursor += 1;
		}
	}

	fn parse(&mut self) -> EmbedResult<()> {
		loop {
			self.skip_separators();
			let Some(lexeme) = self.peek().copied() else {
				return Ok(());
			};

			let kind = match (lexeme.token, lexeme.text) {
				(GoToken::Ident, "import") => Some(SpecKind::Import),
				(GoToken::Ident, "var") => Some(SpecKind::Var),
				(GoToken::Ident, "type") => Some(SpecKind::Type),
				_ => None,
			};

			match kind {
				Some(kind) => {
					self.cursor += 1;
					self.parse_decl(kind)?;
				}
				None => {
					let end = self.statement_end(self.cursor, false);
					// Always make progress, even on a stray closing token.
					self.cursor = end.max(self.cursor + 1);
				}
			}
		}
	}

	/// Parse either a single spec or a parenthesised group of specs.
	fn parse_decl(&mut self, kind: SpecKind) -> EmbedResult<()> {
		let grouped = self
			.peek()
			.is_some_and(|lexeme| lexeme.token == GoToken::LParen);

		if !grouped {
			let end = self.statement_end(self.cursor, false);
			self.parse_spec(kind, self.cursor, end)?;
			self.cursor = end;
			return Ok(());
		}

		self.cursor += 1;
		loop {
			self.skip_separators();
			match self.peek() {
				None => return Ok(()),
				Some(lexeme) if lexeme.token == GoToken::RParen => {
					self.cursor += 1;
					return Ok(());
				}
				Some(_) => {}
			}

			let end = self.statement_end(self.cursor, true);
			if end == self.cursor {
				self.cursor += 1;
				continue;
			}
			self.parse_spec(kind, self.cursor, end)?;
			self.cursor = end;
		}
	}

	/// Find the index one past the last token of the statement starting at
	/// `start`. Brackets are balanced; a newline or semicolon at depth zero
	/// ends the statement when Go would insert a semicolon there. Inside a
	/// group the closing parenthesis also ends the statement.
	fn statement_end(&self, start: usize, in_group: bool) -> usize {
		let mut depth = 0usize;
		let mut previous: Option<GoToken> = None;
		let mut index = start;

		while let Some(lexeme) = self.tokens.get(index) {
			match lexeme.token {
				GoToken::LParen | GoToken::LBracket | GoToken::LBrace => depth += 1,
				GoToken::RParen | GoToken::RBracket | GoToken::RBrace => {
					if depth == 0 {
						if in_group && lexeme.token == GoToken::RParen {
							return index;
						}
					} else {
						depth -= 1;
					}
				}
				GoToken::Semicolon if depth == 0 => return index,
				GoToken::Newline if depth == 0 => {
					if previous.is_some_and(GoToken::ends_statement) {
						return index;
					}
				}
				_ => {}
			}

			if lexeme.token != GoToken::Newline {
				previous = Some(lexeme.token);
			}
			index += 1;
		}

		index
	}

	fn parse_spec(&mut self, kind: SpecKind, start: usize, end: usize) -> EmbedResult<()> {
		let tokens: Vec<Lexeme<'t>> = self.tokens[start..end]
			.iter()
			.filter(|lexeme| lexeme.token != GoToken::Newline)
			.copied()
			.collect();

		match kind {
			SpecKind::Import => self.parse_import_spec(&tokens),
			SpecKind::Var => {
				self.parse_var_spec(&tokens);
				Ok(())
			}
			SpecKind::Type => {
				self.parse_type_spec(&tokens);
				Ok(())
			}
		}
	}

	fn parse_import_spec(&mut self, tokens: &[Lexeme<'_>]) -> EmbedResult<()> {
		let (name, path_token) = match tokens {
			[path] => (None, path),
			[name, path] if matches!(name.token, GoToken::Ident | GoToken::Dot) => {
				(Some(name.text.to_string()), path)
			}
			_ => return Ok(()),
		};

		let path = match path_token.token {
			GoToken::RawString => path_token.text[1..path_token.text.len() - 1].to_string(),
			GoToken::String => unquote(path_token.text).ok_or_else(|| {
				EmbedError::InvalidQuotedString {
					position: self.position(path_token),
					text: path_token.text.to_string(),
				}
			})?,
			_ => return Ok(()),
		};

		let position = self.position(&tokens[0]);
		self.imports.push(Import {
			name,
			path,
			position,
		});

		Ok(())
	}

	fn parse_var_spec(&mut self, tokens: &[Lexeme<'_>]) {
		let mut names = vec![];
		let mut index = 0;

		while let Some(lexeme) = tokens.get(index) {
			if lexeme.token != GoToken::Ident {
				break;
			}
			names.push(lexeme.text.to_string());
			index += 1;
			if tokens.get(index).is_some_and(|next| next.token == GoToken::Comma) {
				index += 1;
			} else {
				break;
			}
		}

		if names.is_empty() {
			return;
		}

		let rest = &tokens[index..];
		let assign = top_level_index(rest, GoToken::Assign);
		let type_tokens = &rest[..assign.unwrap_or(rest.len())];
		let type_expr = (!type_tokens.is_empty()).then(|| parse_type(type_tokens));

		self.declarations.push(Declaration {
			names,
			type_expr,
			has_initializer: assign.is_some(),
			position: self.position(&tokens[0]),
		});
	}

	fn parse_type_spec(&mut self, tokens: &[Lexeme<'_>]) {
		let Some((name, rest)) = tokens.split_first() else {
			return;
		};
		if name.token != GoToken::Ident {
			return;
		}

		let (alias, rest) = match rest.split_first() {
			Some((first, rest)) if first.token == GoToken::Assign => (true, rest),
			_ => (false, rest),
		};
		if rest.is_empty() {
			return;
		}

		let type_expr = if is_type_parameter_list(rest) {
			TypeExpr::Other(render(rest))
		} else {
			parse_type(rest)
		};

		self.types.push(TypeDecl {
			name: name.text.to_string(),
			alias,
			type_expr,
			position: self.position(name),
		});
	}
}

/// `type T[P any] ...` starts with a bracketed parameter list rather than an
/// array length.
fn is_type_parameter_list(tokens: &[Lexeme<'_>]) -> bool {
	matches!(
		tokens,
		[open, first, second, ..]
			if open.token == GoToken::LBracket
				&& first.token == GoToken::Ident
				&& !matches!(second.token, GoToken::RBracket)
	)
}

/// Index of the first `token` outside any brackets.
fn top_level_index(tokens: &[Lexeme<'_>], token: GoToken) -> Option<usize> {
	let mut depth = 0usize;
	for (index, lexeme) in tokens.iter().enumerate() {
		match lexeme.token {
			GoToken::LParen | GoToken::LBracket | GoToken::LBrace => depth += 1,
			GoToken::RParen | GoToken::RBracket | GoToken::RBrace => {
				depth = depth.saturating_sub(1);
			}
			found if found == token && depth == 0 => return Some(index),
			_ => {}
		}
	}
	None
}

/// Index of the bracket closing the one at `open`.
fn matching_close(tokens: &[Lexeme<'_>], open: usize) -> Option<usize> {
	let mut depth = 0usize;
	for (index, lexeme) in tokens.iter().enumerate().skip(open) {
		match lexeme.token {
			GoToken::LParen | GoToken::LBracket | GoToken::LBrace => depth += 1,
			GoToken::RParen | GoToken::RBracket | GoToken::RBrace => {
				depth -= 1;
				if depth == 0 {
					return Some(index);
				}
			}
			_ => {}
		}
	}
	None
}

/// Parse a complete type expression. Anything that is not fully consumed by
/// one of the recognised shapes becomes [`TypeExpr::Other`].
fn parse_type(tokens: &[Lexeme<'_>]) -> TypeExpr {
	match parse_type_prefix(tokens) {
		Some((expr, consumed)) if consumed == tokens.len() => expr,
		_ => TypeExpr::Other(render(tokens)),
	}
}

fn parse_type_prefix(tokens: &[Lexeme<'_>]) -> Option<(TypeExpr, usize)> {
	let first = tokens.first()?;

	match (first.token, first.text) {
		(GoToken::Star, _) => {
			let (elem, consumed) = parse_type_prefix(&tokens[1..])?;
			Some((TypeExpr::Pointer(Box::new(elem)), consumed + 1))
		}
		(GoToken::LBracket, _) => {
			let close = matching_close(tokens, 0)?;
			let (elem, consumed) = parse_type_prefix(&tokens[close + 1..])?;
			let elem = Box::new(elem);
			let expr = if close == 1 {
				TypeExpr::Slice(elem)
			} else {
				TypeExpr::Array {
					len: render(&tokens[1..close]),
					elem,
				}
			};
			Some((expr, close + 1 + consumed))
		}
		(GoToken::Ident, "map")
			if tokens
				.get(1)
				.is_some_and(|next| next.token == GoToken::LBracket) =>
		{
			let close = matching_close(tokens, 1)?;
			let key = parse_type(&tokens[2..close]);
			let (value, consumed) = parse_type_prefix(&tokens[close + 1..])?;
			Some((
				TypeExpr::Map {
					key: Box::new(key),
					value: Box::new(value),
				},
				close + 1 + consumed,
			))
		}
		(GoToken::Ident, "chan" | "func" | "struct" | "interface") => None,
		(GoToken::Ident, name) => {
			match tokens.get(1..3) {
				Some([dot, selected])
					if dot.token == GoToken::Dot && selected.token == GoToken::Ident =>
				{
					Some((
						TypeExpr::Qualified {
							package: name.to_string(),
							name: selected.text.to_string(),
						},
						3,
					))
				}
				_ => Some((TypeExpr::Named(name.to_string()), 1)),
			}
		}
		_ => None,
	}
}

/// Render tokens back into Go source with gofmt style spacing for the type
/// expressions that reach here.
fn render(tokens: &[Lexeme<'_>]) -> String {
	let mut rendered = String::new();
	let mut previous: Option<GoToken> = None;

	for lexeme in tokens {
		if let Some(previous) = previous {
			let spaced = (previous.is_word() && lexeme.token.is_word())
				|| previous == GoToken::Comma
				|| (previous == GoToken::RParen && lexeme.token.is_word());
			if spaced {
				rendered.push(' ');
			}
		}
		rendered.push_str(lexeme.text);
		previous = Some(lexeme.token);
	}

	rendered
}
