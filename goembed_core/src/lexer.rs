use logos::Logos;

use crate::Position;

/// Raw tokens produced by logos for Go source text. Only the shapes needed to
/// find comments and package level declarations are distinguished; every
/// other operator collapses into `Operator`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GoToken {
	#[regex(r"//[^\n]*", allow_greedy = true)]
	LineComment,
	#[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
	BlockComment,
	#[token("\n")]
	Newline,
	#[regex(r"[ \t\r\f]+")]
	Whitespace,
	#[regex(r"[\p{XID_Start}_]\p{XID_Continue}*")]
	Ident,
	#[regex(r#""([^"\\\n]|\\.)*""#)]
	String,
	#[regex(r"`[^`]*`")]
	RawString,
	#[regex(r"'([^'\\\n]|\\.)*'")]
	Rune,
	#[regex(r"[0-9][0-9a-zA-Z_.]*")]
	#[regex(r"\.[0-9][0-9a-zA-Z_]*")]
	Number,
	#[token("(")]
	LParen,
	#[token(")")]
	RParen,
	#[token("[")]
	LBracket,
	#[token("]")]
	RBracket,
	#[token("{")]
	LBrace,
	#[token("}")]
	RBrace,
	#[token(",")]
	Comma,
	#[token(";")]
	Semicolon,
	#[token("=")]
	Assign,
	#[token(".")]
	Dot,
	#[token("*")]
	Star,
	/// Any other operator. Bytes logos cannot classify, such as an
	/// unterminated string, are folded in here as well.
	#[regex(r"[-+/%&|^<>!:~?@#$\\]")]
	Operator,
}

impl GoToken {
	/// Whether a newline after this token terminates the statement, following
	/// Go's automatic semicolon insertion.
	pub(crate) fn ends_statement(self) -> bool {
		matches!(
			self,
			Self::Ident
				| Self::String
				| Self::RawString
				| Self::Rune
				| Self::Number
				| Self::RParen
				| Self::RBracket
				| Self::RBrace
		)
	}

	pub(crate) fn is_word(self) -> bool {
		matches!(
			self,
			Self::Ident | Self::String | Self::RawString | Self::Rune | Self::Number
		)
	}
}

/// A token together with its text and byte offset in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Lexeme<'a> {
	pub token: GoToken,
	pub text: &'a str,
	pub offset: usize,
}

/// The result of lexing a Go file: significant tokens (newlines kept) and the
/// comments that were pulled out of the stream.
pub(crate) struct LexedSource<'a> {
	pub tokens: Vec<Lexeme<'a>>,
	pub comments: Vec<Lexeme<'a>>,
}

pub(crate) fn lex_go(source: &str) -> LexedSource<'_> {
	let mut tokens = Vec::new();
	let mut comments = Vec::new();

	for (result, span) in GoToken::lexer(source).spanned() {
		let text = &source[span.clone()];
		let token = result.unwrap_or(GoToken::Operator);
		let lexeme = Lexeme {
			token,
			text,
			offset: span.start,
		};

		match token {
			GoToken::Whitespace => {}
			GoToken::LineComment => comments.push(lexeme),
			GoToken::BlockComment => {
				comments.push(lexeme);
				// A general comment spanning lines acts like a newline.
				if text.contains('\n') {
					tokens.push(Lexeme {
						token: GoToken::Newline,
						text: "\n",
						offset: span.start,
					});
				}
			}
			_ => tokens.push(lexeme),
		}
	}

	LexedSource { tokens, comments }
}

/// Pre-computed table of line-start byte offsets for efficient offset to
/// position conversion. The table is built once (O(n)) and each lookup is a
/// binary search.
pub(crate) struct LineTable {
	/// Byte offsets of the start of each line. `line_starts[0]` is always 0.
	line_starts: Vec<usize>,
}

impl LineTable {
	pub(crate) fn new(content: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	/// Convert a byte offset to a 1-indexed position inside `file`.
	pub(crate) fn position(&self, file: &str, offset: usize) -> Position {
		let line_idx = match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact,
			Err(insert) => insert.saturating_sub(1),
		};
		let column = offset - self.line_starts[line_idx] + 1;

		Position::new(file, line_idx + 1, column, offset)
	}
}

/// Tokens of the argument list that follows `//go:embed`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArgToken {
	#[regex(r"\s+")]
	Space,
	#[regex(r#""([^"\\]|\\.)*""#)]
	Quoted,
	#[regex(r"`[^`]*`")]
	RawQuoted,
	#[regex(r#"[^\s"`][^\s]*"#)]
	Bare,
}

/// A single lexed directive argument with its byte offset into the argument
/// text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DirectiveArg {
	Pattern { value: String, offset: usize },
	/// The argument list is malformed from `offset` onwards.
	Invalid { offset: usize },
}

/// Split the text after `//go:embed` into patterns. Bare words run to the next
/// whitespace, double quoted strings honour backslash escapes and back quoted
/// strings are taken verbatim. A quoted string must be followed by whitespace
/// or the end of the line.
pub(crate) fn lex_directive_args(args: &str) -> Vec<DirectiveArg> {
	let mut result = Vec::new();
	let mut lexer = ArgToken::lexer(args).spanned().peekable();

	while let Some((token, span)) = lexer.next() {
		let text = &args[span.clone()];
		let value = match token {
			Ok(ArgToken::Space) => continue,
			Ok(ArgToken::Bare) => text.to_string(),
			Ok(ArgToken::RawQuoted) => text[1..text.len() - 1].to_string(),
			Ok(ArgToken::Quoted) => {
				let Some(unquoted) = unquote(text) else {
					result.push(DirectiveArg::Invalid { offset: span.start });
					return result;
				};
				unquoted
			}
			Err(()) => {
				result.push(DirectiveArg::Invalid { offset: span.start });
				return result;
			}
		};

		let quoted = matches!(token, Ok(ArgToken::Quoted | ArgToken::RawQuoted));
		if quoted {
			if let Some((next, next_span)) = lexer.peek() {
				if !matches!(next, Ok(ArgToken::Space)) {
					result.push(DirectiveArg::Invalid {
						offset: next_span.start,
					});
					return result;
				}
			}
		}

		result.push(DirectiveArg::Pattern {
			value,
			offset: span.start,
		});
	}

	result
}

/// Pieces of the body of an interpreted Go string literal.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum StringPiece {
	#[regex(r"[^\\]+")]
	Text,
	/// `\n`, `\t`, `\\`, `\"` and the other single character escapes.
	#[regex(r#"\\[abfnrtv\\"]"#)]
	Escape,
	#[regex(r"\\x[0-9a-fA-F]{2}")]
	Hex,
	#[regex(r"\\[0-7]{3}")]
	Octal,
	#[regex(r"\\u[0-9a-fA-F]{4}")]
	#[regex(r"\\U[0-9a-fA-F]{8}")]
	Unicode,
}

/// Unquote a double quoted Go string literal with Go's escape rules.
///
/// Returns `None` for escapes Go does not define, octal values above 255,
/// surrogate code points and byte escapes that do not form valid UTF-8.
pub(crate) fn unquote(text: &str) -> Option<String> {
	let inner = text.strip_prefix('"')?.strip_suffix('"')?;
	let mut bytes = Vec::with_capacity(inner.len());

	for (piece, span) in StringPiece::lexer(inner).spanned() {
		let piece_text = &inner[span];
		match piece.ok()? {
			StringPiece::Text => bytes.extend_from_slice(piece_text.as_bytes()),
			StringPiece::Escape => {
				let unescaped = snailquote::unescape(&format!("\"{piece_text}\"")).ok()?;
				bytes.extend_from_slice(unescaped.as_bytes());
			}
			StringPiece::Hex => bytes.push(u8::from_str_radix(&piece_text[2..], 16).ok()?),
			StringPiece::Octal => bytes.push(u8::from_str_radix(&piece_text[1..], 8).ok()?),
			StringPiece::Unicode => {
				let code = u32::from_str_radix(&piece_text[2..], 16).ok()?;
				let mut buffer = [0; 4];
				bytes.extend_from_slice(char::from_u32(code)?.encode_utf8(&mut buffer).as_bytes());
			}
		}
	}

	String::from_utf8(bytes).ok()
}
