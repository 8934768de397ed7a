use serde::Deserialize;
use serde::Serialize;

use crate::EmbedError;
use crate::EmbedResult;
use crate::Position;
use crate::directive::DIRECTIVE_KEYWORD_OFFSET;
use crate::directive::DirectiveGroup;
use crate::syntax::SourceFile;
use crate::syntax::TypeExpr;

/// The name of the embeddable filesystem type inside the `embed` package.
pub const EMBED_FS_TYPE: &str = "FS";

/// How far alias resolution follows `type` declarations before giving up.
const MAX_ALIAS_DEPTH: usize = 16;

/// What a declared type embeds as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
	/// `string`
	Text,
	/// `[]byte`
	Bytes,
	/// `embed.FS`
	FileTree,
	Unresolved,
}

impl TypeKind {
	/// Scalar kinds bind to exactly one file.
	pub fn is_scalar(self) -> bool {
		matches!(self, Self::Text | Self::Bytes)
	}
}

/// Whether user defined types with an underlying `string` or `[]byte` type
/// are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypePolicy {
	/// Only `string`, `[]byte` and `embed.FS` themselves are accepted.
	#[default]
	Strict,
	/// Named types declared in the same file are followed to their underlying
	/// type, so `type T string` embeds as text.
	AliasTolerant,
}

/// A directive group matched to the declaration it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
	/// The variable name.
	pub name: String,
	pub kind: TypeKind,
	/// The declared type rendered as Go source.
	pub type_name: String,
	/// The patterns of the group, never empty.
	pub patterns: Vec<String>,
	/// The position of the directive group.
	pub position: Position,
	/// The position of the declared name.
	pub declaration: Position,
}

impl Binding {
	/// The position of the `go:embed` keyword of the group.
	pub fn directive_position(&self) -> Position {
		self.position.retreat_columns(DIRECTIVE_KEYWORD_OFFSET)
	}
}

/// Classify a declared type. `import_name` is the local name of the `embed`
/// import and `file` supplies the type declarations used by
/// [`TypePolicy::AliasTolerant`].
pub fn classify_type(
	type_expr: &TypeExpr,
	import_name: &str,
	file: &SourceFile,
	policy: TypePolicy,
) -> TypeKind {
	classify_inner(type_expr, import_name, file, policy, 0)
}

fn classify_inner(
	type_expr: &TypeExpr,
	import_name: &str,
	file: &SourceFile,
	policy: TypePolicy,
	depth: usize,
) -> TypeKind {
	match type_expr {
		TypeExpr::Named(name) if name == "string" => TypeKind::Text,
		TypeExpr::Named(name) if name == EMBED_FS_TYPE && import_name == "." => TypeKind::FileTree,
		TypeExpr::Qualified { package, name } if package == import_name && name == EMBED_FS_TYPE => {
			TypeKind::FileTree
		}
		TypeExpr::Slice(elem) if is_byte(elem, file, policy, depth) => TypeKind::Bytes,
		TypeExpr::Named(name) if policy == TypePolicy::AliasTolerant => {
			match underlying(name, file, depth) {
				Some(underlying) => {
					let kind = classify_inner(underlying, import_name, file, policy, depth + 1);
					// A named embed.FS is not the embeddable filesystem.
					if kind == TypeKind::FileTree {
						TypeKind::Unresolved
					} else {
						kind
					}
				}
				None => TypeKind::Unresolved,
			}
		}
		_ => TypeKind::Unresolved,
	}
}

/// `byte` and `uint8` are the same type; user types whose underlying type is
/// either only count when aliases are tolerated.
fn is_byte(elem: &TypeExpr, file: &SourceFile, policy: TypePolicy, depth: usize) -> bool {
	let TypeExpr::Named(name) = elem else {
		return false;
	};

	if name == "byte" || name == "uint8" {
		return true;
	}

	if policy != TypePolicy::AliasTolerant {
		return false;
	}

	underlying(name, file, depth).is_some_and(|underlying| is_byte(underlying, file, policy, depth + 1))
}

fn underlying<'a>(name: &str, file: &'a SourceFile, depth: usize) -> Option<&'a TypeExpr> {
	if depth >= MAX_ALIAS_DEPTH {
		return None;
	}

	file.type_decl(name).map(|decl| &decl.type_expr)
}

/// Match every group to the package level `var` on the line after it.
///
/// Results are returned in group order; an error for one group does not stop
/// the remaining groups from being matched.
pub fn bind_directives(
	file: &SourceFile,
	groups: &[DirectiveGroup],
	policy: TypePolicy,
) -> Vec<EmbedResult<Binding>> {
	let import_name = file.embed_import_name();

	groups
		.iter()
		.map(|group| bind_group(file, group, import_name, policy))
		.collect()
}

fn bind_group(
	file: &SourceFile,
	group: &DirectiveGroup,
	import_name: &str,
	policy: TypePolicy,
) -> EmbedResult<Binding> {
	let Some(declaration) = file
		.declarations
		.iter()
		.find(|declaration| declaration.position.line == group.position.line + 1)
	else {
		return Err(EmbedError::MisplacedDirective {
			position: group.keyword_position(),
		});
	};

	if declaration.has_multiple_names() {
		return Err(EmbedError::MultipleVars {
			position: group.keyword_position(),
		});
	}

	if declaration.has_initializer {
		return Err(EmbedError::Initializer {
			position: group.keyword_position(),
		});
	}

	let kind = declaration
		.type_expr
		.as_ref()
		.map_or(TypeKind::Unresolved, |type_expr| {
			classify_type(type_expr, import_name, file, policy)
		});

	if kind == TypeKind::Unresolved {
		return Err(EmbedError::UnsupportedType {
			position: declaration.position.clone(),
			type_name: declaration.type_name(),
		});
	}

	Ok(Binding {
		name: declaration.name().to_string(),
		kind,
		type_name: declaration.type_name(),
		patterns: group.patterns.clone(),
		position: group.position.clone(),
		declaration: declaration.position.clone(),
	})
}
