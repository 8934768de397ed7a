use std::sync::Arc;

use crate::EmbedFile;
use crate::EmbedResult;
use crate::Position;
use crate::SourceFile;
use crate::parse_source;

pub const FILE_NAME: &str = "./main.go";

pub fn pos(line: usize, column: usize) -> Position {
	Position::new(FILE_NAME, line, column, 0)
}

pub fn source(content: &str) -> EmbedResult<SourceFile> {
	parse_source(FILE_NAME, content)
}

/// A `main` package importing `embed` for side effects, with `body` starting
/// on line 5.
pub fn main_package(body: &str) -> String {
	format!("package main\n\nimport _ \"embed\"\n\n{body}\nfunc main() {{\n}}\n")
}

pub fn embed_files(names: &[&str]) -> Vec<Arc<EmbedFile>> {
	names
		.iter()
		.map(|name| {
			Arc::new(EmbedFile {
				name: (*name).to_string(),
				..EmbedFile::default()
			})
		})
		.collect()
}

pub fn names(files: &[Arc<EmbedFile>]) -> Vec<&str> {
	files.iter().map(|file| file.name.as_str()).collect()
}

pub const GROUPED_SOURCE: &str = r#"package main

import (
	"embed"
	"fmt"
)

var (
	//go:embed testdata
	files embed.FS

	x, y = 1, 2
)

type (
	Text  string
	Bytes = []byte
)

func main() {
	var inner string
	fmt.Println(inner, x, y)
}
"#;
