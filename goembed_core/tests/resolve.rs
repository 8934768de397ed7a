mod common;

use goembed_core::AnyEmptyResult;
use goembed_core::OsFileSystem;
use goembed_core::PatternResolver;
use goembed_core::glob;
use goembed_core::resolve_embed;
use rstest::rstest;
use similar_asserts::assert_eq;

fn patterns(patterns: &[&str]) -> Vec<String> {
	patterns.iter().map(ToString::to_string).collect()
}

#[rstest]
#[case::file(&["testdata/data1.txt"], vec!["testdata/data1.txt"])]
#[case::star(&["testdata/*.txt"], vec!["testdata/data1.txt", "testdata/data2.txt"])]
#[case::star_with_directories(&["testdata/*"], vec![
	"testdata/data1.txt",
	"testdata/data2.txt",
	"testdata/one/data.txt",
	"testdata/two/data1.txt",
	"testdata/two/data2.txt",
])]
#[case::question(&["testdata/data?.txt"], vec!["testdata/data1.txt", "testdata/data2.txt"])]
#[case::class(&["testdata/data[2-9].txt"], vec!["testdata/data2.txt"])]
#[case::negated_class(&["testdata/data[^1].txt"], vec!["testdata/data2.txt"])]
#[case::star_in_directory(&["testdata/*/data1.txt"], vec!["testdata/two/data1.txt"])]
#[case::directory(&["testdata/two"], vec!["testdata/two/data1.txt", "testdata/two/data2.txt"])]
#[case::overlapping(&["testdata/*.txt", "testdata/data1.txt"], vec!["testdata/data1.txt", "testdata/data2.txt"])]
fn resolve_patterns(#[case] input: &[&str], #[case] expected: Vec<&str>) -> AnyEmptyResult {
	let tmp = common::testdata_package()?;
	let files = resolve_embed(&OsFileSystem, tmp.path(), &patterns(input))?;
	assert_eq!(files, expected);

	Ok(())
}

#[test]
fn overlapping_patterns_keep_their_own_matches() -> AnyEmptyResult {
	let tmp = common::testdata_package()?;
	let resolution = PatternResolver::new(&OsFileSystem)
		.resolve(tmp.path(), &patterns(&["testdata/data1.txt", "testdata/*.txt"]))?;

	assert_eq!(
		resolution.files,
		vec!["testdata/data1.txt".to_string(), "testdata/data2.txt".to_string()]
	);
	assert_eq!(
		resolution.by_pattern.get("testdata/data1.txt"),
		Some(&vec!["testdata/data1.txt".to_string()])
	);
	assert_eq!(resolution.by_pattern.get("testdata/*.txt").map(Vec::len), Some(2));

	Ok(())
}

#[test]
fn braces_are_literal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "assets/{a}.txt", "braces")?;
	common::write_file(tmp.path(), "assets/a.txt", "plain")?;

	let files = resolve_embed(&OsFileSystem, tmp.path(), &patterns(&["assets/{a}*"]))?;
	assert_eq!(files, vec!["assets/{a}.txt".to_string()]);

	Ok(())
}

#[test]
fn walking_skips_hidden_and_underscore_names() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "static/index.html", "index")?;
	common::write_file(tmp.path(), "static/.env", "secret")?;
	common::write_file(tmp.path(), "static/_draft.html", "draft")?;
	common::write_file(tmp.path(), "static/_private/page.html", "page")?;
	common::write_file(tmp.path(), "static/css/site.css", "css")?;

	let files = resolve_embed(&OsFileSystem, tmp.path(), &patterns(&["static"]))?;
	assert_eq!(
		files,
		vec!["static/css/site.css".to_string(), "static/index.html".to_string()]
	);

	Ok(())
}

#[test]
fn hidden_files_can_be_named_explicitly() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "static/.env", "secret")?;

	let files = resolve_embed(&OsFileSystem, tmp.path(), &patterns(&["static/.env"]))?;
	assert_eq!(files, vec!["static/.env".to_string()]);

	Ok(())
}

#[test]
fn walking_stops_at_nested_modules() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "tree/a.txt", "a")?;
	common::write_file(tmp.path(), "tree/module/go.mod", "module nested\n")?;
	common::write_file(tmp.path(), "tree/module/b.txt", "b")?;

	let files = resolve_embed(&OsFileSystem, tmp.path(), &patterns(&["tree"]))?;
	assert_eq!(files, vec!["tree/a.txt".to_string()]);

	Ok(())
}

#[rstest]
#[case::file_in_module("tree/module/b.txt", "pattern tree/module/b.txt: cannot embed file tree/module/b.txt: in different module")]
#[case::module_directory("tree/module", "pattern tree/module: cannot embed directory tree/module: in different module")]
#[case::vcs_directory(".git", "pattern .git: cannot embed directory .git: invalid name .git")]
#[case::file_in_vcs_directory(".git/config", "pattern .git/config: cannot embed file .git/config: in invalid directory .git")]
#[case::no_match("tree/*.md", "pattern tree/*.md: no matching files found")]
#[case::backslash("tree\\a.txt", "pattern tree\\a.txt: invalid pattern syntax")]
#[case::trailing_slash("tree/", "pattern tree/: invalid pattern syntax")]
fn resolve_errors(#[case] pattern: &str, #[case] expected: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "tree/a.txt", "a")?;
	common::write_file(tmp.path(), "tree/module/go.mod", "module nested\n")?;
	common::write_file(tmp.path(), "tree/module/b.txt", "b")?;
	common::write_file(tmp.path(), ".git/config", "[core]\n")?;

	let Err(error) = resolve_embed(&OsFileSystem, tmp.path(), &patterns(&[pattern])) else {
		panic!("expected `{expected}`");
	};
	assert_eq!(error.to_string(), expected);

	Ok(())
}

#[test]
fn custom_boundary_markers() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "tree/a.txt", "a")?;
	common::write_file(tmp.path(), "tree/work/go.work", "go 1.22\n")?;
	common::write_file(tmp.path(), "tree/work/b.txt", "b")?;

	let default = resolve_embed(&OsFileSystem, tmp.path(), &patterns(&["tree"]))?;
	assert_eq!(default.len(), 3);

	let resolution = PatternResolver::new(&OsFileSystem)
		.with_boundary_markers(["go.mod", "go.work"])
		.resolve(tmp.path(), &patterns(&["tree"]))?;
	assert_eq!(resolution.files, vec!["tree/a.txt".to_string()]);

	Ok(())
}

#[test]
fn glob_orders_matches_by_directory() -> AnyEmptyResult {
	let tmp = common::testdata_package()?;
	let matches = glob(&OsFileSystem, tmp.path(), "testdata/*/data*.txt")?;
	let relative: Vec<String> = matches
		.iter()
		.filter_map(|path| path.strip_prefix(tmp.path()).ok())
		.map(|path| path.to_string_lossy().replace('\\', "/"))
		.collect();

	assert_eq!(
		relative,
		vec![
			"testdata/one/data.txt",
			"testdata/two/data1.txt",
			"testdata/two/data2.txt",
		]
	);

	Ok(())
}

#[cfg(unix)]
#[test]
fn symlinks_are_irregular() -> AnyEmptyResult {
	let tmp = common::testdata_package()?;
	std::os::unix::fs::symlink(
		tmp.path().join("testdata/data1.txt"),
		tmp.path().join("link.txt"),
	)?;
	common::write_file(tmp.path(), "links/real.txt", "real")?;
	std::os::unix::fs::symlink(
		tmp.path().join("testdata/data2.txt"),
		tmp.path().join("links/alias.txt"),
	)?;

	let Err(error) = resolve_embed(&OsFileSystem, tmp.path(), &patterns(&["link.txt"])) else {
		panic!("expected an irregular file error");
	};
	assert_eq!(
		error.to_string(),
		"pattern link.txt: cannot embed irregular file link.txt"
	);

	let files = resolve_embed(&OsFileSystem, tmp.path(), &patterns(&["links"]))?;
	assert_eq!(files, vec!["links/real.txt".to_string()]);

	Ok(())
}
