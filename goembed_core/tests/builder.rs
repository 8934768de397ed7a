mod common;

use std::path::Path;

use goembed_core::AnyEmptyResult;
use goembed_core::AnyResult;
use goembed_core::Binding;
use goembed_core::ContentHash;
use goembed_core::EmbedOptions;
use goembed_core::FileSystem;
use goembed_core::ManifestBuilder;
use goembed_core::TypeKind;
use goembed_core::list_directives;
use goembed_core::load_sources_with;
use goembed_core::parse_source;
use similar_asserts::assert_eq;

fn bindings(body: &str) -> AnyResult<Vec<Binding>> {
	let file = parse_source("./main.go", &common::main_package(r#""embed""#, body))?;
	Ok(list_directives(&[file], &EmbedOptions::default())?)
}

fn binding(body: &str) -> AnyResult<Binding> {
	bindings(body)?
		.into_iter()
		.next()
		.ok_or_else(|| "no binding".into())
}

#[test]
fn scalar_binding_hashes_file_content() -> AnyEmptyResult {
	let tmp = common::testdata_package()?;
	let binding = binding("//go:embed testdata/data1.txt\nvar data string\n")?;
	assert_eq!(binding.kind, TypeKind::Text);

	let builder = ManifestBuilder::new();
	let files = builder.load(tmp.path(), &binding)?;

	assert_eq!(files.len(), 1);
	let on_disk = std::fs::read(tmp.path().join("testdata/data1.txt"))?;
	assert_eq!(files[0].data, on_disk);
	assert_eq!(files[0].hash, ContentHash::of(&on_disk));
	assert!(!files[0].hash.is_zero());
	assert_eq!(files[0].load_error, None);

	Ok(())
}

#[test]
fn empty_file_has_zero_hash() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "empty.txt", "")?;
	let binding = binding("//go:embed empty.txt\nvar data []byte\n")?;

	let files = ManifestBuilder::new().load(tmp.path(), &binding)?;
	assert!(files[0].data.is_empty());
	assert!(files[0].hash.is_zero());

	Ok(())
}

#[test]
fn repeated_loads_read_each_file_once() -> AnyEmptyResult {
	let tmp = common::testdata_package()?;
	let binding = binding("//go:embed testdata\nvar data embed.FS\n")?;
	let builder = ManifestBuilder::with_fs(common::CountingFs::default());

	let first = builder.load(tmp.path(), &binding)?;
	let second = builder.load(tmp.path(), &binding)?;

	assert_eq!(first, second);
	assert_eq!(builder.fs().total_reads(), common::TESTDATA.len());
	for (name, _) in common::TESTDATA {
		assert_eq!(builder.fs().reads(&tmp.path().join(name)), 1);
	}

	Ok(())
}

#[test]
fn bindings_share_cached_files() -> AnyEmptyResult {
	let tmp = common::testdata_package()?;
	let body = "//go:embed testdata/data1.txt\nvar text string\n\n//go:embed testdata/*.txt\nvar files embed.FS\n";
	let file = parse_source("./main.go", &common::main_package(r#""embed""#, body))?;
	let builder = ManifestBuilder::with_fs(common::CountingFs::default());

	let manifest = load_sources_with(&builder, tmp.path(), &[file], &EmbedOptions::default())?;

	assert_eq!(manifest.embeds.len(), 2);
	assert_eq!(builder.fs().total_reads(), 2);
	assert_eq!(
		builder
			.fs()
			.reads(&tmp.path().join("testdata/data1.txt")),
		1
	);
	assert!(std::sync::Arc::ptr_eq(
		&manifest.embeds[0].files[0],
		&manifest.embeds[1].files[0]
	));

	Ok(())
}

#[test]
fn shared_builder_across_threads() -> AnyEmptyResult {
	let tmp = common::testdata_package()?;
	let binding = binding("//go:embed testdata\nvar data embed.FS\n")?;
	let builder = ManifestBuilder::with_fs(common::CountingFs::default());
	let root: &Path = tmp.path();

	std::thread::scope(|scope| {
		for _ in 0..8 {
			scope.spawn(|| {
				let files = builder
					.load(root, &binding)
					.unwrap_or_else(|e| panic!("load failed: {e}"));
				assert_eq!(files.len(), common::TESTDATA.len());
			});
		}
	});

	assert_eq!(builder.fs().total_reads(), common::TESTDATA.len());
	assert_eq!(builder.manifest().len(), common::TESTDATA.len());

	Ok(())
}

#[test]
fn manifest_collects_every_loaded_file() -> AnyEmptyResult {
	let tmp = common::testdata_package()?;
	let builder = ManifestBuilder::new();

	for binding in bindings(
		"//go:embed testdata/two\nvar two embed.FS\n\n//go:embed testdata/data2.txt\nvar data string\n",
	)? {
		builder.load(tmp.path(), &binding)?;
	}

	let names: Vec<String> = builder
		.manifest()
		.iter()
		.map(|file| file.name.clone())
		.collect();
	assert_eq!(
		names,
		vec![
			"testdata/data2.txt",
			"testdata/two/data1.txt",
			"testdata/two/data2.txt",
		]
	);

	Ok(())
}

#[test]
fn read_failures_are_reported_with_the_directive() -> AnyEmptyResult {
	let tmp = common::testdata_package()?;
	let binding = binding("//go:embed testdata/*.txt\nvar data embed.FS\n")?;
	let builder = ManifestBuilder::with_fs(common::DenyingFs {
		denied_suffix: "data2.txt",
	});

	let Err(error) = builder.load(tmp.path(), &binding) else {
		panic!("expected a read error");
	};
	assert_eq!(
		error.to_string(),
		"./main.go:5:3: pattern testdata/*.txt: read testdata/data2.txt: denied"
	);

	let cached = builder.manifest();
	assert_eq!(cached.len(), 2);
	assert_eq!(cached[1].load_error.as_deref(), Some("denied"));

	Ok(())
}

#[test]
fn resolve_does_not_read_files() -> AnyEmptyResult {
	let tmp = common::testdata_package()?;
	let builder = ManifestBuilder::with_fs(common::CountingFs::default());

	let resolution = builder.resolve(tmp.path(), &["testdata".to_string()])?;
	assert_eq!(resolution.files.len(), common::TESTDATA.len());
	assert_eq!(builder.fs().total_reads(), 0);
	assert!(builder.fs().exists(&tmp.path().join("testdata")));

	Ok(())
}

#[test]
fn cached_files_are_named_relative_to_each_base_dir() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "pkg/a.txt", "shared")?;
	let outer = binding("//go:embed pkg/a.txt\nvar data string\n")?;
	let inner = binding("//go:embed a.txt\nvar data string\n")?;
	let builder = ManifestBuilder::with_fs(common::CountingFs::default());
	let pkg = tmp.path().join("pkg");

	let first = builder.load(tmp.path(), &outer)?;
	let second = builder.load(&pkg, &inner)?;

	assert_eq!(first[0].name, "pkg/a.txt");
	assert_eq!(second[0].name, "a.txt");
	assert_eq!(second[0].data, b"shared".to_vec());
	assert_eq!(second[0].hash, first[0].hash);
	assert!(pkg.join(&second[0].name).is_file());
	assert_eq!(builder.fs().total_reads(), 1);

	Ok(())
}

#[test]
fn relative_and_absolute_base_dirs_share_the_cache() -> AnyEmptyResult {
	let tmp = tempfile::tempdir_in(".")?;
	common::write_file(tmp.path(), "a.txt", "relative")?;
	assert!(tmp.path().is_relative());
	let absolute = std::env::current_dir()?.join(tmp.path());
	let binding = binding("//go:embed a.txt\nvar data string\n")?;
	let builder = ManifestBuilder::with_fs(common::CountingFs::default());

	let relative_files = builder.load(tmp.path(), &binding)?;
	let absolute_files = builder.load(&absolute, &binding)?;

	assert_eq!(builder.fs().total_reads(), 1);
	assert_eq!(builder.manifest().len(), 1);
	assert!(relative_files[0].path.is_absolute());
	assert_eq!(relative_files, absolute_files);

	Ok(())
}
