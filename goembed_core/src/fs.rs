use std::io;
use std::path::Path;

/// The type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
	File,
	Directory,
	Symlink,
	/// Devices, sockets, pipes and anything else.
	Other,
}

impl From<std::fs::FileType> for FileKind {
	fn from(file_type: std::fs::FileType) -> Self {
		if file_type.is_symlink() {
			Self::Symlink
		} else if file_type.is_dir() {
			Self::Directory
		} else if file_type.is_file() {
			Self::File
		} else {
			Self::Other
		}
	}
}

/// Filesystem access used while resolving patterns and loading files.
///
/// Failures are reported as [`io::Error`] so callers can tell a missing path
/// (`ErrorKind::NotFound`) apart from a pattern that simply matched nothing.
pub trait FileSystem: Send + Sync {
	/// The entry type at `path`, following symbolic links.
	fn stat(&self, path: &Path) -> io::Result<FileKind>;

	/// The entry type at `path` without following a final symbolic link.
	fn lstat(&self, path: &Path) -> io::Result<FileKind>;

	fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

	/// Names of the entries of the directory at `path`, in any order.
	fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;

	fn exists(&self, path: &Path) -> bool {
		self.stat(path).is_ok()
	}
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
	fn stat(&self, path: &Path) -> io::Result<FileKind> {
		(**self).stat(path)
	}

	fn lstat(&self, path: &Path) -> io::Result<FileKind> {
		(**self).lstat(path)
	}

	fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
		(**self).read_file(path)
	}

	fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
		(**self).read_dir(path)
	}
}

/// The operating system's filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
	fn stat(&self, path: &Path) -> io::Result<FileKind> {
		Ok(std::fs::metadata(path)?.file_type().into())
	}

	fn lstat(&self, path: &Path) -> io::Result<FileKind> {
		Ok(std::fs::symlink_metadata(path)?.file_type().into())
	}

	fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
		std::fs::read(path)
	}

	fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
		let mut names = vec![];
		for entry in std::fs::read_dir(path)? {
			names.push(entry?.file_name().to_string_lossy().into_owned());
		}
		Ok(names)
	}
}
