//! The Filesystem seam (spec §6.3): the Resolver and Loader never touch
//! `std::fs` directly, so a test double can stand in without touching disk.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// The subset of file metadata the library's collaborators need.
#[derive(Debug, Clone, Copy)]
pub struct FileStat {
    /// `true` if the path is a directory.
    pub is_dir: bool,
    /// Size in bytes (0 for directories).
    pub len: u64,
}

/// Filesystem access seam (spec §6.3).
pub trait Filesystem: Send + Sync {
    /// Read a file's full contents.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
    /// Stat a path.
    fn stat(&self, path: &Path) -> Result<FileStat>;
    /// Create a directory and all missing parents.
    fn mkdir_all(&self, path: &Path) -> Result<()>;
    /// Write a file's full contents, creating or truncating it.
    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

/// The real, `std::fs`-backed [`Filesystem`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFilesystem;

impl Filesystem for RealFilesystem {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn stat(&self, path: &Path) -> Result<FileStat> {
        let meta = std::fs::metadata(path)?;
        Ok(FileStat {
            is_dir: meta.is_dir(),
            len: meta.len(),
        })
    }

    fn mkdir_all(&self, path: &Path) -> Result<()> {
        Ok(std::fs::create_dir_all(path)?)
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        Ok(std::fs::write(path, bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_filesystem_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFilesystem;
        let path = dir.path().join("nested").join("f.txt");
        fs.mkdir_all(path.parent().unwrap()).unwrap();
        fs.write_file(&path, b"hello").unwrap();
        assert_eq!(fs.read_file(&path).unwrap(), b"hello");
        let stat = fs.stat(&path).unwrap();
        assert!(!stat.is_dir);
        assert_eq!(stat.len, 5);
    }
}
