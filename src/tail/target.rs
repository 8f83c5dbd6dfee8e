//! Absolute file path split into the parts the OS watch needs.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::TailError;

/// The file one worker tails: absolute path, its directory, and its file name.
///
/// Resolved once per worker instance and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    path: PathBuf,
    dir: PathBuf,
    file_name: OsString,
}

impl WatchTarget {
    /// Resolves `path` against the filesystem.
    ///
    /// Symlinks and `..` are resolved so the directory matches what the OS
    /// watch reports. The file must exist.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self, TailError> {
        let requested = path.as_ref();
        let path = std::fs::canonicalize(requested).map_err(|source| TailError::Resolve {
            path: requested.to_path_buf(),
            source,
        })?;
        Self::from_absolute(path)
    }

    /// Builds a target from an already absolute path without touching the filesystem.
    pub fn from_absolute(path: PathBuf) -> Result<Self, TailError> {
        let (Some(dir), Some(file_name)) = (path.parent(), path.file_name()) else {
            return Err(TailError::NotSupported {
                reason: format!("{} does not name a file", path.display()),
            });
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            file_name: file_name.to_os_string(),
            path,
        })
    }

    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the file lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name without directory.
    pub fn file_name(&self) -> &std::ffi::OsStr {
        &self.file_name
    }

    /// File name as (lossy) text, as carried by notifications.
    pub fn file_name_lossy(&self) -> String {
        self.file_name.to_string_lossy().into_owned()
    }
}
