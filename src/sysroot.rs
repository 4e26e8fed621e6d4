use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Read-only view of the host filesystem (`/proc`, `/sys`, `/etc`).
/// Defaults to `/` in production, redirectable to a temp directory for
/// testing. Probes only ever read through this.
#[derive(Debug, Clone)]
pub struct SysRoot {
    root: PathBuf,
}

impl Default for SysRoot {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }
}

impl SysRoot {
    /// View of the real system.
    pub fn system() -> Self {
        Self::default()
    }

    /// View rooted at a custom directory (for testing).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a path relative to this root.
    /// e.g. `path("proc/meminfo")` -> `/proc/meminfo` or `<test_root>/proc/meminfo`
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Read a file, trimming trailing whitespace.
    pub fn read(&self, relative: impl AsRef<Path>) -> Result<String> {
        let path = self.path(relative);
        std::fs::read_to_string(&path)
            .map(|s| s.trim_end().to_string())
            .map_err(|e| Error::FileRead { path, source: e })
    }

    /// Read a file, returning None if it is missing or unreadable for
    /// permission reasons (both common under `/proc` and `/etc`).
    pub fn read_optional(&self, relative: impl AsRef<Path>) -> Result<Option<String>> {
        let path = self.path(relative);
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s.trim_end().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Ok(None),
            Err(e) => Err(Error::FileRead { path, source: e }),
        }
    }

    /// Read a file and parse it as a specific type.
    pub fn read_parse<T: std::str::FromStr>(&self, relative: impl AsRef<Path>) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        let relative = relative.as_ref();
        let value = self.read(relative)?;
        value.trim().parse::<T>().map_err(|e| Error::Parse {
            path: self.path(relative),
            detail: format!("failed to parse '{}': {}", value, e),
        })
    }

    /// List entries in a directory, sorted.
    pub fn list_dir(&self, relative: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = self.path(relative);
        let entries = std::fs::read_dir(&path).map_err(|e| Error::FileRead {
            path: path.clone(),
            source: e,
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::FileRead {
                path: path.clone(),
                source: e,
            })?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Check if a path exists relative to this root.
    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.path(relative).exists()
    }

    /// Unix permission bits of a file, if it exists.
    pub fn mode(&self, relative: impl AsRef<Path>) -> Option<u32> {
        use std::os::unix::fs::MetadataExt;
        std::fs::metadata(self.path(relative))
            .ok()
            .map(|m| m.mode() & 0o777)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
