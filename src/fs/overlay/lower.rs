//! Base provider pass-through
//!
//! Paths the overlay does not serve are delegated to a base provider,
//! normally the application's real directory on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::mapper::APP_ROOT_MARKER;
use super::{InvalidationDependency, ResourceStream};
use crate::error::{Error, Result};

/// Fallback filesystem consulted for paths the overlay does not own
///
/// Paths arrive normalized: `~/`-rooted when under the application root,
/// `/`-rooted otherwise.
pub trait BaseProvider: Send + Sync {
    /// Whether a file exists at the path
    fn exists(&self, path: &str) -> bool;

    /// Open the file at the path
    fn open(&self, path: &str) -> Result<ResourceStream>;

    /// Dependency covering the path and any extra paths, if there is
    /// anything to watch
    fn dependency(
        &self,
        path: &str,
        extra_paths: &[String],
        observed_at: SystemTime,
    ) -> Option<InvalidationDependency>;
}

/// Base provider over a directory on the real filesystem
pub struct PhysicalProvider {
    /// Directory the application root maps to
    root: PathBuf,
}

impl PhysicalProvider {
    /// Create a provider rooted at `root`, which must exist
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::NotFound(root.to_string_lossy().to_string()));
        }
        Ok(Self { root })
    }

    /// Get the root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an application-relative path onto the root directory
    ///
    /// Returns `None` for paths outside the application root.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = path.strip_prefix(APP_ROOT_MARKER)?;
        let mut resolved = self.root.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return None;
            }
            resolved.push(segment);
        }
        Some(resolved)
    }
}

impl BaseProvider for PhysicalProvider {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path)
            .map(|resolved| resolved.is_file())
            .unwrap_or(false)
    }

    fn open(&self, path: &str) -> Result<ResourceStream> {
        let resolved = self
            .resolve(path)
            .filter(|resolved| resolved.is_file())
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        let file = fs::File::open(&resolved)?;
        Ok(ResourceStream::file(file)?)
    }

    fn dependency(
        &self,
        path: &str,
        extra_paths: &[String],
        observed_at: SystemTime,
    ) -> Option<InvalidationDependency> {
        let deps = std::iter::once(path)
            .chain(extra_paths.iter().map(|p| p.as_str()))
            .filter_map(|p| self.resolve(p))
            .map(|resolved| InvalidationDependency::file(resolved, observed_at));

        match InvalidationDependency::aggregate(deps)? {
            InvalidationDependency::Aggregate(mut members) if members.len() == 1 => members.pop(),
            aggregate => Some(aggregate),
        }
    }
}

/// Base provider with no files at all
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProvider;

impl BaseProvider for NullProvider {
    fn exists(&self, _path: &str) -> bool {
        false
    }

    fn open(&self, path: &str) -> Result<ResourceStream> {
        Err(Error::NotFound(path.to_string()))
    }

    fn dependency(
        &self,
        _path: &str,
        _extra_paths: &[String],
        _observed_at: SystemTime,
    ) -> Option<InvalidationDependency> {
        None
    }
}
