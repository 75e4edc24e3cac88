//! Cache invalidation dependencies
//!
//! A dependency records what has to be watched to know that content served
//! for a path may be stale. Files from the base provider are watched one by
//! one; embedded content is watched through the on-disk location of the
//! bundle that carries it, so any change to a bundle invalidates every path
//! it serves.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// What must be watched to detect stale content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationDependency {
    /// A single file on the real filesystem
    File {
        path: PathBuf,
        /// Whether the file existed when the dependency was built
        existed: bool,
        observed_at: SystemTime,
    },
    /// The storage location of a source bundle
    Bundle {
        name: String,
        location: PathBuf,
        observed_at: SystemTime,
    },
    /// Stale as soon as any member is stale
    Aggregate(Vec<InvalidationDependency>),
}

impl InvalidationDependency {
    /// Build a file dependency, recording whether the file exists right now
    pub fn file(path: impl Into<PathBuf>, observed_at: SystemTime) -> Self {
        let path = path.into();
        let existed = path.exists();
        InvalidationDependency::File {
            path,
            existed,
            observed_at,
        }
    }

    /// Build a bundle dependency anchored at the bundle's location
    pub fn bundle(name: &str, location: &Path, observed_at: SystemTime) -> Self {
        InvalidationDependency::Bundle {
            name: name.to_string(),
            location: location.to_path_buf(),
            observed_at,
        }
    }

    /// Combine dependencies, dropping exact duplicates
    ///
    /// Returns `None` when there is nothing to watch.
    pub fn aggregate<I>(deps: I) -> Option<Self>
    where
        I: IntoIterator<Item = InvalidationDependency>,
    {
        let mut members: Vec<InvalidationDependency> = Vec::new();
        for dep in deps {
            if !members.contains(&dep) {
                members.push(dep);
            }
        }

        if members.is_empty() {
            None
        } else {
            Some(InvalidationDependency::Aggregate(members))
        }
    }

    /// Check whether the watched state changed since the dependency was built
    pub fn has_changed(&self) -> bool {
        match self {
            InvalidationDependency::File {
                path,
                existed,
                observed_at,
            } => match fs::metadata(path) {
                Ok(meta) => !*existed || modified_after(&meta, *observed_at),
                Err(_) => *existed,
            },
            InvalidationDependency::Bundle {
                location,
                observed_at,
                ..
            } => match fs::metadata(location) {
                Ok(meta) => modified_after(&meta, *observed_at),
                Err(_) => true,
            },
            InvalidationDependency::Aggregate(members) => members.iter().any(|d| d.has_changed()),
        }
    }

    /// Every filesystem path this dependency watches
    pub fn watched_paths(&self) -> Vec<&Path> {
        match self {
            InvalidationDependency::File { path, .. } => vec![path.as_path()],
            InvalidationDependency::Bundle { location, .. } => vec![location.as_path()],
            InvalidationDependency::Aggregate(members) => {
                members.iter().flat_map(|d| d.watched_paths()).collect()
            }
        }
    }

    /// Number of leaf dependencies
    pub fn len(&self) -> usize {
        match self {
            InvalidationDependency::Aggregate(members) => members.iter().map(|d| d.len()).sum(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn modified_after(meta: &fs::Metadata, observed_at: SystemTime) -> bool {
    meta.modified()
        .map(|mtime| mtime > observed_at)
        .unwrap_or(false)
}
