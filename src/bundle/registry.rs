//! Name-based bundle loading

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::{BundleArchive, BundleHandle, BundleLoader, SourceBundle};
use crate::error::{Error, Result};

/// Resolves bundle names against registered bundles, then archives on disk
#[derive(Default)]
pub struct BundleRegistry {
    bundles: HashMap<String, BundleHandle>,
    archive_dir: Option<PathBuf>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that also looks for `<name>.bundle.json` inside `dir`
    pub fn with_archive_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            bundles: HashMap::new(),
            archive_dir: Some(dir.into()),
        }
    }

    /// Register a bundle under its own name
    ///
    /// Returns the previously registered bundle with that name, if any.
    pub fn register<B: SourceBundle + 'static>(&mut self, bundle: B) -> Option<BundleHandle> {
        self.register_handle(Arc::new(bundle))
    }

    pub fn register_handle(&mut self, bundle: BundleHandle) -> Option<BundleHandle> {
        self.bundles.insert(bundle.name().to_string(), bundle)
    }

    /// Directory searched for bundle archives
    pub fn archive_dir(&self) -> Option<&Path> {
        self.archive_dir.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

impl BundleLoader for BundleRegistry {
    fn load(&self, name: &str) -> Result<BundleHandle> {
        if let Some(bundle) = self.bundles.get(name) {
            return Ok(bundle.clone());
        }

        if let Some(dir) = &self.archive_dir {
            let path = BundleArchive::path_in(dir, name);
            if path.is_file() {
                debug!("Loading bundle '{}' from {}", name, path.display());
                let archive = BundleArchive::load(&path)?;
                if archive.name != name {
                    return Err(Error::BundleNotFound(format!(
                        "{} (archive {} declares bundle '{}')",
                        name,
                        path.display(),
                        archive.name
                    )));
                }
                return Ok(Arc::new(archive.into_bundle(Some(path.as_path()))));
            }
        }

        Err(Error::BundleNotFound(name.to_string()))
    }
}
