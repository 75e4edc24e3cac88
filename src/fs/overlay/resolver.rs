//! Overlay resolver
//!
//! Serves embedded resources at their mapped virtual paths and hands every
//! other path to the base provider.

use std::io;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

use super::{
    entry::{EntryTable, VirtualEntry},
    lower::{BaseProvider, NullProvider, PhysicalProvider},
    mapper, vpath, InvalidationDependency, ResourceStream,
};
use crate::bundle::{BundleHandle, BundleLoader, BundleRegistry};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::settings::{self, SettingsStore, ALLOW_OVERRIDE_KEY};

/// Lifecycle of a resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    /// Constructed, no bundles scanned yet
    Uninitialized,
    /// Scanning bundles
    Initializing,
    /// Entry table is complete and read-only
    Ready,
}

/// Virtual path overlay backed by source bundles
///
/// Populated once by [`initialize`](Self::initialize); every query after
/// that takes `&self`, so a ready resolver can be shared across threads.
pub struct OverlayResolver {
    /// Lifecycle state
    state: ResolverState,
    /// Virtual path -> embedded resource
    entries: EntryTable,
    /// Resolves configured bundle names
    loader: Box<dyn BundleLoader>,
    /// Fallback for paths the overlay does not serve
    base: Box<dyn BaseProvider>,
    /// Source of the override flag, read on every query
    settings: Arc<dyn SettingsStore>,
    /// Override flag used while the store has no value for it
    default_allow_override: bool,
    /// Absolute virtual path of the application root
    app_root: String,
}

impl OverlayResolver {
    /// Create an uninitialized resolver
    pub fn new(
        loader: impl BundleLoader + 'static,
        base: impl BaseProvider + 'static,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            state: ResolverState::Uninitialized,
            entries: EntryTable::new(),
            loader: Box::new(loader),
            base: Box::new(base),
            settings,
            default_allow_override: false,
            app_root: vpath::DEFAULT_APP_ROOT.to_string(),
        }
    }

    /// Create an uninitialized resolver from configuration
    ///
    /// Bundles are looked up in `registry` first, then as archives in the
    /// configured bundle directory. The override flag is read from
    /// `settings` on every query; the configured value applies only while
    /// the store has no entry for it.
    pub fn from_config(
        config: &Config,
        registry: BundleRegistry,
        settings: Arc<dyn SettingsStore>,
    ) -> Result<Self> {
        config.validate()?;

        let mut loader = BundleRegistry::with_archive_dir(&config.overlay.bundle_dir);
        for name in &config.overlay.bundles {
            if let Ok(bundle) = registry.load(name) {
                loader.register_handle(bundle);
            }
        }

        let base: Box<dyn BaseProvider> = match &config.base.root {
            Some(root) => Box::new(PhysicalProvider::new(root)?),
            None => Box::new(NullProvider),
        };

        Ok(Self {
            state: ResolverState::Uninitialized,
            entries: EntryTable::new(),
            loader: Box::new(loader),
            base,
            settings,
            default_allow_override: config.overlay.allow_override,
            app_root: config.overlay.app_root.clone(),
        })
    }

    /// Set the absolute virtual path of the application root
    pub fn with_app_root(mut self, app_root: impl Into<String>) -> Self {
        self.app_root = app_root.into();
        self
    }

    pub fn state(&self) -> ResolverState {
        self.state
    }

    pub fn app_root(&self) -> &str {
        &self.app_root
    }

    /// Number of virtual paths served by the overlay
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Scan the named bundles and build the entry table
    ///
    /// Bundles are processed in order. Declarations without content, with
    /// unmappable names, or whose path is already taken are skipped. A bundle
    /// that fails to load does not stop the scan; once every bundle has been
    /// processed the resolver is ready and the failures are reported as
    /// [`Error::BundleNotFound`].
    pub fn initialize<S: AsRef<str>>(&mut self, bundle_names: &[S]) -> Result<()> {
        if self.state != ResolverState::Uninitialized {
            return Err(Error::AlreadyInitialized);
        }
        self.state = ResolverState::Initializing;

        let mut failed = Vec::new();
        for name in bundle_names {
            let name = name.as_ref();
            match self.loader.load(name) {
                Ok(bundle) => {
                    let added = self.register_bundle(&bundle);
                    info!("Registered {} entries from bundle '{}'", added, name);
                }
                Err(Error::BundleNotFound(detail)) => {
                    warn!("Source bundle not found: {}", detail);
                    failed.push(detail);
                }
                Err(e) => {
                    warn!("Failed to load source bundle '{}': {}", name, e);
                    failed.push(format!("{} ({})", name, e));
                }
            }
        }

        self.state = ResolverState::Ready;
        info!("Overlay ready with {} entries", self.entries.len());

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::BundleNotFound(failed.join(", ")))
        }
    }

    /// Add a bundle's servable declarations to the entry table
    fn register_bundle(&mut self, bundle: &BundleHandle) -> usize {
        let mut added = 0;

        for decl in bundle.declarations() {
            if !bundle.contains_resource(&decl.resource_id) {
                debug!(
                    "Skipping '{}' in bundle '{}': no such resource",
                    decl.resource_id,
                    bundle.name()
                );
                continue;
            }

            let virtual_path = match mapper::map_resource(&decl.namespace, &decl.resource_id) {
                Ok(path) => path,
                Err(e) => {
                    debug!("Skipping '{}': {}", decl.resource_id, e);
                    continue;
                }
            };

            let entry = VirtualEntry::new(virtual_path, bundle.clone(), decl.resource_id.clone());
            if self.entries.insert(entry) {
                added += 1;
            } else {
                debug!(
                    "Skipping '{}' in bundle '{}': path already registered",
                    decl.resource_id,
                    bundle.name()
                );
            }
        }

        added
    }

    /// Normalize a path against this resolver's application root
    pub fn normalize(&self, virtual_path: &str) -> Result<String> {
        vpath::normalize(virtual_path, &self.app_root)
    }

    /// Settings store consulted for the override flag
    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        &self.settings
    }

    /// Current value of the override flag
    pub fn allow_override(&self) -> bool {
        settings::flag_or(
            self.settings.as_ref(),
            ALLOW_OVERRIDE_KEY,
            self.default_allow_override,
        )
    }

    /// Whether requests for the path go to the base provider
    pub fn is_handled_by_base(&self, virtual_path: &str) -> Result<bool> {
        let path = self.normalize(virtual_path)?;
        Ok(self.handled_by_base(&path))
    }

    fn handled_by_base(&self, path: &str) -> bool {
        !self.entries.contains(path) || (self.allow_override() && self.base.exists(path))
    }

    /// Entry serving the normalized path, unless the base provider takes it
    fn serving_entry(&self, path: &str) -> Option<&VirtualEntry> {
        if self.handled_by_base(path) {
            None
        } else {
            self.entries.lookup(path)
        }
    }

    /// Entry registered for a path, regardless of the override flag
    pub fn lookup(&self, virtual_path: &str) -> Result<Option<&VirtualEntry>> {
        let path = self.normalize(virtual_path)?;
        Ok(self.entries.lookup(&path))
    }

    /// Check whether a file exists in the overlay or the base provider
    pub fn exists(&self, virtual_path: &str) -> Result<bool> {
        let path = self.normalize(virtual_path)?;
        Ok(self.entries.contains(&path) || self.base.exists(&path))
    }

    /// Open a read-only stream over a file's content
    pub fn open(&self, virtual_path: &str) -> Result<ResourceStream> {
        let path = self.normalize(virtual_path)?;

        match self.serving_entry(&path) {
            Some(entry) => {
                debug!(
                    "open({}) -> bundle '{}' resource '{}'",
                    path,
                    entry.bundle().name(),
                    entry.resource_id()
                );
                entry.bundle().open_resource(entry.resource_id())
            }
            None => {
                debug!("open({}) -> base provider", path);
                self.base.open(&path)
            }
        }
    }

    /// Build the dependency that signals when content served for
    /// `virtual_path`, or any of `dependent_paths`, may be stale
    ///
    /// Returns `None` only when none of the paths has anything to watch.
    /// Dependent paths that cannot be normalized contribute nothing; only an
    /// invalid primary path is an error.
    pub fn invalidation_dependency<S: AsRef<str>>(
        &self,
        virtual_path: &str,
        dependent_paths: &[S],
        observed_at: SystemTime,
    ) -> Result<Option<InvalidationDependency>> {
        let mut deps = Vec::with_capacity(dependent_paths.len() + 1);
        deps.extend(self.path_dependency(virtual_path, observed_at)?);

        for dependent in dependent_paths {
            let dependent = dependent.as_ref();
            match self.path_dependency(dependent, observed_at) {
                Ok(dep) => deps.extend(dep),
                Err(e) => debug!("Ignoring dependent path '{}': {}", dependent, e),
            }
        }

        Ok(InvalidationDependency::aggregate(deps))
    }

    /// Dependency for a single path
    ///
    /// Embedded content is tied to its bundle's location rather than to the
    /// individual resource.
    fn path_dependency(
        &self,
        virtual_path: &str,
        observed_at: SystemTime,
    ) -> Result<Option<InvalidationDependency>> {
        let path = self.normalize(virtual_path)?;

        let dep = match self.serving_entry(&path) {
            Some(entry) => {
                let bundle = entry.bundle();
                bundle
                    .location()
                    .map(|location| InvalidationDependency::bundle(bundle.name(), location, observed_at))
            }
            None => self.base.dependency(&path, &[], observed_at),
        };

        Ok(dep)
    }

    /// BLAKE3 digest of the content `open` returns for a path
    pub fn content_hash(&self, virtual_path: &str) -> Result<String> {
        let mut stream = self.open(virtual_path)?;
        let mut hasher = blake3::Hasher::new();
        io::copy(&mut stream, &mut hasher)?;
        Ok(hasher.finalize().to_hex().to_string())
    }
}
