//! Source bundles
//!
//! A source bundle carries embedded resource content together with the list
//! of resources it declares servable. Bundles are built with
//! [`EmbeddedBundle::builder`] (typically from `include_bytes!`) or loaded
//! from bundle archives on disk, and handed to the overlay through a
//! [`BundleLoader`].

mod archive;
mod embedded;
mod registry;

pub use archive::{pack_directory, BundleArchive, ARCHIVE_EXTENSION};
pub use embedded::{EmbeddedBundle, EmbeddedBundleBuilder};
pub use registry::BundleRegistry;

use crate::error::Result;
use crate::fs::overlay::ResourceStream;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A resource a bundle declares servable, with its declaring namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    /// Full dotted resource identifier
    #[serde(rename = "resource")]
    pub resource_id: String,
    /// Namespace the identifier is relative to
    pub namespace: String,
}

impl ResourceDeclaration {
    pub fn new(resource_id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            namespace: namespace.into(),
        }
    }
}

/// A loadable unit carrying embedded resources
pub trait SourceBundle: Send + Sync + std::fmt::Debug {
    /// Bundle name used in configuration
    fn name(&self) -> &str;

    /// Resources declared servable, in declaration order
    fn declarations(&self) -> &[ResourceDeclaration];

    /// Whether the resource manifest contains `resource_id`
    fn contains_resource(&self, resource_id: &str) -> bool;

    /// Open a read-only stream over an embedded resource
    fn open_resource(&self, resource_id: &str) -> Result<ResourceStream>;

    /// Where the bundle lives on disk, if anywhere
    fn location(&self) -> Option<&Path>;
}

/// Shared handle to a loaded bundle
pub type BundleHandle = Arc<dyn SourceBundle>;

/// Resolves bundle names to loaded bundles
pub trait BundleLoader: Send + Sync {
    /// Load a bundle by name, failing with `BundleNotFound` if unresolvable
    fn load(&self, name: &str) -> Result<BundleHandle>;
}
