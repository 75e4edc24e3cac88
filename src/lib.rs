//! embedvfs - Virtual filesystem overlay for embedded resources
//!
//! This library serves files embedded in source bundles at virtual paths
//! under an application root, falling back to a base filesystem for
//! everything the bundles do not provide.

pub mod bundle;
pub mod config;
pub mod error;
pub mod fs;
pub mod settings;

pub use config::Config;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bundle::{BundleLoader, BundleRegistry, EmbeddedBundle, SourceBundle};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::fs::overlay::{
        InvalidationDependency, OverlayResolver, PhysicalProvider, ResourceStream,
    };
    pub use crate::settings::{MapSettings, SettingsStore};
}
