//! Virtual path overlay
//!
//! Serves resources embedded in source bundles at virtual paths and falls
//! back to a base provider for everything else:
//! - Bundles: declared resources mapped to `~/`-rooted paths
//! - Base: the application's real directory (or nothing)
//! - Result: merged read-only view, overlay first unless overriding is enabled

pub mod dependency;
pub mod entry;
pub mod lower;
pub mod mapper;
pub mod resolver;
pub mod stream;
pub mod vpath;

pub use dependency::InvalidationDependency;
pub use entry::{EntryTable, VirtualEntry};
pub use lower::{BaseProvider, NullProvider, PhysicalProvider};
pub use mapper::{map_resource, resource_id_for};
pub use resolver::{OverlayResolver, ResolverState};
pub use stream::ResourceStream;
pub use vpath::{normalize, PathKey};
