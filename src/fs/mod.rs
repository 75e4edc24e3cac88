//! Virtual filesystem
//!
//! Path-based read access merging embedded bundle content with a base
//! directory.

pub mod overlay;

pub use overlay::{OverlayResolver, ResourceStream};
