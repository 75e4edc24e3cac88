//! Overlay entries
//!
//! Binds virtual paths to the embedded resources that back them.

use std::collections::HashMap;

use super::vpath::PathKey;
use crate::bundle::BundleHandle;

/// A virtual path backed by an embedded resource
#[derive(Debug, Clone)]
pub struct VirtualEntry {
    virtual_path: String,
    bundle: BundleHandle,
    resource_id: String,
}

impl VirtualEntry {
    pub fn new(virtual_path: String, bundle: BundleHandle, resource_id: String) -> Self {
        Self {
            virtual_path,
            bundle,
            resource_id,
        }
    }

    /// Canonical virtual path, as mapped from the resource identifier
    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    /// Bundle carrying the content
    pub fn bundle(&self) -> &BundleHandle {
        &self.bundle
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }
}

/// Case-insensitive set of entries keyed by virtual path
///
/// The first entry inserted for a path wins; later inserts are rejected.
#[derive(Debug, Default)]
pub struct EntryTable {
    entries: HashMap<PathKey, VirtualEntry>,
}

impl EntryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning false if its path is already present
    pub fn insert(&mut self, entry: VirtualEntry) -> bool {
        use std::collections::hash_map::Entry;

        match self.entries.entry(PathKey::new(&entry.virtual_path)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    pub fn contains(&self, virtual_path: &str) -> bool {
        self.entries.contains_key(&PathKey::new(virtual_path))
    }

    pub fn lookup(&self, virtual_path: &str) -> Option<&VirtualEntry> {
        self.entries.get(&PathKey::new(virtual_path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
