//! In-memory bundles built by static registration

use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{ResourceDeclaration, SourceBundle};
use crate::error::{Error, Result};
use crate::fs::overlay::{mapper, ResourceStream};

/// A bundle whose resources are held in memory
#[derive(Debug, Clone)]
pub struct EmbeddedBundle {
    name: String,
    declarations: Vec<ResourceDeclaration>,
    resources: HashMap<String, Bytes>,
    location: Option<PathBuf>,
}

impl EmbeddedBundle {
    /// Start building a bundle
    pub fn builder(name: impl Into<String>) -> EmbeddedBundleBuilder {
        EmbeddedBundleBuilder {
            bundle: EmbeddedBundle {
                name: name.into(),
                declarations: Vec::new(),
                resources: HashMap::new(),
                location: None,
            },
        }
    }

    /// Identifiers of every embedded resource, declared or not
    pub fn resource_ids(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(|k| k.as_str())
    }

    /// Raw content of a resource
    pub fn resource(&self, resource_id: &str) -> Option<&Bytes> {
        self.resources.get(resource_id)
    }
}

impl SourceBundle for EmbeddedBundle {
    fn name(&self) -> &str {
        &self.name
    }

    fn declarations(&self) -> &[ResourceDeclaration] {
        &self.declarations
    }

    fn contains_resource(&self, resource_id: &str) -> bool {
        self.resources.contains_key(resource_id)
    }

    fn open_resource(&self, resource_id: &str) -> Result<ResourceStream> {
        self.resources
            .get(resource_id)
            .map(|content| ResourceStream::embedded(content.clone()))
            .ok_or_else(|| {
                Error::NotFound(format!("resource '{}' in bundle '{}'", resource_id, self.name))
            })
    }

    fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }
}

/// Builder for [`EmbeddedBundle`]
pub struct EmbeddedBundleBuilder {
    bundle: EmbeddedBundle,
}

impl EmbeddedBundleBuilder {
    /// Add resource content to the manifest without declaring it
    pub fn resource(mut self, resource_id: impl Into<String>, content: impl Into<Bytes>) -> Self {
        self.bundle
            .resources
            .insert(resource_id.into(), content.into());
        self
    }

    /// Declare a resource servable under `namespace`
    ///
    /// The declaration is kept even if the resource is never added; the
    /// overlay skips declarations without content.
    pub fn declare(mut self, resource_id: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.bundle
            .declarations
            .push(ResourceDeclaration::new(resource_id, namespace));
        self
    }

    /// Embed a file under `namespace` at `relative_path` and declare it
    pub fn embed(
        self,
        namespace: &str,
        relative_path: &str,
        content: impl Into<Bytes>,
    ) -> Result<Self> {
        let resource_id = mapper::resource_id_for(namespace, relative_path)?;
        Ok(self
            .resource(resource_id.clone(), content)
            .declare(resource_id, namespace))
    }

    /// Record where the bundle is stored on disk
    pub fn located_at(mut self, location: impl Into<PathBuf>) -> Self {
        self.bundle.location = Some(location.into());
        self
    }

    /// Anchor the bundle at the running executable, for content compiled in
    pub fn in_current_exe(mut self) -> Self {
        self.bundle.location = std::env::current_exe().ok();
        self
    }

    pub fn build(self) -> EmbeddedBundle {
        self.bundle
    }
}
