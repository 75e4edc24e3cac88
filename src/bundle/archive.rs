//! Bundle archives
//!
//! A bundle archive is a JSON document holding one bundle's declarations and
//! base64-encoded resource content. The archive file is the bundle's on-disk
//! location, so rewriting it invalidates everything the bundle serves.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{EmbeddedBundle, ResourceDeclaration, SourceBundle};
use crate::error::{Error, Result};
use crate::fs::overlay::mapper;

/// File extension used for bundle archives
pub const ARCHIVE_EXTENSION: &str = "bundle.json";

/// Serialized form of a bundle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleArchive {
    pub name: String,
    #[serde(default)]
    pub declarations: Vec<ResourceDeclaration>,
    /// Resource identifier -> content
    #[serde(default, with = "base64_map")]
    pub resources: BTreeMap<String, Vec<u8>>,
}

impl BundleArchive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declarations: Vec::new(),
            resources: BTreeMap::new(),
        }
    }

    /// Archive path for a bundle name inside `dir`
    pub fn path_in(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.{}", name, ARCHIVE_EXTENSION))
    }

    /// Read and parse an archive file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| {
            Error::Serialization(format!(
                "Failed to parse bundle archive {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Write the archive as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize bundle archive: {}", e)))?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Turn the archive into a bundle located at `location`
    pub fn into_bundle(self, location: Option<&Path>) -> EmbeddedBundle {
        let mut builder = EmbeddedBundle::builder(self.name);
        for (id, content) in self.resources {
            builder = builder.resource(id, content);
        }
        for decl in self.declarations {
            builder = builder.declare(decl.resource_id, decl.namespace);
        }
        if let Some(location) = location {
            builder = builder.located_at(location);
        }
        builder.build()
    }

    /// Capture an in-memory bundle
    pub fn from_bundle(bundle: &EmbeddedBundle) -> Self {
        Self {
            name: bundle.name().to_string(),
            declarations: bundle.declarations().to_vec(),
            resources: bundle
                .resource_ids()
                .filter_map(|id| bundle.resource(id).map(|c| (id.to_string(), c.to_vec())))
                .collect(),
        }
    }
}

/// Pack every regular file under `dir` into an archive
///
/// Each file is embedded under `namespace` and declared servable, so the
/// overlay serves it at its path relative to `dir`.
pub fn pack_directory(dir: &Path, name: &str, namespace: &str) -> Result<BundleArchive> {
    if !dir.is_dir() {
        return Err(Error::InvalidArgument(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    mapper::validate_identifier("namespace", namespace)?;

    let mut archive = BundleArchive::new(name);
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let relative = path
                .strip_prefix(dir)
                .map_err(|_| Error::InvalidArgument(format!("{} escaped {}", path.display(), dir.display())))?;
            let relative = relative.to_string_lossy().replace('\\', "/");
            let resource_id = match mapper::resource_id_for(namespace, &relative) {
                Ok(id) => id,
                Err(e @ Error::MalformedIdentifier(_)) => {
                    debug!("Skipping {}: {}", relative, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            debug!("Packing {} as {}", relative, resource_id);
            archive.resources.insert(resource_id.clone(), fs::read(&path)?);
            archive
                .declarations
                .push(ResourceDeclaration::new(resource_id, namespace));
        }
    }

    archive
        .declarations
        .sort_by(|a, b| a.resource_id.cmp(&b.resource_id));
    Ok(archive)
}

/// Base64 serialization for resource content
mod base64_map {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(map: &BTreeMap<String, Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(map.iter().map(|(k, v)| (k, STANDARD.encode(v))))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = BTreeMap::<String, String>::deserialize(deserializer)?;
        encoded
            .into_iter()
            .map(|(k, v)| {
                STANDARD
                    .decode(v.as_bytes())
                    .map(|bytes| (k, bytes))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::SourceBundle;
    use tempfile::tempdir;

    #[test]
    fn test_archive_json_shape() {
        let json = r#"{
            "name": "Demo",
            "declarations": [{"resource": "Demo.Page1.aspx", "namespace": "Demo"}],
            "resources": {"Demo.Page1.aspx": "PGgxPkhpPC9oMT4="}
        }"#;

        let archive: BundleArchive = serde_json::from_str(json).unwrap();
        assert_eq!(archive.name, "Demo");
        assert_eq!(archive.resources["Demo.Page1.aspx"], b"<h1>Hi</h1>");
    }

    #[test]
    fn test_bad_base64_is_rejected() {
        let json = r#"{"name": "Demo", "resources": {"Demo.a.txt": "***"}}"#;
        assert!(serde_json::from_str::<BundleArchive>(json).is_err());
    }

    #[test]
    fn test_save_load_into_bundle() {
        let dir = tempdir().unwrap();
        let path = BundleArchive::path_in(dir.path(), "Demo");
        assert!(path.ends_with("Demo.bundle.json"));

        let mut archive = BundleArchive::new("Demo");
        archive
            .resources
            .insert("Demo.Page1.aspx".to_string(), b"page one".to_vec());
        archive
            .declarations
            .push(ResourceDeclaration::new("Demo.Page1.aspx", "Demo"));
        archive.save(&path).unwrap();

        let bundle = BundleArchive::load(&path).unwrap().into_bundle(Some(path.as_path()));
        assert_eq!(bundle.location(), Some(path.as_path()));
        let mut stream = bundle.open_resource("Demo.Page1.aspx").unwrap();
        assert_eq!(stream.read_all().unwrap(), b"page one");

        assert_eq!(BundleArchive::from_bundle(&bundle), archive);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Broken.bundle.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            BundleArchive::load(&path).unwrap_err(),
            Error::Serialization(_)
        ));
    }

    #[test]
    fn test_pack_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("Config")).unwrap();
        fs::write(dir.path().join("Page1.aspx"), b"<p>1</p>").unwrap();
        fs::write(dir.path().join("Config").join("MyFile.config"), b"<cfg/>").unwrap();

        let archive = pack_directory(dir.path(), "Demo", "Demo").unwrap();
        let ids: Vec<_> = archive
            .declarations
            .iter()
            .map(|d| d.resource_id.as_str())
            .collect();
        assert_eq!(ids, vec!["Demo.Config.MyFile.config", "Demo.Page1.aspx"]);
        assert_eq!(archive.resources["Demo.Page1.aspx"], b"<p>1</p>");
    }

    #[test]
    fn test_pack_skips_unmappable_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Page1.aspx"), b"<p>1</p>").unwrap();
        fs::write(dir.path().join(".gitignore"), b"target/").unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join(".hidden").join("notes.txt"), b"x").unwrap();

        let archive = pack_directory(dir.path(), "Demo", "Demo").unwrap();
        assert_eq!(archive.declarations.len(), 1);
        assert_eq!(archive.declarations[0].resource_id, "Demo.Page1.aspx");
        assert_eq!(archive.resources.len(), 1);
    }

    #[test]
    fn test_pack_rejects_malformed_namespace() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Page1.aspx"), b"<p>1</p>").unwrap();
        assert!(matches!(
            pack_directory(dir.path(), "Demo", "Demo.").unwrap_err(),
            Error::MalformedIdentifier(_)
        ));
    }

    #[test]
    fn test_pack_requires_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, b"x").unwrap();
        assert!(pack_directory(&file, "Demo", "Demo").is_err());
    }
}
