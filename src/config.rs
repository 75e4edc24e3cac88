//! Configuration management for embedvfs

use crate::error::{Error, Result};
use crate::fs::overlay::vpath::DEFAULT_APP_ROOT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Overlay configuration
    #[serde(default)]
    pub overlay: OverlayConfig,

    /// Base filesystem configuration
    #[serde(default)]
    pub base: BaseConfig,
}

/// Overlay configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    /// Source bundles to scan, in registration order
    pub bundles: Vec<String>,

    /// Directory holding `<name>.bundle.json` archives
    pub bundle_dir: PathBuf,

    /// Absolute virtual path of the application root
    pub app_root: String,

    /// Let files on the base filesystem override embedded ones
    pub allow_override: bool,
}

/// Base filesystem configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BaseConfig {
    /// Directory the application root maps to. No base filesystem when unset.
    pub root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            overlay: OverlayConfig::default(),
            base: BaseConfig::default(),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("embedvfs");

        OverlayConfig {
            bundles: Vec::new(),
            bundle_dir: data_dir.join("bundles"),
            app_root: DEFAULT_APP_ROOT.to_string(),
            allow_override: false,
        }
    }
}

/// Serialization format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration from a file, with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = match ConfigFormat::for_path(path) {
            ConfigFormat::Json => serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?,
            ConfigFormat::Yaml => serde_yaml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?,
        };

        // Override with environment variables if set
        config.apply_env_overrides();

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(allow) = std::env::var("EMBEDVFS_ALLOW_OVERRIDE") {
            if let Ok(allow) = allow.trim().to_ascii_lowercase().parse::<bool>() {
                self.overlay.allow_override = allow;
            }
        }

        if let Ok(dir) = std::env::var("EMBEDVFS_BUNDLE_DIR") {
            let dir = dir.trim();
            if !dir.is_empty() {
                self.overlay.bundle_dir = PathBuf::from(dir);
            }
        }

        if let Ok(root) = std::env::var("EMBEDVFS_BASE_ROOT") {
            let root = root.trim();
            if !root.is_empty() {
                self.base.root = Some(PathBuf::from(root));
            }
        }

        if let Ok(bundles) = std::env::var("EMBEDVFS_BUNDLES") {
            let bundles: Vec<String> = bundles
                .split(',')
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .collect();
            if !bundles.is_empty() {
                self.overlay.bundles = bundles;
            }
        }
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::for_path(path) {
            ConfigFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?,
            ConfigFormat::Yaml => serde_yaml::to_string(self)
                .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?,
        };

        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let root = &self.overlay.app_root;
        if !root.starts_with('/') || !root.ends_with('/') {
            return Err(Error::InvalidConfig(format!(
                "Application root '{}' must start and end with '/'",
                root
            )));
        }

        if let Some(name) = self.overlay.bundles.iter().find(|b| b.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "Bundle names must not be empty (got {:?})",
                name
            )));
        }

        Ok(())
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.overlay.bundle_dir)?;
        Ok(())
    }
}
