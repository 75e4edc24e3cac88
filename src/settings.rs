//! Runtime settings lookup
//!
//! The overlay reads its override flag from an injected key/value store on
//! every query, so the flag can be flipped without rebuilding the resolver.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Setting that lets files on the real filesystem override embedded ones
pub const ALLOW_OVERRIDE_KEY: &str = "overlay.allow_override";

/// Read-only view of a key/value settings store
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Read a boolean setting, defaulting to false when absent or unparsable
pub fn flag(store: &dyn SettingsStore, key: &str) -> bool {
    flag_or(store, key, false)
}

/// Read a boolean setting, falling back to `default` only when the key is absent
///
/// A present but unparsable value still reads as false.
pub fn flag_or(store: &dyn SettingsStore, key: &str, default: bool) -> bool {
    match store.get(key) {
        Some(value) => parse_bool(&value).unwrap_or(false),
        None => default,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// In-memory settings that may be changed while the overlay is serving
#[derive(Debug, Default)]
pub struct MapSettings {
    values: RwLock<HashMap<String, String>>,
}

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.write().remove(key)
    }

    /// Convenience for the override flag
    pub fn set_allow_override(&self, allow: bool) {
        self.set(ALLOW_OVERRIDE_KEY, allow.to_string());
    }
}

impl SettingsStore for MapSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_defaults_to_false() {
        let settings = MapSettings::new();
        assert!(!flag(&settings, ALLOW_OVERRIDE_KEY));
    }

    #[test]
    fn test_flag_parsing() {
        let settings = MapSettings::new();

        for (raw, expected) in [
            ("true", true),
            ("True", true),
            (" TRUE ", true),
            ("false", false),
            ("yes", false),
            ("1", false),
            ("", false),
        ] {
            settings.set(ALLOW_OVERRIDE_KEY, raw);
            assert_eq!(flag(&settings, ALLOW_OVERRIDE_KEY), expected, "value {:?}", raw);
        }
    }

    #[test]
    fn test_flag_or_uses_default_only_when_absent() {
        let settings = MapSettings::new();
        assert!(flag_or(&settings, ALLOW_OVERRIDE_KEY, true));
        assert!(!flag_or(&settings, ALLOW_OVERRIDE_KEY, false));

        settings.set_allow_override(false);
        assert!(!flag_or(&settings, ALLOW_OVERRIDE_KEY, true));

        settings.set(ALLOW_OVERRIDE_KEY, "maybe");
        assert!(!flag_or(&settings, ALLOW_OVERRIDE_KEY, true));
    }

    #[test]
    fn test_flag_changes_are_visible() {
        let settings = MapSettings::new();
        settings.set_allow_override(true);
        assert!(flag(&settings, ALLOW_OVERRIDE_KEY));

        settings.set_allow_override(false);
        assert!(!flag(&settings, ALLOW_OVERRIDE_KEY));

        settings.set_allow_override(true);
        settings.remove(ALLOW_OVERRIDE_KEY);
        assert!(!flag(&settings, ALLOW_OVERRIDE_KEY));
    }
}
