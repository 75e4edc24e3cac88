//! Virtual path normalization
//!
//! Every query is keyed by the canonical application-relative form
//! (`~/dir/file.ext`). Paths under the application root are rewritten into
//! that form; absolute paths outside it are kept absolute and can only be
//! served by the base provider.

use crate::error::{Error, Result};

use super::mapper::APP_ROOT_MARKER;

/// Default application root
pub const DEFAULT_APP_ROOT: &str = "/";

/// Normalize a caller-supplied path against the application root
pub fn normalize(input: &str, app_root: &str) -> Result<String> {
    if input.is_empty() {
        return Err(Error::InvalidArgument("virtual path is empty".to_string()));
    }

    let path = input.replace('\\', "/");

    let (app_relative, rest) = if path == "~" {
        (true, "")
    } else if let Some(rest) = path.strip_prefix(APP_ROOT_MARKER) {
        (true, rest)
    } else if path.starts_with('/') {
        match strip_app_root(&path, app_root) {
            Some(rest) => (true, rest),
            None => (false, path.as_str()),
        }
    } else if path.starts_with('~') {
        return Err(Error::InvalidArgument(format!(
            "'{}' is not an application-relative path",
            input
        )));
    } else {
        (true, path.as_str())
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(Error::InvalidArgument(format!(
                        "'{}' climbs above the root",
                        input
                    )));
                }
            }
            s => segments.push(s),
        }
    }

    let prefix = if app_relative { APP_ROOT_MARKER } else { "/" };
    Ok(format!("{}{}", prefix, segments.join("/")))
}

/// Strip the application root from an absolute path, case-insensitively
fn strip_app_root<'a>(path: &'a str, app_root: &str) -> Option<&'a str> {
    let root = app_root.trim_end_matches('/');
    if root.is_empty() {
        return Some(path);
    }

    let head = path.get(..root.len())?;
    if fold_case(head) != fold_case(root) {
        return None;
    }

    let rest = &path[root.len()..];
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        // "/application" is not under "/app"
        None
    }
}

/// Fold a string for ordinal case-insensitive comparison
///
/// Each char maps to its simple uppercase form. Chars whose uppercase
/// expands to several chars (`ß`) are kept as they are, so distinct
/// spellings such as the Kelvin sign and `k` stay distinct. The mapping
/// does not depend on the process locale.
fn fold_case(s: &str) -> String {
    s.chars()
        .map(|c| {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) => u,
                _ => c,
            }
        })
        .collect()
}

/// Case-insensitive lookup key for a normalized virtual path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathKey(String);

impl PathKey {
    pub fn new(normalized: &str) -> Self {
        PathKey(fold_case(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PathKey {
    fn from(s: &str) -> Self {
        PathKey::new(s)
    }
}
