//! Resource name to virtual path mapping
//!
//! Embedded resources are named with dotted identifiers: the declaring
//! namespace, then every directory of the original file, then the file name
//! itself. `Demo.Config.MyFile.config` declared under `Demo` becomes
//! `~/Config/MyFile.config`.
//!
//! Only the final period is treated as the extension separator, so a file
//! named `My.Custom.config` comes back as `~/My/Custom.config`. Names with
//! several extension-like segments cannot be recovered from the dotted form.

use crate::error::{Error, Result};

/// Separator between the components of a resource identifier
pub const IDENTIFIER_DELIMITER: char = '.';

/// Marker for the application root in virtual paths
pub const APP_ROOT_MARKER: &str = "~/";

/// Check that a dotted identifier has no empty components
pub(crate) fn validate_identifier(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::MalformedIdentifier(format!("{} is empty", kind)));
    }

    if value.starts_with(IDENTIFIER_DELIMITER) || value.ends_with(IDENTIFIER_DELIMITER) {
        return Err(Error::MalformedIdentifier(format!(
            "{} '{}' starts or ends with '{}'",
            kind, value, IDENTIFIER_DELIMITER
        )));
    }

    if value.contains("..") {
        return Err(Error::MalformedIdentifier(format!(
            "{} '{}' contains an empty component",
            kind, value
        )));
    }

    Ok(())
}

/// Map a resource identifier declared under `base_namespace` to its virtual path
pub fn map_resource(base_namespace: &str, resource_id: &str) -> Result<String> {
    validate_identifier("namespace", base_namespace)?;
    validate_identifier("resource identifier", resource_id)?;

    let remainder = resource_id
        .strip_prefix(base_namespace)
        .and_then(|rest| rest.strip_prefix(IDENTIFIER_DELIMITER))
        .ok_or_else(|| Error::InvalidMapping {
            namespace: base_namespace.to_string(),
            resource: resource_id.to_string(),
        })?;

    let (stem, extension) = match remainder.rfind(IDENTIFIER_DELIMITER) {
        Some(idx) => remainder.split_at(idx),
        None => (remainder, ""),
    };

    let mut path = String::with_capacity(APP_ROOT_MARKER.len() + remainder.len());
    path.push_str(APP_ROOT_MARKER);
    path.push_str(&stem.replace(IDENTIFIER_DELIMITER, "/"));
    path.push_str(extension);
    Ok(path)
}

/// Build the resource identifier a file at `relative_path` gets when embedded
/// under `base_namespace`
///
/// Inverse of [`map_resource`] for paths whose directories contain no periods.
pub fn resource_id_for(base_namespace: &str, relative_path: &str) -> Result<String> {
    validate_identifier("namespace", base_namespace)?;

    let relative = relative_path
        .trim_start_matches(APP_ROOT_MARKER)
        .trim_start_matches('/');
    if relative.is_empty() {
        return Err(Error::InvalidArgument("relative path is empty".to_string()));
    }

    let mut id = String::from(base_namespace);
    for segment in relative.split(|c: char| c == '/' || c == '\\') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(Error::MalformedIdentifier(format!(
                "path '{}' has an empty or relative segment",
                relative_path
            )));
        }
        id.push(IDENTIFIER_DELIMITER);
        id.push_str(segment);
    }

    validate_identifier("resource identifier", &id)?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "Acme.Web";

    #[test]
    fn test_nested_resource_maps_to_directories() {
        let path = map_resource(NS, "Acme.Web.Config.MyFile.config").unwrap();
        assert_eq!(path, "~/Config/MyFile.config");
    }

    #[test]
    fn test_top_level_resource() {
        let path = map_resource(NS, "Acme.Web.MyPage.aspx").unwrap();
        assert_eq!(path, "~/MyPage.aspx");
    }

    #[test]
    fn test_resource_without_extension() {
        assert_eq!(map_resource(NS, "Acme.Web.LICENSE").unwrap(), "~/LICENSE");
    }

    #[test]
    fn test_multi_extension_name_is_split() {
        // Only the last period is an extension separator
        let path = map_resource(NS, "Acme.Web.My.Custom.config").unwrap();
        assert_eq!(path, "~/My/Custom.config");
    }

    #[test]
    fn test_namespace_must_be_prefix() {
        let err = map_resource("A", "B.x").unwrap_err();
        assert!(matches!(err, Error::InvalidMapping { .. }));
    }

    #[test]
    fn test_namespace_must_end_at_delimiter() {
        // "Acme.WebX" starts with "Acme.Web" but not with "Acme.Web."
        let err = map_resource(NS, "Acme.WebX.Page.aspx").unwrap_err();
        assert!(matches!(err, Error::InvalidMapping { .. }));

        let err = map_resource(NS, NS).unwrap_err();
        assert!(matches!(err, Error::InvalidMapping { .. }));
    }

    #[test]
    fn test_malformed_identifiers() {
        let cases = [
            (NS, ""),
            ("", "Acme.Web.Page.aspx"),
            (".Acme", ".Acme.Page.aspx"),
            ("Acme.", "Acme.Page.aspx"),
            (NS, "Acme.Web.Page.aspx."),
            (NS, ".Acme.Web.Page.aspx"),
            (NS, "Acme.Web..Page.aspx"),
            ("Acme..Web", "Acme..Web.Page.aspx"),
        ];

        for (ns, id) in cases {
            let err = map_resource(ns, id).unwrap_err();
            assert!(
                matches!(err, Error::MalformedIdentifier(_)),
                "expected malformed identifier for ({:?}, {:?}), got {:?}",
                ns,
                id,
                err
            );
        }
    }

    #[test]
    fn test_resource_id_for_nested_file() {
        let id = resource_id_for("Demo", "Config/MyFile.config").unwrap();
        assert_eq!(id, "Demo.Config.MyFile.config");
        assert_eq!(map_resource("Demo", &id).unwrap(), "~/Config/MyFile.config");
    }

    #[test]
    fn test_resource_id_for_accepts_rooted_paths() {
        assert_eq!(resource_id_for("Demo", "~/Page1.aspx").unwrap(), "Demo.Page1.aspx");
        assert_eq!(resource_id_for("Demo", "/Page1.aspx").unwrap(), "Demo.Page1.aspx");
    }

    #[test]
    fn test_resource_id_for_rejects_relative_segments() {
        assert!(resource_id_for("Demo", "../secret.txt").is_err());
        assert!(resource_id_for("Demo", "a//b.txt").is_err());
        assert!(matches!(
            resource_id_for("Demo", "").unwrap_err(),
            Error::InvalidArgument(_)
        ));
    }
}
