//! Format-preserving edits to pyproject.toml.

use crate::error::{PypiError, Result};
use toml_edit::DocumentMut;

/// Removes `name` from the top-level `[dependencies]` table.
///
/// Returns the rewritten manifest, or `None` when there is no such table or
/// the package is not in it. Comments and formatting of the remaining entries
/// are preserved.
///
/// # Errors
///
/// Returns [`PypiError::TomlParseError`] if the manifest is not valid TOML.
///
/// # Examples
///
/// ```
/// use uvls_pyproject::remove_dependency;
///
/// let manifest = "[dependencies]\nrequests = \"2.31.0\"\nflask = \"3.0\"\n";
/// let updated = remove_dependency(manifest, "flask").unwrap().unwrap();
/// assert!(!updated.contains("flask"));
/// assert!(updated.contains("requests = \"2.31.0\""));
///
/// assert!(remove_dependency(manifest, "django").unwrap().is_none());
/// ```
pub fn remove_dependency(manifest: &str, name: &str) -> Result<Option<String>> {
    let mut doc: DocumentMut = manifest
        .parse()
        .map_err(|source| PypiError::TomlParseError { source })?;

    let Some(table) = doc
        .get_mut("dependencies")
        .and_then(|item| item.as_table_like_mut())
    else {
        return Ok(None);
    };

    if table.remove(name).is_none() {
        return Ok(None);
    }

    tracing::info!("removed '{}' from [dependencies]", name);
    Ok(Some(doc.to_string()))
}
