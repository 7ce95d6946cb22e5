//! Missing-dependency check against uv.lock.

use crate::extractor::extract_dependencies;
use crate::types::{DependencyDeclaration, MissingDependency};
use serde::{Deserialize, Serialize};
use uvls_core::LockEntrySet;

/// File name of the lock file that sits next to pyproject.toml.
pub const LOCK_FILE_NAME: &str = "uv.lock";

/// How a declared name is looked up in the lock text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMatch {
    /// The name occurs anywhere in the lock text
    #[default]
    Substring,
    /// The name occurs with no adjacent name characters
    Token,
}

impl LockMatch {
    fn is_present(self, lock: &LockEntrySet, name: &str) -> bool {
        match self {
            Self::Substring => lock.contains(name),
            Self::Token => lock.contains_token(name),
        }
    }
}

/// Reports each declaration whose name is not present in the lock text.
///
/// Every declaration is checked independently: a name declared twice and
/// missing from the lock yields two results, each anchored at its own span.
///
/// # Examples
///
/// ```
/// use uvls_core::LockEntrySet;
/// use uvls_pyproject::diagnostics::{find_missing_dependencies, LockMatch};
/// use uvls_pyproject::extract_dependencies;
///
/// let deps = extract_dependencies("[dependencies]\nrequests = \"2.31.0\"\n");
/// let lock = LockEntrySet::new("name = \"flask\"");
///
/// let missing = find_missing_dependencies(&deps, &lock, LockMatch::Substring);
/// assert_eq!(missing.len(), 1);
/// assert_eq!(missing[0].message, "Dependency \"requests\" missing from uv.lock");
/// ```
pub fn find_missing_dependencies(
    declarations: &[DependencyDeclaration],
    lock: &LockEntrySet,
    mode: LockMatch,
) -> Vec<MissingDependency> {
    declarations
        .iter()
        .filter(|dep| !mode.is_present(lock, &dep.name))
        .map(|dep| MissingDependency {
            name: dep.name.clone(),
            source_span: dep.source_span,
            message: missing_message(&dep.name),
        })
        .collect()
}

/// Extracts the manifest's `[dependencies]` tables and checks them against the lock.
pub fn check_manifest(
    manifest: &str,
    lock: &LockEntrySet,
    mode: LockMatch,
) -> Vec<MissingDependency> {
    let missing = find_missing_dependencies(&extract_dependencies(manifest), lock, mode);
    tracing::debug!("{} dependencies missing from {}", missing.len(), LOCK_FILE_NAME);
    missing
}

fn missing_message(name: &str) -> String {
    format!("Dependency \"{name}\" missing from {LOCK_FILE_NAME}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uvls_core::SourceSpan;

    #[test]
    fn test_reports_only_missing() {
        let manifest = "[dependencies]\nrequests = \"2.31.0\"\nflask = \"3.0\"\n";
        let lock = LockEntrySet::new("[[package]]\nname = \"flask\"\n");

        let missing = check_manifest(manifest, &lock, LockMatch::Substring);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "requests");
        assert_eq!(missing[0].source_span, SourceSpan::new(1, 0, 8));
        assert_eq!(
            missing[0].message,
            "Dependency \"requests\" missing from uv.lock"
        );
    }

    #[test]
    fn test_substring_match_under_reports() {
        let manifest = "[dependencies]\nflask = \"3.0\"\n";
        let lock = LockEntrySet::new("name = \"flask-cors\"\n");

        assert!(check_manifest(manifest, &lock, LockMatch::Substring).is_empty());
        assert_eq!(check_manifest(manifest, &lock, LockMatch::Token).len(), 1);
    }

    #[test]
    fn test_duplicates_reported_independently() {
        let manifest = "[dependencies]\nhttpx = \"0.27\"\nhttpx = \"0.28\"\n";
        let missing = check_manifest(manifest, &LockEntrySet::default(), LockMatch::Substring);

        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].source_span.line, 1);
        assert_eq!(missing[1].source_span.line, 2);
    }

    #[test]
    fn test_no_declarations() {
        let lock = LockEntrySet::new("name = \"flask\"");
        assert!(check_manifest("", &lock, LockMatch::Substring).is_empty());
        assert!(check_manifest("[project]\nname = \"x\"\n", &lock, LockMatch::Token).is_empty());
    }

    #[test]
    fn test_lock_match_deserialization() {
        let mode: LockMatch = serde_json::from_str("\"token\"").unwrap();
        assert_eq!(mode, LockMatch::Token);
        assert_eq!(LockMatch::default(), LockMatch::Substring);
    }
}
