use serde::Serialize;
use uvls_core::SourceSpan;

/// Syntax a dependency was declared with.
///
/// - `TableEntry`: `requests = "2.31.0"` inside a `[dependencies]`-style table
/// - `ArrayEntry`: `"numpy>=1.20"` inside a `dependencies = [ ... ]` block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyntaxForm {
    TableEntry,
    ArrayEntry,
}

/// One parsed occurrence of a package reference.
///
/// `source_span` points at the name token only, so re-slicing the source
/// text at the span always yields `name`.
///
/// # Examples
///
/// ```
/// use uvls_pyproject::types::{DependencyDeclaration, SyntaxForm};
/// use uvls_core::SourceSpan;
///
/// let text = "[dependencies]\nrequests = \"2.31.0\"\n";
/// let dep = DependencyDeclaration {
///     name: "requests".into(),
///     version_constraint: Some("2.31.0".into()),
///     source_span: SourceSpan::new(1, 0, 8),
///     syntax_form: SyntaxForm::TableEntry,
/// };
///
/// assert_eq!(dep.source_span.slice(text), Some(dep.name.as_str()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyDeclaration {
    /// Package name, `[A-Za-z0-9_-]+`
    pub name: String,
    /// Raw text following the name (comparator and version), not validated
    pub version_constraint: Option<String>,
    /// Location of the name token
    pub source_span: SourceSpan,
    pub syntax_form: SyntaxForm,
}

/// A position-anchored link from a dependency name to its registry page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyLink {
    pub name: String,
    pub source_span: SourceSpan,
    pub target: String,
}

/// A declared dependency that the lock file does not mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingDependency {
    pub name: String,
    pub source_span: SourceSpan,
    pub message: String,
}

/// Version information for a package from PyPI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PypiVersion {
    /// Version string (PEP 440 compliant)
    pub version: String,
    /// Whether every file of this release has been yanked
    pub yanked: bool,
}

impl PypiVersion {
    /// Check if this version is a prerelease (alpha, beta, rc).
    ///
    /// # Examples
    ///
    /// ```
    /// use uvls_pyproject::types::PypiVersion;
    ///
    /// let stable = PypiVersion { version: "1.0.0".into(), yanked: false };
    /// let rc = PypiVersion { version: "1.0.0rc1".into(), yanked: false };
    ///
    /// assert!(!stable.is_prerelease());
    /// assert!(rc.is_prerelease());
    /// ```
    pub fn is_prerelease(&self) -> bool {
        use pep440_rs::Version;
        use std::str::FromStr;

        Version::from_str(&self.version)
            .map(|v| v.is_pre())
            .unwrap_or(false)
    }
}

/// Package summary from the PyPI JSON API, shown when searching for a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PypiPackage {
    /// Package name (canonical form as reported by PyPI)
    pub name: String,
    pub summary: Option<String>,
    pub latest_version: String,
    /// Link to the package page on pypi.org
    pub url: String,
}
