//! PyPI registry client.
//!
//! Uses the package metadata API (<https://pypi.org/pypi/{package}/json>) for
//! package search and version lookups. Responses go through the shared
//! [`HttpCache`], so repeated lookups are served from memory or revalidated
//! with ETag/Last-Modified headers.

use crate::error::{PypiError, Result};
use crate::links::package_page_url;
use crate::types::{PypiPackage, PypiVersion};
use pep440_rs::Version;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use uvls_core::HttpCache;

const PYPI_BASE: &str = "https://pypi.org/pypi";

/// Base URL for package pages on pypi.org
pub const PYPI_PROJECT_URL: &str = "https://pypi.org/project/";

/// Normalize package name according to PEP 503.
///
/// # Examples
///
/// ```
/// # use uvls_pyproject::registry::normalize_package_name;
/// assert_eq!(normalize_package_name("Flask"), "flask");
/// assert_eq!(normalize_package_name("django_rest_framework"), "django-rest-framework");
/// assert_eq!(normalize_package_name("my__package"), "my-package");
/// ```
pub fn normalize_package_name(name: &str) -> String {
    name.to_lowercase()
        .replace(&['_', '.'][..], "-")
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// JSON API URL for a package. The name is normalized and URL-encoded.
fn metadata_url(name: &str) -> String {
    let normalized = normalize_package_name(name);
    format!("{}/{}/json", PYPI_BASE, urlencoding::encode(&normalized))
}

/// Client for the PyPI JSON API.
///
/// # Examples
///
/// ```no_run
/// # use uvls_pyproject::PypiRegistry;
/// # use uvls_core::HttpCache;
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() {
/// let registry = PypiRegistry::new(Arc::new(HttpCache::new()));
///
/// let package = registry.get_package_info("requests").await.unwrap();
/// println!("{} {}", package.name, package.latest_version);
/// # }
/// ```
#[derive(Clone)]
pub struct PypiRegistry {
    cache: Arc<HttpCache>,
}

impl PypiRegistry {
    pub fn new(cache: Arc<HttpCache>) -> Self {
        Self { cache }
    }

    /// Looks up a package by exact name and returns its latest release summary.
    ///
    /// # Errors
    ///
    /// Returns [`PypiError::PackageNotFound`] if PyPI has no such package, or
    /// a registry/response error if the request or JSON parsing fails.
    pub async fn get_package_info(&self, name: &str) -> Result<PypiPackage> {
        let data = self.fetch(name).await?;
        parse_package_info(name, &data)
    }

    /// Fetches all versions for a package, sorted newest-first.
    ///
    /// Yanked versions are included and flagged; versions that are not valid
    /// PEP 440 are dropped.
    ///
    /// # Errors
    ///
    /// Same as [`get_package_info`](Self::get_package_info).
    pub async fn get_versions(&self, name: &str) -> Result<Vec<PypiVersion>> {
        let data = self.fetch(name).await?;
        parse_package_metadata(name, &data)
    }

    async fn fetch(&self, name: &str) -> Result<Arc<Vec<u8>>> {
        let url = metadata_url(name);
        tracing::debug!("fetching PyPI metadata: {}", url);

        self.cache.get_cached(&url).await.map_err(|e| {
            if e.to_string().contains("404") {
                PypiError::PackageNotFound {
                    package: name.to_string(),
                }
            } else {
                PypiError::registry_error(name, e)
            }
        })
    }
}

// JSON response types

#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
    #[serde(default)]
    releases: HashMap<String, Vec<PypiRelease>>,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    name: String,
    summary: Option<String>,
    version: String,
}

#[derive(Debug, Deserialize)]
struct PypiRelease {
    yanked: Option<bool>,
}

fn parse_response(package_name: &str, data: &[u8]) -> Result<PypiResponse> {
    serde_json::from_slice(data).map_err(|e| PypiError::api_response_error(package_name, e))
}

/// Parse the release list from a PyPI JSON response.
fn parse_package_metadata(package_name: &str, data: &[u8]) -> Result<Vec<PypiVersion>> {
    let response = parse_response(package_name, data)?;

    let mut versions: Vec<(PypiVersion, Version)> = response
        .releases
        .into_iter()
        .filter_map(|(version_str, files)| {
            // A release with no files is not installable; treat it as yanked.
            let yanked = files.is_empty() || files.iter().all(|f| f.yanked.unwrap_or(false));
            Version::from_str(&version_str).ok().map(|parsed| {
                (
                    PypiVersion {
                        version: version_str,
                        yanked,
                    },
                    parsed,
                )
            })
        })
        .collect();

    versions.sort_by(|a, b| b.1.cmp(&a.1));

    Ok(versions.into_iter().map(|(v, _)| v).collect())
}

/// Parse the `info` block of a PyPI JSON response.
fn parse_package_info(package_name: &str, data: &[u8]) -> Result<PypiPackage> {
    let response = parse_response(package_name, data)?;
    let url = package_page_url(PYPI_PROJECT_URL, &response.info.name);

    Ok(PypiPackage {
        name: response.info.name,
        summary: response.info.summary.filter(|s| !s.is_empty()),
        latest_version: response.info.version,
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_url() {
        assert_eq!(
            metadata_url("Requests"),
            "https://pypi.org/pypi/requests/json"
        );
        assert_eq!(
            metadata_url("typing_extensions"),
            "https://pypi.org/pypi/typing-extensions/json"
        );
        assert_eq!(
            metadata_url("a/../b"),
            "https://pypi.org/pypi/a%2F-%2Fb/json"
        );
    }

    #[test]
    fn test_parse_package_metadata() {
        let json = r#"{
            "info": {
                "name": "requests",
                "summary": "Python HTTP for Humans.",
                "version": "2.28.2"
            },
            "releases": {
                "2.28.2": [{"yanked": false}],
                "2.28.1": [{"yanked": false}],
                "2.28.0": [{"yanked": true}],
                "2.27.0": [{"yanked": false}],
                "not-a-version": [{"yanked": false}]
            }
        }"#;

        let versions = parse_package_metadata("requests", json.as_bytes()).unwrap();

        assert_eq!(versions.len(), 4);
        assert_eq!(versions[0].version, "2.28.2");
        assert!(!versions[0].yanked);
        assert!(versions[2].yanked);
        assert_eq!(versions[3].version, "2.27.0");
    }

    #[test]
    fn test_partially_yanked_release_is_available() {
        let json = r#"{
            "info": {"name": "x", "summary": null, "version": "1.0"},
            "releases": {
                "1.0": [{"yanked": true}, {"yanked": false}],
                "0.9": []
            }
        }"#;

        let versions = parse_package_metadata("x", json.as_bytes()).unwrap();
        assert!(!versions[0].yanked);
        assert!(versions[1].yanked);
    }

    #[test]
    fn test_release_without_files_is_yanked() {
        let json = r#"{
            "info": {"name": "x", "summary": null, "version": "2.0"},
            "releases": {"2.0": [], "1.0": [{}]}
        }"#;

        let versions = parse_package_metadata("x", json.as_bytes()).unwrap();
        assert_eq!(versions[0].version, "2.0");
        assert!(versions[0].yanked);
        assert!(!versions[1].yanked);
    }

    #[test]
    fn test_parse_package_info() {
        let json = r#"{
            "info": {
                "name": "Flask",
                "summary": "A simple framework for building complex web applications.",
                "version": "3.0.3"
            },
            "releases": {}
        }"#;

        let pkg = parse_package_info("flask", json.as_bytes()).unwrap();

        assert_eq!(pkg.name, "Flask");
        assert_eq!(
            pkg.summary.as_deref(),
            Some("A simple framework for building complex web applications.")
        );
        assert_eq!(pkg.latest_version, "3.0.3");
        assert_eq!(pkg.url, "https://pypi.org/project/Flask/");
    }

    #[test]
    fn test_parse_package_info_empty_summary() {
        let json = r#"{"info": {"name": "x", "summary": "", "version": "0.1"}}"#;
        let pkg = parse_package_info("x", json.as_bytes()).unwrap();
        assert_eq!(pkg.summary, None);
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_package_info("broken", b"<html>");
        assert!(matches!(
            result,
            Err(PypiError::ApiResponseError { ref package, .. }) if package == "broken"
        ));
    }

    #[test]
    fn test_prerelease_detection() {
        let json = r#"{
            "info": {"name": "test", "version": "1.0.0"},
            "releases": {
                "1.0.0": [{"yanked": false}],
                "1.0.0a1": [{"yanked": false}],
                "1.0.0b2": [{"yanked": false}],
                "1.0.0rc1": [{"yanked": false}]
            }
        }"#;

        let versions = parse_package_metadata("test", json.as_bytes()).unwrap();
        let prerelease = versions.iter().filter(|v| v.is_prerelease()).count();

        assert_eq!(versions[0].version, "1.0.0");
        assert_eq!(prerelease, 3);
    }
}
