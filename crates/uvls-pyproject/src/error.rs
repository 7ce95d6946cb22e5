//! Errors specific to pyproject.toml editing and PyPI access.
//!
//! Scanning never fails, so nothing here describes malformed dependency
//! lines: those are skipped silently.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PypiError {
    /// The manifest is not valid TOML (only raised when rewriting it)
    #[error("Failed to parse pyproject.toml: {source}")]
    TomlParseError {
        #[source]
        source: toml_edit::TomlError,
    },

    /// Package not found on PyPI
    #[error("Package '{package}' not found on PyPI")]
    PackageNotFound { package: String },

    /// PyPI request failed
    #[error("PyPI request failed for '{package}': {source}")]
    RegistryError {
        package: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to deserialize a PyPI API response
    #[error("Failed to parse PyPI API response for '{package}': {source}")]
    ApiResponseError {
        package: String,
        #[source]
        source: serde_json::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pyproject operations.
pub type Result<T> = std::result::Result<T, PypiError>;

impl PypiError {
    /// Create a registry error from any error type.
    pub fn registry_error(
        package: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::RegistryError {
            package: package.into(),
            source: Box::new(error),
        }
    }

    /// Create an API response error.
    pub fn api_response_error(package: impl Into<String>, error: serde_json::Error) -> Self {
        Self::ApiResponseError {
            package: package.into(),
            source: error,
        }
    }
}

/// Convert to uvls_core::UvlsError at the server boundary
impl From<PypiError> for uvls_core::UvlsError {
    fn from(err: PypiError) -> Self {
        match err {
            PypiError::TomlParseError { source } => uvls_core::UvlsError::ParseError {
                file_type: "pyproject.toml".into(),
                source: Box::new(source),
            },
            PypiError::Io(e) => uvls_core::UvlsError::Io(e),
            PypiError::ApiResponseError { source, .. } => uvls_core::UvlsError::Json(source),
            other => uvls_core::UvlsError::CacheError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_not_found_display() {
        let err = PypiError::PackageNotFound {
            package: "nonexistent".into(),
        };
        assert_eq!(err.to_string(), "Package 'nonexistent' not found on PyPI");
    }

    #[test]
    fn test_toml_error_converts_to_parse_error() {
        let toml_err = "invalid = [".parse::<toml_edit::DocumentMut>().unwrap_err();
        let err: uvls_core::UvlsError = PypiError::TomlParseError { source: toml_err }.into();
        assert!(err.to_string().contains("failed to parse pyproject.toml"));
    }

    #[test]
    fn test_registry_error_converts_with_message() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err: uvls_core::UvlsError = PypiError::registry_error("flask", io).into();
        assert!(err.to_string().contains("flask"));
        assert!(err.to_string().contains("timed out"));
    }
}
