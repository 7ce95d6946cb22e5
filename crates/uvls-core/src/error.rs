use thiserror::Error;

/// Core error types for uvls.
///
/// Scanning manifest text never fails; these errors come from the edges of the
/// system: file access, registry requests, TOML rewriting and running `uv`.
///
/// # Examples
///
/// ```
/// use uvls_core::error::{UvlsError, Result};
///
/// fn require_name(name: &str) -> Result<&str> {
///     if name.is_empty() {
///         return Err(UvlsError::InvalidCommand("package name is required".into()));
///     }
///     Ok(name)
/// }
///
/// assert!(require_name("").is_err());
/// ```
#[derive(Error, Debug)]
pub enum UvlsError {
    #[error("failed to parse {file_type}: {source}")]
    ParseError {
        file_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("registry request failed for {package}: {source}")]
    RegistryError {
        package: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("invalid URI: {0}")]
    InvalidUri(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The external packaging tool exited unsuccessfully. `stderr` is kept verbatim.
    #[error("{stderr}")]
    CommandFailed { command: String, stderr: String },
}

/// Convenience type alias for `Result<T, UvlsError>`.
pub type Result<T> = std::result::Result<T, UvlsError>;
