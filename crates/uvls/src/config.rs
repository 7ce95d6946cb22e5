use serde::Deserialize;
use std::time::Duration;
use tower_lsp_server::ls_types::DiagnosticSeverity;
use uvls_pyproject::{LockMatch, PYPI_PROJECT_URL};

/// Root configuration for the uvls server.
///
/// Provided by the client as `initializationOptions`. Every field falls back
/// to a default when omitted.
///
/// # Examples
///
/// ```
/// use uvls::config::UvlsConfig;
///
/// let json = r#"{
///     "diagnostics": { "lock_match": "token" },
///     "uv": { "executable": "/opt/uv/bin/uv" }
/// }"#;
///
/// let config: UvlsConfig = serde_json::from_str(json).unwrap();
/// assert!(config.links.enabled);
/// assert_eq!(config.uv.executable, "/opt/uv/bin/uv");
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UvlsConfig {
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub cold_start: ColdStartConfig,
    #[serde(default)]
    pub uv: UvConfig,
}

/// Document links from dependency names to their registry pages.
///
/// # Defaults
///
/// - `enabled`: `true`
/// - `registry_url`: `"https://pypi.org/project/"`
#[derive(Debug, Clone, Deserialize)]
pub struct LinksConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_registry_url")]
    pub registry_url: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            registry_url: default_registry_url(),
        }
    }
}

/// Missing-dependency diagnostics.
///
/// # Defaults
///
/// - `enabled`: `true`
/// - `missing_severity`: `WARNING`
/// - `lock_match`: `substring`
///
/// # Examples
///
/// ```
/// use uvls::config::DiagnosticsConfig;
/// use uvls_pyproject::LockMatch;
/// use tower_lsp_server::ls_types::DiagnosticSeverity;
///
/// let config = DiagnosticsConfig {
///     enabled: true,
///     missing_severity: DiagnosticSeverity::ERROR,
///     lock_match: LockMatch::Token,
/// };
///
/// assert_eq!(config.missing_severity, DiagnosticSeverity::ERROR);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_missing_severity")]
    pub missing_severity: DiagnosticSeverity,
    #[serde(default)]
    pub lock_match: LockMatch,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            missing_severity: default_missing_severity(),
            lock_match: LockMatch::default(),
        }
    }
}

/// HTTP caching of PyPI responses.
///
/// # Defaults
///
/// - `enabled`: `true`
/// - `refresh_interval_secs`: `300` (5 minutes)
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl CacheConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            enabled: true,
        }
    }
}

/// Loading documents from disk when a request arrives before `didOpen`.
///
/// # Defaults
///
/// - `enabled`: `true`
/// - `rate_limit_ms`: `100` (10 loads/sec per URI)
#[derive(Debug, Clone, Deserialize)]
pub struct ColdStartConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
}

impl Default for ColdStartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate_limit_ms: default_rate_limit_ms(),
        }
    }
}

/// Location of the `uv` and `uvx` executables.
///
/// # Defaults
///
/// - `executable`: `"uv"` (looked up on `PATH`)
/// - `uvx_executable`: `"uvx"`
#[derive(Debug, Clone, Deserialize)]
pub struct UvConfig {
    #[serde(default = "default_uv")]
    pub executable: String,
    #[serde(default = "default_uvx")]
    pub uvx_executable: String,
}

impl Default for UvConfig {
    fn default() -> Self {
        Self {
            executable: default_uv(),
            uvx_executable: default_uvx(),
        }
    }
}

// Default value functions
const fn default_true() -> bool {
    true
}

fn default_registry_url() -> String {
    PYPI_PROJECT_URL.to_string()
}

const fn default_missing_severity() -> DiagnosticSeverity {
    DiagnosticSeverity::WARNING
}

const fn default_refresh_interval() -> u64 {
    300 // 5 minutes
}

const fn default_rate_limit_ms() -> u64 {
    100
}

fn default_uv() -> String {
    "uv".to_string()
}

fn default_uvx() -> String {
    "uvx".to_string()
}
