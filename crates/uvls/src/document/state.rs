use crate::config::{CacheConfig, UvlsConfig};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tower_lsp_server::ls_types::Uri;
use uvls_core::{HttpCache, LockFileCache};
use uvls_pyproject::{LOCK_FILE_NAME, PypiRegistry, UvLockProvider};

/// File types the server understands.
///
/// # Examples
///
/// ```
/// use uvls::document::DocumentKind;
///
/// assert_eq!(DocumentKind::from_filename("pyproject.toml"), Some(DocumentKind::Manifest));
/// assert_eq!(DocumentKind::from_filename("uv.lock"), Some(DocumentKind::LockFile));
/// assert_eq!(DocumentKind::from_filename("requirements.txt"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// pyproject.toml
    Manifest,
    /// uv.lock
    LockFile,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Option<Self> {
        match filename {
            "pyproject.toml" => Some(Self::Manifest),
            LOCK_FILE_NAME => Some(Self::LockFile),
            _ => None,
        }
    }

    /// Detects the kind from the last path segment of a URI.
    pub fn from_uri(uri: &Uri) -> Option<Self> {
        let path = uri.path();
        let filename = path.as_str().split('/').next_back()?;
        Self::from_filename(filename)
    }
}

/// State for a single open document.
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub kind: DocumentKind,
    /// Full text as last sent by the client (or read from disk)
    pub content: String,
    /// When the content was last replaced
    pub updated_at: Instant,
}

impl DocumentState {
    pub fn new(kind: DocumentKind, content: String) -> Self {
        Self {
            kind,
            content,
            updated_at: Instant::now(),
        }
    }
}

/// Rate limiter for loading documents from disk.
///
/// # Examples
///
/// ```
/// use uvls::document::ColdStartLimiter;
/// use std::time::Duration;
/// use tower_lsp_server::ls_types::Uri;
///
/// let limiter = ColdStartLimiter::new(Duration::from_secs(60));
/// let uri = Uri::from_file_path("/project/pyproject.toml").unwrap();
///
/// assert!(limiter.allow_cold_start(&uri));
/// assert!(!limiter.allow_cold_start(&uri));
/// ```
#[derive(Debug)]
pub struct ColdStartLimiter {
    last_attempts: DashMap<Uri, Instant>,
    min_interval_ms: AtomicU64,
}

impl ColdStartLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_attempts: DashMap::new(),
            min_interval_ms: AtomicU64::new(min_interval.as_millis() as u64),
        }
    }

    pub fn set_min_interval(&self, min_interval: Duration) {
        self.min_interval_ms
            .store(min_interval.as_millis() as u64, Ordering::Relaxed);
    }

    fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms.load(Ordering::Relaxed))
    }

    /// Returns true if a load is allowed now, recording the attempt.
    pub fn allow_cold_start(&self, uri: &Uri) -> bool {
        let now = Instant::now();

        if let Some(mut last) = self.last_attempts.get_mut(uri) {
            if now.duration_since(*last) < self.min_interval() {
                tracing::warn!("cold start rate limited for {:?}", uri);
                return false;
            }
            *last = now;
        } else {
            self.last_attempts.insert(uri.clone(), now);
        }

        true
    }

    /// Drops attempts older than `max_age`.
    pub fn cleanup_old_entries(&self, max_age: Duration) {
        let now = Instant::now();
        self.last_attempts
            .retain(|_, instant| now.duration_since(*instant) < max_age);
    }

    #[cfg(test)]
    pub fn tracked_count(&self) -> usize {
        self.last_attempts.len()
    }
}

/// Global server state shared by all handlers.
pub struct ServerState {
    /// Open documents by URI
    pub documents: DashMap<Uri, DocumentState>,
    /// Lock files read so far, keyed by path
    pub lockfile_cache: Arc<LockFileCache>,
    pub lock_provider: UvLockProvider,
    pub cold_start_limiter: ColdStartLimiter,
    registry: RwLock<PypiRegistry>,
}

impl ServerState {
    pub fn new() -> Self {
        Self::with_cold_start_interval(Duration::from_millis(100))
    }

    pub fn with_cold_start_interval(interval: Duration) -> Self {
        Self {
            documents: DashMap::new(),
            lockfile_cache: Arc::new(LockFileCache::new()),
            lock_provider: UvLockProvider,
            cold_start_limiter: ColdStartLimiter::new(interval),
            registry: RwLock::new(PypiRegistry::new(Arc::new(HttpCache::new()))),
        }
    }

    /// Applies the client's initialization options.
    pub async fn configure(&self, config: &UvlsConfig) {
        self.cold_start_limiter
            .set_min_interval(Duration::from_millis(config.cold_start.rate_limit_ms));
        self.configure_cache(&config.cache).await;
    }

    /// Replaces the PyPI client with one whose cache follows `config`.
    ///
    /// Previously cached responses are dropped.
    pub async fn configure_cache(&self, config: &CacheConfig) {
        let cache = HttpCache::with_settings(config.enabled, config.refresh_interval());
        *self.registry.write().await = PypiRegistry::new(Arc::new(cache));
        tracing::debug!(
            "registry cache: enabled={}, refresh={}s",
            config.enabled,
            config.refresh_interval_secs
        );
    }

    /// Returns a handle to the PyPI client; the lock is released immediately.
    pub async fn registry(&self) -> PypiRegistry {
        self.registry.read().await.clone()
    }

    pub fn get_document(
        &self,
        uri: &Uri,
    ) -> Option<dashmap::mapref::one::Ref<'_, Uri, DocumentState>> {
        self.documents.get(uri)
    }

    /// Clones the document and releases the map lock, for use across awaits.
    pub fn get_document_clone(&self, uri: &Uri) -> Option<DocumentState> {
        self.documents.get(uri).map(|doc| doc.clone())
    }

    pub fn update_document(&self, uri: Uri, state: DocumentState) {
        self.documents.insert(uri, state);
    }

    pub fn remove_document(&self, uri: &Uri) -> Option<(Uri, DocumentState)> {
        self.documents.remove(uri)
    }

    /// URIs of open manifests, in no particular order.
    pub fn open_manifests(&self) -> Vec<Uri> {
        self.documents
            .iter()
            .filter(|entry| entry.value().kind == DocumentKind::Manifest)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
