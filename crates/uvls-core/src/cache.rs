use crate::error::{Result, UvlsError};
use dashmap::DashMap;
use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maximum number of cached entries to prevent unbounded memory growth.
const MAX_CACHE_ENTRIES: usize = 500;

/// Default window during which a cached body is served without revalidation.
const DEFAULT_FRESHNESS: Duration = Duration::from_secs(300);

/// Rejects any URL that is not HTTPS.
///
/// In test mode, HTTP URLs are allowed for mockito compatibility.
#[inline]
fn ensure_https(url: &str) -> Result<()> {
    #[cfg(not(test))]
    if !url.starts_with("https://") {
        return Err(UvlsError::CacheError(format!(
            "URL must use HTTPS: {}",
            url
        )));
    }
    #[cfg(test)]
    let _ = url;
    Ok(())
}

/// Cached HTTP response with validation headers.
///
/// # Examples
///
/// ```
/// use uvls_core::cache::CachedResponse;
/// use std::sync::Arc;
/// use std::time::Instant;
///
/// let response = CachedResponse {
///     body: Arc::new(br#"{"info": {}}"#.to_vec()),
///     etag: Some("\"abc123\"".into()),
///     last_modified: None,
///     fetched_at: Instant::now(),
/// };
///
/// let cloned = response.clone();
/// assert!(Arc::ptr_eq(&response.body, &cloned.body));
/// ```
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: Arc<Vec<u8>>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub fetched_at: Instant,
}

impl CachedResponse {
    fn is_fresh(&self, freshness: Duration) -> bool {
        self.fetched_at.elapsed() < freshness
    }
}

/// HTTP cache for registry lookups.
///
/// Bodies younger than the freshness window are served straight from memory.
/// Older entries are revalidated with `If-None-Match` / `If-Modified-Since`;
/// a `304 Not Modified` keeps the cached body, and network failures fall back
/// to it as well. When disabled, every call goes to the network and nothing is
/// stored.
///
/// # Examples
///
/// ```no_run
/// use uvls_core::cache::HttpCache;
///
/// # async fn example() -> uvls_core::error::Result<()> {
/// let cache = HttpCache::new();
/// let first = cache.get_cached("https://pypi.org/pypi/requests/json").await?;
/// let second = cache.get_cached("https://pypi.org/pypi/requests/json").await?;
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// # Ok(())
/// # }
/// ```
pub struct HttpCache {
    entries: DashMap<String, CachedResponse>,
    client: Client,
    freshness: Duration,
    enabled: bool,
}

impl HttpCache {
    /// Creates an enabled cache with a five minute freshness window.
    pub fn new() -> Self {
        Self::with_settings(true, DEFAULT_FRESHNESS)
    }

    /// Creates a cache with explicit settings (from the server configuration).
    pub fn with_settings(enabled: bool, freshness: Duration) -> Self {
        let client = Client::builder()
            .user_agent(concat!("uvls/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create HTTP client");

        Self {
            entries: DashMap::new(),
            client,
            freshness,
            enabled,
        }
    }

    /// Retrieves the body at `url`, using the cache where possible.
    ///
    /// # Errors
    ///
    /// Returns `UvlsError::RegistryError` if the request fails and nothing is
    /// cached, or `UvlsError::CacheError` for non-success HTTP statuses
    /// (the message contains the status code, e.g. `HTTP 404 Not Found`).
    pub async fn get_cached(&self, url: &str) -> Result<Arc<Vec<u8>>> {
        if !self.enabled {
            return self.fetch(url).await.map(|fetched| fetched.body);
        }

        if self.entries.len() >= MAX_CACHE_ENTRIES {
            self.evict_entries();
        }

        let cached = self.entries.get(url).map(|entry| entry.value().clone());
        if let Some(cached) = cached {
            if cached.is_fresh(self.freshness) {
                tracing::trace!("cache fresh: {}", url);
                return Ok(cached.body);
            }

            return match self.conditional_request(url, &cached).await {
                Ok(Some(new_body)) => Ok(new_body),
                Ok(None) => {
                    // 304: restart the freshness window
                    self.entries.insert(
                        url.to_string(),
                        CachedResponse {
                            fetched_at: Instant::now(),
                            ..cached.clone()
                        },
                    );
                    Ok(cached.body)
                }
                Err(e) => {
                    tracing::warn!("revalidation failed, serving stale entry: {}", e);
                    Ok(cached.body)
                }
            };
        }

        self.fetch_and_store(url).await
    }

    /// Returns `Ok(None)` on `304 Not Modified`, otherwise the new body.
    async fn conditional_request(
        &self,
        url: &str,
        cached: &CachedResponse,
    ) -> Result<Option<Arc<Vec<u8>>>> {
        ensure_https(url)?;
        let mut request = self.client.get(url);

        if let Some(etag) = &cached.etag {
            request = request.header(header::IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = &cached.last_modified {
            request = request.header(header::IF_MODIFIED_SINCE, last_modified);
        }

        let response = request.send().await.map_err(|e| UvlsError::RegistryError {
            package: url.to_string(),
            source: e,
        })?;

        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(None);
        }

        let fetched = Self::read_response(url, response).await?;
        let body = Arc::clone(&fetched.body);
        self.entries.insert(url.to_string(), fetched);
        Ok(Some(body))
    }

    /// Fetches `url` from the network and stores the response.
    pub(crate) async fn fetch_and_store(&self, url: &str) -> Result<Arc<Vec<u8>>> {
        let fetched = self.fetch(url).await?;
        let body = Arc::clone(&fetched.body);
        self.entries.insert(url.to_string(), fetched);
        Ok(body)
    }

    async fn fetch(&self, url: &str) -> Result<CachedResponse> {
        ensure_https(url)?;
        tracing::debug!("fetching: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UvlsError::RegistryError {
                package: url.to_string(),
                source: e,
            })?;

        Self::read_response(url, response).await
    }

    async fn read_response(url: &str, response: reqwest::Response) -> Result<CachedResponse> {
        if !response.status().is_success() {
            return Err(UvlsError::CacheError(format!(
                "HTTP {} for {}",
                response.status(),
                url
            )));
        }

        let header_value = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        let etag = header_value(header::ETAG);
        let last_modified = header_value(header::LAST_MODIFIED);

        let body = response
            .bytes()
            .await
            .map_err(|e| UvlsError::RegistryError {
                package: url.to_string(),
                source: e,
            })?;

        Ok(CachedResponse {
            body: Arc::new(body.to_vec()),
            etag,
            last_modified,
            fetched_at: Instant::now(),
        })
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops the oldest tenth of the entries.
    fn evict_entries(&self) {
        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().fetched_at))
            .collect();
        by_age.sort_by_key(|(_, fetched_at)| *fetched_at);

        let target = MAX_CACHE_ENTRIES / 10;
        for (url, _) in by_age.iter().take(target) {
            self.entries.remove(url);
        }

        tracing::debug!("evicted {} cache entries", target.min(by_age.len()));
    }
}

impl Default for HttpCache {
    fn default() -> Self {
        Self::new()
    }
}
