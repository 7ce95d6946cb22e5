//! Lock file abstractions.
//!
//! A lock file is only ever consulted for presence checks: "does this
//! package name appear in it?". No structured parsing takes place; the
//! [`LockEntrySet`] keeps the raw text and answers membership queries against it.

use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tower_lsp_server::ls_types::Uri;

/// Returns true for characters allowed in a package name token (`A-Za-z0-9_-`).
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Package names considered present in a lock file.
///
/// # Examples
///
/// ```
/// use uvls_core::LockEntrySet;
///
/// let lock = LockEntrySet::new("[[package]]\nname = \"flask-cors\"\n");
/// assert!(lock.contains("flask"));
/// assert!(!lock.contains_token("flask"));
/// assert!(lock.contains_token("flask-cors"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockEntrySet {
    text: Arc<str>,
}

impl LockEntrySet {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }

    /// Plain substring containment anywhere in the lock text.
    pub fn contains(&self, name: &str) -> bool {
        !name.is_empty() && self.text.contains(name)
    }

    /// Containment as a whole token: the match must not be adjacent to
    /// another name character on either side.
    pub fn contains_token(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }

        self.text.match_indices(name).any(|(offset, _)| {
            let before = self.text[..offset].chars().next_back();
            let after = self.text[offset + name.len()..].chars().next();
            !before.is_some_and(is_name_char) && !after.is_some_and(is_name_char)
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Locates and reads the lock file that belongs to a manifest.
///
/// # Examples
///
/// ```no_run
/// use uvls_core::lockfile::{LockEntrySet, LockFileProvider};
/// use async_trait::async_trait;
/// use std::path::{Path, PathBuf};
/// use tower_lsp_server::ls_types::Uri;
///
/// struct SiblingLock;
///
/// #[async_trait]
/// impl LockFileProvider for SiblingLock {
///     fn locate_lockfile(&self, manifest_uri: &Uri) -> Option<PathBuf> {
///         let manifest_path = uvls_core::file_path(manifest_uri)?;
///         let lock_path = manifest_path.with_file_name("my.lock");
///         lock_path.exists().then_some(lock_path)
///     }
///
///     async fn read_lockfile(&self, lockfile_path: &Path) -> uvls_core::Result<LockEntrySet> {
///         Ok(LockEntrySet::new(tokio::fs::read_to_string(lockfile_path).await?))
///     }
/// }
/// ```
#[async_trait]
pub trait LockFileProvider: Send + Sync {
    /// Returns the lock file path for a manifest, or `None` if it does not exist.
    fn locate_lockfile(&self, manifest_uri: &Uri) -> Option<PathBuf>;

    /// Reads a lock file into a [`LockEntrySet`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not UTF-8.
    async fn read_lockfile(&self, lockfile_path: &Path) -> Result<LockEntrySet>;
}

struct CachedLockFile {
    entries: LockEntrySet,
    modified_at: SystemTime,
}

/// Cache of read lock files keyed by path, invalidated by modification time.
pub struct LockFileCache {
    entries: DashMap<PathBuf, CachedLockFile>,
}

impl LockFileCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns the cached entry set, re-reading the file if it changed on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn get_or_read(
        &self,
        provider: &dyn LockFileProvider,
        lockfile_path: &Path,
    ) -> Result<LockEntrySet> {
        let modified_at = tokio::fs::metadata(lockfile_path).await?.modified()?;

        if let Some(cached) = self.entries.get(lockfile_path)
            && modified_at <= cached.modified_at
        {
            tracing::debug!("lock file cache hit: {}", lockfile_path.display());
            return Ok(cached.entries.clone());
        }

        tracing::debug!("lock file cache miss: {}", lockfile_path.display());
        let entries = provider.read_lockfile(lockfile_path).await?;

        self.entries.insert(
            lockfile_path.to_path_buf(),
            CachedLockFile {
                entries: entries.clone(),
                modified_at,
            },
        );

        Ok(entries)
    }

    pub fn invalidate(&self, lockfile_path: &Path) {
        self.entries.remove(lockfile_path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LockFileCache {
    fn default() -> Self {
        Self::new()
    }
}
