//! uv.lock discovery.
//!
//! uv writes `uv.lock` next to the project's pyproject.toml; nothing is
//! searched for in parent directories.

use crate::diagnostics::LOCK_FILE_NAME;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tower_lsp_server::ls_types::Uri;
use uvls_core::{LockEntrySet, LockFileProvider};

/// Finds and reads the `uv.lock` sitting beside a manifest.
///
/// # Examples
///
/// ```no_run
/// use uvls_pyproject::UvLockProvider;
/// use uvls_core::LockFileProvider;
/// use tower_lsp_server::ls_types::Uri;
///
/// let provider = UvLockProvider;
/// let manifest: Uri = "file:///project/pyproject.toml".parse().unwrap();
///
/// if let Some(path) = provider.locate_lockfile(&manifest) {
///     println!("lock file at {}", path.display());
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UvLockProvider;

#[async_trait]
impl LockFileProvider for UvLockProvider {
    fn locate_lockfile(&self, manifest_uri: &Uri) -> Option<PathBuf> {
        let manifest_path = uvls_core::file_path(manifest_uri)?;
        let lock_path = manifest_path.with_file_name(LOCK_FILE_NAME);

        if lock_path.is_file() {
            tracing::debug!("found {}", lock_path.display());
            Some(lock_path)
        } else {
            tracing::debug!("no {} next to {}", LOCK_FILE_NAME, manifest_path.display());
            None
        }
    }

    async fn read_lockfile(&self, lockfile_path: &Path) -> uvls_core::Result<LockEntrySet> {
        let text = tokio::fs::read_to_string(lockfile_path).await?;
        Ok(LockEntrySet::new(text))
    }
}
