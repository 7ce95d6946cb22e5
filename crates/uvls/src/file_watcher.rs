//! uv.lock watching.
//!
//! The server asks the client to report lock file changes so that cached lock
//! text is dropped and diagnostics are recomputed for affected manifests.

use std::path::Path;
use tower_lsp_server::Client;
use tower_lsp_server::ls_types::{
    DidChangeWatchedFilesRegistrationOptions, FileSystemWatcher, GlobPattern, Registration,
    WatchKind,
};
use uvls_pyproject::LOCK_FILE_NAME;

/// Glob matching every uv.lock in the workspace.
pub const LOCK_FILE_PATTERN: &str = "**/uv.lock";

/// Registers a file system watcher for [`LOCK_FILE_PATTERN`].
///
/// # Errors
///
/// Returns an error if the client doesn't support dynamic registration
/// or if the registration request fails.
pub async fn register_lock_file_watcher(client: &Client) -> Result<(), String> {
    let options = DidChangeWatchedFilesRegistrationOptions {
        watchers: vec![FileSystemWatcher {
            glob_pattern: GlobPattern::String(LOCK_FILE_PATTERN.to_string()),
            kind: Some(WatchKind::Create | WatchKind::Change | WatchKind::Delete),
        }],
    };

    let registration = Registration {
        id: "uvls-lockfile-watcher".to_string(),
        method: "workspace/didChangeWatchedFiles".to_string(),
        register_options: Some(serde_json::to_value(options).map_err(|e| e.to_string())?),
    };

    client
        .register_capability(vec![registration])
        .await
        .map_err(|e| format!("Failed to register file watcher: {}", e))?;

    tracing::info!("watching {}", LOCK_FILE_PATTERN);
    Ok(())
}

/// Returns the file name of a changed path.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use uvls::file_watcher::extract_lockfile_name;
///
/// assert_eq!(extract_lockfile_name(Path::new("/project/uv.lock")), Some("uv.lock"));
/// assert_eq!(extract_lockfile_name(Path::new("/")), None);
/// ```
pub fn extract_lockfile_name(lockfile_path: &Path) -> Option<&str> {
    lockfile_path.file_name()?.to_str()
}

/// True if `path` names a uv.lock file.
pub fn is_lock_file(path: &Path) -> bool {
    extract_lockfile_name(path) == Some(LOCK_FILE_NAME)
}
