//! Loading documents from disk.
//!
//! A client may send requests (links, pull diagnostics, commands) for a file
//! it never opened, e.g. when the server starts after the editor. Handlers
//! call [`ensure_document_loaded`], which reads the file and stores it as if
//! `didOpen` had been received.

use super::state::{DocumentKind, DocumentState, ServerState};
use crate::config::ColdStartConfig;
use tower_lsp_server::ls_types::Uri;
use uvls_core::{Result, UvlsError};

/// Maximum file size accepted from disk (10MB).
const MAX_FILE_SIZE: u64 = 10_000_000;

/// Reads a `file://` document.
///
/// # Errors
///
/// - `UvlsError::InvalidUri` if the URI is not a file path
/// - `UvlsError::CacheError` if the file exceeds the size limit
/// - `UvlsError::Io` if the file cannot be read or is not UTF-8
///
/// # Examples
///
/// ```no_run
/// use uvls::document::load_document_from_disk;
/// use tower_lsp_server::ls_types::Uri;
///
/// # async fn example() -> uvls_core::Result<()> {
/// let uri = Uri::from_file_path("/path/to/pyproject.toml").unwrap();
/// let content = load_document_from_disk(&uri).await?;
/// println!("loaded {} bytes", content.len());
/// # Ok(())
/// # }
/// ```
pub async fn load_document_from_disk(uri: &Uri) -> Result<String> {
    let Some(path) = uvls_core::file_path(uri) else {
        tracing::debug!("cannot load non-file URI: {:?}", uri);
        return Err(UvlsError::InvalidUri(uri.as_str().to_string()));
    };

    let size = tokio::fs::metadata(&path).await?.len();
    if size > MAX_FILE_SIZE {
        tracing::error!("{} exceeds {} bytes", path.display(), MAX_FILE_SIZE);
        return Err(UvlsError::CacheError(format!(
            "file too large: {size} bytes (max: {MAX_FILE_SIZE} bytes)"
        )));
    }

    let content = tokio::fs::read_to_string(&path).await?;
    tracing::debug!("loaded {} ({} bytes)", path.display(), content.len());
    Ok(content)
}

/// Makes sure `uri` is present in the document map, reading it from disk if needed.
///
/// Returns false for unsupported file types, when cold start is disabled or
/// rate limited, and when the file cannot be read.
pub async fn ensure_document_loaded(
    uri: &Uri,
    state: &ServerState,
    config: &ColdStartConfig,
) -> bool {
    if state.get_document(uri).is_some() {
        return true;
    }

    let Some(kind) = DocumentKind::from_uri(uri) else {
        tracing::debug!("unsupported file type: {:?}", uri);
        return false;
    };

    if !config.enabled {
        tracing::debug!("cold start disabled via configuration");
        return false;
    }

    if !state.cold_start_limiter.allow_cold_start(uri) {
        return false;
    }

    tracing::info!("loading document from disk (cold start): {:?}", uri);
    match load_document_from_disk(uri).await {
        Ok(content) => {
            state.update_document(uri.clone(), DocumentState::new(kind, content));
            true
        }
        Err(e) => {
            tracing::warn!("failed to load document {:?}: {}", uri, e);
            false
        }
    }
}
