//! Missing-dependency diagnostics for pyproject.toml.

use crate::config::{ColdStartConfig, DiagnosticsConfig};
use crate::document::{DocumentKind, ServerState, ensure_document_loaded};
use tower_lsp_server::ls_types::{Diagnostic, Uri};
use uvls_core::{LineIndex, LockFileProvider};
use uvls_pyproject::check_manifest;

/// Diagnostic source shown by clients next to each message.
pub const DIAGNOSTIC_SOURCE: &str = "uvls";

/// Computes diagnostics for a document.
///
/// Only manifests produce diagnostics. A manifest without a sibling uv.lock,
/// or whose lock file cannot be read, gets none.
pub async fn handle_diagnostics(
    state: &ServerState,
    uri: &Uri,
    config: &DiagnosticsConfig,
    cold_start: &ColdStartConfig,
) -> Vec<Diagnostic> {
    if !ensure_document_loaded(uri, state, cold_start).await {
        tracing::warn!("could not load document for diagnostics: {:?}", uri);
        return vec![];
    }

    generate_diagnostics(state, uri, config).await
}

/// Diagnostic generation for a document already in the state.
pub(crate) async fn generate_diagnostics(
    state: &ServerState,
    uri: &Uri,
    config: &DiagnosticsConfig,
) -> Vec<Diagnostic> {
    if !config.enabled {
        return vec![];
    }

    let Some(doc) = state.get_document_clone(uri) else {
        tracing::warn!("document not found for diagnostics: {:?}", uri);
        return vec![];
    };

    if doc.kind != DocumentKind::Manifest {
        return vec![];
    }

    let Some(lock_path) = state.lock_provider.locate_lockfile(uri) else {
        tracing::debug!("no lock file for {:?}, skipping diagnostics", uri);
        return vec![];
    };

    let lock = match state
        .lockfile_cache
        .get_or_read(&state.lock_provider, &lock_path)
        .await
    {
        Ok(lock) => lock,
        Err(e) => {
            tracing::warn!("failed to read {}: {}", lock_path.display(), e);
            return vec![];
        }
    };

    let index = LineIndex::new(&doc.content);
    check_manifest(&doc.content, &lock, config.lock_match)
        .into_iter()
        .map(|missing| Diagnostic {
            range: index.range(missing.source_span),
            severity: Some(config.missing_severity),
            source: Some(DIAGNOSTIC_SOURCE.into()),
            message: missing.message,
            ..Default::default()
        })
        .collect()
}
