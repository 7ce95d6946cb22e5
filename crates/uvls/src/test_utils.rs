//! Test utilities for handler tests.

#[cfg(test)]
pub(crate) mod test_helpers {
    use crate::document::{DocumentKind, DocumentState, ServerState};
    use std::time::Duration;
    use tempfile::TempDir;
    use tower_lsp_server::ls_types::Uri;

    /// Writes a pyproject.toml (and optionally a uv.lock) to a fresh directory
    /// and opens the manifest in a new server state.
    ///
    /// The directory must be kept alive for as long as the files are needed.
    pub async fn project_with_files(
        manifest: &str,
        lock: Option<&str>,
    ) -> (TempDir, ServerState, Uri) {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("pyproject.toml");
        tokio::fs::write(&manifest_path, manifest).await.unwrap();

        if let Some(lock) = lock {
            tokio::fs::write(dir.path().join("uv.lock"), lock)
                .await
                .unwrap();
        }

        let state = ServerState::with_cold_start_interval(Duration::ZERO);
        let uri = Uri::from_file_path(&manifest_path).unwrap();
        state.update_document(
            uri.clone(),
            DocumentState::new(DocumentKind::Manifest, manifest.to_string()),
        );

        (dir, state, uri)
    }
}
