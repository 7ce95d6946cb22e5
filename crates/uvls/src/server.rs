use crate::config::UvlsConfig;
use crate::document::{DocumentKind, DocumentState, ServerState};
use crate::file_watcher;
use crate::handlers::commands::{self, CommandOutcome};
use crate::handlers::{diagnostics, links};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp_server::jsonrpc::{self, ErrorCode, Result};
use tower_lsp_server::ls_types::{
    DiagnosticOptions, DiagnosticServerCapabilities, DidChangeTextDocumentParams,
    DidChangeWatchedFilesParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, DocumentDiagnosticParams, DocumentDiagnosticReport,
    DocumentDiagnosticReportResult, DocumentLink, DocumentLinkOptions, DocumentLinkParams,
    ExecuteCommandOptions, ExecuteCommandParams, FullDocumentDiagnosticReport, InitializeParams,
    InitializeResult, InitializedParams, MessageType, RelatedFullDocumentDiagnosticReport,
    SaveOptions, ServerCapabilities, ServerInfo, TextDocumentSyncCapability,
    TextDocumentSyncKind, TextDocumentSyncOptions, TextDocumentSyncSaveOptions, Uri,
};
use tower_lsp_server::{Client, LanguageServer};
use uvls_core::UvlsError;
use uvls_pyproject::LOCK_FILE_NAME;

pub struct Backend {
    client: Client,
    state: Arc<ServerState>,
    config: Arc<RwLock<UvlsConfig>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            state: Arc::new(ServerState::new()),
            config: Arc::new(RwLock::new(UvlsConfig::default())),
        }
    }

    /// Recomputes and pushes diagnostics for one manifest.
    async fn publish_diagnostics(&self, uri: Uri) {
        let (diagnostics_config, cold_start) = {
            let config = self.config.read().await;
            (config.diagnostics.clone(), config.cold_start.clone())
        };

        let items =
            diagnostics::handle_diagnostics(&self.state, &uri, &diagnostics_config, &cold_start)
                .await;
        tracing::debug!("publishing {} diagnostics for {:?}", items.len(), uri);
        self.client.publish_diagnostics(uri, items, None).await;
    }

    /// Drops the cached lock text and refreshes manifests next to it.
    async fn handle_lockfile_change(&self, lockfile_path: &Path) {
        self.state.lockfile_cache.invalidate(lockfile_path);

        let affected: Vec<Uri> = self
            .state
            .open_manifests()
            .into_iter()
            .filter(|uri| {
                uvls_core::file_path(uri)
                    .is_some_and(|path| path.with_file_name(LOCK_FILE_NAME) == lockfile_path)
            })
            .collect();

        if affected.is_empty() {
            tracing::debug!(
                "no open manifests affected by lock file: {}",
                lockfile_path.display()
            );
            return;
        }

        tracing::info!(
            "updating {} manifest(s) affected by lock file change",
            affected.len()
        );

        for uri in affected {
            self.publish_diagnostics(uri).await;
        }
    }

    fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::FULL),
                    save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                        include_text: Some(true),
                    })),
                    ..Default::default()
                },
            )),
            document_link_provider: Some(DocumentLinkOptions {
                resolve_provider: Some(false),
                work_done_progress_options: Default::default(),
            }),
            diagnostic_provider: Some(DiagnosticServerCapabilities::Options(DiagnosticOptions {
                identifier: Some("uvls".into()),
                inter_file_dependencies: false,
                workspace_diagnostics: false,
                ..Default::default()
            })),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: commands::ALL_COMMANDS.iter().map(|c| c.to_string()).collect(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// Maps a command failure to a JSON-RPC error shown to the user.
fn to_rpc_error(err: UvlsError) -> jsonrpc::Error {
    match err {
        UvlsError::InvalidCommand(message) => jsonrpc::Error::invalid_params(message),
        other => jsonrpc::Error {
            code: ErrorCode::ServerError(1),
            message: other.to_string().into(),
            data: None,
        },
    }
}

impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("initializing uvls server");

        let config = match params.initialization_options {
            Some(options) => serde_json::from_value::<UvlsConfig>(options).unwrap_or_else(|e| {
                tracing::debug!("invalid initialization options, using defaults: {}", e);
                UvlsConfig::default()
            }),
            None => UvlsConfig::default(),
        };

        tracing::debug!("loaded configuration: {:?}", config);
        self.state.configure(&config).await;
        *self.config.write().await = config;

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "uvls".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("uvls server initialized");
        self.client.log_message(MessageType::INFO, "uvls ready").await;

        // Registration waits for the client's reply; don't hold up other messages
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = file_watcher::register_lock_file_watcher(&client).await {
                tracing::warn!("failed to register file watcher: {}", e);
                client
                    .log_message(
                        MessageType::WARNING,
                        format!("File watching disabled: {}", e),
                    )
                    .await;
            }
        });

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                state
                    .cold_start_limiter
                    .cleanup_old_entries(std::time::Duration::from_secs(300));
                tracing::trace!("cleaned up old cold start entries");
            }
        });
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("shutting down uvls server");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;

        let Some(kind) = DocumentKind::from_uri(&uri) else {
            tracing::debug!("unsupported file type: {:?}", uri);
            return;
        };

        tracing::info!("document opened: {:?}", uri);
        self.state.update_document(
            uri.clone(),
            DocumentState::new(kind, params.text_document.text),
        );

        if kind == DocumentKind::Manifest {
            self.publish_diagnostics(uri).await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;

        let Some(kind) = DocumentKind::from_uri(&uri) else {
            return;
        };

        // Full sync: the last change carries the whole document
        if let Some(change) = params.content_changes.into_iter().last() {
            self.state
                .update_document(uri, DocumentState::new(kind, change.text));
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;

        let Some(kind) = DocumentKind::from_uri(&uri) else {
            return;
        };

        if let Some(text) = params.text {
            self.state
                .update_document(uri.clone(), DocumentState::new(kind, text));
        }

        if kind == DocumentKind::Manifest {
            self.publish_diagnostics(uri).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!("document closed: {:?}", uri);

        self.state.remove_document(&uri);
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        tracing::debug!("received {} file change events", params.changes.len());

        for change in params.changes {
            let Some(path) = uvls_core::file_path(&change.uri) else {
                tracing::warn!("invalid file path in change event: {:?}", change.uri);
                continue;
            };

            if !file_watcher::is_lock_file(&path) {
                continue;
            }

            tracing::info!("lock file changed: {}", path.display());
            self.handle_lockfile_change(&path).await;
        }
    }

    async fn document_link(&self, params: DocumentLinkParams) -> Result<Option<Vec<DocumentLink>>> {
        let (links_config, cold_start) = {
            let config = self.config.read().await;
            (config.links.clone(), config.cold_start.clone())
        };

        let links = links::handle_document_links(
            &self.state,
            &params.text_document.uri,
            &links_config,
            &cold_start,
        )
        .await;

        Ok(Some(links))
    }

    async fn diagnostic(
        &self,
        params: DocumentDiagnosticParams,
    ) -> Result<DocumentDiagnosticReportResult> {
        let uri = params.text_document.uri;
        tracing::info!("diagnostic request for: {:?}", uri);

        let (diagnostics_config, cold_start) = {
            let config = self.config.read().await;
            (config.diagnostics.clone(), config.cold_start.clone())
        };

        let items =
            diagnostics::handle_diagnostics(&self.state, &uri, &diagnostics_config, &cold_start)
                .await;

        Ok(DocumentDiagnosticReportResult::Report(
            DocumentDiagnosticReport::Full(RelatedFullDocumentDiagnosticReport {
                related_documents: None,
                full_document_diagnostic_report: FullDocumentDiagnosticReport {
                    result_id: None,
                    items,
                },
            }),
        ))
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        tracing::info!("execute_command: {:?}", params.command);

        let config = self.config.read().await.clone();
        let outcome = commands::handle_execute_command(
            &self.state,
            &config,
            &params.command,
            &params.arguments,
        )
        .await
        .map_err(|e| {
            tracing::warn!("{} failed: {}", params.command, e);
            to_rpc_error(e)
        })?;

        match outcome {
            CommandOutcome::Value(value) => Ok(Some(value)),
            CommandOutcome::Edit(edit) => {
                let response = self.client.apply_edit(edit).await?;
                if let Some(reason) = &response.failure_reason {
                    tracing::warn!("client rejected edit: {}", reason);
                }
                Ok(Some(serde_json::Value::Bool(response.applied)))
            }
        }
    }
}
