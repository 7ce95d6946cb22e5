//! `workspace/executeCommand` handler.
//!
//! Commands take a single JSON object argument. Errors are returned to the
//! client rather than logged, so they can be shown to the user.

use crate::config::UvlsConfig;
use crate::document::{ServerState, ensure_document_loaded};
use crate::uv::{self, UvCommand};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tower_lsp_server::ls_types::{Position, Range, TextEdit, Uri, WorkspaceEdit};
use uvls_core::{LineIndex, Result, UvlsError};
use uvls_pyproject::{PypiPackage, PypiVersion, SyntaxForm, extract_dependencies, remove_dependency};

/// Lists `[dependencies]` entries of a pyproject.toml.
pub const LIST_DEPENDENCIES: &str = "uvls.listDependencies";
/// Removes a package from `[dependencies]` via a workspace edit.
pub const REMOVE_PACKAGE: &str = "uvls.removePackage";
/// Looks a package up on PyPI.
pub const SEARCH_PACKAGE: &str = "uvls.searchPackage";
/// Returns the command line for a `uv` action without running it.
pub const BUILD_COMMAND: &str = "uvls.buildCommand";
/// Runs a `uv` action and returns its output.
pub const RUN_COMMAND: &str = "uvls.runCommand";

/// Every command advertised in the server capabilities.
pub const ALL_COMMANDS: [&str; 5] = [
    LIST_DEPENDENCIES,
    REMOVE_PACKAGE,
    SEARCH_PACKAGE,
    BUILD_COMMAND,
    RUN_COMMAND,
];

#[derive(Debug, Deserialize)]
struct DocumentArgs {
    uri: Uri,
}

#[derive(Debug, Deserialize)]
struct RemovePackageArgs {
    uri: Uri,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchPackageArgs {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BuildCommandArgs {
    command: UvCommand,
}

#[derive(Debug, Deserialize)]
struct RunCommandArgs {
    command: UvCommand,
    cwd: PathBuf,
}

/// A `[dependencies]` entry as returned by `uvls.listDependencies`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedDependency {
    pub name: String,
    pub version_constraint: Option<String>,
    pub syntax_form: SyntaxForm,
    pub range: Range,
}

/// Result of `uvls.searchPackage`.
#[derive(Debug, Clone, Serialize)]
pub struct PackageSearchResult {
    pub package: PypiPackage,
    /// Releases newest-first, yanked ones included and flagged
    pub versions: Vec<PypiVersion>,
}

/// What the server should do with a successfully executed command.
#[derive(Debug)]
pub enum CommandOutcome {
    /// Return this value to the client
    Value(Value),
    /// Ask the client to apply this edit
    Edit(WorkspaceEdit),
}

/// Executes one of [`ALL_COMMANDS`].
///
/// # Errors
///
/// - `UvlsError::InvalidCommand` for unknown commands, malformed arguments,
///   or a package that is not declared
/// - `UvlsError::UnsupportedDocument` if a document cannot be loaded
/// - errors from PyPI lookups, TOML rewriting and `uv` itself
pub async fn handle_execute_command(
    state: &ServerState,
    config: &UvlsConfig,
    command: &str,
    arguments: &[Value],
) -> Result<CommandOutcome> {
    match command {
        LIST_DEPENDENCIES => {
            let args: DocumentArgs = parse_args(command, arguments)?;
            let listed = list_dependencies(state, config, &args.uri).await?;
            Ok(CommandOutcome::Value(serde_json::to_value(listed)?))
        }
        REMOVE_PACKAGE => {
            let args: RemovePackageArgs = parse_args(command, arguments)?;
            let edit = remove_package(state, config, &args.uri, &args.name).await?;
            Ok(CommandOutcome::Edit(edit))
        }
        SEARCH_PACKAGE => {
            let args: SearchPackageArgs = parse_args(command, arguments)?;
            let result = search_package(state, &args.name).await?;
            Ok(CommandOutcome::Value(serde_json::to_value(result)?))
        }
        BUILD_COMMAND => {
            let args: BuildCommandArgs = parse_args(command, arguments)?;
            let line = args.command.command_line(&config.uv)?;
            Ok(CommandOutcome::Value(Value::String(line)))
        }
        RUN_COMMAND => {
            let args: RunCommandArgs = parse_args(command, arguments)?;
            let stdout = uv::run(&args.command, &config.uv, &args.cwd).await?;
            Ok(CommandOutcome::Value(Value::String(stdout)))
        }
        other => Err(UvlsError::InvalidCommand(format!("unknown command: {other}"))),
    }
}

fn parse_args<T: DeserializeOwned>(command: &str, arguments: &[Value]) -> Result<T> {
    let Some(first) = arguments.first() else {
        return Err(UvlsError::InvalidCommand(format!(
            "{command} expects one argument object"
        )));
    };

    serde_json::from_value(first.clone()).map_err(|e| {
        UvlsError::InvalidCommand(format!("invalid arguments for {command}: {e}"))
    })
}

async fn document_text(state: &ServerState, config: &UvlsConfig, uri: &Uri) -> Result<String> {
    if !ensure_document_loaded(uri, state, &config.cold_start).await {
        return Err(UvlsError::UnsupportedDocument(uri.as_str().to_string()));
    }

    state
        .get_document_clone(uri)
        .map(|doc| doc.content)
        .ok_or_else(|| UvlsError::UnsupportedDocument(uri.as_str().to_string()))
}

async fn list_dependencies(
    state: &ServerState,
    config: &UvlsConfig,
    uri: &Uri,
) -> Result<Vec<ListedDependency>> {
    let text = document_text(state, config, uri).await?;
    let index = LineIndex::new(&text);

    Ok(extract_dependencies(&text)
        .into_iter()
        .map(|dep| ListedDependency {
            range: index.range(dep.source_span),
            name: dep.name,
            version_constraint: dep.version_constraint,
            syntax_form: dep.syntax_form,
        })
        .collect())
}

async fn remove_package(
    state: &ServerState,
    config: &UvlsConfig,
    uri: &Uri,
    name: &str,
) -> Result<WorkspaceEdit> {
    let text = document_text(state, config, uri).await?;

    let Some(updated) = remove_dependency(&text, name)? else {
        return Err(UvlsError::InvalidCommand(format!(
            "'{name}' is not declared in [dependencies]"
        )));
    };

    let mut changes = HashMap::new();
    changes.insert(
        uri.clone(),
        vec![TextEdit {
            range: full_document_range(&text),
            new_text: updated,
        }],
    );

    Ok(WorkspaceEdit {
        changes: Some(changes),
        ..Default::default()
    })
}

async fn search_package(state: &ServerState, name: &str) -> Result<PackageSearchResult> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UvlsError::InvalidCommand("package name is required".into()));
    }

    let registry = state.registry().await;
    let package = registry.get_package_info(name).await?;
    let versions = registry.get_versions(name).await?;

    Ok(PackageSearchResult { package, versions })
}

/// Range covering all of `text`, ending after the last character.
fn full_document_range(text: &str) -> Range {
    let line = text.matches('\n').count() as u32;
    let last_line = text.rsplit('\n').next().unwrap_or_default();
    let character = last_line.encode_utf16().count() as u32;
    Range::new(Position::new(0, 0), Position::new(line, character))
}
