//! `textDocument/documentLink` handler.

use crate::config::{ColdStartConfig, LinksConfig};
use crate::document::{DocumentKind, ServerState, ensure_document_loaded};
use tower_lsp_server::ls_types::{DocumentLink, Uri};
use uvls_core::LineIndex;
use uvls_pyproject::LinkResolver;

/// Returns registry links for every dependency name in a pyproject.toml or uv.lock.
pub async fn handle_document_links(
    state: &ServerState,
    uri: &Uri,
    config: &LinksConfig,
    cold_start: &ColdStartConfig,
) -> Vec<DocumentLink> {
    if !config.enabled {
        return vec![];
    }

    if !ensure_document_loaded(uri, state, cold_start).await {
        tracing::debug!("no document for links: {:?}", uri);
        return vec![];
    }

    let Some(doc) = state.get_document_clone(uri) else {
        return vec![];
    };

    let resolver = LinkResolver::new(config.registry_url.as_str());
    let links = match doc.kind {
        DocumentKind::Manifest => resolver.manifest_links(&doc.content),
        DocumentKind::LockFile => resolver.lock_links(&doc.content),
    };

    let index = LineIndex::new(&doc.content);
    links
        .into_iter()
        .filter_map(|link| {
            let target = match link.target.parse::<Uri>() {
                Ok(target) => target,
                Err(e) => {
                    tracing::warn!("invalid link target {}: {}", link.target, e);
                    return None;
                }
            };

            Some(DocumentLink {
                range: index.range(link.source_span),
                tooltip: Some(tooltip(&link.name, &target)),
                target: Some(target),
                data: None,
            })
        })
        .collect()
}

/// Names the host the link points at, since the registry is configurable.
fn tooltip(name: &str, target: &Uri) -> String {
    match target.authority().map(|authority| authority.host()) {
        Some(host) if !host.is_empty() => format!("Open {} on {}", name, host),
        _ => format!("Open {} in package registry", name),
    }
}
