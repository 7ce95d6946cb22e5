//! URI to filesystem path conversion.

use std::borrow::Cow;
use std::path::PathBuf;
use tower_lsp_server::ls_types::Uri;

/// Returns the local path of a `file:` URI.
///
/// `Uri::to_file_path` decodes the path of any scheme, so `untitled:` buffers
/// and remote URIs would otherwise resolve against the server's working
/// directory. Those yield `None` here.
///
/// # Examples
///
/// ```
/// use tower_lsp_server::ls_types::Uri;
/// use uvls_core::file_path;
///
/// let local: Uri = "file:///project/pyproject.toml".parse().unwrap();
/// assert!(file_path(&local).is_some());
///
/// let scratch: Uri = "untitled:pyproject.toml".parse().unwrap();
/// assert_eq!(file_path(&scratch), None);
/// ```
pub fn file_path(uri: &Uri) -> Option<PathBuf> {
    if !uri.scheme().as_str().eq_ignore_ascii_case("file") {
        return None;
    }
    uri.to_file_path().map(Cow::into_owned)
}
