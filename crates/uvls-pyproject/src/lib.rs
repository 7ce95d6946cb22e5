//! pyproject.toml and uv.lock support for uvls.
//!
//! # Features
//!
//! - **Line classifier**: one place for the manifest grammar (section headers,
//!   array delimiters, name tokens)
//! - **Extractor**: `name = "value"` entries of `[dependencies]` tables
//! - **Link resolver**: registry links for `[project]` dependency arrays,
//!   `[dependencies]`/`[dev-dependencies]` tables and uv.lock records
//! - **Missing-dependency check**: declared names absent from uv.lock
//! - **Editing**: format-preserving removal of a dependency via `toml_edit`
//! - **PyPI client**: package lookup and version lists with HTTP caching
//!
//! Scanning is synchronous and never fails: malformed lines are skipped and
//! absent input yields empty results.
//!
//! # Examples
//!
//! ```
//! use uvls_core::LockEntrySet;
//! use uvls_pyproject::{LinkResolver, LockMatch, check_manifest};
//!
//! let manifest = "[project]\ndependencies = [\n  \"numpy>=1.20\",\n]\n\n[dependencies]\nrequests = \"2.31.0\"\n";
//!
//! let links = LinkResolver::default().manifest_links(manifest);
//! assert_eq!(links[0].target, "https://pypi.org/project/numpy/");
//! assert_eq!(links[1].name, "requests");
//!
//! let lock = LockEntrySet::new("name = \"numpy\"\n");
//! let missing = check_manifest(manifest, &lock, LockMatch::Substring);
//! assert_eq!(missing[0].name, "requests");
//! ```

pub mod diagnostics;
pub mod edit;
pub mod error;
pub mod extractor;
pub mod lexer;
pub mod links;
pub mod lockfile;
pub mod registry;
pub mod types;

pub use diagnostics::{LOCK_FILE_NAME, LockMatch, check_manifest, find_missing_dependencies};
pub use edit::remove_dependency;
pub use error::{PypiError, Result};
pub use extractor::extract_dependencies;
pub use links::{LinkResolver, ScanState, package_page_url, scan_declarations};
pub use lockfile::UvLockProvider;
pub use registry::{PYPI_PROJECT_URL, PypiRegistry};
pub use types::{
    DependencyDeclaration, DependencyLink, MissingDependency, PypiPackage, PypiVersion,
    SyntaxForm,
};
