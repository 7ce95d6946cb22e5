//! Core abstractions for uvls.
//!
//! This crate provides the foundational types shared by the manifest scanner
//! (`uvls-pyproject`) and the language server (`uvls`).
//!
//! # Architecture
//!
//! uvls-core defines:
//! - **Spans**: `SourceSpan` and `LineIndex` for mapping scan results to LSP ranges
//! - **HTTP Cache**: Shared caching layer with ETag/Last-Modified validation
//! - **Lock files**: `LockFileProvider` trait, `LockEntrySet` and a staleness-aware cache
//! - **Error Types**: Unified error handling across all crates
//! - **URIs**: `file_path` for `file:` URIs only
//!
//! # Examples
//!
//! Anchoring a scanned name in LSP coordinates:
//!
//! ```
//! use uvls_core::{LineIndex, SourceSpan};
//!
//! let text = "[dependencies]\nrequests = \"2.31.0\"\n";
//! let span = SourceSpan::new(1, 0, 8);
//! assert_eq!(span.slice(text), Some("requests"));
//!
//! let index = LineIndex::new(text);
//! let range = index.range(span);
//! assert_eq!(range.start.line, 1);
//! assert_eq!(range.end.character, 8);
//! ```

pub mod cache;
pub mod error;
pub mod lockfile;
pub mod span;
pub mod uri;

// Re-export commonly used types
pub use cache::{CachedResponse, HttpCache};
pub use error::{Result, UvlsError};
pub use lockfile::{LockEntrySet, LockFileCache, LockFileProvider, is_name_char};
pub use span::{LineIndex, SourceSpan};
pub use uri::file_path;
