//! Document management.
//!
//! - `state`: open documents and shared server state
//! - `loader`: reading documents from disk when a request arrives before `didOpen`

mod loader;
mod state;

pub use loader::{ensure_document_loaded, load_document_from_disk};
pub use state::{ColdStartLimiter, DocumentKind, DocumentState, ServerState};
