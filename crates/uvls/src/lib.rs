pub mod config;
pub mod document;
pub mod file_watcher;
pub mod handlers;
pub mod server;
pub mod uv;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use server::Backend;
pub use uvls_core::{Result, UvlsError};
