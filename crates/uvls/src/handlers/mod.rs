//! LSP request handlers.
//!
//! Handlers take the shared [`ServerState`](crate::document::ServerState) and
//! a snapshot of the relevant configuration section, and never fail: problems
//! are logged and result in empty responses. `workspace/executeCommand` is the
//! exception, since its errors are shown to the user.

pub mod commands;
pub mod diagnostics;
pub mod links;
