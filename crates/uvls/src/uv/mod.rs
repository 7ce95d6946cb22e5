//! Invoking the `uv` packaging tool.
//!
//! [`UvCommand`] describes an action and validates its inputs; [`run`]
//! executes it in a project directory without a shell.

mod command;
mod runner;

pub use command::{Upgrade, UvCommand};
pub use runner::run;
