#![warn(missing_docs)]

//! # jsguard-sandbox
//!
//! Gated execution of untrusted JavaScript snippets.
//!
//! [`Gatekeeper::run`] validates a snippet, asks the analyzer for a verdict
//! and only hands clean snippets to a [`ScriptExecutor`]. The default
//! executor, [`NodeExecutor`], runs the snippet in a `node` child process.
//!
//! ## Security model
//!
//! - **Static gate**: denied module imports and provably endless loops are
//!   refused before anything runs, including inside `eval` strings
//! - **Fail closed**: a snippet the analyzer cannot judge is never executed
//! - **Environment scope**: host environment variables are cleared while a
//!   snippet runs and restored afterwards, on every exit path
//! - **Timeout and heap cap**: the child process is killed after a deadline
//!   and runs with a bounded heap
//! - **Output size limits**: oversized output is rejected

pub mod audit;
pub mod env;
pub mod error;
pub mod executor;
pub mod gatekeeper;
pub mod host;
pub mod validator;

pub use env::EnvScope;
pub use error::SandboxError;
pub use executor::{SandboxConfig, ScriptExecutor};
pub use gatekeeper::Gatekeeper;
pub use host::NodeExecutor;
