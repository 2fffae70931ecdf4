//! # ast-error
//!
//! Unified error handling for the `ast-core` compiler framework, following
//! the same kind/status/context split used across this workspace's crates.
//!
//! - `ErrorKind` says what happened.
//! - `ErrorStatus` says whether retrying helps (almost nothing here does;
//!   AST errors are deterministic functions of the input tree).
//! - Context key/value pairs and an optional wrapped source error assist in
//!   tracking down the cause.
//!
//! Most of the diagnostic taxonomy described by the AST framework's error
//! design (validation errors, resolution ambiguity, internal errors) is
//! *reported* through the `Logger` rather than returned as a `Result` — see
//! `ast_core::logger`. This crate covers the smaller set of APIs (constant
//! parsing, coercion, instruction resolution) that fail in a way a caller
//! needs to inspect directly.

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

pub type Result<T> = std::result::Result<T, Error>;
