//! Core building blocks shared by every addon-mirror command
//!
//! - **config**: mirror.toml parsing and validation
//! - **context**: repository context built once per run
//! - **error**: error types with contextual help messages and exit codes
//! - **logging**: tracing subscriber setup
//! - **vcs**: system git backend (clone, checkout, first-parent history)

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod vcs;
