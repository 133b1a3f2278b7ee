//! addon-mirror: mirror add-on repositories into a distribution repository
//!
//! - **addon**: channel policy, version resolution and update detection
//! - **changelog**: channel-aware CHANGELOG.md synthesis
//! - **host**: hosting platform access (GitHub REST API)
//! - **publish**: writing config, static files and changelog into a target
//! - **commands**: `status` and `update`
//! - **core**: config, context, errors, logging and the system git backend

pub mod addon;
pub mod changelog;
pub mod commands;
pub mod core;
pub mod host;
pub mod publish;
