//! Add-on version resolution
//!
//! - **channel**: release channels and their policy table
//! - **version**: `VersionRef` and version-string classification
//! - **manifest**: add-on config files in their three spellings
//! - **resolver**: current and latest version lookup against the upstream host
//! - **detector**: the update verdict

pub mod channel;
pub mod detector;
pub mod manifest;
pub mod resolver;
pub mod version;

pub use channel::Channel;
pub use detector::{AddonState, needs_update};
pub use resolver::{ResolvedAddon, resolve};
pub use version::VersionRef;
