//! Release resolution, content synchronization and launch assembly.
//!
//! [`api::launcher::Launcher`] ties the pieces together: it resolves a release
//! descriptor through the local store or the remote catalog, fetches missing
//! libraries and asset objects through a bounded worker pool, and starts the
//! release with a short liveness check.

pub mod api;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod launch;
pub mod source;
pub mod store;

pub use api::launcher::{Launcher, PreparedRelease};
pub use config::LauncherConfig;
pub use error::{LauncherError, Result};
pub use launch::assembler::Identity;
