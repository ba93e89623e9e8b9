#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Environment registry for the couchctl administration client.
//!
//! Layout: `registry.rs` (loading and resolving environment credentials),
//! `env_file.rs` (`.env` merging), `error.rs` (`ConfigError`).

pub mod env_file;
pub mod error;
pub mod registry;

pub use env_file::load_env_file;
pub use error::{ConfigError, ConfigResult};
pub use registry::{
    DEFAULT_ENVIRONMENTS, ENVIRONMENTS_VAR, EnvironmentConfig, EnvironmentRegistry,
};
