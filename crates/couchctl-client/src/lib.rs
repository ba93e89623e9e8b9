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
#![allow(clippy::redundant_pub_crate)]

//! Asynchronous client for a CouchDB-compatible HTTP API.
//!
//! Layout: `client.rs` (`CouchClient` and request shaping), `models.rs`
//! (security, user, and listing documents), `error.rs` (`ClientError`).

pub mod client;
pub mod error;
pub mod models;

pub use client::{
    ClientOptions, CouchClient, DEFAULT_TIMEOUT, HEADER_REQUEST_ID, Scheme, strip_scheme,
};
pub use error::{ClientError, ClientResult};
pub use models::{SecurityDocument, SecurityGroup, USER_ID_PREFIX, UserDocument};
