//! Command handlers grouped by the resource they act on.

pub(crate) mod databases;
pub(crate) mod documents;
pub(crate) mod security;
pub(crate) mod users;
