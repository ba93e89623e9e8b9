//! Error types surfaced by the database client.

use thiserror::Error;

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures raised while talking to the database server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL could not be turned into a request origin.
    #[error("invalid server URL '{base_url}': {reason}")]
    InvalidUrl {
        /// Base URL as configured, without credentials.
        base_url: String,
        /// Why the URL was rejected.
        reason: String,
    },
    /// The request identifier cannot be sent as a header value.
    #[error("request identifier contains invalid characters")]
    InvalidRequestId,
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Build {
        /// Source reqwest error.
        source: reqwest::Error,
    },
    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("{operation} request failed")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Source reqwest error, stripped of its credential-bearing URL.
        source: reqwest::Error,
    },
    /// The server answered with a non-2xx status.
    #[error("{operation} rejected with status {status}: {body}")]
    Remote {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status code returned by the server.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// A 2xx response body was not the JSON shape the operation expects.
    #[error("{operation} returned an unexpected payload")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// Source serde error.
        source: serde_json::Error,
    },
    /// A fetched document carried no revision token.
    #[error("document '{id}' in database '{database}' has no _rev")]
    MissingRevision {
        /// Database the document was read from.
        database: String,
        /// Document identifier.
        id: String,
    },
}

impl ClientError {
    /// HTTP status for remote failures.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors_carry_status_and_body() {
        let err = ClientError::Remote {
            operation: "delete_document",
            status: 409,
            body: r#"{"error":"conflict"}"#.into(),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(
            err.to_string(),
            r#"delete_document rejected with status 409: {"error":"conflict"}"#
        );
    }

    #[test]
    fn non_remote_errors_have_no_status() {
        let err = ClientError::MissingRevision {
            database: "shop".into(),
            id: "doc1".into(),
        };
        assert_eq!(err.status(), None);
        assert_eq!(
            err.to_string(),
            "document 'doc1' in database 'shop' has no _rev"
        );
    }
}
