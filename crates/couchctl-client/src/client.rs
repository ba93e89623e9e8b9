//! HTTP client bound to one environment's server and credentials.
//!
//! # Design
//! - Every request URL is rebuilt from the configured host with the user and
//!   password embedded as userinfo; reqwest turns that into a basic-auth header.
//! - Read-modify-write operations issue a fresh read immediately before each
//!   write and never cache server state. Conflicts are left to the server.
//! - Logged fields never include the credential-bearing URL.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use couchctl_config::EnvironmentConfig;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::models::{AllDocsResponse, SecurityDocument, UserDocument};

/// Header carrying the per-invocation correlation identifier.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Scheme re-applied to the configured host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// TLS; used for every real environment.
    #[default]
    Https,
    /// Plain HTTP, for local mock servers.
    Http,
}

impl Scheme {
    /// Scheme name as it appears in a URL.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }
}

/// Transport settings independent of the target environment.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Scheme prepended to the configured host.
    pub scheme: Scheme,
    /// Value sent in the `x-request-id` header on every request.
    pub request_id: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            scheme: Scheme::Https,
            request_id: None,
        }
    }
}

/// Client for one database server environment.
#[derive(Clone)]
pub struct CouchClient {
    http: Client,
    origin: Url,
}

impl Debug for CouchClient {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CouchClient")
            .field("host", &self.origin.host_str())
            .field("port", &self.origin.port())
            .field("user", &self.origin.username())
            .finish_non_exhaustive()
    }
}

impl CouchClient {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL or credentials cannot form a valid
    /// request origin, when the request id is not a valid header value, or
    /// when the HTTP client fails to build.
    pub fn new(config: &EnvironmentConfig, options: &ClientOptions) -> ClientResult<Self> {
        let origin = build_origin(config, options.scheme)?;

        let mut default_headers = HeaderMap::new();
        if let Some(request_id) = &options.request_id {
            let value =
                HeaderValue::from_str(request_id).map_err(|_| ClientError::InvalidRequestId)?;
            default_headers.insert(HEADER_REQUEST_ID, value);
        }

        let http = Client::builder()
            .timeout(options.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|source| ClientError::Build { source })?;

        Ok(Self { http, origin })
    }

    /// Credential-bearing URL for `segments` below the server root.
    ///
    /// Each segment is percent-encoded on its own, so a `/` inside a segment
    /// never introduces a new path level.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if the origin cannot carry a path.
    pub fn request_url(&self, segments: &[&str], query: &[(&str, &str)]) -> ClientResult<Url> {
        let mut url = self.origin.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl {
                base_url: self.origin.host_str().unwrap_or_default().to_string(),
                reason: "URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// `GET /_all_dbs`.
    ///
    /// # Errors
    ///
    /// Propagates transport, remote, and decode failures.
    pub async fn list_databases(&self) -> ClientResult<Vec<String>> {
        let url = self.request_url(&["_all_dbs"], &[])?;
        self.execute("list_databases", Method::GET, url, None::<&Value>)
            .await
    }

    /// `PUT /{db}`.
    ///
    /// # Errors
    ///
    /// Propagates transport, remote, and decode failures.
    pub async fn create_database(&self, database: &str) -> ClientResult<Value> {
        let url = self.request_url(&[database], &[])?;
        self.execute("create_database", Method::PUT, url, None::<&Value>)
            .await
    }

    /// `DELETE /{db}`.
    ///
    /// # Errors
    ///
    /// Propagates transport, remote, and decode failures.
    pub async fn delete_database(&self, database: &str) -> ClientResult<Value> {
        let url = self.request_url(&[database], &[])?;
        self.execute("delete_database", Method::DELETE, url, None::<&Value>)
            .await
    }

    /// `GET /{db}/_security`.
    ///
    /// # Errors
    ///
    /// Propagates transport, remote, and decode failures.
    pub async fn list_users(&self, database: &str) -> ClientResult<SecurityDocument> {
        let url = self.request_url(&[database, "_security"], &[])?;
        self.execute("list_users", Method::GET, url, None::<&Value>)
            .await
    }

    /// Append `user` to the database members and write the document back.
    ///
    /// Returns the security document that was written.
    ///
    /// # Errors
    ///
    /// Fails on either request; the write is skipped when the read fails.
    pub async fn add_user_to_database(
        &self,
        database: &str,
        user: &str,
        roles: &[String],
    ) -> ClientResult<SecurityDocument> {
        let mut security = self.list_users(database).await?;
        security.grant(user, roles);
        self.write_security("add_user_to_database", database, &security)
            .await?;
        Ok(security)
    }

    /// Remove every occurrence of `user` from the database members and write
    /// the document back.
    ///
    /// Returns the security document that was written.
    ///
    /// # Errors
    ///
    /// Fails on either request; the write is skipped when the read fails.
    pub async fn remove_user_from_database(
        &self,
        database: &str,
        user: &str,
    ) -> ClientResult<SecurityDocument> {
        let mut security = self.list_users(database).await?;
        security.revoke(user);
        self.write_security("remove_user_from_database", database, &security)
            .await?;
        Ok(security)
    }

    /// `POST /_users` with a new account document.
    ///
    /// # Errors
    ///
    /// Propagates transport, remote, and decode failures.
    pub async fn create_user(
        &self,
        user: &str,
        password: &str,
        roles: Vec<String>,
    ) -> ClientResult<Value> {
        let url = self.request_url(&["_users"], &[])?;
        let document = UserDocument::new(user, password, roles);
        self.execute("create_user", Method::POST, url, Some(&document))
            .await
    }

    /// Every `_users` document whose `type` is `user`.
    ///
    /// # Errors
    ///
    /// Propagates transport, remote, and decode failures.
    pub async fn list_server_users(&self) -> ClientResult<Vec<Value>> {
        let url = self.request_url(&["_users", "_all_docs"], &[("include_docs", "true")])?;
        let listing: AllDocsResponse = self
            .execute("list_server_users", Method::GET, url, None::<&Value>)
            .await?;
        Ok(listing.into_user_documents())
    }

    /// `POST /{db}` with an arbitrary JSON document.
    ///
    /// # Errors
    ///
    /// Propagates transport, remote, and decode failures.
    pub async fn insert_document(&self, database: &str, document: &Value) -> ClientResult<Value> {
        let url = self.request_url(&[database], &[])?;
        self.execute("insert_document", Method::POST, url, Some(document))
            .await
    }

    /// `GET /{db}/{id}`.
    ///
    /// # Errors
    ///
    /// Propagates transport, remote, and decode failures.
    pub async fn get_document(&self, database: &str, id: &str) -> ClientResult<Value> {
        let url = self.document_url(database, id, &[])?;
        self.execute("get_document", Method::GET, url, None::<&Value>)
            .await
    }

    /// `GET /{db}/_all_docs`.
    ///
    /// # Errors
    ///
    /// Propagates transport, remote, and decode failures.
    pub async fn list_documents(&self, database: &str) -> ClientResult<Value> {
        let url = self.request_url(&[database, "_all_docs"], &[])?;
        self.execute("list_documents", Method::GET, url, None::<&Value>)
            .await
    }

    /// `PUT /{db}/{id}` with an arbitrary JSON document.
    ///
    /// # Errors
    ///
    /// Propagates transport, remote, and decode failures.
    pub async fn update_document(
        &self,
        database: &str,
        id: &str,
        document: &Value,
    ) -> ClientResult<Value> {
        let url = self.document_url(database, id, &[])?;
        self.execute("update_document", Method::PUT, url, Some(document))
            .await
    }

    /// Fetch the current revision of a document, then delete that revision.
    ///
    /// # Errors
    ///
    /// Fails on either request, and with `ClientError::MissingRevision` when
    /// the fetched document has no `_rev`. A revision that changed between
    /// the two requests surfaces as the server's conflict response.
    pub async fn delete_document(&self, database: &str, id: &str) -> ClientResult<Value> {
        let current = self.get_document(database, id).await?;
        let revision = current
            .get("_rev")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::MissingRevision {
                database: database.to_string(),
                id: id.to_string(),
            })?;

        let url = self.document_url(database, id, &[("rev", revision)])?;
        self.execute("delete_document", Method::DELETE, url, None::<&Value>)
            .await
    }

    async fn write_security(
        &self,
        operation: &'static str,
        database: &str,
        security: &SecurityDocument,
    ) -> ClientResult<Value> {
        let url = self.request_url(&[database, "_security"], &[])?;
        self.execute(operation, Method::PUT, url, Some(security))
            .await
    }

    fn document_url(&self, database: &str, id: &str, query: &[(&str, &str)]) -> ClientResult<Url> {
        let mut segments = vec![database];
        segments.extend(document_segments(id));
        self.request_url(&segments, query)
    }

    async fn execute<T, B>(
        &self,
        operation: &'static str,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!(operation, %method, path = url.path(), "sending request");

        let mut request: RequestBuilder = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                operation,
                source: source.without_url(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = remote_body(response.text().await);
            warn!(operation, status = status.as_u16(), "server rejected request");
            return Err(ClientError::Remote {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport {
                operation,
                source: source.without_url(),
            })?;
        debug!(operation, status = status.as_u16(), bytes = bytes.len(), "request completed");
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode { operation, source })
    }
}

fn remote_body(text: reqwest::Result<String>) -> String {
    match text {
        Ok(body) => body.trim().to_string(),
        Err(err) => format!("<unreadable body: {}>", err.without_url()),
    }
}

/// Host portion of a configured base URL: any `http://` or `https://` prefix
/// and trailing slashes removed.
#[must_use]
pub fn strip_scheme(base_url: &str) -> &str {
    let trimmed = base_url.trim();
    trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/')
}

fn build_origin(config: &EnvironmentConfig, scheme: Scheme) -> ClientResult<Url> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        base_url: config.base_url.clone(),
        reason,
    };

    let host = strip_scheme(&config.base_url);
    if host.is_empty() {
        return Err(invalid("no host".to_string()));
    }

    let mut origin = Url::parse(&format!("{}://{host}/", scheme.as_str()))
        .map_err(|err| invalid(err.to_string()))?;
    origin
        .set_username(&config.user)
        .map_err(|()| invalid("cannot embed user name".to_string()))?;
    origin
        .set_password(Some(&config.password))
        .map_err(|()| invalid("cannot embed password".to_string()))?;
    Ok(origin)
}

/// Design and local document ids keep their prefix as a separate path level.
fn document_segments(id: &str) -> Vec<&str> {
    for prefix in ["_design", "_local"] {
        if let Some(rest) = id
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            return vec![prefix, rest];
        }
    }
    vec![id]
}
