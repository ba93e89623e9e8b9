//! Wire types for the documents the client reads and rewrites.

use std::fmt::{self, Debug, Formatter};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Prefix CouchDB requires on `_users` document identifiers.
pub const USER_ID_PREFIX: &str = "org.couchdb.user:";

/// Per-database access-control document.
///
/// Only `members` is modelled; every other key (such as `admins`) is kept in
/// `extra` so a rewrite sends the document back whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityDocument {
    /// Users and roles allowed to read and write the database.
    #[serde(default, deserialize_with = "null_as_default")]
    pub members: SecurityGroup,
    /// Fields the client does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A `names`/`roles` pair inside a security document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroup {
    /// User names, in server order. Duplicates are preserved.
    #[serde(default, deserialize_with = "null_as_default")]
    pub names: Vec<String>,
    /// Role names.
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: Vec<String>,
    /// Fields the client does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SecurityDocument {
    /// Append `user` to the member names and record any new roles.
    ///
    /// The name is appended even when already present.
    pub fn grant(&mut self, user: &str, roles: &[String]) {
        self.members.names.push(user.to_string());
        for role in roles {
            if !self.members.roles.contains(role) {
                self.members.roles.push(role.clone());
            }
        }
    }

    /// Drop every occurrence of `user` from the member names.
    pub fn revoke(&mut self, user: &str) {
        self.members.names.retain(|name| name != user);
    }
}

/// Account document stored in the server's `_users` database.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    /// `org.couchdb.user:<name>`.
    #[serde(rename = "_id")]
    pub id: String,
    /// Login name.
    pub name: String,
    /// Server roles granted to the account.
    pub roles: Vec<String>,
    /// Always `user`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Plain-text password; the server hashes it on write.
    pub password: String,
}

impl UserDocument {
    /// Build the document for a new account.
    #[must_use]
    pub fn new(name: &str, password: &str, roles: Vec<String>) -> Self {
        Self {
            id: format!("{USER_ID_PREFIX}{name}"),
            name: name.to_string(),
            roles,
            kind: "user".to_string(),
            password: password.to_string(),
        }
    }
}

impl Debug for UserDocument {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UserDocument")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("roles", &self.roles)
            .field("kind", &self.kind)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllDocsResponse {
    #[serde(default)]
    pub(crate) rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllDocsRow {
    #[serde(default)]
    pub(crate) doc: Option<Value>,
}

impl AllDocsResponse {
    /// Embedded documents whose `type` is `user`.
    pub(crate) fn into_user_documents(self) -> Vec<Value> {
        self.rows
            .into_iter()
            .filter_map(|row| row.doc)
            .filter(|doc| doc.get("type").and_then(Value::as_str) == Some("user"))
            .collect()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
