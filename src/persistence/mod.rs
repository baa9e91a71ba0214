//! Document store abstraction for session records.
//!
//! The store exposes driver-level primitives only (insert one, find one,
//! update one, delete one, ...). Identifier resolution lives in
//! [`crate::gateway`], not here.

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::Value;

use crate::config::{PersistenceConfig, StoreProvider};

pub mod object_id;
pub mod providers;

pub use object_id::{OBJECT_ID_HEX_LEN, ObjectId, ObjectIdError};

/// Schema-less, ordered field mapping.
pub type Document = serde_json::Map<String, Value>;

/// Field holding the application-level session id.
pub const SESSION_ID_FIELD: &str = "sessionId";

/// Key under which the native id is rendered.
pub const INTERNAL_ID_FIELD: &str = "internalId";

/// A stored session: native id plus caller-owned fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: ObjectId,
    pub fields: Document,
}

impl SessionRecord {
    /// The `sessionId` field, if present and a string.
    pub fn session_id(&self) -> Option<&str> {
        self.fields.get(SESSION_ID_FIELD).and_then(Value::as_str)
    }

    /// Render as a single document with the native id first, as a string.
    /// A caller field named `internalId` is shadowed by the native id.
    pub fn into_document(self) -> Document {
        let mut out = Document::new();
        out.insert(
            INTERNAL_ID_FIELD.to_string(),
            Value::String(self.id.to_hex()),
        );
        for (key, value) in self.fields {
            if key != INTERNAL_ID_FIELD {
                out.insert(key, value);
            }
        }
        out
    }
}

/// Selects at most one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Native id equality.
    Id(ObjectId),
    /// Exact string match on the `sessionId` field.
    SessionId(String),
}

impl Filter {
    pub fn matches(&self, id: &ObjectId, fields: &Document) -> bool {
        match self {
            Self::Id(wanted) => wanted == id,
            Self::SessionId(wanted) => {
                fields.get(SESSION_ID_FIELD).and_then(Value::as_str) == Some(wanted.as_str())
            }
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Insert a document, returning the id the store assigned to it.
    async fn insert_one(&self, fields: Document) -> Result<ObjectId>;

    /// First record matching `filter`, in ascending id order.
    async fn find_one(&self, filter: &Filter) -> Result<Option<SessionRecord>>;

    /// Up to `limit` records, newest first, with the `exclude` keys removed.
    async fn find_recent(&self, limit: usize, exclude: &[&str]) -> Result<Vec<SessionRecord>>;

    /// Merge `set` into the first record matching `filter`. Returns the number
    /// of records matched (0 or 1).
    async fn update_one(&self, filter: &Filter, set: &Document) -> Result<u64>;

    /// Remove the first record matching `filter`. Returns the number removed.
    async fn delete_one(&self, filter: &Filter) -> Result<u64>;

    /// Total number of stored records.
    async fn count(&self) -> Result<u64>;
}

/// Build the store selected by `config`.
pub async fn connect(config: &PersistenceConfig) -> Result<Arc<dyn SessionStore>> {
    match config.provider {
        StoreProvider::Memory => Ok(Arc::new(providers::memory::MemoryProvider::new())),
        StoreProvider::Postgres => {
            let Some(url) = config.database_url.as_deref().filter(|u| !u.trim().is_empty())
            else {
                bail!(
                    "persistence.database_url is not set; set DATABASE_URL or REPLAY_PERSISTENCE__DATABASE_URL"
                );
            };
            let provider =
                providers::postgres::PostgresProvider::new(url, config.max_connections).await?;
            Ok(Arc::new(provider))
        }
    }
}
