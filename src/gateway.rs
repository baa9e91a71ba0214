//! Session Store Gateway.
//!
//! Flat set of operation handlers over one injected [`SessionStore`]. The only
//! shared policy is identifier resolution: callers may hold either the native
//! id or the application-level `sessionId`, and get/update/delete accept both
//! without being told which one they were given.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::persistence::{Document, Filter, ObjectId, SESSION_ID_FIELD, SessionStore};

/// Default page size for [`SessionGateway::list`].
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Field stripped from list responses.
pub const EVENTS_FIELD: &str = "events";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// An update carried no fields.
    #[error("No data provided")]
    EmptyUpdate,

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Identifiers handed back by [`SessionGateway::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSession {
    pub session_id: String,
    pub internal_id: String,
}

/// One page of [`SessionGateway::list`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionPage {
    pub sessions: Vec<Document>,
    /// Number of sessions in this page, not the collection size.
    pub count: usize,
}

/// Filters to try for `id`, in order: native id (only when `id` parses as
/// one), then `sessionId`. Operations stop at the first filter that matches.
pub fn resolution_order(id: &str) -> Vec<Filter> {
    let mut filters = Vec::with_capacity(2);
    if let Ok(native) = id.parse::<ObjectId>() {
        filters.push(Filter::Id(native));
    }
    filters.push(Filter::SessionId(id.to_string()));
    filters
}

#[derive(Debug, Clone)]
pub struct SessionGateway {
    store: Arc<dyn SessionStore>,
}

impl SessionGateway {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Insert `document`, then stamp its `sessionId` with the native id.
    ///
    /// The two writes are not atomic: a concurrent reader can observe the
    /// record before `sessionId` is set.
    pub async fn create(&self, document: Document) -> Result<CreatedSession> {
        let id = self.store.insert_one(document).await?;
        let sid = id.to_hex();

        let mut stamp = Document::new();
        stamp.insert(SESSION_ID_FIELD.to_string(), Value::String(sid.clone()));
        self.store.update_one(&Filter::Id(id), &stamp).await?;

        info!(name: "session.created", session_id = %sid, "Session created");
        Ok(CreatedSession {
            session_id: sid.clone(),
            internal_id: sid,
        })
    }

    /// Full record for `id`, rendered with `internalId` as a string.
    pub async fn get(&self, id: &str) -> Result<Option<Document>> {
        for filter in resolution_order(id) {
            if let Some(record) = self.store.find_one(&filter).await? {
                debug!(session_id = %id, ?filter, "Session resolved");
                return Ok(Some(record.into_document()));
            }
        }
        Ok(None)
    }

    /// Newest sessions first, at most `limit`, without their events.
    pub async fn list(&self, limit: usize) -> Result<SessionPage> {
        let sessions: Vec<Document> = self
            .store
            .find_recent(limit, &[EVENTS_FIELD])
            .await?
            .into_iter()
            .map(|record| record.into_document())
            .collect();

        Ok(SessionPage {
            count: sessions.len(),
            sessions,
        })
    }

    /// Merge `document` into the record `id` resolves to. Returns whether a
    /// record matched.
    pub async fn update(&self, id: &str, document: &Document) -> Result<bool> {
        if document.is_empty() {
            return Err(GatewayError::EmptyUpdate);
        }

        for filter in resolution_order(id) {
            if self.store.update_one(&filter, document).await? > 0 {
                info!(name: "session.updated", session_id = %id, fields = document.len(), "Session updated");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Remove the record `id` resolves to. Returns whether one was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        for filter in resolution_order(id) {
            if self.store.delete_one(&filter).await? > 0 {
                info!(name: "session.deleted", session_id = %id, "Session deleted");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// One cheap store round-trip; returns the collection size.
    pub async fn ping(&self) -> Result<u64> {
        Ok(self.store.count().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::SessionRecord;
    use crate::persistence::providers::memory::MemoryProvider;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn gateway() -> SessionGateway {
        SessionGateway::new(Arc::new(MemoryProvider::new()))
    }

    #[derive(Debug)]
    struct FailingStore;

    #[async_trait]
    impl SessionStore for FailingStore {
        async fn insert_one(&self, _: Document) -> anyhow::Result<ObjectId> {
            Err(anyhow!("connection refused"))
        }
        async fn find_one(&self, _: &Filter) -> anyhow::Result<Option<SessionRecord>> {
            Err(anyhow!("connection refused"))
        }
        async fn find_recent(&self, _: usize, _: &[&str]) -> anyhow::Result<Vec<SessionRecord>> {
            Err(anyhow!("connection refused"))
        }
        async fn update_one(&self, _: &Filter, _: &Document) -> anyhow::Result<u64> {
            Err(anyhow!("connection refused"))
        }
        async fn delete_one(&self, _: &Filter) -> anyhow::Result<u64> {
            Err(anyhow!("connection refused"))
        }
        async fn count(&self) -> anyhow::Result<u64> {
            Err(anyhow!("connection refused"))
        }
    }

    #[test]
    fn resolution_tries_native_id_first() {
        let hex = "65a1b2c3d4e5f60718293a4b";
        let order = resolution_order(hex);
        assert_eq!(
            order,
            [
                Filter::Id(hex.parse().unwrap()),
                Filter::SessionId(hex.to_string())
            ]
        );
    }

    #[test]
    fn resolution_skips_unparseable_native_id() {
        assert_eq!(
            resolution_order("doesnotexist"),
            [Filter::SessionId("doesnotexist".to_string())]
        );
    }

    #[tokio::test]
    async fn create_stamps_session_id() {
        let gw = gateway();
        let created = gw.create(doc(json!({"player": "a"}))).await.unwrap();
        assert_eq!(created.session_id, created.internal_id);
        assert!(created.session_id.parse::<ObjectId>().is_ok());

        let record = gw.get(&created.session_id).await.unwrap().unwrap();
        assert_eq!(record["player"], json!("a"));
        assert_eq!(record["sessionId"], json!(created.session_id));
        assert_eq!(record["internalId"], json!(created.internal_id));
    }

    #[tokio::test]
    async fn create_accepts_empty_document() {
        let gw = gateway();
        let created = gw.create(Document::new()).await.unwrap();
        let record = gw.get(&created.internal_id).await.unwrap().unwrap();
        assert_eq!(record.len(), 2);
    }

    #[tokio::test]
    async fn get_falls_back_to_custom_session_id() {
        let gw = gateway();
        let created = gw.create(doc(json!({"n": 1}))).await.unwrap();
        gw.update(&created.internal_id, &doc(json!({"sessionId": "checkout-42"})))
            .await
            .unwrap();

        let by_custom = gw.get("checkout-42").await.unwrap().unwrap();
        assert_eq!(by_custom["internalId"], json!(created.internal_id));
        // The native id still resolves even though sessionId no longer matches.
        assert!(gw.get(&created.internal_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn get_falls_back_when_native_id_parses_but_misses() {
        let gw = gateway();
        let created = gw.create(Document::new()).await.unwrap();
        let lookalike = "aaaaaaaaaaaaaaaaaaaaaaaa";
        gw.update(&created.internal_id, &doc(json!({"sessionId": lookalike})))
            .await
            .unwrap();

        let record = gw.get(lookalike).await.unwrap().unwrap();
        assert_eq!(record["internalId"], json!(created.internal_id));
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let gw = gateway();
        assert!(gw.get("doesnotexist").await.unwrap().is_none());
        assert!(gw.get(&ObjectId::new().to_hex()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first_without_events() {
        let gw = gateway();
        let mut ids = Vec::new();
        for n in 0..4 {
            let created = gw
                .create(doc(json!({"n": n, "events": [{"type": "tap"}]})))
                .await
                .unwrap();
            ids.push(created.internal_id);
        }

        let page = gw.list(3).await.unwrap();
        assert_eq!(page.count, 3);
        let got: Vec<&Value> = page.sessions.iter().map(|s| &s["internalId"]).collect();
        assert_eq!(got, [&json!(ids[3]), &json!(ids[2]), &json!(ids[1])]);
        assert!(page.sessions.iter().all(|s| !s.contains_key(EVENTS_FIELD)));

        // The full record keeps its events.
        let full = gw.get(&ids[0]).await.unwrap().unwrap();
        assert!(full.contains_key(EVENTS_FIELD));
    }

    #[tokio::test]
    async fn list_zero_is_empty() {
        let gw = gateway();
        gw.create(Document::new()).await.unwrap();
        let page = gw.list(0).await.unwrap();
        assert_eq!(page.count, 0);
        assert!(page.sessions.is_empty());
    }

    #[tokio::test]
    async fn update_merges_and_keeps_other_fields() {
        let gw = gateway();
        let created = gw
            .create(doc(json!({"player": "a", "score": 1})))
            .await
            .unwrap();

        assert!(gw.update(&created.session_id, &doc(json!({"score": 2}))).await.unwrap());

        let record = gw.get(&created.session_id).await.unwrap().unwrap();
        assert_eq!(record["score"], json!(2));
        assert_eq!(record["player"], json!("a"));
    }

    #[tokio::test]
    async fn update_rejects_empty_document_before_resolution() {
        let gw = gateway();
        let err = gw.update("doesnotexist", &Document::new()).await.unwrap_err();
        assert!(matches!(err, GatewayError::EmptyUpdate));
    }

    #[tokio::test]
    async fn update_missing_changes_nothing() {
        let gw = gateway();
        let created = gw.create(doc(json!({"player": "a"}))).await.unwrap();

        assert!(!gw.update("doesnotexist", &doc(json!({"player": "b"}))).await.unwrap());

        let record = gw.get(&created.session_id).await.unwrap().unwrap();
        assert_eq!(record["player"], json!("a"));
        assert_eq!(gw.ping().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_then_get_and_delete_again_are_not_found() {
        let gw = gateway();
        let created = gw.create(doc(json!({"player": "a"}))).await.unwrap();

        assert!(gw.delete(&created.session_id).await.unwrap());
        assert!(gw.get(&created.session_id).await.unwrap().is_none());
        assert!(!gw.delete(&created.session_id).await.unwrap());
        assert_eq!(gw.ping().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn store_faults_propagate() {
        let gw = SessionGateway::new(Arc::new(FailingStore));
        let err = gw.create(Document::new()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Store(_)));
        assert_eq!(err.to_string(), "connection refused");
        assert!(gw.get("x").await.is_err());
        assert!(gw.list(1).await.is_err());
        assert!(gw.delete("x").await.is_err());
        assert!(gw.ping().await.is_err());
    }
}
