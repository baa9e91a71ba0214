//! In-process session store.
//!
//! Records live in a `BTreeMap` keyed by [`ObjectId`], so iteration order is
//! creation order. Used by tests and by `provider: memory` deployments where
//! losing data on restart is acceptable.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::persistence::{Document, Filter, ObjectId, SessionRecord, SessionStore};

#[derive(Debug, Default)]
pub struct MemoryProvider {
    records: RwLock<BTreeMap<ObjectId, Document>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

fn first_match(records: &BTreeMap<ObjectId, Document>, filter: &Filter) -> Option<ObjectId> {
    match filter {
        Filter::Id(id) => records.contains_key(id).then_some(*id),
        Filter::SessionId(_) => records
            .iter()
            .find(|(id, fields)| filter.matches(id, fields))
            .map(|(id, _)| *id),
    }
}

#[async_trait]
impl SessionStore for MemoryProvider {
    async fn insert_one(&self, fields: Document) -> Result<ObjectId> {
        let mut records = self.records.write().await;
        let mut id = ObjectId::new();
        while records.contains_key(&id) {
            id = ObjectId::new();
        }
        records.insert(id, fields);
        Ok(id)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<SessionRecord>> {
        let records = self.records.read().await;
        Ok(first_match(&records, filter).and_then(|id| {
            records.get(&id).map(|fields| SessionRecord {
                id,
                fields: fields.clone(),
            })
        }))
    }

    async fn find_recent(&self, limit: usize, exclude: &[&str]) -> Result<Vec<SessionRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .take(limit)
            .map(|(id, fields)| {
                let mut fields = fields.clone();
                for key in exclude {
                    fields.shift_remove(*key);
                }
                SessionRecord { id: *id, fields }
            })
            .collect())
    }

    async fn update_one(&self, filter: &Filter, set: &Document) -> Result<u64> {
        let mut records = self.records.write().await;
        let Some(id) = first_match(&records, filter) else {
            return Ok(0);
        };
        let Some(fields) = records.get_mut(&id) else {
            return Ok(0);
        };
        for (key, value) in set {
            fields.insert(key.clone(), value.clone());
        }
        Ok(1)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64> {
        let mut records = self.records.write().await;
        let removed = first_match(&records, filter).and_then(|id| records.remove(&id));
        Ok(u64::from(removed.is_some()))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().await.len() as u64)
    }
}
