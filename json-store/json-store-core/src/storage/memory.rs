use super::{ensure_unique_xid, JsonDataRepository};
use crate::document::JsonData;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Volatile repository keyed by document id.
#[derive(Default)]
pub struct MemoryRepository {
    docs: RwLock<HashMap<Uuid, JsonData>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

#[async_trait]
impl JsonDataRepository for MemoryRepository {
    async fn get_by_xid(&self, xid: &str) -> Result<Option<JsonData>> {
        Ok(self.docs.read().values().find(|d| d.xid == xid).cloned())
    }

    async fn get_all(&self) -> Result<Vec<JsonData>> {
        Ok(self.docs.read().values().cloned().collect())
    }

    async fn save(&self, doc: &JsonData, _initiator_id: Option<&str>) -> Result<()> {
        let mut docs = self.docs.write();
        ensure_unique_xid(&docs, doc)?;
        docs.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.docs
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("document {} not found", id))
    }
}
