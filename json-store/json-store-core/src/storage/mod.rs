//! Repositories that persist [`JsonData`] documents.
//!
//! The store only needs lookups by xid, a full listing, save and delete by
//! id. Two backends are provided: an in-memory map and a directory of JSON
//! files loaded at startup.

use crate::document::JsonData;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

pub mod file;
pub mod memory;

pub use file::FileRepository;
pub use memory::MemoryRepository;

/// Persistence backend for JSON data documents.
///
/// Implementations hand out clones; mutating a returned document never
/// affects stored state until it is passed back to [`save`](Self::save).
#[async_trait]
pub trait JsonDataRepository: Send + Sync {
    async fn get_by_xid(&self, xid: &str) -> Result<Option<JsonData>>;
    async fn get_all(&self) -> Result<Vec<JsonData>>;
    /// Insert or update by `id`. `initiator_id` identifies the client that
    /// caused the change.
    async fn save(&self, doc: &JsonData, initiator_id: Option<&str>) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Save refused because another document already owns the xid.
#[derive(Debug, Error)]
#[error("xid '{xid}' is already used by {owner}")]
pub struct DuplicateXid {
    pub xid: String,
    pub owner: Uuid,
}

/// Refuse to store a document whose xid belongs to a different id.
fn ensure_unique_xid(docs: &HashMap<Uuid, JsonData>, doc: &JsonData) -> Result<()> {
    if let Some(other) = docs.values().find(|d| d.xid == doc.xid && d.id != doc.id) {
        return Err(DuplicateXid {
            xid: doc.xid.clone(),
            owner: other.id,
        }
        .into());
    }
    Ok(())
}
