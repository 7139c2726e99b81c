//! Filesystem-backed repository: one `<id>.json` file per document, loaded
//! into memory when the repository is opened.

use super::{ensure_unique_xid, JsonDataRepository};
use crate::document::JsonData;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

const EXTENSION: &str = "json";

pub struct FileRepository {
    dir: PathBuf,
    docs: RwLock<HashMap<Uuid, JsonData>>,
    /// Held across check, write and insert so xid ownership cannot race.
    writes: Mutex<()>,
}

impl FileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mut docs = HashMap::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type()?.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION)
            {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| Uuid::parse_str(s).ok())
            else {
                continue;
            };
            match Self::load(&path) {
                Ok(doc) if doc.id == id => {
                    docs.insert(id, doc);
                }
                Ok(doc) => {
                    tracing::warn!("skipping {}: file holds document {}", path.display(), doc.id);
                }
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
        tracing::debug!("loaded {} json data documents from {}", docs.len(), dir.display());

        Ok(Self {
            dir,
            docs: RwLock::new(docs),
            writes: Mutex::new(()),
        })
    }

    /// Directory where documents are persisted.
    pub fn data_dir(&self) -> &Path {
        &self.dir
    }

    fn load(path: &Path) -> Result<JsonData> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.{}", id, EXTENSION))
    }
}

#[async_trait]
impl JsonDataRepository for FileRepository {
    async fn get_by_xid(&self, xid: &str) -> Result<Option<JsonData>> {
        Ok(self.docs.read().values().find(|d| d.xid == xid).cloned())
    }

    async fn get_all(&self) -> Result<Vec<JsonData>> {
        Ok(self.docs.read().values().cloned().collect())
    }

    async fn save(&self, doc: &JsonData, initiator_id: Option<&str>) -> Result<()> {
        let _writing = self.writes.lock().await;
        ensure_unique_xid(&self.docs.read(), doc)?;

        let bytes = serde_json::to_vec_pretty(doc)?;
        let path = self.path(doc.id);
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        self.docs.write().insert(doc.id, doc.clone());
        tracing::debug!(
            "saved json data '{}' to {} (initiator: {:?})",
            doc.xid,
            path.display(),
            initiator_id
        );
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let _writing = self.writes.lock().await;
        if !self.docs.read().contains_key(&id) {
            return Err(anyhow!("document {} not found", id));
        }
        tokio::fs::remove_file(self.path(id)).await?;
        self.docs.write().remove(&id);
        Ok(())
    }
}
