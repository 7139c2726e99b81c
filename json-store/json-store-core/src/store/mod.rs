//! Path-addressable JSON data store.
//!
//! [`JsonDataStore`] wraps a [`JsonDataRepository`] and exposes reads and
//! writes scoped to a dotted path inside a document's payload. Reads are
//! gated by the document's read permission (or its public flag), writes by
//! its edit permission. Every write is validated before it reaches the
//! repository and each call performs at most one repository mutation.

use crate::auth::{GroupPermissionEvaluator, PermissionEvaluator, Principal};
use crate::document::{JsonData, JsonDataMetadata, JsonDataValidator, ValidationMessage, Validator};
use crate::error::{StoreError, StoreResult};
use crate::events::{Event, EventBus};
use crate::path::{self, DataPath, PathOperation};
use crate::storage::{DuplicateXid, JsonDataRepository};
use serde_json::Value;
use std::sync::Arc;

/// How a write treats the node already at the target path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Shallow-merge when both sides are objects, otherwise overwrite.
    Append,
    /// Always overwrite.
    Replace,
}

impl WriteMode {
    fn operation(self, value: Value) -> PathOperation {
        match self {
            WriteMode::Append => PathOperation::Append(value),
            WriteMode::Replace => PathOperation::Replace(value),
        }
    }
}

/// Arguments of [`JsonDataStore::upsert`].
#[derive(Clone, Debug)]
pub struct UpsertRequest {
    pub xid: String,
    pub path: Option<String>,
    pub data: Option<Value>,
    pub metadata: JsonDataMetadata,
    pub mode: WriteMode,
    pub initiator_id: Option<String>,
}

impl UpsertRequest {
    pub fn new(xid: impl Into<String>, mode: WriteMode, data: Value) -> Self {
        Self {
            xid: xid.into(),
            path: None,
            data: Some(data),
            metadata: JsonDataMetadata::default(),
            mode,
            initiator_id: None,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn metadata(mut self, metadata: JsonDataMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn initiator(mut self, initiator_id: impl Into<String>) -> Self {
        self.initiator_id = Some(initiator_id.into());
        self
    }
}

pub struct JsonDataStore {
    repository: Arc<dyn JsonDataRepository>,
    permissions: Arc<dyn PermissionEvaluator>,
    validator: Arc<dyn Validator>,
    events: EventBus,
}

impl JsonDataStore {
    /// Store using group-intersection permissions and the default validator.
    pub fn new(repository: Arc<dyn JsonDataRepository>) -> Self {
        Self::with_collaborators(
            repository,
            Arc::new(GroupPermissionEvaluator),
            Arc::new(JsonDataValidator),
            EventBus::new(),
        )
    }

    pub fn with_collaborators(
        repository: Arc<dyn JsonDataRepository>,
        permissions: Arc<dyn PermissionEvaluator>,
        validator: Arc<dyn Validator>,
        events: EventBus,
    ) -> Self {
        Self {
            repository,
            permissions,
            validator,
            events,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Xids of every document the principal may read, sorted.
    pub async fn list(&self, principal: &Principal) -> StoreResult<Vec<String>> {
        let all = self
            .repository
            .get_all()
            .await
            .map_err(StoreError::internal)?;
        let mut xids: Vec<String> = all
            .into_iter()
            .filter(|doc| self.permissions.has_permission(principal, &doc.read_permission))
            .map(|doc| doc.xid)
            .collect();
        xids.sort();
        Ok(xids)
    }

    /// Read a document, or the node at `path` inside its payload.
    pub async fn get(&self, principal: &Principal, xid: &str, path: Option<&str>) -> StoreResult<JsonData> {
        let doc = self.fetch_existing(xid).await?;
        if !self.permissions.has_permission(principal, &doc.read_permission) {
            tracing::warn!("user '{}' may not read json data '{}'", principal.user_id, xid);
            return Err(StoreError::Unauthorized(xid.to_string()));
        }
        narrow(doc, path)
    }

    /// Read a document flagged as public, without a permission check.
    pub async fn get_public(&self, xid: &str, path: Option<&str>) -> StoreResult<JsonData> {
        let doc = self.fetch_existing(xid).await?;
        if !doc.public_data {
            return Err(StoreError::Unauthorized(xid.to_string()));
        }
        narrow(doc, path)
    }

    /// Write `data` into a document, creating it when a replace names an
    /// unknown xid. A new document takes `data` as its whole payload; any
    /// path is ignored since there is nothing to address yet.
    ///
    /// The returned document reflects the persisted metadata, but its
    /// payload is only the supplied data rather than the full merged tree.
    pub async fn upsert(&self, principal: &Principal, request: UpsertRequest) -> StoreResult<JsonData> {
        self.write(principal, request, false).await
    }

    async fn write(&self, principal: &Principal, request: UpsertRequest, create_only: bool) -> StoreResult<JsonData> {
        let UpsertRequest {
            xid,
            path,
            data,
            metadata,
            mode,
            initiator_id,
        } = request;
        let path = path.as_deref().map(DataPath::parse);

        let (mut doc, created) = match self.fetch(&xid).await? {
            Some(_) if create_only => return Err(StoreError::AlreadyExists(xid)),
            Some(doc) => {
                self.ensure_can_edit(principal, &doc)?;
                (doc, false)
            }
            None if mode == WriteMode::Append => return Err(StoreError::NotFound(xid)),
            None => (JsonData::new(xid.clone(), JsonDataMetadata::default(), None), true),
        };

        doc.apply_metadata(metadata);
        match (&path, &data) {
            _ if created => doc.json_data = data.clone(),
            (None, _) => doc.json_data = data.clone(),
            (Some(path), Some(value)) => {
                let found = doc
                    .json_data
                    .as_mut()
                    .is_some_and(|root| path::modify(root, path, mode.operation(value.clone())));
                if !found {
                    return Err(StoreError::PathNotFound {
                        xid,
                        path: path.to_string(),
                    });
                }
            }
            (Some(_), None) => {
                return Err(StoreError::ValidationFailed {
                    document: Box::new(doc.with_payload(None)),
                    messages: vec![ValidationMessage::error("validate.required", "jsonData")],
                });
            }
        }

        let messages = self.validator.validate(&doc);
        if !messages.is_empty() {
            return Err(StoreError::ValidationFailed {
                document: Box::new(doc.with_payload(data)),
                messages,
            });
        }

        // the caller must keep edit access under the new permissions
        if !self.permissions.has_permission(principal, &doc.edit_permission) {
            return Err(StoreError::ValidationFailed {
                document: Box::new(doc.with_payload(data)),
                messages: vec![ValidationMessage::error(
                    "jsonData.editPermissionRequired",
                    "editPermission",
                )],
            });
        }

        self.persist(&doc, initiator_id.as_deref()).await?;
        tracing::debug!(
            "{} json data '{}' at {}",
            if created { "created" } else { "updated" },
            xid,
            path.as_ref().map_or_else(|| "<root>".to_string(), ToString::to_string)
        );

        let event = if created {
            Event::Created { xid, initiator_id }
        } else {
            Event::Updated { xid, initiator_id }
        };
        self.events.send(event);

        Ok(doc.with_payload(data))
    }

    /// Create a new document, failing if the xid is already taken.
    pub async fn create(
        &self,
        principal: &Principal,
        xid: &str,
        data: Value,
        metadata: JsonDataMetadata,
        initiator_id: Option<&str>,
    ) -> StoreResult<JsonData> {
        let mut request = UpsertRequest::new(xid, WriteMode::Replace, data).metadata(metadata);
        request.initiator_id = initiator_id.map(str::to_string);
        self.write(principal, request, true).await
    }

    /// Delete a whole document, or the member named by `path`.
    ///
    /// For a path delete, a failed save is reported as
    /// [`StoreError::Internal`] carrying the mutated document; the stored
    /// copy may still hold the member, so callers should re-fetch.
    pub async fn delete_path(
        &self,
        principal: &Principal,
        xid: &str,
        path: Option<&str>,
        initiator_id: Option<&str>,
    ) -> StoreResult<JsonData> {
        let mut doc = self.fetch_existing(xid).await?;
        self.ensure_can_edit(principal, &doc)?;

        let Some(path) = path.map(DataPath::parse) else {
            self.repository.delete(doc.id).await.map_err(|e| {
                tracing::error!("failed to delete json data '{}': {}", xid, e);
                StoreError::internal(e)
            })?;
            tracing::debug!("deleted json data '{}'", xid);
            self.events.send(Event::Deleted {
                xid: xid.to_string(),
                initiator_id: initiator_id.map(str::to_string),
            });
            return Ok(doc);
        };

        let removed = doc
            .json_data
            .as_mut()
            .is_some_and(|root| path::modify(root, &path, PathOperation::Delete));
        if !removed {
            return Err(StoreError::PathNotFound {
                xid: xid.to_string(),
                path: path.to_string(),
            });
        }

        let messages = self.validator.validate(&doc);
        if !messages.is_empty() {
            return Err(StoreError::ValidationFailed {
                document: Box::new(doc),
                messages,
            });
        }

        if let Err(e) = self.repository.save(&doc, initiator_id).await {
            tracing::error!("failed to save json data '{}' after removing {}: {}", xid, path, e);
            return Err(StoreError::Internal {
                document: Some(Box::new(doc)),
                source: e,
            });
        }
        tracing::debug!("removed {} from json data '{}'", path, xid);
        self.events.send(Event::Updated {
            xid: xid.to_string(),
            initiator_id: initiator_id.map(str::to_string),
        });
        Ok(doc)
    }

    async fn fetch(&self, xid: &str) -> StoreResult<Option<JsonData>> {
        self.repository
            .get_by_xid(xid)
            .await
            .map_err(StoreError::internal)
    }

    async fn fetch_existing(&self, xid: &str) -> StoreResult<JsonData> {
        self.fetch(xid)
            .await?
            .ok_or_else(|| StoreError::NotFound(xid.to_string()))
    }

    async fn persist(&self, doc: &JsonData, initiator_id: Option<&str>) -> StoreResult<()> {
        self.repository.save(doc, initiator_id).await.map_err(|e| {
            if e.downcast_ref::<DuplicateXid>().is_some() {
                return StoreError::AlreadyExists(doc.xid.clone());
            }
            tracing::error!("failed to save json data '{}': {}", doc.xid, e);
            StoreError::internal(e)
        })
    }

    fn ensure_can_edit(&self, principal: &Principal, doc: &JsonData) -> StoreResult<()> {
        if self.permissions.has_permission(principal, &doc.edit_permission) {
            return Ok(());
        }
        tracing::warn!("user '{}' may not edit json data '{}'", principal.user_id, doc.xid);
        Err(StoreError::Unauthorized(doc.xid.clone()))
    }
}

/// Replace the payload of `doc` with the node at `path`.
fn narrow(doc: JsonData, path: Option<&str>) -> StoreResult<JsonData> {
    let Some(path) = path.map(DataPath::parse) else {
        return Ok(doc);
    };
    let node = doc
        .json_data
        .as_ref()
        .and_then(|root| path::resolve(root, &path))
        .cloned()
        .ok_or_else(|| StoreError::PathNotFound {
            xid: doc.xid.clone(),
            path: path.to_string(),
        })?;
    Ok(doc.with_payload(Some(node)))
}
