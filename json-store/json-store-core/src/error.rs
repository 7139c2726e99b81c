use crate::document::{JsonData, ValidationMessage};
use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("json data '{0}' does not exist")]
    NotFound(String),

    #[error("path '{path}' does not exist in json data '{xid}'")]
    PathNotFound { xid: String, path: String },

    #[error("unauthorized access to json data '{0}'")]
    Unauthorized(String),

    #[error("json data '{0}' already exists")]
    AlreadyExists(String),

    /// Nothing was persisted; `document` is the attempted model.
    #[error("validation failed for json data '{}'", .document.xid)]
    ValidationFailed {
        document: Box<JsonData>,
        messages: Vec<ValidationMessage>,
    },

    /// Repository failure. `document` is set when the caller was already
    /// handed a mutated model that may not have been persisted.
    #[error("internal error: {source}")]
    Internal {
        document: Option<Box<JsonData>>,
        #[source]
        source: anyhow::Error,
    },
}

impl StoreError {
    pub(crate) fn internal(source: anyhow::Error) -> Self {
        Self::Internal {
            document: None,
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::PathNotFound { .. })
    }
}
