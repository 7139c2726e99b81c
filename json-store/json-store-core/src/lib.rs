pub mod auth;
pub mod document;
pub mod error;
pub mod events;
pub mod path;
pub mod storage;
pub mod store;

pub use auth::{GroupPermissionEvaluator, PermissionEvaluator, PermissionSet, Principal};
pub use document::{JsonData, JsonDataMetadata, JsonDataValidator, ValidationMessage, Validator};
pub use error::{StoreError, StoreResult};
pub use store::{JsonDataStore, UpsertRequest, WriteMode};
