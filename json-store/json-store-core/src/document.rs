//! JSON data documents and their validation.

use crate::auth::PermissionSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const XID_MAX_LEN: usize = 100;
const NAME_MAX_LEN: usize = 255;

/// A named JSON document addressed by its `xid`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonData {
    pub id: Uuid,
    pub xid: String,
    pub name: String,
    pub public_data: bool,
    pub read_permission: PermissionSet,
    pub edit_permission: PermissionSet,
    /// `None` when no payload was supplied at all.
    pub json_data: Option<Value>,
}

/// The caller-supplied fields that are always overwritten on write.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonDataMetadata {
    pub name: String,
    pub public_data: bool,
    pub read_permission: PermissionSet,
    pub edit_permission: PermissionSet,
}

impl JsonData {
    pub fn new(xid: impl Into<String>, metadata: JsonDataMetadata, json_data: Option<Value>) -> Self {
        let mut doc = Self {
            id: Uuid::new_v4(),
            xid: xid.into(),
            name: String::new(),
            public_data: false,
            read_permission: PermissionSet::new(),
            edit_permission: PermissionSet::new(),
            json_data,
        };
        doc.apply_metadata(metadata);
        doc
    }

    pub fn apply_metadata(&mut self, metadata: JsonDataMetadata) {
        self.name = metadata.name;
        self.public_data = metadata.public_data;
        self.read_permission = metadata.read_permission;
        self.edit_permission = metadata.edit_permission;
    }

    pub fn metadata(&self) -> JsonDataMetadata {
        JsonDataMetadata {
            name: self.name.clone(),
            public_data: self.public_data,
            read_permission: self.read_permission.clone(),
            edit_permission: self.edit_permission.clone(),
        }
    }

    /// Copy of this document carrying `json_data` as its payload.
    pub fn with_payload(&self, json_data: Option<Value>) -> Self {
        Self {
            json_data,
            ..self.clone()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageLevel {
    Error,
    Warning,
    Info,
}

/// A field-level validation problem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    pub key: String,
    pub level: MessageLevel,
    pub property: String,
}

impl ValidationMessage {
    pub fn error(key: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            level: MessageLevel::Error,
            property: property.into(),
        }
    }
}

pub trait Validator: Send + Sync {
    /// An empty result means the document is valid.
    fn validate(&self, doc: &JsonData) -> Vec<ValidationMessage>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDataValidator;

impl Validator for JsonDataValidator {
    fn validate(&self, doc: &JsonData) -> Vec<ValidationMessage> {
        let mut messages = Vec::new();

        if doc.xid.trim().is_empty() {
            messages.push(ValidationMessage::error("validate.required", "xid"));
        } else if doc.xid.chars().count() > XID_MAX_LEN {
            messages.push(ValidationMessage::error("validate.notLongerThan", "xid"));
        }

        if doc.name.chars().count() > NAME_MAX_LEN {
            messages.push(ValidationMessage::error("validate.notLongerThan", "name"));
        }

        if doc.json_data.is_none() {
            messages.push(ValidationMessage::error("validate.required", "jsonData"));
        }

        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata() -> JsonDataMetadata {
        JsonDataMetadata {
            name: "Dashboard layout".to_string(),
            public_data: true,
            read_permission: PermissionSet::explode("viewers"),
            edit_permission: PermissionSet::explode("operators"),
        }
    }

    #[test]
    fn serializes_permissions_as_strings() {
        let doc = JsonData::new("layout", metadata(), Some(json!({"cols": 3})));
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["xid"], "layout");
        assert_eq!(value["publicData"], true);
        assert_eq!(value["readPermission"], "viewers");
        assert_eq!(value["editPermission"], "operators");
        assert_eq!(value["jsonData"], json!({"cols": 3}));

        let back: JsonData = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn validator_flags_missing_fields() {
        let validator = JsonDataValidator;
        assert!(validator
            .validate(&JsonData::new("layout", metadata(), Some(json!(null))))
            .is_empty());

        let messages = validator.validate(&JsonData::new("  ", metadata(), None));
        let properties: Vec<_> = messages.iter().map(|m| m.property.as_str()).collect();
        assert_eq!(properties, ["xid", "jsonData"]);

        let long = JsonData::new("x".repeat(XID_MAX_LEN + 1), metadata(), Some(json!({})));
        assert_eq!(
            validator.validate(&long),
            vec![ValidationMessage::error("validate.notLongerThan", "xid")]
        );
    }
}
