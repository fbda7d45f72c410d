/// Patch request and store operation types.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::path::FieldAddress;
use crate::document::validate::ValidationError;

/// Body of a patch request: one path and the value to store there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl PatchRequest {
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: Some(path.into()),
            value,
        }
    }

    /// Resolve the path into a field address.
    pub fn address(&self) -> Result<FieldAddress, ValidationError> {
        FieldAddress::parse(self.path.as_deref())
    }
}

/// A resolved single-field set, ready to hand to a document store.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    pub address: FieldAddress,
    pub value: Value,
    /// Stamped into `dateUpdated` alongside the field write.
    pub timestamp: DateTime<Utc>,
    /// Refuse to change the JSON shape of an existing value.
    pub strict: bool,
}

impl SetOperation {
    pub fn new(address: FieldAddress, value: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            address,
            value,
            timestamp,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
