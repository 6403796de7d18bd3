//! Raw documents as held by the store

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use core_kernel::PortError;

/// A stored record: an id plus a JSON object body
///
/// The body is the serialized entity with camelCase field names. The store
/// never interprets it beyond the fields named in a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub body: Value,
}

impl Document {
    /// Wraps a raw body, rejecting anything that is not a JSON object
    pub fn new(id: Uuid, body: Value) -> Result<Self, PortError> {
        if !body.is_object() {
            return Err(PortError::serialization(format!(
                "document {} body must be an object",
                id
            )));
        }
        Ok(Self { id, body })
    }

    /// Serializes a typed entity into a document
    pub fn from_entity<T: Serialize>(id: Uuid, entity: &T) -> Result<Self, PortError> {
        let body = serde_json::to_value(entity)
            .map_err(|e| PortError::serialization(format!("encode {}: {}", id, e)))?;
        Self::new(id, body)
    }

    /// Deserializes the body into a typed entity
    pub fn to_entity<T: DeserializeOwned>(&self) -> Result<T, PortError> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| PortError::serialization(format!("decode {}: {}", self.id, e)))
    }

    /// Returns a top-level field of the body
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }
}
