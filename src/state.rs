//! The per-instance resource state record.
//!
//! [`ResourceState`] is the local, mutable record the lifecycle operations
//! read from and write to. It holds the provider-assigned identifier plus a
//! flat attribute map, and converts to and from the `serde_json::Value`
//! shape the [`ProviderService`](crate::provider::ProviderService) trait
//! exchanges with the orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProviderError;

/// Mutable state record for a single resource instance.
///
/// The identifier is empty until the resource is created (or imported);
/// once set it doubles as the remote key of the entity it tracks. Clearing
/// the identifier marks the resource as absent, which tells the
/// orchestrator to schedule recreation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// The provider-assigned identifier.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    id: String,
    /// All remaining attributes, keyed by schema attribute name.
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl ResourceState {
    /// Create an empty state with no identifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state carrying only an identifier.
    ///
    /// This is the seed state for an import: the attributes are filled in
    /// by the subsequent read.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }

    /// Deserialize a state record from its JSON representation.
    pub fn from_value(value: Value) -> Result<Self, ProviderError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize this state record back into its JSON representation.
    ///
    /// The identifier is included under `"id"` only when set.
    pub fn into_value(self) -> Value {
        let mut map = self.attributes;
        if !self.id.is_empty() {
            map.insert("id".to_string(), Value::String(self.id));
        }
        Value::Object(map)
    }

    /// The provider-assigned identifier, or `""` if unset.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the provider-assigned identifier.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Clear the identifier, marking the resource as absent.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// Whether this state refers to an existing remote entity.
    pub fn is_present(&self) -> bool {
        !self.id.is_empty()
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Get an attribute as a string slice.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// Set an attribute value, replacing any previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }
}
