use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::ModelError;
use crate::instance::InstanceRef;
use crate::model::GeneratedType;

/// One registration record per descriptor, produced at lock time and consumed
/// entirely by the external facet manager.
#[derive(Clone)]
pub struct FacetTarget {
    pub generated_type: Arc<GeneratedType>,
    pub key: String,
    pub container_key: Option<String>,
    pub access_method: String,
    pub inverse_access_method: String,
}

impl std::fmt::Debug for FacetTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetTarget")
            .field("key", &self.key)
            .field("container_key", &self.container_key)
            .field("access_method", &self.access_method)
            .field("inverse_access_method", &self.inverse_access_method)
            .finish()
    }
}

/// External extension system attaching capabilities to instances.
///
/// `register_target` is called once per descriptor at lock time; its failures
/// propagate untranslated. `apply_extension` is called once per instance
/// construction, before any configuration is applied.
pub trait FacetManager: Send + Sync {
    fn register_target(&self, target: FacetTarget) -> Result<(), ModelError>;
    fn apply_extension(&self, instance: &InstanceRef) -> Result<(), ModelError>;
}

/// A capability attached to an instance by a facet manager.
///
/// Capabilities participate in dotted-path configuration: a path segment
/// resolves through `nested`, and the final segment is assigned through `set`.
pub trait Capability: Send + Sync {
    /// Key under which this capability is looked up on the instance.
    fn capability_key(&self) -> &str;

    /// Resolves a nested configuration segment, if this capability has one.
    fn nested(&self, _segment: &str) -> Option<Arc<dyn Capability>> {
        None
    }

    /// Assigns a property; returns false when the property is unsupported.
    fn set(&self, property: &str, value: Value) -> bool;

    fn get(&self, property: &str) -> Option<Value>;
}

/// Map-backed capability with a declared field set.
///
/// Mirrors the shape most facet managers need: a keyed bag of settable values
/// where anything outside the declared fields is rejected.
pub struct MapCapability {
    key: String,
    fields: BTreeSet<String>,
    values: Mutex<BTreeMap<String, Value>>,
}

impl MapCapability {
    pub fn new<I, S>(key: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            values: Mutex::new(BTreeMap::new()),
        }
    }
}

impl Capability for MapCapability {
    fn capability_key(&self) -> &str {
        &self.key
    }

    fn set(&self, property: &str, value: Value) -> bool {
        if !self.fields.contains(property) {
            return false;
        }
        self.values.lock().insert(property.to_string(), value);
        true
    }

    fn get(&self, property: &str) -> Option<Value> {
        self.values.lock().get(property).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn map_capability_rejects_undeclared_fields() {
        let capability = MapCapability::new("gwt", ["with_lookup"]);
        assert!(capability.set("with_lookup", json!(true)));
        assert_eq!(capability.get("with_lookup"), Some(json!(true)));
        assert!(!capability.set("unknown", json!(1)));
        assert_eq!(capability.get("unknown"), None);
    }
}
