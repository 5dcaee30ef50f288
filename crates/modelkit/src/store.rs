use std::sync::Arc;

use indexmap::IndexMap;

use crate::descriptor::ElementDescriptor;
use crate::error::ModelError;
use crate::instance::InstanceRef;
use crate::log::LogSink;

pub(crate) fn missing_instance(element: &ElementDescriptor, id: &str) -> ModelError {
    ModelError::Lookup(format!(
        "No {} with {} '{}' defined.",
        element.key(),
        element.identity_field(),
        id
    ))
}

/// Ordered keyed store backing one containment edge.
///
/// Keys are identity values in canonical string form, iteration order is
/// insertion order and is never re-sorted. Duplicate registration is non-fatal
/// by design: it is reported through the log sink and the existing entry is
/// overwritten (last write wins), unlike the fatal schema-level duplicate
/// check in the registry.
pub struct InstanceStore {
    element: Arc<ElementDescriptor>,
    entries: IndexMap<String, InstanceRef>,
}

impl InstanceStore {
    pub(crate) fn new(element: Arc<ElementDescriptor>) -> Self {
        Self {
            element,
            entries: IndexMap::new(),
        }
    }

    pub fn element(&self) -> &ElementDescriptor {
        &self.element
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Result<InstanceRef, ModelError> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| missing_instance(&self.element, id))
    }

    /// Identity values in insertion order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Instances in insertion order.
    pub fn values(&self) -> Vec<InstanceRef> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn register(&mut self, id: &str, instance: InstanceRef, log: &dyn LogSink) {
        if self.entries.contains_key(id) {
            log.error(&format!(
                "Attempting to register a duplicate {} with {} '{}'. The existing instance will be replaced.",
                self.element.key(),
                self.element.identity_field(),
                id
            ));
        }
        self.entries.insert(id.to_string(), instance);
    }
}
