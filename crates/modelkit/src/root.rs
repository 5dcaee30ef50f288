use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::ModelError;
use crate::instance::{InitCallback, InstanceRef};
use crate::log::LogSink;
use crate::model::GeneratedType;
use crate::store::InstanceStore;

/// Top-level namespace carrying the accessor set of every container-less
/// element: the same create/exists/get/list/list-ids/non-empty family a
/// generated container type gets, attached at lock time.
///
/// Cheaply cloneable handle; clones share the same stores.
#[derive(Clone)]
pub struct RootNamespace {
    inner: Arc<RootInner>,
}

struct RootInner {
    registry_key: String,
    elements: RwLock<IndexMap<String, Arc<GeneratedType>>>,
    stores: RwLock<IndexMap<String, InstanceStore>>,
    log: Arc<dyn LogSink>,
}

impl RootNamespace {
    pub(crate) fn new(registry_key: &str, log: Arc<dyn LogSink>) -> Self {
        Self {
            inner: Arc::new(RootInner {
                registry_key: registry_key.to_string(),
                elements: RwLock::new(IndexMap::new()),
                stores: RwLock::new(IndexMap::new()),
                log,
            }),
        }
    }

    pub(crate) fn attach(&self, generated: Arc<GeneratedType>) {
        let key = generated.key().to_string();
        self.inner
            .stores
            .write()
            .insert(key.clone(), InstanceStore::new(generated.descriptor().clone()));
        self.inner.elements.write().insert(key, generated);
    }

    pub fn registry_key(&self) -> &str {
        &self.inner.registry_key
    }

    /// Root element keys in registration order.
    pub fn element_keys(&self) -> Vec<String> {
        self.inner.elements.read().keys().cloned().collect()
    }

    /// Constructs and registers a new root instance.
    pub fn create(
        &self,
        element_key: &str,
        id: &str,
        configuration: &[(String, Value)],
        callback: Option<InitCallback<'_>>,
    ) -> Result<InstanceRef, ModelError> {
        let generated = self.element(element_key)?;
        generated.create(None, id, configuration, callback)
    }

    /// True iff a root instance with this identity value is registered.
    pub fn has(&self, element_key: &str, id: &str) -> Result<bool, ModelError> {
        self.element(element_key)?;
        Ok(self
            .inner
            .stores
            .read()
            .get(element_key)
            .is_some_and(|store| store.contains(id)))
    }

    /// Root instance with this identity value; fails if absent.
    pub fn get(&self, element_key: &str, id: &str) -> Result<InstanceRef, ModelError> {
        self.element(element_key)?;
        let stores = self.inner.stores.read();
        let store = &stores[element_key];
        store.get(id)
    }

    /// Root instances in insertion order.
    pub fn all(&self, element_key: &str) -> Result<Vec<InstanceRef>, ModelError> {
        self.element(element_key)?;
        Ok(self.inner.stores.read()[element_key].values())
    }

    /// Identity values in insertion order.
    pub fn ids(&self, element_key: &str) -> Result<Vec<String>, ModelError> {
        self.element(element_key)?;
        Ok(self.inner.stores.read()[element_key].ids())
    }

    /// True iff at least one instance of this element is registered.
    pub fn is_non_empty(&self, element_key: &str) -> Result<bool, ModelError> {
        self.element(element_key)?;
        Ok(!self.inner.stores.read()[element_key].is_empty())
    }

    pub(crate) fn register(&self, element_key: &str, id: &str, instance: InstanceRef) {
        let mut stores = self.inner.stores.write();
        if let Some(store) = stores.get_mut(element_key) {
            store.register(id, instance, self.inner.log.as_ref());
        }
    }

    fn element(&self, element_key: &str) -> Result<Arc<GeneratedType>, ModelError> {
        self.inner
            .elements
            .read()
            .get(element_key)
            .cloned()
            .ok_or_else(|| {
                ModelError::Lookup(format!(
                    "No root model element '{}' in registry '{}'.",
                    element_key, self.inner.registry_key
                ))
            })
    }
}

impl std::fmt::Debug for RootNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootNamespace")
            .field("registry_key", &self.inner.registry_key)
            .field("elements", &self.element_keys())
            .finish()
    }
}
