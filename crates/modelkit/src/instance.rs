use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::config;
use crate::descriptor::ElementDescriptor;
use crate::error::ModelError;
use crate::facet::Capability;
use crate::model::GeneratedType;
use crate::store::{missing_instance, InstanceStore};

pub type InstanceRef = Arc<Instance>;

/// Post-construction callback, invoked after the configuration mapping has
/// been applied and before the post-init hook.
pub type InitCallback<'a> = &'a dyn Fn(&InstanceRef) -> Result<(), ModelError>;

/// Runtime instance of a generated type.
///
/// Carries the identity value, a back-reference to its container, one ordered
/// keyed store per child element (created lazily), the property table, and
/// the capability map populated by the facet manager.
pub struct Instance {
    generated_type: Arc<GeneratedType>,
    identity: String,
    container: Option<Weak<Instance>>,
    stores: RwLock<IndexMap<String, InstanceStore>>,
    properties: RwLock<BTreeMap<String, Value>>,
    capabilities: RwLock<BTreeMap<String, Arc<dyn Capability>>>,
}

impl Instance {
    /// Runs the fixed construction protocol: assign identity, register into
    /// the container's store (or the root namespace), attach facets, trace
    /// start, pre-init hook, apply configuration, caller callback, post-init
    /// hook, trace completion.
    pub(crate) fn construct(
        generated_type: &Arc<GeneratedType>,
        container: Option<&InstanceRef>,
        id: &str,
        configuration: &[(String, Value)],
        callback: Option<InitCallback<'_>>,
    ) -> Result<InstanceRef, ModelError> {
        let instance = Arc::new(Instance {
            generated_type: generated_type.clone(),
            identity: id.to_string(),
            container: container.map(Arc::downgrade),
            stores: RwLock::new(IndexMap::new()),
            properties: RwLock::new(BTreeMap::new()),
            capabilities: RwLock::new(BTreeMap::new()),
        });
        instance.properties.write().insert(
            generated_type.descriptor().identity_field().to_string(),
            Value::String(id.to_string()),
        );

        match container {
            Some(parent) => {
                parent.register_child(generated_type.descriptor().clone(), id, instance.clone());
            }
            None => {
                let root = generated_type.root_namespace().ok_or_else(|| {
                    ModelError::Lookup(format!(
                        "Model element '{}' has no root namespace; lock the registry before constructing instances.",
                        generated_type.descriptor().qualified_key()
                    ))
                })?;
                root.register(generated_type.key(), id, instance.clone());
            }
        }

        if let Some(manager) = generated_type.facet_manager() {
            manager.apply_extension(&instance)?;
        }

        let log = generated_type.log();
        log.info(&format!(
            "{} '{}' construction started.",
            generated_type.name(),
            id
        ));
        if let Some(hooks) = generated_type.hooks() {
            hooks.pre_init(&instance)?;
        }
        config::apply_configuration(&instance, configuration)?;
        if let Some(callback) = callback {
            callback(&instance)?;
        }
        if let Some(hooks) = generated_type.hooks() {
            hooks.post_init(&instance)?;
        }
        log.info(&format!(
            "{} '{}' construction completed.",
            generated_type.name(),
            id
        ));
        Ok(instance)
    }

    pub fn generated_type(&self) -> &Arc<GeneratedType> {
        &self.generated_type
    }

    /// The element key of this instance's generated type.
    pub fn element_key(&self) -> &str {
        self.generated_type.key()
    }

    /// The identity value in canonical string form.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Back-reference to the container instance, `None` for root instances.
    pub fn container(&self) -> Option<InstanceRef> {
        self.container.as_ref().and_then(Weak::upgrade)
    }

    // --- generated accessor set, one family per containment edge ---

    /// Constructs and registers a new child instance.
    pub fn create_child(
        self: &Arc<Self>,
        child_key: &str,
        id: &str,
        configuration: &[(String, Value)],
        callback: Option<InitCallback<'_>>,
    ) -> Result<InstanceRef, ModelError> {
        let child = self.child_type(child_key)?;
        child.create(Some(self), id, configuration, callback)
    }

    /// True iff a child with this identity value is registered.
    pub fn has_child(&self, child_key: &str, id: &str) -> Result<bool, ModelError> {
        self.child_type(child_key)?;
        Ok(self
            .stores
            .read()
            .get(child_key)
            .is_some_and(|store| store.contains(id)))
    }

    /// Child with this identity value; fails with a lookup error if absent.
    pub fn child(&self, child_key: &str, id: &str) -> Result<InstanceRef, ModelError> {
        let child = self.child_type(child_key)?;
        match self.stores.read().get(child_key) {
            Some(store) => store.get(id),
            None => Err(missing_instance(child.descriptor(), id)),
        }
    }

    /// Child instances in insertion order.
    pub fn children(&self, child_key: &str) -> Result<Vec<InstanceRef>, ModelError> {
        self.child_type(child_key)?;
        Ok(self
            .stores
            .read()
            .get(child_key)
            .map(InstanceStore::values)
            .unwrap_or_default())
    }

    /// Child identity values in insertion order.
    pub fn child_ids(&self, child_key: &str) -> Result<Vec<String>, ModelError> {
        self.child_type(child_key)?;
        Ok(self
            .stores
            .read()
            .get(child_key)
            .map(InstanceStore::ids)
            .unwrap_or_default())
    }

    /// True iff at least one child of this element is registered.
    pub fn has_children(&self, child_key: &str) -> Result<bool, ModelError> {
        self.child_type(child_key)?;
        Ok(self
            .stores
            .read()
            .get(child_key)
            .is_some_and(|store| !store.is_empty()))
    }

    fn child_type(&self, child_key: &str) -> Result<Arc<GeneratedType>, ModelError> {
        self.generated_type.child(child_key).ok_or_else(|| {
            ModelError::Lookup(format!(
                "Generated type '{}' has no child element '{}'.",
                self.generated_type.name(),
                child_key
            ))
        })
    }

    /// Registers a child into the store for its element, creating the store
    /// on first use. Duplicates are logged and overwritten, never fatal.
    pub(crate) fn register_child(
        &self,
        element: Arc<ElementDescriptor>,
        id: &str,
        instance: InstanceRef,
    ) {
        let mut stores = self.stores.write();
        let store = stores
            .entry(element.key().to_string())
            .or_insert_with(|| InstanceStore::new(element.clone()));
        store.register(id, instance, self.generated_type.log().as_ref());
    }

    // --- property table and capability map ---

    /// Assigns a declared property; fails naming the unsupported property and
    /// the owning generated type.
    pub fn set_property(&self, name: &str, value: Value) -> Result<(), ModelError> {
        if !self.try_set_property(name, value) {
            return Err(ModelError::ConfigurationProperty {
                type_name: self.generated_type.name().to_string(),
                property: name.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn try_set_property(&self, name: &str, value: Value) -> bool {
        if !self.generated_type.has_property(name) {
            return false;
        }
        self.properties.write().insert(name.to_string(), value);
        true
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.properties.read().get(name).cloned()
    }

    pub fn add_capability(&self, capability: Arc<dyn Capability>) {
        self.capabilities
            .write()
            .insert(capability.capability_key().to_string(), capability);
    }

    pub fn capability(&self, key: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.read().get(key).cloned()
    }

    pub fn capability_keys(&self) -> Vec<String> {
        self.capabilities.read().keys().cloned().collect()
    }

    /// Applies an ordered configuration mapping of dotted paths to values.
    pub fn apply_configuration(
        self: &Arc<Self>,
        configuration: &[(String, Value)],
    ) -> Result<(), ModelError> {
        config::apply_configuration(self, configuration)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.element_key() == other.element_key() && self.identity == other.identity
    }
}

impl Eq for Instance {}

impl PartialOrd for Instance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Default ordering: instances of the same generated type compare by
/// identity value. Supports explicit sorting by callers; registry iteration
/// order is unaffected.
impl Ord for Instance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.element_key()
            .cmp(other.element_key())
            .then_with(|| self.identity.cmp(&other.identity))
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.generated_type.name())
            .field("identity", &self.identity)
            .finish()
    }
}
