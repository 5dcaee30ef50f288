use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::descriptor::ElementDescriptor;
use crate::error::ModelError;
use crate::facet::{FacetManager, FacetTarget};
use crate::instance::{Instance, InstanceRef, InitCallback};
use crate::log::LogSink;
use crate::registry::SchemaRegistry;
use crate::root::RootNamespace;

/// Optional per-type construction hooks, dispatched around configuration
/// application. Both default to no-ops.
pub trait InstanceHooks: Send + Sync {
    fn pre_init(&self, _instance: &InstanceRef) -> Result<(), ModelError> {
        Ok(())
    }

    fn post_init(&self, _instance: &InstanceRef) -> Result<(), ModelError> {
        Ok(())
    }
}

/// Runtime type definition synthesized from one element descriptor.
///
/// Created once per descriptor at lock time and alive for the process
/// lifetime; instances are constructed afterwards by application code,
/// unboundedly, each owned by its container's store (or the root namespace).
pub struct GeneratedType {
    descriptor: Arc<ElementDescriptor>,
    children: RwLock<Vec<Arc<GeneratedType>>>,
    properties: RwLock<BTreeSet<String>>,
    hooks: RwLock<Option<Arc<dyn InstanceHooks>>>,
    root: RwLock<Option<RootNamespace>>,
    log: Arc<dyn LogSink>,
    facet_manager: Option<Arc<dyn FacetManager>>,
}

impl GeneratedType {
    fn new(
        descriptor: Arc<ElementDescriptor>,
        log: Arc<dyn LogSink>,
        facet_manager: Option<Arc<dyn FacetManager>>,
    ) -> Self {
        // The identity field is always readable and settable through the
        // property table, under its declared name.
        let mut properties = BTreeSet::new();
        properties.insert(descriptor.identity_field().to_string());
        Self {
            descriptor,
            children: RwLock::new(Vec::new()),
            properties: RwLock::new(properties),
            hooks: RwLock::new(None),
            root: RwLock::new(None),
            log,
            facet_manager,
        }
    }

    /// The generated type name from the descriptor.
    pub fn name(&self) -> &str {
        self.descriptor.generated_type_name()
    }

    /// The element key this type was synthesized from.
    pub fn key(&self) -> &str {
        self.descriptor.key()
    }

    pub fn descriptor(&self) -> &Arc<ElementDescriptor> {
        &self.descriptor
    }

    /// Child types in registration order.
    pub fn children(&self) -> Vec<Arc<GeneratedType>> {
        self.children.read().clone()
    }

    pub fn child(&self, key: &str) -> Option<Arc<GeneratedType>> {
        self.children
            .read()
            .iter()
            .find(|child| child.key() == key)
            .cloned()
    }

    /// Declares a settable configuration property on this type.
    pub fn define_property(&self, name: impl Into<String>) {
        self.properties.write().insert(name.into());
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.read().contains(name)
    }

    /// Installs construction hooks for this type.
    pub fn set_hooks(&self, hooks: Arc<dyn InstanceHooks>) {
        *self.hooks.write() = Some(hooks);
    }

    pub(crate) fn hooks(&self) -> Option<Arc<dyn InstanceHooks>> {
        self.hooks.read().clone()
    }

    pub(crate) fn log(&self) -> &Arc<dyn LogSink> {
        &self.log
    }

    pub(crate) fn facet_manager(&self) -> Option<&Arc<dyn FacetManager>> {
        self.facet_manager.as_ref()
    }

    pub(crate) fn root_namespace(&self) -> Option<RootNamespace> {
        self.root.read().clone()
    }

    pub(crate) fn attach_root(&self, root: RootNamespace) {
        *self.root.write() = Some(root);
    }

    /// The synthesized init routine: runs the full construction protocol.
    ///
    /// This is the entry point caller-supplied constructors invoke for
    /// custom-initialize elements; for everything else prefer the generated
    /// create operations.
    pub fn init(
        self: &Arc<Self>,
        container: Option<&InstanceRef>,
        id: &str,
        configuration: &[(String, Value)],
        callback: Option<InitCallback<'_>>,
    ) -> Result<InstanceRef, ModelError> {
        match (self.descriptor.container_key(), container) {
            (None, None) => {}
            (Some(expected), Some(actual)) if actual.element_key() == expected => {}
            (Some(expected), Some(actual)) => {
                return Err(ModelError::Lookup(format!(
                    "Model element '{}' requires a container of type '{}' but was given a '{}'.",
                    self.descriptor.qualified_key(),
                    expected,
                    actual.element_key()
                )));
            }
            (Some(expected), None) => {
                return Err(ModelError::Lookup(format!(
                    "Model element '{}' requires a container of type '{}'.",
                    self.descriptor.qualified_key(),
                    expected
                )));
            }
            (None, Some(_)) => {
                return Err(ModelError::Lookup(format!(
                    "Model element '{}' is a root element and takes no container.",
                    self.descriptor.qualified_key()
                )));
            }
        }
        Instance::construct(self, container, id, configuration, callback)
    }

    /// The generated create operation. Absent (fails fast) for
    /// custom-initialize elements.
    pub(crate) fn create(
        self: &Arc<Self>,
        container: Option<&InstanceRef>,
        id: &str,
        configuration: &[(String, Value)],
        callback: Option<InitCallback<'_>>,
    ) -> Result<InstanceRef, ModelError> {
        if self.descriptor.custom_initialize() {
            return Err(ModelError::CustomInitialize {
                qualified_key: self.descriptor.qualified_key(),
            });
        }
        self.init(container, id, configuration, callback)
    }
}

impl std::fmt::Debug for GeneratedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedType")
            .field("name", &self.name())
            .field("key", &self.key())
            .finish()
    }
}

/// Synthesis output: one generated type per descriptor plus the root
/// namespace. The explicit context object application code resolves types
/// through after lock.
pub struct Model {
    registry_key: String,
    types: IndexMap<String, Arc<GeneratedType>>,
    root: RootNamespace,
}

impl Model {
    /// Runs the lock-time phases, in order: type synthesis over every
    /// descriptor, facet target registration, root namespace generation.
    pub(crate) fn synthesize(registry: &SchemaRegistry) -> Result<Model, ModelError> {
        let log = registry.log().clone();
        let facet_manager = registry.facet_manager().cloned();

        let mut types: IndexMap<String, Arc<GeneratedType>> = IndexMap::new();
        for descriptor in registry.descriptors() {
            let generated = Arc::new(GeneratedType::new(
                descriptor.clone(),
                log.clone(),
                facet_manager.clone(),
            ));
            types.insert(descriptor.key().to_string(), generated);
        }
        for generated in types.values() {
            let children: Vec<Arc<GeneratedType>> = registry
                .descriptors_by_container(Some(generated.key()))
                .iter()
                .map(|child| types[child.key()].clone())
                .collect();
            *generated.children.write() = children;
        }

        if let Some(manager) = &facet_manager {
            for generated in types.values() {
                let descriptor = generated.descriptor();
                manager.register_target(FacetTarget {
                    generated_type: generated.clone(),
                    key: descriptor.key().to_string(),
                    container_key: descriptor.container_key().map(str::to_string),
                    access_method: descriptor.access_method().to_string(),
                    inverse_access_method: descriptor.inverse_access_method().to_string(),
                })?;
            }
        }

        let root = RootNamespace::new(registry.key(), log);
        for generated in types.values() {
            if generated.descriptor().container_key().is_none() {
                root.attach(generated.clone());
                generated.attach_root(root.clone());
            }
        }

        Ok(Model {
            registry_key: registry.key().to_string(),
            types,
            root,
        })
    }

    pub fn registry_key(&self) -> &str {
        &self.registry_key
    }

    pub fn has_generated_type(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    pub fn generated_type(&self, key: &str) -> Result<Arc<GeneratedType>, ModelError> {
        self.types.get(key).cloned().ok_or_else(|| {
            ModelError::Lookup(format!(
                "Can not find generated type for '{}' in model '{}'.",
                key, self.registry_key
            ))
        })
    }

    /// Generated types in registration order.
    pub fn generated_types(&self) -> Vec<Arc<GeneratedType>> {
        self.types.values().cloned().collect()
    }

    /// Top-level namespace carrying the accessor sets of the container-less
    /// elements.
    pub fn root(&self) -> &RootNamespace {
        &self.root
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("registry_key", &self.registry_key)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ElementOptions;
    use crate::log::MemorySink;
    use crate::registry::RegistryOptions;
    use parking_lot::Mutex;

    fn locked_model(sink: Arc<MemorySink>) -> (SchemaRegistry, Model) {
        SchemaRegistry::build(
            "resgen",
            RegistryOptions {
                log: sink,
                ..RegistryOptions::default()
            },
            |registry| {
                registry.define_element("widget", None, ElementOptions::default())?;
                registry.define_element(
                    "panel",
                    Some("widget"),
                    ElementOptions {
                        custom_initialize: true,
                        ..ElementOptions::default()
                    },
                )?;
                Ok(())
            },
        )
        .unwrap()
    }

    #[test]
    fn synthesis_produces_one_type_per_descriptor() {
        let (_registry, model) = locked_model(Arc::new(MemorySink::new()));
        assert!(model.has_generated_type("widget"));
        assert!(model.has_generated_type("panel"));
        let widget = model.generated_type("widget").unwrap();
        assert_eq!(widget.name(), "Widget");
        let children = widget.children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].key(), "panel");
        assert!(widget.child("panel").is_some());
        assert!(widget.child("missing").is_none());
        assert!(model.generated_type("missing").is_err());
    }

    #[test]
    fn construction_emits_trace_events_in_order() {
        let sink = Arc::new(MemorySink::new());
        let (_registry, model) = locked_model(sink.clone());
        model.root().create("widget", "main", &[], None).unwrap();
        let messages: Vec<String> = sink
            .entries()
            .into_iter()
            .map(|(_, message)| message)
            .collect();
        assert_eq!(
            messages,
            [
                "Widget 'main' construction started.",
                "Widget 'main' construction completed.",
            ]
        );
    }

    #[test]
    fn hooks_run_around_configuration_and_callback() {
        struct RecordingHooks {
            events: Arc<Mutex<Vec<String>>>,
        }

        impl InstanceHooks for RecordingHooks {
            fn pre_init(&self, _instance: &InstanceRef) -> Result<(), ModelError> {
                self.events.lock().push("pre_init".to_string());
                Ok(())
            }

            fn post_init(&self, _instance: &InstanceRef) -> Result<(), ModelError> {
                self.events.lock().push("post_init".to_string());
                Ok(())
            }
        }

        let (_registry, model) = locked_model(Arc::new(MemorySink::new()));
        let widget = model.generated_type("widget").unwrap();
        widget.define_property("title");
        let events = Arc::new(Mutex::new(Vec::new()));
        widget.set_hooks(Arc::new(RecordingHooks {
            events: events.clone(),
        }));

        let callback_events = events.clone();
        let callback = move |instance: &InstanceRef| -> Result<(), ModelError> {
            assert_eq!(
                instance.property("title"),
                Some(serde_json::json!("configured"))
            );
            callback_events.lock().push("callback".to_string());
            Ok(())
        };
        model
            .root()
            .create(
                "widget",
                "main",
                &[("title".to_string(), serde_json::json!("configured"))],
                Some(&callback),
            )
            .unwrap();
        assert_eq!(*events.lock(), ["pre_init", "callback", "post_init"]);
    }

    #[test]
    fn create_fails_fast_for_custom_initialize_elements() {
        let (_registry, model) = locked_model(Arc::new(MemorySink::new()));
        let widget = model.root().create("widget", "main", &[], None).unwrap();
        let err = widget
            .create_child("panel", "side", &[], None)
            .unwrap_err();
        match err {
            ModelError::CustomInitialize { qualified_key } => {
                assert_eq!(qualified_key, "resgen.panel");
            }
            other => panic!("expected custom initialize error, got {other:?}"),
        }

        // The synthesized init routine is the supported path.
        let panel = model
            .generated_type("panel")
            .unwrap()
            .init(Some(&widget), "side", &[], None)
            .unwrap();
        assert!(widget.has_child("panel", "side").unwrap());
        assert!(Arc::ptr_eq(&panel, &widget.child("panel", "side").unwrap()));
    }

    #[test]
    fn init_rejects_container_mismatches() {
        let (_registry, model) = locked_model(Arc::new(MemorySink::new()));
        let widget = model.root().create("widget", "main", &[], None).unwrap();
        let panel_type = model.generated_type("panel").unwrap();

        let err = panel_type.init(None, "side", &[], None).unwrap_err();
        assert!(matches!(err, ModelError::Lookup(_)));

        let widget_type = model.generated_type("widget").unwrap();
        let err = widget_type.init(Some(&widget), "other", &[], None).unwrap_err();
        assert!(matches!(err, ModelError::Lookup(_)));
    }
}
