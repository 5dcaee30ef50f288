use std::sync::Arc;

use indexmap::IndexMap;

use crate::descriptor::{ElementDescriptor, ElementOptions};
use crate::error::ModelError;
use crate::facet::FacetManager;
use crate::log::{LogSink, TracingSink};
use crate::model::Model;
use crate::naming::{DefaultNamingPolicy, NamingPolicy};

/// External collaborators and registry-wide defaults.
pub struct RegistryOptions {
    /// Default identity field for elements that do not override it.
    pub default_identity_field: String,
    pub naming: Arc<dyn NamingPolicy>,
    pub log: Arc<dyn LogSink>,
    pub facet_manager: Option<Arc<dyn FacetManager>>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            default_identity_field: "name".to_string(),
            naming: Arc::new(DefaultNamingPolicy),
            log: Arc::new(TracingSink),
            facet_manager: None,
        }
    }
}

/// Owner of all element descriptors for one schema.
///
/// Enforces key uniqueness, registration-order referential integrity, and the
/// one-way Open to Locked lifecycle. Locking synthesizes the runtime model;
/// afterwards the registry is read-only metadata.
pub struct SchemaRegistry {
    key: String,
    default_identity_field: String,
    naming: Arc<dyn NamingPolicy>,
    log: Arc<dyn LogSink>,
    facet_manager: Option<Arc<dyn FacetManager>>,
    elements: IndexMap<String, Arc<ElementDescriptor>>,
    locked: bool,
}

impl SchemaRegistry {
    pub fn new(key: impl Into<String>, options: RegistryOptions) -> Self {
        Self {
            key: key.into(),
            default_identity_field: options.default_identity_field,
            naming: options.naming,
            log: options.log,
            facet_manager: options.facet_manager,
            elements: IndexMap::new(),
            locked: false,
        }
    }

    /// Defines every element through `define`, then locks.
    ///
    /// Convenience for the common open-define-lock sequence; returns the
    /// locked registry alongside the synthesized model.
    pub fn build(
        key: impl Into<String>,
        options: RegistryOptions,
        define: impl FnOnce(&mut SchemaRegistry) -> Result<(), ModelError>,
    ) -> Result<(SchemaRegistry, Model), ModelError> {
        let mut registry = SchemaRegistry::new(key, options);
        define(&mut registry)?;
        let model = registry.lock()?;
        Ok((registry, model))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_identity_field(&self) -> &str {
        &self.default_identity_field
    }

    pub fn is_faceted(&self) -> bool {
        self.facet_manager.is_some()
    }

    pub(crate) fn naming(&self) -> &dyn NamingPolicy {
        self.naming.as_ref()
    }

    pub(crate) fn log(&self) -> &Arc<dyn LogSink> {
        &self.log
    }

    pub(crate) fn facet_manager(&self) -> Option<&Arc<dyn FacetManager>> {
        self.facet_manager.as_ref()
    }

    /// Constructs, validates, and registers a new element descriptor.
    ///
    /// Validation failure leaves the registry unchanged; construction and
    /// registration are atomic from the caller's view.
    pub fn define_element(
        &mut self,
        key: &str,
        container_key: Option<&str>,
        options: ElementOptions,
    ) -> Result<Arc<ElementDescriptor>, ModelError> {
        if self.locked {
            return Err(ModelError::LockState(format!(
                "Attempting to define model element '{}.{}' when registry is locked.",
                self.key, key
            )));
        }
        let descriptor = Arc::new(ElementDescriptor::new(self, key, container_key, options)?);
        if self.elements.contains_key(key) {
            return Err(ModelError::DuplicateDefinition {
                qualified_key: descriptor.qualified_key(),
            });
        }
        self.elements.insert(key.to_string(), descriptor.clone());
        Ok(descriptor)
    }

    pub fn has_descriptor(&self, key: &str) -> bool {
        self.elements.contains_key(key)
    }

    pub fn descriptor(&self, key: &str) -> Result<Arc<ElementDescriptor>, ModelError> {
        self.elements.get(key).cloned().ok_or_else(|| {
            ModelError::Lookup(format!(
                "Can not find model element '{}' in registry '{}'.",
                key, self.key
            ))
        })
    }

    /// Descriptor keys in registration order.
    pub fn descriptor_keys(&self) -> Vec<&str> {
        self.elements.keys().map(String::as_str).collect()
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<Arc<ElementDescriptor>> {
        self.elements.values().cloned().collect()
    }

    /// Descriptors whose container matches, in registration order. An empty
    /// result is not an error; `None` selects the root-level descriptors.
    pub fn descriptors_by_container(
        &self,
        container_key: Option<&str>,
    ) -> Vec<Arc<ElementDescriptor>> {
        self.elements
            .values()
            .filter(|descriptor| descriptor.container_key() == container_key)
            .cloned()
            .collect()
    }

    /// Finalizes the registry and synthesizes the runtime model.
    ///
    /// Runs, in order: type synthesis over all descriptors, facet target
    /// registration (when a facet manager is configured), and root namespace
    /// generation over the container-less descriptors. Not retryable: a
    /// second call is itself an error.
    pub fn lock(&mut self) -> Result<Model, ModelError> {
        if self.locked {
            return Err(ModelError::LockState(format!(
                "Attempting to lock registry '{}' when registry is already locked.",
                self.key
            )));
        }
        self.locked = true;
        Model::synthesize(self)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemorySink;

    fn registry(key: &str) -> SchemaRegistry {
        SchemaRegistry::new(
            key,
            RegistryOptions {
                log: Arc::new(MemorySink::new()),
                ..RegistryOptions::default()
            },
        )
    }

    #[test]
    fn define_element_applies_defaults() {
        let mut registry = registry("resgen");
        let descriptor = registry
            .define_element("uibinder_file", None, ElementOptions::default())
            .unwrap();
        assert_eq!(descriptor.key(), "uibinder_file");
        assert_eq!(descriptor.generated_type_name(), "UibinderFile");
        assert_eq!(descriptor.identity_field(), "name");
        assert_eq!(descriptor.access_method(), "uibinder_files");
        assert_eq!(descriptor.inverse_access_method(), "uibinder_file");
        assert_eq!(descriptor.container_key(), None);
        assert!(!descriptor.custom_initialize());
        assert_eq!(descriptor.qualified_key(), "resgen.uibinder_file");
    }

    #[test]
    fn define_element_honors_overrides() {
        let mut registry = registry("resgen");
        registry
            .define_element("catalog", None, ElementOptions::default())
            .unwrap();
        let descriptor = registry
            .define_element(
                "uibinder_parameter",
                Some("catalog"),
                ElementOptions {
                    identity_field: Some("key".to_string()),
                    access_method: Some("parameters".to_string()),
                    inverse_access_method: Some("parameter".to_string()),
                    ..ElementOptions::default()
                },
            )
            .unwrap();
        assert_eq!(descriptor.identity_field(), "key");
        assert_eq!(descriptor.access_method(), "parameters");
        assert_eq!(descriptor.inverse_access_method(), "parameter");
        assert_eq!(descriptor.container_key(), Some("catalog"));
    }

    #[test]
    fn invalid_key_reports_corrected_form() {
        let mut registry = registry("resgen");
        let err = registry
            .define_element("UibinderFile", None, ElementOptions::default())
            .unwrap_err();
        match err {
            ModelError::Validation {
                field, suggestion, ..
            } => {
                assert_eq!(field, "key");
                assert_eq!(suggestion, "uibinder_file");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(!registry.has_descriptor("UibinderFile"));
    }

    #[test]
    fn invalid_generated_type_name_is_rejected() {
        let mut registry = registry("resgen");
        let err = registry
            .define_element(
                "catalog",
                None,
                ElementOptions {
                    generated_type_name: Some("catalog_class".to_string()),
                    ..ElementOptions::default()
                },
            )
            .unwrap_err();
        match err {
            ModelError::Validation { field, .. } => assert_eq!(field, "generated type name"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_definition_is_fatal_and_keeps_first() {
        let mut registry = registry("resgen");
        let first = registry
            .define_element("catalog", None, ElementOptions::default())
            .unwrap();
        let err = registry
            .define_element("catalog", None, ElementOptions::default())
            .unwrap_err();
        match err {
            ModelError::DuplicateDefinition { qualified_key } => {
                assert_eq!(qualified_key, "resgen.catalog");
            }
            other => panic!("expected duplicate definition error, got {other:?}"),
        }
        assert_eq!(registry.descriptors().len(), 1);
        assert!(Arc::ptr_eq(&first, &registry.descriptor("catalog").unwrap()));
    }

    #[test]
    fn forward_container_references_are_rejected() {
        let mut registry = registry("resgen");
        let err = registry
            .define_element("catalog", Some("repository"), ElementOptions::default())
            .unwrap_err();
        match err {
            ModelError::Referential {
                qualified_key,
                container_key,
            } => {
                assert_eq!(qualified_key, "resgen.catalog");
                assert_eq!(container_key, "repository");
            }
            other => panic!("expected referential error, got {other:?}"),
        }
        assert!(!registry.has_descriptor("catalog"));

        registry
            .define_element("repository", None, ElementOptions::default())
            .unwrap();
        registry
            .define_element("catalog", Some("repository"), ElementOptions::default())
            .unwrap();
    }

    #[test]
    fn descriptors_by_container_preserves_registration_order() {
        let mut registry = registry("resgen");
        registry
            .define_element("catalog", None, ElementOptions::default())
            .unwrap();
        for key in ["zeta", "alpha", "mid"] {
            registry
                .define_element(key, Some("catalog"), ElementOptions::default())
                .unwrap();
        }
        let keys: Vec<String> = registry
            .descriptors_by_container(Some("catalog"))
            .iter()
            .map(|d| d.key().to_string())
            .collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert!(registry.descriptors_by_container(Some("zeta")).is_empty());
    }

    #[test]
    fn lock_is_one_way() {
        let mut registry = registry("resgen");
        registry
            .define_element("repository", None, ElementOptions::default())
            .unwrap();
        assert!(!registry.is_locked());
        registry.lock().unwrap();
        assert!(registry.is_locked());

        let err = registry
            .define_element("catalog", None, ElementOptions::default())
            .unwrap_err();
        assert!(matches!(err, ModelError::LockState(_)));

        let err = registry.lock().unwrap_err();
        assert!(matches!(err, ModelError::LockState(_)));
    }

    #[test]
    fn descriptor_lookup_names_the_registry() {
        let registry = registry("resgen");
        let err = registry.descriptor("catalog").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can not find model element 'catalog' in registry 'resgen'."
        );
        assert!(!registry.has_descriptor("catalog"));
    }
}
