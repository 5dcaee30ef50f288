use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::naming::NamingPolicy;
use crate::registry::SchemaRegistry;

/// Optional settings accepted by [`SchemaRegistry::define_element`].
///
/// Every field defaults from the element key or the registry-wide defaults;
/// see [`ElementDescriptor`] for the derivation rules.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ElementOptions {
    /// Name of the runtime type to synthesize; defaults to the pascal-cased key.
    pub generated_type_name: Option<String>,
    /// Attribute used as this type's id; defaults to the registry-wide default.
    pub identity_field: Option<String>,
    /// Name of the "list all children of this type" operation; defaults to the
    /// pluralized key.
    pub access_method: Option<String>,
    /// Name of the single-child operation family; defaults to the key.
    pub inverse_access_method: Option<String>,
    /// Suppresses the generated create operation in favor of a caller-supplied
    /// entry point that invokes the synthesized init routine.
    pub custom_initialize: bool,
}

/// Validated, immutable metadata describing one declared type.
///
/// Construction either succeeds (and the descriptor is registered into the
/// owning registry) or fails without touching the registry.
#[derive(Clone, Debug, Serialize)]
pub struct ElementDescriptor {
    registry_key: String,
    key: String,
    generated_type_name: String,
    identity_field: String,
    access_method: String,
    inverse_access_method: String,
    container_key: Option<String>,
    custom_initialize: bool,
}

impl ElementDescriptor {
    pub(crate) fn new(
        registry: &SchemaRegistry,
        key: &str,
        container_key: Option<&str>,
        options: ElementOptions,
    ) -> Result<Self, ModelError> {
        let naming = registry.naming();
        let qualified_key = format!("{}.{}", registry.key(), key);

        let generated_type_name = options
            .generated_type_name
            .unwrap_or_else(|| naming.to_upper_camel_case(key));
        let identity_field = options
            .identity_field
            .unwrap_or_else(|| registry.default_identity_field().to_string());
        let access_method = options
            .access_method
            .unwrap_or_else(|| naming.pluralize(key));
        let inverse_access_method = options
            .inverse_access_method
            .unwrap_or_else(|| key.to_string());

        let snake_cased = [
            ("key", key),
            ("identity field", identity_field.as_str()),
            ("access method", access_method.as_str()),
            ("inverse access method", inverse_access_method.as_str()),
        ];
        for (field, value) in snake_cased {
            if !naming.is_lower_snake_case(value) {
                return Err(ModelError::Validation {
                    qualified_key,
                    field,
                    value: value.to_string(),
                    pattern: "lower snake case",
                    suggestion: naming.to_lower_snake_case(value),
                });
            }
        }
        if !naming.is_upper_camel_case(&generated_type_name) {
            return Err(ModelError::Validation {
                qualified_key,
                field: "generated type name",
                value: generated_type_name.clone(),
                pattern: "upper camel case",
                suggestion: naming.to_upper_camel_case(&generated_type_name),
            });
        }

        if let Some(container) = container_key {
            if !registry.has_descriptor(container) {
                return Err(ModelError::Referential {
                    qualified_key,
                    container_key: container.to_string(),
                });
            }
        }

        Ok(Self {
            registry_key: registry.key().to_string(),
            key: key.to_string(),
            generated_type_name,
            identity_field,
            access_method,
            inverse_access_method,
            container_key: container_key.map(str::to_string),
            custom_initialize: options.custom_initialize,
        })
    }

    /// Key of the registry that owns this descriptor.
    pub fn registry_key(&self) -> &str {
        &self.registry_key
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn generated_type_name(&self) -> &str {
        &self.generated_type_name
    }

    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }

    pub fn access_method(&self) -> &str {
        &self.access_method
    }

    pub fn inverse_access_method(&self) -> &str {
        &self.inverse_access_method
    }

    pub fn container_key(&self) -> Option<&str> {
        self.container_key.as_deref()
    }

    pub fn custom_initialize(&self) -> bool {
        self.custom_initialize
    }

    /// `registry_key.key`, used in error messages to disambiguate across
    /// registries.
    pub fn qualified_key(&self) -> String {
        format!("{}.{}", self.registry_key, self.key)
    }
}
