use thiserror::Error;

/// High-level error type shared across modelkit components.
///
/// Every fatal error carries a fully qualified identifier (registry-qualified
/// element key or generated type name) so failures are traceable without
/// additional context.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A descriptor field violates the naming policy.
    #[error(
        "Model element '{qualified_key}' has a {field} '{value}' that does not use the {pattern} naming pattern (i.e. the {field} should be '{suggestion}')."
    )]
    Validation {
        qualified_key: String,
        field: &'static str,
        value: String,
        pattern: &'static str,
        suggestion: String,
    },
    /// A descriptor names a container key that does not (yet) exist.
    #[error(
        "Model element '{qualified_key}' defines container as '{container_key}' but no such model element exists."
    )]
    Referential {
        qualified_key: String,
        container_key: String,
    },
    /// A descriptor key was registered twice in the same registry.
    #[error("Attempting to redefine model element '{qualified_key}'.")]
    DuplicateDefinition { qualified_key: String },
    /// Mutation attempted on a locked registry, or `lock` called twice.
    #[error("{0}")]
    LockState(String),
    /// A key-based lookup (descriptor or instance) found nothing.
    #[error("{0}")]
    Lookup(String),
    /// A configuration mapping referenced a property the target does not support.
    #[error("Generated type '{type_name}' does not support configuration property '{property}'.")]
    ConfigurationProperty {
        type_name: String,
        property: String,
    },
    /// The generated create path was invoked for a custom-initialize element.
    #[error(
        "Model element '{qualified_key}' uses custom initialization; construct instances through its own entry point."
    )]
    CustomInitialize { qualified_key: String },
    /// Propagated failure from an external facet manager.
    #[error("facet error: {0}")]
    Facet(String),
}
