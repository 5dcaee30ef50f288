use std::sync::Arc;

use serde_json::Value;

use crate::error::ModelError;
use crate::facet::Capability;
use crate::instance::InstanceRef;

/// Ordered configuration mapping from dotted path strings to values. The
/// only wire format the core defines.
pub type ConfigMap = Vec<(String, Value)>;

enum ConfigNode {
    Instance(InstanceRef),
    Capability(Arc<dyn Capability>),
}

impl ConfigNode {
    fn type_name(&self) -> String {
        match self {
            ConfigNode::Instance(instance) => instance.generated_type().name().to_string(),
            ConfigNode::Capability(capability) => capability.capability_key().to_string(),
        }
    }

    fn nested(&self, segment: &str) -> Option<ConfigNode> {
        match self {
            ConfigNode::Instance(instance) => {
                instance.capability(segment).map(ConfigNode::Capability)
            }
            ConfigNode::Capability(capability) => {
                capability.nested(segment).map(ConfigNode::Capability)
            }
        }
    }

    fn set(&self, property: &str, value: Value) -> bool {
        match self {
            ConfigNode::Instance(instance) => instance.try_set_property(property, value),
            ConfigNode::Capability(capability) => capability.set(property, value),
        }
    }
}

/// Applies a configuration mapping to an instance.
///
/// Each path is split on `.`; every segment but the last resolves a nested
/// target (a capability on the current target), and the final segment is
/// assigned on whatever target the traversal reached. An unresolvable
/// segment or unsupported leaf fails naming the owning type and property,
/// never the low-level dispatch failure.
pub fn apply_configuration(
    instance: &InstanceRef,
    configuration: &[(String, Value)],
) -> Result<(), ModelError> {
    for (path, value) in configuration {
        let mut segments: Vec<&str> = path.split('.').collect();
        let last = segments.pop().unwrap_or_default();
        let mut node = ConfigNode::Instance(instance.clone());
        for segment in segments {
            node = match node.nested(segment) {
                Some(next) => next,
                None => {
                    return Err(ModelError::ConfigurationProperty {
                        type_name: node.type_name(),
                        property: segment.to_string(),
                    });
                }
            };
        }
        if !node.set(last, value.clone()) {
            return Err(ModelError::ConfigurationProperty {
                type_name: node.type_name(),
                property: last.to_string(),
            });
        }
    }
    Ok(())
}
