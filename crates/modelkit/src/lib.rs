pub mod config;
pub mod descriptor;
pub mod error;
pub mod facet;
pub mod instance;
pub mod log;
pub mod model;
pub mod naming;
pub mod registry;
pub mod root;
pub mod store;

pub use config::{apply_configuration, ConfigMap};
pub use descriptor::{ElementDescriptor, ElementOptions};
pub use error::ModelError;
pub use facet::{Capability, FacetManager, FacetTarget, MapCapability};
pub use instance::{InitCallback, Instance, InstanceRef};
pub use log::{LogLevel, LogSink, MemorySink, TracingSink};
pub use model::{GeneratedType, InstanceHooks, Model};
pub use naming::{DefaultNamingPolicy, NamingPolicy};
pub use registry::{RegistryOptions, SchemaRegistry};
pub use root::RootNamespace;
pub use store::InstanceStore;
