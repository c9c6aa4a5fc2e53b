//! Maven side of the conversion: POM model, reader and module topology

pub mod model;
pub mod reader;
pub mod topology;

pub use model::{BuildDescriptor, Dependency, Execution, Plugin, ProjectCoordinates};
pub use reader::{
    parse_descriptor, read_descriptor, read_descriptor_or_empty, DescriptorError, POM_NAMESPACE,
};
pub use topology::{
    detect_modules, is_multi_module, match_module, resolve_module_paths, ModuleRef, ModuleSet,
    TopologyError, POM_FILE, ROOT_MODULE,
};
