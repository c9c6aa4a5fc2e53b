//! Module topology of a Maven project
//!
//! A project is multi-module exactly when its root POM declares at least one
//! `<module>`; there is no separately stored flag.

use super::reader::{read_descriptor_or_empty, DescriptorError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name under which the root project is addressed in a [`ModuleSet`]
pub const ROOT_MODULE: &str = "root";

pub const POM_FILE: &str = "pom.xml";

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("Module name '{0}' is reserved for the project root")]
    ReservedModuleName(String),
}

/// Module names declared in the root descriptor, in declaration order
pub fn detect_modules(root_descriptor: &Path) -> Result<Vec<String>, TopologyError> {
    let descriptor = read_descriptor_or_empty(root_descriptor)?;
    Ok(descriptor.modules)
}

pub fn is_multi_module(root_descriptor: &Path) -> Result<bool, TopologyError> {
    Ok(!detect_modules(root_descriptor)?.is_empty())
}

/// Module locations. In raw form every declared name is returned as-is; in
/// absolute form each name is joined to the descriptor's directory,
/// canonicalized, and entries that are not existing directories are dropped.
pub fn resolve_module_paths(
    root_descriptor: &Path,
    absolute: bool,
) -> Result<Vec<PathBuf>, TopologyError> {
    let modules = detect_modules(root_descriptor)?;

    if !absolute {
        return Ok(modules.into_iter().map(PathBuf::from).collect());
    }

    let base = descriptor_dir(root_descriptor);
    Ok(modules
        .iter()
        .filter_map(|module| {
            let resolved = base.join(module).canonicalize().ok()?;
            if resolved.is_dir() {
                Some(resolved)
            } else {
                debug!(module = %module, "Dropping module that is not a directory");
                None
            }
        })
        .collect())
}

fn descriptor_dir(descriptor: &Path) -> PathBuf {
    match descriptor.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// A member of a [`ModuleSet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub name: String,
    pub dir: PathBuf,
}

impl ModuleRef {
    pub fn descriptor_path(&self) -> PathBuf {
        self.dir.join(POM_FILE)
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_MODULE
    }
}

/// The root project plus its declared submodules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSet {
    root: PathBuf,
    modules: Vec<String>,
}

impl ModuleSet {
    pub fn new(root: impl Into<PathBuf>, modules: Vec<String>) -> Result<Self, TopologyError> {
        let modules: Vec<String> = modules
            .into_iter()
            .map(|m| normalize_module_name(&m))
            .collect();

        if let Some(reserved) = modules.iter().find(|m| m.as_str() == ROOT_MODULE) {
            return Err(TopologyError::ReservedModuleName(reserved.clone()));
        }

        Ok(Self {
            root: root.into(),
            modules,
        })
    }

    /// Reads `<root>/pom.xml` and builds the set from its `<modules>`
    pub fn discover(root: impl Into<PathBuf>) -> Result<Self, TopologyError> {
        let root = root.into();
        let modules = detect_modules(&root.join(POM_FILE))?;
        Self::new(root, modules)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn names(&self) -> &[String] {
        &self.modules
    }

    pub fn is_multi_module(&self) -> bool {
        !self.modules.is_empty()
    }

    /// Root first, then the declared modules in order
    pub fn members(&self) -> Vec<ModuleRef> {
        std::iter::once(ModuleRef {
            name: ROOT_MODULE.to_string(),
            dir: self.root.clone(),
        })
        .chain(self.modules.iter().map(|name| ModuleRef {
            name: name.clone(),
            dir: self.root.join(name),
        }))
        .collect()
    }

    /// Finds the module an artifact id refers to, by full module name or by
    /// its last path segment
    pub fn match_artifact(&self, artifact_id: &str) -> Option<&str> {
        match_module(&self.modules, artifact_id)
    }

    /// `services/api` -> `:services:api`
    pub fn gradle_path(module: &str) -> String {
        format!(":{}", module.replace('/', ":"))
    }
}

/// Module in `modules` named `artifact_id`, comparing full names first and
/// then the last path segment (`services/api` matches `api`)
pub fn match_module<'m>(modules: &'m [String], artifact_id: &str) -> Option<&'m str> {
    modules
        .iter()
        .find(|m| m.as_str() == artifact_id)
        .or_else(|| {
            modules
                .iter()
                .find(|m| m.rsplit('/').next() == Some(artifact_id))
        })
        .map(String::as_str)
}

fn normalize_module_name(module: &str) -> String {
    let trimmed = module.trim().replace('\\', "/");
    trimmed
        .trim_start_matches("./")
        .trim_end_matches('/')
        .to_string()
}
