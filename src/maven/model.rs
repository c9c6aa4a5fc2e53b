//! In-memory model of a parsed Maven POM

use serde::Serialize;
use std::collections::BTreeMap;

/// Artifact ids whose `archive.manifest.mainClass` configuration names the
/// executable entry point.
const MANIFEST_PLUGINS: &[&str] = &["maven-jar-plugin", "maven-assembly-plugin"];

pub const SPRING_BOOT_MAVEN_PLUGIN: &str = "spring-boot-maven-plugin";

/// Identity of the project itself (direct children of `<project>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectCoordinates {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
}

impl Dependency {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: None,
            scope: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// `groupId:artifactId`
    pub fn key(&self) -> String {
        coordinate_key(&self.group_id, &self.artifact_id)
    }
}

/// A plugin execution binding (`<execution>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Execution {
    pub id: Option<String>,
    pub phase: Option<String>,
    pub goals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plugin {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    /// Flattened `<configuration>`; nested elements use dotted keys
    pub configuration: BTreeMap<String, String>,
    pub executions: Vec<Execution>,
}

impl Plugin {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: None,
            configuration: BTreeMap::new(),
            executions: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.configuration.insert(key.into(), value.into());
        self
    }

    pub fn key(&self) -> String {
        coordinate_key(&self.group_id, &self.artifact_id)
    }

    pub fn config(&self, key: &str) -> Option<&str> {
        self.configuration.get(key).map(String::as_str)
    }
}

/// Everything the translation needs from one `pom.xml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildDescriptor {
    pub project: ProjectCoordinates,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<Dependency>,
    /// `groupId:artifactId` -> version pinned under `<dependencyManagement>`
    pub dependency_management_versions: BTreeMap<String, String>,
    /// `groupId:artifactId` -> version pinned under `<pluginManagement>`
    pub plugin_management_versions: BTreeMap<String, String>,
    pub build_plugins: Vec<Plugin>,
    pub modules: Vec<String>,
}

impl BuildDescriptor {
    pub fn is_multi_module(&self) -> bool {
        !self.modules.is_empty()
    }

    /// Adds a dependency; a later entry with the same `groupId:artifactId`
    /// replaces the earlier one in place.
    pub fn push_dependency(&mut self, dependency: Dependency) {
        let key = dependency.key();
        match self.dependencies.iter_mut().find(|d| d.key() == key) {
            Some(existing) => *existing = dependency,
            None => self.dependencies.push(dependency),
        }
    }

    /// Same replacement rule as [`push_dependency`](Self::push_dependency)
    pub fn push_plugin(&mut self, plugin: Plugin) {
        let key = plugin.key();
        match self.build_plugins.iter_mut().find(|p| p.key() == key) {
            Some(existing) => *existing = plugin,
            None => self.build_plugins.push(plugin),
        }
    }

    pub fn find_plugin(&self, artifact_id: &str) -> Option<&Plugin> {
        self.build_plugins
            .iter()
            .find(|p| p.artifact_id == artifact_id)
    }

    /// Entry point declared through a plugin manifest configuration
    pub fn manifest_main_class(&self) -> Option<String> {
        for plugin in &self.build_plugins {
            let candidate = if MANIFEST_PLUGINS.contains(&plugin.artifact_id.as_str()) {
                plugin.config("archive.manifest.mainClass")
            } else if plugin.artifact_id == SPRING_BOOT_MAVEN_PLUGIN {
                plugin.config("mainClass")
            } else {
                None
            };

            if let Some(main_class) = candidate.map(str::trim).filter(|c| !c.is_empty()) {
                return Some(main_class.to_string());
            }
        }
        None
    }
}

pub fn coordinate_key(group_id: &str, artifact_id: &str) -> String {
    format!("{}:{}", group_id, artifact_id)
}
