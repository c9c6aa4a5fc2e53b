//! POM reader
//!
//! Parses a `pom.xml` into a [`BuildDescriptor`]. Every section is extracted
//! independently: a POM with only `<modules>` or only `<properties>` yields a
//! descriptor with the remaining sections empty.

use super::model::{
    coordinate_key, BuildDescriptor, Dependency, Execution, Plugin, ProjectCoordinates,
};
use roxmltree::{Document, Node};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const POM_NAMESPACE: &str = "http://maven.apache.org/POM/4.0.0";

/// Maven's implicit groupId for plugins declared without one
const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Missing descriptor: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read descriptor {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed descriptor {}: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("Descriptor {} has no <project> root in the Maven POM namespace (found {found})", .path.display())]
    MissingNamespace { path: PathBuf, found: String },
}

impl DescriptorError {
    pub fn path(&self) -> &Path {
        match self {
            DescriptorError::Missing(path) => path,
            DescriptorError::Io { path, .. }
            | DescriptorError::Malformed { path, .. }
            | DescriptorError::MissingNamespace { path, .. } => path,
        }
    }
}

/// Reads and parses the descriptor at `path`
pub fn read_descriptor(path: &Path) -> Result<BuildDescriptor, DescriptorError> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            DescriptorError::Missing(path.to_path_buf())
        } else {
            DescriptorError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_descriptor(&content, path)
}

/// Like [`read_descriptor`], but a foreign root namespace yields an empty
/// descriptor instead of an error.
pub fn read_descriptor_or_empty(path: &Path) -> Result<BuildDescriptor, DescriptorError> {
    match read_descriptor(path) {
        Err(DescriptorError::MissingNamespace { found, .. }) => {
            warn!(
                path = %path.display(),
                found = %found,
                "No Maven POM namespace, treating descriptor as empty"
            );
            Ok(BuildDescriptor::default())
        }
        other => other,
    }
}

/// Parses POM text. `origin` is only used in error messages.
pub fn parse_descriptor(content: &str, origin: &Path) -> Result<BuildDescriptor, DescriptorError> {
    let content = content.trim_start_matches('\u{feff}');
    let doc = Document::parse(content).map_err(|e| DescriptorError::Malformed {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })?;

    let root = doc.root_element();
    let namespace = root.tag_name().namespace();
    let in_pom_namespace = matches!(namespace, None | Some(POM_NAMESPACE));

    if root.tag_name().name() != "project" || !in_pom_namespace {
        return Err(DescriptorError::MissingNamespace {
            path: origin.to_path_buf(),
            found: match namespace {
                Some(ns) => format!("<{}> in {}", root.tag_name().name(), ns),
                None => format!("<{}>", root.tag_name().name()),
            },
        });
    }

    let pom = PomNode { namespace };
    let mut descriptor = BuildDescriptor {
        project: pom.project_coordinates(root),
        properties: pom.properties(root),
        dependency_management_versions: pom.dependency_management(root),
        plugin_management_versions: pom.plugin_management(root),
        modules: pom.modules(root),
        ..Default::default()
    };

    if let Some(dependencies) = pom.child(root, "dependencies") {
        for node in pom.children(dependencies, "dependency") {
            if let Some(dependency) = pom.dependency(node) {
                descriptor.push_dependency(dependency);
            }
        }
    }

    if let Some(plugins) = pom
        .child(root, "build")
        .and_then(|build| pom.child(build, "plugins"))
    {
        for node in pom.children(plugins, "plugin") {
            if let Some(plugin) = pom.plugin(node) {
                descriptor.push_plugin(plugin);
            }
        }
    }

    debug!(
        path = %origin.display(),
        properties = descriptor.properties.len(),
        dependencies = descriptor.dependencies.len(),
        plugins = descriptor.build_plugins.len(),
        modules = descriptor.modules.len(),
        "Parsed descriptor"
    );

    Ok(descriptor)
}

/// Element lookups scoped to the namespace of the `<project>` root
struct PomNode<'a> {
    namespace: Option<&'a str>,
}

impl<'a> PomNode<'a> {
    fn is(&self, node: &Node<'_, '_>, name: &str) -> bool {
        node.is_element()
            && node.tag_name().name() == name
            && node.tag_name().namespace() == self.namespace
    }

    fn child<'b, 'i>(&self, node: Node<'b, 'i>, name: &str) -> Option<Node<'b, 'i>> {
        node.children().find(|c| self.is(c, name))
    }

    fn children<'b, 'i>(
        &self,
        node: Node<'b, 'i>,
        name: &'b str,
    ) -> impl Iterator<Item = Node<'b, 'i>> + 'b
    where
        'a: 'b,
    {
        let namespace = self.namespace;
        node.children().filter(move |c| {
            c.is_element() && c.tag_name().name() == name && c.tag_name().namespace() == namespace
        })
    }

    fn text(&self, node: Node<'_, '_>, name: &str) -> Option<String> {
        self.child(node, name).and_then(element_text)
    }

    fn project_coordinates(&self, root: Node<'_, '_>) -> ProjectCoordinates {
        ProjectCoordinates {
            group_id: self.text(root, "groupId"),
            artifact_id: self.text(root, "artifactId"),
            version: self.text(root, "version"),
            packaging: self.text(root, "packaging"),
            name: self.text(root, "name"),
        }
    }

    fn properties(&self, root: Node<'_, '_>) -> BTreeMap<String, String> {
        let Some(block) = self.child(root, "properties") else {
            return BTreeMap::new();
        };

        block
            .children()
            .filter(|c| c.is_element())
            .map(|c| {
                let value = element_text(c).unwrap_or_default();
                (c.tag_name().name().to_string(), value)
            })
            .collect()
    }

    fn dependency(&self, node: Node<'_, '_>) -> Option<Dependency> {
        let artifact_id = self.text(node, "artifactId")?;
        Some(Dependency {
            group_id: self.text(node, "groupId").unwrap_or_default(),
            artifact_id,
            version: self.text(node, "version"),
            scope: self.text(node, "scope"),
        })
    }

    fn dependency_management(&self, root: Node<'_, '_>) -> BTreeMap<String, String> {
        let mut pins = BTreeMap::new();
        let Some(dependencies) = self
            .child(root, "dependencyManagement")
            .and_then(|dm| self.child(dm, "dependencies"))
        else {
            return pins;
        };

        for node in self.children(dependencies, "dependency") {
            if let Some(dependency) = self.dependency(node) {
                if let Some(version) = dependency.version.clone() {
                    pins.insert(dependency.key(), version);
                }
            }
        }
        pins
    }

    fn plugin_management(&self, root: Node<'_, '_>) -> BTreeMap<String, String> {
        let mut pins = BTreeMap::new();
        let Some(plugins) = self
            .child(root, "build")
            .and_then(|build| self.child(build, "pluginManagement"))
            .and_then(|pm| self.child(pm, "plugins"))
        else {
            return pins;
        };

        for node in self.children(plugins, "plugin") {
            let Some(artifact_id) = self.text(node, "artifactId") else {
                continue;
            };
            let group_id = self
                .text(node, "groupId")
                .unwrap_or_else(|| DEFAULT_PLUGIN_GROUP.to_string());
            if let Some(version) = self.text(node, "version") {
                pins.insert(coordinate_key(&group_id, &artifact_id), version);
            }
        }
        pins
    }

    fn plugin(&self, node: Node<'_, '_>) -> Option<Plugin> {
        let artifact_id = self.text(node, "artifactId")?;
        let mut plugin = Plugin::new(
            self.text(node, "groupId")
                .unwrap_or_else(|| DEFAULT_PLUGIN_GROUP.to_string()),
            artifact_id,
        );
        plugin.version = self.text(node, "version");

        if let Some(configuration) = self.child(node, "configuration") {
            flatten_configuration(configuration, "", &mut plugin.configuration);
        }

        if let Some(executions) = self.child(node, "executions") {
            for execution in self.children(executions, "execution") {
                let goals = self
                    .child(execution, "goals")
                    .map(|goals| {
                        self.children(goals, "goal")
                            .filter_map(element_text)
                            .collect()
                    })
                    .unwrap_or_default();

                plugin.executions.push(Execution {
                    id: self.text(execution, "id"),
                    phase: self.text(execution, "phase"),
                    goals,
                });
            }
        }

        Some(plugin)
    }

    fn modules(&self, root: Node<'_, '_>) -> Vec<String> {
        self.child(root, "modules")
            .map(|modules| {
                self.children(modules, "module")
                    .filter_map(element_text)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn element_text(node: Node<'_, '_>) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// `<archive><manifest><mainClass>X</mainClass>` becomes
/// `archive.manifest.mainClass = X`
fn flatten_configuration(node: Node<'_, '_>, prefix: &str, out: &mut BTreeMap<String, String>) {
    for child in node.children().filter(|c| c.is_element()) {
        let key = if prefix.is_empty() {
            child.tag_name().name().to_string()
        } else {
            format!("{}.{}", prefix, child.tag_name().name())
        };

        if child.children().any(|c| c.is_element()) {
            flatten_configuration(child, &key, out);
        } else {
            out.insert(key, element_text(child).unwrap_or_default());
        }
    }
}
