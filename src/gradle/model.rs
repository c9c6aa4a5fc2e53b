//! Gradle build model produced by the translation

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const JAVA_PLUGIN: &str = "java";
pub const APPLICATION_PLUGIN: &str = "application";
pub const SPRING_BOOT_PLUGIN: &str = "org.springframework.boot";

/// Gradle dependency configuration a Maven scope maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Configuration {
    Implementation,
    RuntimeOnly,
    TestImplementation,
    CompileOnly,
}

impl Configuration {
    /// `compile`/absent -> implementation, `runtime` -> runtimeOnly,
    /// `test` -> testImplementation, `provided` -> compileOnly. Scopes with no
    /// Gradle counterpart (`system`, `import`) land in implementation.
    pub fn from_scope(scope: Option<&str>) -> Self {
        match scope.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("runtime") => Configuration::RuntimeOnly,
            Some("test") => Configuration::TestImplementation,
            Some("provided") => Configuration::CompileOnly,
            _ => Configuration::Implementation,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Configuration::Implementation => "implementation",
            Configuration::RuntimeOnly => "runtimeOnly",
            Configuration::TestImplementation => "testImplementation",
            Configuration::CompileOnly => "compileOnly",
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DependencyNotation {
    /// `group:artifact:version`
    Coordinate(String),
    /// Gradle project path, e.g. `:core`
    Project(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyDeclaration {
    pub configuration: Configuration,
    pub notation: DependencyNotation,
}

impl DependencyDeclaration {
    pub fn is_project_reference(&self) -> bool {
        matches!(self.notation, DependencyNotation::Project(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradlePlugin {
    pub id: String,
    pub version: Option<String>,
}

impl GradlePlugin {
    pub fn core(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
        }
    }
}

/// Build description for one Gradle project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GradleBuildModel {
    pub plugins: Vec<GradlePlugin>,
    pub group: Option<String>,
    pub version: Option<String>,
    pub ext_properties: BTreeMap<String, String>,
    pub dependencies: Vec<DependencyDeclaration>,
    pub application_main_class: Option<String>,
    pub spring_boot_main_class: Option<String>,
    pub compiler_source_level: Option<String>,
    pub compiler_target_level: Option<String>,
    pub test_uses_platform: bool,
}

impl GradleBuildModel {
    pub fn has_plugin(&self, id: &str) -> bool {
        self.plugins.iter().any(|p| p.id == id)
    }

    pub fn project_references(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().filter_map(|d| match &d.notation {
            DependencyNotation::Project(path) => Some(path.as_str()),
            DependencyNotation::Coordinate(_) => None,
        })
    }
}
