//! Maven -> Gradle translation engine
//!
//! Turns one [`BuildDescriptor`] into a [`GradleBuildModel`]. Missing optional
//! data (versions, properties, main class) never fails the translation; every
//! fallback is recorded as a [`Diagnostic`] and logged.

use super::model::{
    Configuration, DependencyDeclaration, DependencyNotation, GradleBuildModel, GradlePlugin,
    APPLICATION_PLUGIN, JAVA_PLUGIN, SPRING_BOOT_PLUGIN,
};
use crate::maven::model::SPRING_BOOT_MAVEN_PLUGIN;
use crate::maven::{
    match_module, read_descriptor, BuildDescriptor, Dependency, DescriptorError, ModuleSet,
    ProjectCoordinates,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Version used when nothing else resolves
pub const BASELINE_VERSION: &str = "3.2.5";

pub const DEFAULT_COMPILER_LEVEL: &str = "11";

/// Known versions for artifacts commonly declared without one
const DEFAULT_VERSIONS: &[(&str, &str)] = &[
    ("spring-boot-starter-web", "3.2.5"),
    ("spring-boot-starter", "3.2.5"),
    ("spring-boot-starter-test", "3.2.5"),
    ("spring-boot-starter-data-jpa", "3.2.5"),
    ("spring-boot-devtools", "3.2.5"),
];

/// Plugin-management pins whose version is the Spring Boot Gradle plugin version
const SPRING_BOOT_PLUGIN_PINS: &[&str] = &[
    "org.springframework.boot:spring-boot-gradle-plugin",
    "org.springframework.boot:spring-boot-maven-plugin",
];

/// Project identity keys; never carried into `ext`
const RESERVED_PROPERTY_KEYS: &[&str] = &["version", "group", "name"];

const COMPILER_PLUGIN: &str = "maven-compiler-plugin";
const SUREFIRE_PLUGIN: &str = "maven-surefire-plugin";

const MAX_PLACEHOLDER_DEPTH: usize = 8;

/// Non-fatal findings of a translation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    PropertyRenamed { from: String, to: String },
    PropertyKeyCollision { key: String, kept: String, dropped: String },
    UnresolvedPlaceholder { coordinate: String, key: String },
    ManagedVersionApplied { coordinate: String, version: String },
    DefaultVersionApplied { coordinate: String, version: String },
    BaselineVersionApplied { coordinate: String, version: String },
    SpringBootUnversioned,
    MainClassFromManifest { main_class: String },
}

impl Diagnostic {
    fn is_warning(&self) -> bool {
        matches!(
            self,
            Diagnostic::UnresolvedPlaceholder { .. }
                | Diagnostic::BaselineVersionApplied { .. }
                | Diagnostic::PropertyKeyCollision { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::PropertyRenamed { from, to } => {
                write!(f, "Renamed property key: {} -> {}", from, to)
            }
            Diagnostic::PropertyKeyCollision { key, kept, dropped } => write!(
                f,
                "Properties {} and {} both map to ext key {}, keeping {}",
                kept, dropped, key, kept
            ),
            Diagnostic::UnresolvedPlaceholder { coordinate, key } => {
                write!(f, "Unresolved version property ${{{}}} used in {}", key, coordinate)
            }
            Diagnostic::ManagedVersionApplied {
                coordinate,
                version,
            } => write!(f, "Using dependencyManagement version '{}' for {}", version, coordinate),
            Diagnostic::DefaultVersionApplied {
                coordinate,
                version,
            } => write!(f, "Using default version '{}' for {}", version, coordinate),
            Diagnostic::BaselineVersionApplied {
                coordinate,
                version,
            } => write!(
                f,
                "No specific version for {}, using fallback version {}",
                coordinate, version
            ),
            Diagnostic::SpringBootUnversioned => write!(
                f,
                "spring-boot-maven-plugin has no pinned version, applying the Gradle plugin unversioned"
            ),
            Diagnostic::MainClassFromManifest { main_class } => {
                write!(f, "Extracted mainClass from plugin manifest: {}", main_class)
            }
        }
    }
}

/// Result of translating one module
#[derive(Debug, Clone)]
pub struct Translation {
    pub model: GradleBuildModel,
    pub diagnostics: Vec<Diagnostic>,
}

/// Translates descriptors against a fixed, project-wide set of module names
#[derive(Debug, Clone)]
pub struct Translator<'a> {
    module_names: &'a [String],
    main_class: Option<String>,
}

impl<'a> Translator<'a> {
    pub fn new(module_names: &'a [String]) -> Self {
        Self {
            module_names,
            main_class: None,
        }
    }

    pub fn for_modules(modules: &'a ModuleSet) -> Self {
        Self::new(modules.names())
    }

    /// Main class supplied from outside the descriptor; takes precedence over
    /// a manifest declaration
    pub fn with_main_class(mut self, main_class: Option<String>) -> Self {
        self.main_class = main_class.filter(|c| !c.trim().is_empty());
        self
    }

    /// Reads `path` and translates it. Fails with
    /// [`DescriptorError::Missing`] before any parsing if the file is absent.
    pub fn translate_file(&self, path: &Path) -> Result<Translation, DescriptorError> {
        if !path.is_file() {
            return Err(DescriptorError::Missing(path.to_path_buf()));
        }
        let descriptor = read_descriptor(path)?;
        Ok(self.translate(&descriptor))
    }

    pub fn translate(&self, descriptor: &BuildDescriptor) -> Translation {
        let mut run = TranslationRun {
            descriptor,
            properties: PropertyResolver::new(&descriptor.properties, &descriptor.project),
            diagnostics: Vec::new(),
        };
        let mut model = GradleBuildModel::default();

        let main_class = self.main_class.clone().or_else(|| {
            let discovered = descriptor.manifest_main_class()?;
            run.record(Diagnostic::MainClassFromManifest {
                main_class: discovered.clone(),
            });
            Some(discovered)
        });

        run.select_plugins(&mut model, main_class.is_some());
        run.carry_identity(&mut model);
        run.carry_properties(&mut model);
        for dependency in &descriptor.dependencies {
            let declaration = run.translate_dependency(dependency, self.module_names);
            model.dependencies.push(declaration);
        }
        run.derive_plugin_configuration(&mut model);

        if let Some(main_class) = main_class {
            if model.has_plugin(SPRING_BOOT_PLUGIN) {
                model.spring_boot_main_class = Some(main_class.clone());
            }
            model.application_main_class = Some(main_class);
        }

        Translation {
            model,
            diagnostics: run.diagnostics,
        }
    }
}

struct TranslationRun<'d> {
    descriptor: &'d BuildDescriptor,
    properties: PropertyResolver<'d>,
    diagnostics: Vec<Diagnostic>,
}

impl<'d> TranslationRun<'d> {
    fn record(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_warning() {
            warn!("{}", diagnostic);
        } else {
            info!("{}", diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }

    fn select_plugins(&mut self, model: &mut GradleBuildModel, has_main_class: bool) {
        model.plugins.push(GradlePlugin::core(JAVA_PLUGIN));
        if has_main_class {
            model.plugins.push(GradlePlugin::core(APPLICATION_PLUGIN));
        }

        if let Some(spring_boot) = self.spring_boot_plugin() {
            model.plugins.push(spring_boot);
        }
    }

    fn spring_boot_plugin(&mut self) -> Option<GradlePlugin> {
        for key in SPRING_BOOT_PLUGIN_PINS {
            let Some(raw) = self.descriptor.plugin_management_versions.get(*key) else {
                continue;
            };
            match self.properties.resolve(raw) {
                Ok(version) => {
                    return Some(GradlePlugin {
                        id: SPRING_BOOT_PLUGIN.to_string(),
                        version: Some(version),
                    });
                }
                Err(missing) => self.record(Diagnostic::UnresolvedPlaceholder {
                    coordinate: key.to_string(),
                    key: missing,
                }),
            }
        }

        let maven_plugin = self.descriptor.find_plugin(SPRING_BOOT_MAVEN_PLUGIN)?;
        let explicit = maven_plugin
            .version
            .as_deref()
            .and_then(|v| self.properties.resolve(v).ok());
        if explicit.is_none() {
            self.record(Diagnostic::SpringBootUnversioned);
        }
        Some(GradlePlugin {
            id: SPRING_BOOT_PLUGIN.to_string(),
            version: explicit,
        })
    }

    fn carry_identity(&self, model: &mut GradleBuildModel) {
        let project = &self.descriptor.project;
        model.group = project.group_id.clone();
        model.version = project
            .version
            .as_deref()
            .and_then(|v| self.properties.resolve(v).ok());
    }

    /// Sanitized keys that collide keep the first property in key order
    fn carry_properties(&mut self, model: &mut GradleBuildModel) {
        let mut origins: BTreeMap<String, &str> = BTreeMap::new();

        for (key, value) in &self.descriptor.properties {
            if RESERVED_PROPERTY_KEYS.contains(&key.as_str()) {
                continue;
            }
            let safe_key = sanitize_property_key(key);
            if let Some(kept) = origins.get(&safe_key) {
                self.record(Diagnostic::PropertyKeyCollision {
                    key: safe_key,
                    kept: kept.to_string(),
                    dropped: key.clone(),
                });
                continue;
            }
            if &safe_key != key {
                self.record(Diagnostic::PropertyRenamed {
                    from: key.clone(),
                    to: safe_key.clone(),
                });
            }
            origins.insert(safe_key.clone(), key.as_str());
            model.ext_properties.insert(safe_key, value.clone());
        }
    }

    fn translate_dependency(
        &mut self,
        dependency: &Dependency,
        module_names: &[String],
    ) -> DependencyDeclaration {
        let configuration = Configuration::from_scope(dependency.scope.as_deref());

        if let Some(module) = match_module(module_names, &dependency.artifact_id) {
            return DependencyDeclaration {
                configuration,
                notation: DependencyNotation::Project(ModuleSet::gradle_path(module)),
            };
        }

        let version = self.resolve_version(dependency);
        DependencyDeclaration {
            configuration,
            notation: DependencyNotation::Coordinate(format!(
                "{}:{}:{}",
                dependency.group_id, dependency.artifact_id, version
            )),
        }
    }

    /// declared (through properties) -> dependencyManagement pin -> defaults
    /// table -> baseline
    fn resolve_version(&mut self, dependency: &Dependency) -> String {
        let coordinate = dependency.key();
        let declared = dependency
            .version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let resolved = match declared {
            Some(raw) => match self.properties.resolve(raw) {
                Ok(version) => Some(version),
                Err(key) => {
                    self.record(Diagnostic::UnresolvedPlaceholder {
                        coordinate: coordinate.clone(),
                        key,
                    });
                    None
                }
            },
            None => self.managed_version(&coordinate),
        };
        if let Some(version) = resolved {
            return version;
        }

        if let Some(version) = default_version(&dependency.artifact_id) {
            self.record(Diagnostic::DefaultVersionApplied {
                coordinate,
                version: version.to_string(),
            });
            return version.to_string();
        }

        self.record(Diagnostic::BaselineVersionApplied {
            coordinate,
            version: BASELINE_VERSION.to_string(),
        });
        BASELINE_VERSION.to_string()
    }

    fn managed_version(&mut self, coordinate: &str) -> Option<String> {
        let raw = self.descriptor.dependency_management_versions.get(coordinate)?;
        match self.properties.resolve(raw) {
            Ok(version) => {
                self.record(Diagnostic::ManagedVersionApplied {
                    coordinate: coordinate.to_string(),
                    version: version.clone(),
                });
                Some(version)
            }
            Err(key) => {
                self.record(Diagnostic::UnresolvedPlaceholder {
                    coordinate: coordinate.to_string(),
                    key,
                });
                None
            }
        }
    }

    fn derive_plugin_configuration(&self, model: &mut GradleBuildModel) {
        for plugin in &self.descriptor.build_plugins {
            match plugin.artifact_id.as_str() {
                COMPILER_PLUGIN => {
                    let source = self.compiler_level(
                        [plugin.config("source"), plugin.config("release")],
                        "maven.compiler.source",
                    );
                    let target = self.compiler_level(
                        [plugin.config("target"), plugin.config("release")],
                        "maven.compiler.target",
                    );
                    model.compiler_source_level = Some(source);
                    model.compiler_target_level = Some(target);
                }
                SUREFIRE_PLUGIN => model.test_uses_platform = true,
                _ => {}
            }
        }
    }

    fn compiler_level(&self, configured: [Option<&str>; 2], property: &str) -> String {
        let from_properties = [property, "maven.compiler.release", "java.version"]
            .into_iter()
            .map(|key| self.descriptor.properties.get(key).map(String::as_str));

        configured
            .into_iter()
            .chain(from_properties)
            .flatten()
            .find_map(|raw| {
                self.properties
                    .resolve(raw)
                    .ok()
                    .filter(|level| !level.is_empty())
            })
            .unwrap_or_else(|| DEFAULT_COMPILER_LEVEL.to_string())
    }
}

/// Replaces `.` and `-`, which Gradle does not allow in bare identifiers
pub fn sanitize_property_key(key: &str) -> String {
    key.replace(['.', '-'], "_")
}

pub fn default_version(artifact_id: &str) -> Option<&'static str> {
    DEFAULT_VERSIONS
        .iter()
        .find(|(artifact, _)| *artifact == artifact_id)
        .map(|(_, version)| *version)
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid placeholder pattern"))
}

/// Expands `${key}` references from the POM properties and the project's own
/// coordinates
pub struct PropertyResolver<'d> {
    properties: &'d BTreeMap<String, String>,
    project: &'d ProjectCoordinates,
}

impl<'d> PropertyResolver<'d> {
    pub fn new(properties: &'d BTreeMap<String, String>, project: &'d ProjectCoordinates) -> Self {
        Self {
            properties,
            project,
        }
    }

    fn lookup(&self, key: &str) -> Option<&'d str> {
        if let Some(value) = self.properties.get(key) {
            return Some(value.as_str());
        }
        match key {
            "project.version" | "pom.version" => self.project.version.as_deref(),
            "project.groupId" | "pom.groupId" => self.project.group_id.as_deref(),
            "project.artifactId" | "pom.artifactId" => self.project.artifact_id.as_deref(),
            _ => None,
        }
    }

    /// Fully expanded value, or the first key that could not be resolved
    pub fn resolve(&self, value: &str) -> Result<String, String> {
        let pattern = placeholder_pattern();
        let mut current = value.trim().to_string();

        for _ in 0..MAX_PLACEHOLDER_DEPTH {
            if !pattern.is_match(&current) {
                return Ok(current);
            }
            if let Some(missing) = pattern
                .captures_iter(&current)
                .map(|caps| caps[1].to_string())
                .find(|key| self.lookup(key).is_none())
            {
                return Err(missing);
            }
            current = pattern
                .replace_all(&current, |caps: &regex::Captures<'_>| {
                    self.lookup(&caps[1]).unwrap_or_default().to_string()
                })
                .into_owned();
        }

        // Still unexpanded after the depth limit: a reference cycle
        match pattern.captures(&current) {
            Some(caps) => Err(caps[1].to_string()),
            None => Ok(current),
        }
    }
}
