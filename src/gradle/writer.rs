//! Descriptor writer: renders a [`GradleBuildModel`] as Groovy DSL and
//! writes the project files (`build.gradle`, `settings.gradle`, `.gitignore`)
//!
//! Rendering is pure and deterministic; the same model always yields the same
//! bytes.

use super::model::{DependencyNotation, GradleBuildModel, SPRING_BOOT_PLUGIN};
use crate::maven::ModuleSet;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const BUILD_FILE: &str = "build.gradle";
pub const SETTINGS_FILE: &str = "settings.gradle";
pub const GITIGNORE_FILE: &str = ".gitignore";

pub const SETTINGS_HEADER: &str = "// Auto-generated by pom2gradle";

pub const GITIGNORE_TEMPLATE: &str = "\
# Gradle
.gradle/
build/
!gradle-wrapper.jar

# Java
*.class

# IntelliJ
.idea/
*.iml

# Logs
*.log
";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// What happens to the previous build file when a repaired one replaces it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    /// Overwrite in place; history lives in the working tree's VCS
    #[default]
    SourceControlOnly,
    /// Keep the last `n` versions as `build.gradle.bak.1` (newest) ..
    /// `build.gradle.bak.n`
    KeepGenerations(usize),
}

impl RetentionPolicy {
    pub fn from_generations(generations: usize) -> Self {
        if generations == 0 {
            RetentionPolicy::SourceControlOnly
        } else {
            RetentionPolicy::KeepGenerations(generations)
        }
    }
}

/// Single-quoted Groovy string literal
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub fn render_build_file(model: &GradleBuildModel) -> String {
    let mut out = String::new();

    out.push_str("plugins {\n");
    for plugin in &model.plugins {
        match &plugin.version {
            Some(version) => {
                let _ = writeln!(out, "    id {} version {}", quote(&plugin.id), quote(version));
            }
            None => {
                let _ = writeln!(out, "    id {}", quote(&plugin.id));
            }
        }
    }
    out.push_str("}\n");

    if model.group.is_some() || model.version.is_some() {
        out.push('\n');
        if let Some(group) = &model.group {
            let _ = writeln!(out, "group = {}", quote(group));
        }
        if let Some(version) = &model.version {
            let _ = writeln!(out, "version = {}", quote(version));
        }
    }

    if !model.ext_properties.is_empty() {
        out.push_str("\next {\n");
        for (key, value) in &model.ext_properties {
            let _ = writeln!(out, "    {} = {}", key, quote(value));
        }
        out.push_str("}\n");
    }

    out.push_str("\nrepositories {\n    mavenCentral()\n}\n");

    out.push_str("\ndependencies {\n");
    for declaration in &model.dependencies {
        match &declaration.notation {
            DependencyNotation::Coordinate(coordinate) => {
                let _ = writeln!(out, "    {} {}", declaration.configuration, quote(coordinate));
            }
            DependencyNotation::Project(path) => {
                let _ = writeln!(
                    out,
                    "    {} project({})",
                    declaration.configuration,
                    quote(path)
                );
            }
        }
    }
    out.push_str("}\n");

    if let Some(main_class) = &model.application_main_class {
        let _ = write!(out, "\napplication {{\n    mainClass = {}\n}}\n", quote(main_class));
    }
    if let Some(main_class) = &model.spring_boot_main_class {
        if model.has_plugin(SPRING_BOOT_PLUGIN) {
            let _ = write!(out, "\nspringBoot {{\n    mainClass = {}\n}}\n", quote(main_class));
        }
    }

    if model.compiler_source_level.is_some() || model.compiler_target_level.is_some() {
        out.push_str("\ntasks.withType(JavaCompile) {\n");
        if let Some(source) = &model.compiler_source_level {
            let _ = writeln!(out, "    sourceCompatibility = {}", quote(source));
        }
        if let Some(target) = &model.compiler_target_level {
            let _ = writeln!(out, "    targetCompatibility = {}", quote(target));
        }
        out.push_str("}\n");
    }

    if model.test_uses_platform {
        out.push_str("\ntest {\n    useJUnitPlatform()\n}\n");
    }

    out
}

/// `settings.gradle` naming the root project and including every module
pub fn render_settings(root_project_name: &str, modules: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", SETTINGS_HEADER);
    let _ = writeln!(out, "rootProject.name = {}", quote(root_project_name));
    for module in modules {
        let _ = writeln!(out, "include({})", quote(&module.replace('/', ":")));
    }
    out
}

/// Directory name of the project root, falling back to the canonical path
/// for inputs like `.`
pub fn root_project_name(root: &Path) -> String {
    let named = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
    };
    named(root)
        .filter(|n| n != "." && n != "..")
        .or_else(|| root.canonicalize().ok().as_deref().and_then(named))
        .unwrap_or_else(|| "project".to_string())
}

fn write_text(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut normalized = content.trim().to_string();
    normalized.push('\n');
    fs::write(path, normalized)?;
    strip_bom(path)?;
    Ok(())
}

/// Removes a leading UTF-8 byte-order mark in place. Returns whether one was
/// found.
pub fn strip_bom(path: &Path) -> io::Result<bool> {
    let bytes = fs::read(path)?;
    match bytes.strip_prefix(UTF8_BOM) {
        Some(rest) => {
            warn!(path = %path.display(), "BOM found, removing");
            fs::write(path, rest)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Renders `model` to `<dir>/build.gradle`
pub fn write_build_file(dir: &Path, model: &GradleBuildModel) -> io::Result<PathBuf> {
    let path = dir.join(BUILD_FILE);
    write_text(&path, &render_build_file(model))?;
    info!(path = %path.display(), "build.gradle written");
    Ok(path)
}

pub fn write_settings_file(modules: &ModuleSet) -> io::Result<PathBuf> {
    let path = modules.root().join(SETTINGS_FILE);
    let content = render_settings(&root_project_name(modules.root()), modules.names());
    write_text(&path, &content)?;
    info!(path = %path.display(), modules = ?modules.names(), "settings.gradle written");
    Ok(path)
}

pub fn write_gitignore(dir: &Path) -> io::Result<PathBuf> {
    let path = dir.join(GITIGNORE_FILE);
    write_text(&path, GITIGNORE_TEMPLATE)?;
    info!(path = %path.display(), ".gitignore written");
    Ok(path)
}

fn generation_path(path: &Path, generation: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".bak.{}", generation));
    PathBuf::from(name)
}

/// Replaces the build file at `path` with repaired content, retaining earlier
/// versions according to `policy`
pub fn write_fixed(path: &Path, content: &str, policy: RetentionPolicy) -> io::Result<()> {
    if let RetentionPolicy::KeepGenerations(generations) = policy {
        if generations > 0 && path.exists() {
            let oldest = generation_path(path, generations);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for generation in (1..generations).rev() {
                let from = generation_path(path, generation);
                if from.exists() {
                    fs::rename(&from, generation_path(path, generation + 1))?;
                }
            }
            let newest = generation_path(path, 1);
            fs::copy(path, &newest)?;
            debug!(backup = %newest.display(), "Previous build file retained");
        }
    }

    write_text(path, content)?;
    info!(path = %path.display(), "Repaired build file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradle::model::{Configuration, DependencyDeclaration, GradlePlugin};
    use tempfile::TempDir;

    fn sample_model() -> GradleBuildModel {
        let mut model = GradleBuildModel {
            plugins: vec![
                GradlePlugin::core("java"),
                GradlePlugin::core("application"),
                GradlePlugin {
                    id: SPRING_BOOT_PLUGIN.to_string(),
                    version: Some("3.2.4".to_string()),
                },
            ],
            group: Some("com.example".to_string()),
            version: Some("1.0.0".to_string()),
            dependencies: vec![
                DependencyDeclaration {
                    configuration: Configuration::Implementation,
                    notation: DependencyNotation::Coordinate(
                        "org.springframework.boot:spring-boot-starter-web:3.2.5".to_string(),
                    ),
                },
                DependencyDeclaration {
                    configuration: Configuration::TestImplementation,
                    notation: DependencyNotation::Project(":core".to_string()),
                },
            ],
            application_main_class: Some("com.example.App".to_string()),
            spring_boot_main_class: Some("com.example.App".to_string()),
            compiler_source_level: Some("17".to_string()),
            compiler_target_level: Some("17".to_string()),
            test_uses_platform: true,
            ..Default::default()
        };
        model
            .ext_properties
            .insert("java_version".to_string(), "17".to_string());
        model
    }

    #[test]
    fn test_render_full_build_file() {
        let rendered = render_build_file(&sample_model());
        let expected = "\
plugins {
    id 'java'
    id 'application'
    id 'org.springframework.boot' version '3.2.4'
}

group = 'com.example'
version = '1.0.0'

ext {
    java_version = '17'
}

repositories {
    mavenCentral()
}

dependencies {
    implementation 'org.springframework.boot:spring-boot-starter-web:3.2.5'
    testImplementation project(':core')
}

application {
    mainClass = 'com.example.App'
}

springBoot {
    mainClass = 'com.example.App'
}

tasks.withType(JavaCompile) {
    sourceCompatibility = '17'
    targetCompatibility = '17'
}

test {
    useJUnitPlatform()
}
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_minimal_build_file() {
        let model = GradleBuildModel {
            plugins: vec![GradlePlugin::core("java")],
            ..Default::default()
        };
        let rendered = render_build_file(&model);

        assert!(rendered.starts_with("plugins {\n    id 'java'\n}\n"));
        assert!(rendered.contains("dependencies {\n}\n"));
        assert!(!rendered.contains("ext {"));
        assert!(!rendered.contains("application {"));
        assert!(!rendered.contains("JavaCompile"));
        assert!(!rendered.contains("test {"));
    }

    #[test]
    fn test_spring_boot_block_requires_plugin() {
        let model = GradleBuildModel {
            plugins: vec![GradlePlugin::core("java"), GradlePlugin::core("application")],
            application_main_class: Some("a.Main".to_string()),
            spring_boot_main_class: Some("a.Main".to_string()),
            ..Default::default()
        };
        let rendered = render_build_file(&model);
        assert!(rendered.contains("application {"));
        assert!(!rendered.contains("springBoot {"));
    }

    #[test]
    fn test_quotes_are_escaped() {
        assert_eq!(quote("it's"), r"'it\'s'");
        assert_eq!(quote(r"C:\tmp"), r"'C:\\tmp'");
    }

    #[test]
    fn test_render_settings() {
        let modules = vec!["core".to_string(), "services/api".to_string()];
        assert_eq!(
            render_settings("shop", &modules),
            "// Auto-generated by pom2gradle\nrootProject.name = 'shop'\ninclude('core')\ninclude('services:api')\n"
        );
    }

    #[test]
    fn test_write_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let model = sample_model();

        let path = write_build_file(dir.path(), &model).unwrap();
        let first = fs::read(&path).unwrap();
        write_build_file(dir.path(), &model).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_write_settings_uses_directory_name() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("inventory");
        fs::create_dir(&root).unwrap();
        let modules = ModuleSet::new(&root, vec!["core".to_string()]).unwrap();

        let path = write_settings_file(&modules).unwrap();
        let content = fs::read_to_string(path).unwrap();

        assert!(content.starts_with(SETTINGS_HEADER));
        assert!(content.contains("rootProject.name = 'inventory'"));
        assert!(content.contains("include('core')"));
    }

    #[test]
    fn test_write_gitignore() {
        let dir = TempDir::new().unwrap();
        let path = write_gitignore(dir.path()).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains(".gradle/"));
        assert!(content.contains("!gradle-wrapper.jar"));
        assert!(content.ends_with("*.log\n"));
    }

    #[test]
    fn test_bom_is_stripped_after_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(BUILD_FILE);

        write_fixed(&path, "\u{feff}plugins {}\n", RetentionPolicy::SourceControlOnly).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(!bytes.starts_with(UTF8_BOM));
        assert_eq!(bytes, b"plugins {}\n");
    }

    #[test]
    fn test_write_fixed_without_retention_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(BUILD_FILE);
        fs::write(&path, "old").unwrap();

        write_fixed(&path, "new", RetentionPolicy::SourceControlOnly).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert!(!generation_path(&path, 1).exists());
    }

    #[test]
    fn test_write_fixed_rotates_generations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(BUILD_FILE);
        fs::write(&path, "v1").unwrap();

        let policy = RetentionPolicy::KeepGenerations(2);
        write_fixed(&path, "v2", policy).unwrap();
        write_fixed(&path, "v3", policy).unwrap();
        write_fixed(&path, "v4", policy).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "v4\n");
        assert_eq!(fs::read_to_string(generation_path(&path, 1)).unwrap(), "v3\n");
        assert_eq!(fs::read_to_string(generation_path(&path, 2)).unwrap(), "v2\n");
        assert!(!generation_path(&path, 3).exists());
    }

    #[test]
    fn test_retention_from_generations() {
        assert_eq!(
            RetentionPolicy::from_generations(0),
            RetentionPolicy::SourceControlOnly
        );
        assert_eq!(
            RetentionPolicy::from_generations(3),
            RetentionPolicy::KeepGenerations(3)
        );
    }
}
