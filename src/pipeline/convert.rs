//! Offline conversion of a whole Maven project: every module translated,
//! then all Gradle files written

use crate::gradle::{
    write_build_file, write_gitignore, write_settings_file, MainClassLocator, Translation,
    Translator,
};
use crate::maven::{read_descriptor, BuildDescriptor, ModuleRef, ModuleSet, POM_FILE};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A translated member of the project
#[derive(Debug, Clone)]
pub struct ConvertedModule {
    pub member: ModuleRef,
    pub translation: Translation,
}

/// Translations for the root project and every submodule that has a POM
#[derive(Debug, Clone)]
pub struct ProjectConversion {
    pub modules: ModuleSet,
    pub converted: Vec<ConvertedModule>,
    /// Declared modules without a `pom.xml`
    pub skipped: Vec<String>,
}

impl ProjectConversion {
    /// Translates the project rooted at `root`. `main_class` overrides
    /// discovery for the root project only; other members fall back to
    /// `locator` when their POM declares no manifest main class.
    pub fn plan(
        root: &Path,
        main_class: Option<&str>,
        locator: &dyn MainClassLocator,
    ) -> Result<Self> {
        let declared = ModuleSet::discover(root).context("Failed to read module layout")?;

        let mut present = Vec::new();
        let mut skipped = Vec::new();
        for name in declared.names() {
            if root.join(name).join(POM_FILE).is_file() {
                present.push(name.clone());
            } else {
                warn!(module = %name, "Module has no pom.xml, skipping");
                skipped.push(name.clone());
            }
        }

        // Project references may only point at modules that get a build file
        let modules = ModuleSet::new(root, present)?;
        let translator = Translator::for_modules(&modules);

        let mut converted = Vec::new();
        for member in modules.members() {
            let path = member.descriptor_path();
            let descriptor = read_descriptor(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let override_class = main_class.filter(|_| member.is_root());
            let main_class = match override_class {
                Some(class) => Some(class.to_string()),
                None => locate_main_class(&member, &descriptor, locator),
            };
            let translation = translator
                .clone()
                .with_main_class(main_class)
                .translate(&descriptor);

            info!(
                module = %member.name,
                dependencies = translation.model.dependencies.len(),
                diagnostics = translation.diagnostics.len(),
                "Module translated"
            );
            converted.push(ConvertedModule {
                member,
                translation,
            });
        }

        Ok(Self {
            modules,
            converted,
            skipped,
        })
    }

    pub fn root_translation(&self) -> Option<&Translation> {
        self.converted
            .iter()
            .find(|m| m.member.is_root())
            .map(|m| &m.translation)
    }

    /// Writes every build file, then `settings.gradle` and `.gitignore`.
    /// Returns the written paths relative to the project root.
    pub fn write(&self) -> Result<Vec<String>> {
        let root = self.modules.root();
        let mut written = Vec::new();

        for module in &self.converted {
            let path = write_build_file(&module.member.dir, &module.translation.model)
                .with_context(|| format!("Failed to write build file for {}", module.member.name))?;
            written.push(relative(root, &path));
        }

        let settings =
            write_settings_file(&self.modules).context("Failed to write settings.gradle")?;
        written.push(relative(root, &settings));

        let gitignore = write_gitignore(root).context("Failed to write .gitignore")?;
        written.push(relative(root, &gitignore));

        Ok(written)
    }
}

/// Source scan for members whose POM names no entry point. Aggregator POMs
/// get none.
fn locate_main_class(
    member: &ModuleRef,
    descriptor: &BuildDescriptor,
    locator: &dyn MainClassLocator,
) -> Option<String> {
    if descriptor.manifest_main_class().is_some()
        || descriptor.project.packaging.as_deref() == Some("pom")
    {
        return None;
    }

    let found = locator.locate(&member.dir);
    if let Some(main_class) = &found {
        debug!(module = %member.name, main_class = %main_class, locator = locator.name(), "Main class located");
    }
    found
}

/// `path` relative to `root` with `/` separators
fn relative(root: &Path, path: &Path) -> String {
    let relative: PathBuf = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
