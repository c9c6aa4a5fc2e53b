//! Gradle side of the conversion: build model, translation engine, writer
//! and main-class discovery

pub mod main_class;
pub mod model;
pub mod translate;
pub mod writer;

pub use main_class::{MainClassLocator, SourceScanLocator};
pub use model::{
    Configuration, DependencyDeclaration, DependencyNotation, GradleBuildModel, GradlePlugin,
};
pub use translate::{Diagnostic, PropertyResolver, Translation, Translator, BASELINE_VERSION};
pub use writer::{
    render_build_file, render_settings, write_build_file, write_fixed, write_gitignore,
    write_settings_file, RetentionPolicy, BUILD_FILE, GITIGNORE_FILE, SETTINGS_FILE,
};
