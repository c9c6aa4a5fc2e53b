//! pom2gradle - Maven to Gradle migration with LLM-assisted build repair
//!
//! The library reads Maven POMs, translates them into Gradle build models,
//! writes `build.gradle`/`settings.gradle`, runs the Gradle build and, when it
//! fails, asks an LLM for a corrected build file. A successful result can be
//! committed and published as a GitHub pull request.
//!
//! # Example Usage
//!
//! ```no_run
//! use pom2gradle::gradle::{render_build_file, Translator};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let modules: Vec<String> = Vec::new();
//! let translation = Translator::new(&modules).translate_file(Path::new("pom.xml"))?;
//! for diagnostic in &translation.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! print!("{}", render_build_file(&translation.model));
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`maven`]: POM reader and module topology
//! - [`gradle`]: translation engine, build model and file writer
//! - [`build`]: Gradle build runner
//! - [`repair`]: build-file repair advisor over an [`llm::LLMClient`]
//! - [`scm`]: git operations and pull requests
//! - [`pipeline`]: the migration workflow

pub mod build;
pub mod cli;
pub mod config;
pub mod gradle;
pub mod llm;
pub mod maven;
pub mod pipeline;
pub mod progress;
pub mod repair;
pub mod scm;
pub mod util;

pub use config::{ConfigError, GitHubSettings, MigrationConfig};
pub use gradle::{Diagnostic, GradleBuildModel, Translation, Translator};
pub use maven::{BuildDescriptor, DescriptorError, ModuleSet};
pub use pipeline::{MigrationOrchestrator, MigrationReport, MigrationState, Workspace};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
