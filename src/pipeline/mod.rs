//! Migration workflow: clone, branch, translate, write, build with repairs,
//! publish

pub mod config;
pub mod convert;
pub mod orchestrator;
pub mod report;

pub use config::{MigrationSettings, Workspace, DEFAULT_COMMIT_MESSAGE};
pub use convert::{ConvertedModule, ProjectConversion};
pub use orchestrator::MigrationOrchestrator;
pub use report::{MigrationReport, MigrationState};
