//! Progress reporting for migration runs

mod handler;
mod logging;

pub use handler::{MigrationEvent, NoOpHandler, ProgressHandler};
pub use logging::LoggingHandler;
