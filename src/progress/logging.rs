//! Logging-based progress handler

use super::{MigrationEvent, ProgressHandler};
use tracing::{debug, error, info, warn};

/// Renders each event as one tracing line
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &MigrationEvent) {
        match event {
            MigrationEvent::Started { project } => {
                info!(project = %project, "Starting Maven to Gradle migration");
            }
            MigrationEvent::StepStarted { step } => {
                info!(step = %step, "Step started");
            }
            MigrationEvent::StepCompleted { step, duration } => {
                debug!(
                    step = %step,
                    duration_ms = duration.as_millis(),
                    "Step complete"
                );
            }
            MigrationEvent::BuildAttempt {
                attempt,
                max_attempts,
            } => {
                info!(
                    progress = format!("{}/{}", attempt, max_attempts),
                    "Running build"
                );
            }
            MigrationEvent::RepairProposed { attempt, changed } => {
                if *changed {
                    info!(attempt, "Applying repaired build file");
                } else {
                    warn!(attempt, "Repair advisor proposed no change");
                }
            }
            MigrationEvent::Completed {
                build_attempts,
                total_time,
            } => {
                info!(
                    build_attempts,
                    total_time_ms = total_time.as_millis(),
                    "Migration complete"
                );
            }
            MigrationEvent::Failed { step, error } => {
                error!(step = %step, error = %error, "Migration failed");
            }
        }
    }
}
