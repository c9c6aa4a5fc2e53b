//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while a migration runs
#[derive(Debug, Clone)]
pub enum MigrationEvent {
    /// Migration started
    Started { project: String },

    /// A workflow step began
    StepStarted { step: String },

    /// A workflow step finished
    StepCompleted { step: String, duration: Duration },

    /// A build run is about to start (1-based)
    BuildAttempt { attempt: u32, max_attempts: u32 },

    /// The repair advisor answered; `changed` is false when the proposal
    /// matched the current build file
    RepairProposed { attempt: u32, changed: bool },

    /// Migration finished successfully
    Completed {
        build_attempts: u32,
        total_time: Duration,
    },

    /// Migration failed
    Failed { step: String, error: String },
}

/// Receives [`MigrationEvent`]s
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &MigrationEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &MigrationEvent) {}
}
