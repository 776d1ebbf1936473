//! Progress handler trait and events

use crate::generation::FileStatus;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Events emitted while a generation run progresses
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started for a layer/scope target
    Started { run_id: Uuid, target: String },

    /// Solution subscribers registered their projects
    SolutionPlanned { solution: String, projects: usize },

    /// Project subscribers registered their files
    ProjectStarted {
        project: String,
        index: usize,
        total: usize,
        files: usize,
    },

    /// A file reached its final status
    FileFinished {
        project: String,
        path: PathBuf,
        status: FileStatus,
    },

    /// All files of a project are done
    ProjectComplete {
        project: String,
        files: usize,
        duration: Duration,
    },

    /// Run completed
    Completed {
        projects: usize,
        files: usize,
        total_time: Duration,
    },

    /// Run stopped because cancellation was requested
    Cancelled { phase: String, subject: String },

    /// Run aborted
    Failed { error: String },
}

/// Trait for handling progress events during generation
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {
        // Intentionally empty
    }
}
