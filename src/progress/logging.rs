//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use crate::generation::FileStatus;
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { run_id, target } => {
                info!(run = %run_id, target = %target, "Starting generation");
            }
            ProgressEvent::SolutionPlanned { solution, projects } => {
                info!(solution = %solution, projects, "Solution planned");
            }
            ProgressEvent::ProjectStarted {
                project,
                index,
                total,
                files,
            } => {
                info!(
                    project = %project,
                    progress = format!("{}/{}", index, total),
                    files,
                    "Generating project"
                );
            }
            ProgressEvent::FileFinished {
                project,
                path,
                status,
            } => match status {
                FileStatus::Failed { error } => {
                    warn!(project = %project, path = %path.display(), error = %error, "File failed");
                }
                FileStatus::Skipped { reason } => {
                    debug!(project = %project, path = %path.display(), reason = %reason, "File skipped");
                }
                other => {
                    debug!(project = %project, path = %path.display(), status = other.label(), "File finished");
                }
            },
            ProgressEvent::ProjectComplete {
                project,
                files,
                duration,
            } => {
                info!(
                    project = %project,
                    files,
                    duration_ms = duration.as_millis(),
                    "Project complete"
                );
            }
            ProgressEvent::Completed {
                projects,
                files,
                total_time,
            } => {
                info!(
                    projects,
                    files,
                    total_time_ms = total_time.as_millis(),
                    "Generation complete"
                );
            }
            ProgressEvent::Cancelled { phase, subject } => {
                warn!(phase = %phase, subject = %subject, "Generation cancelled");
            }
            ProgressEvent::Failed { error } => {
                warn!(error = %error, "Generation failed");
            }
        }
    }
}
