//! Records of what a run materialized

use super::error::GenerationError;
use super::messages::Phase;
use crate::artifact::Artifact;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// Content was handed to persistence and stored
    Written,
    /// Target exists and the registration does not allow overwriting
    Unchanged,
    /// A `CreatingFile` subscriber cancelled the file
    Skipped { reason: String },
    /// Persistence reported an error
    Failed { error: String },
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Written => "written",
            FileStatus::Unchanged => "unchanged",
            FileStatus::Skipped { .. } => "skipped",
            FileStatus::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub project: String,
    pub name: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
    pub registered_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRecord {
    pub name: String,
    pub layer: String,
    pub scope: String,
    pub registered_by: String,
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolutionRecord {
    pub name: String,
    pub projects: Vec<String>,
}

/// Append-only record of one run
///
/// Files are recorded as they complete, projects once `CreatedProject` has been
/// delivered. An aborted run keeps whatever was recorded up to the failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    solution: Option<SolutionRecord>,
    projects: Vec<ProjectRecord>,
    files: Vec<FileRecord>,
}

impl GenerationResult {
    pub fn solution(&self) -> Option<&SolutionRecord> {
        self.solution.as_ref()
    }

    pub fn projects(&self) -> &[ProjectRecord] {
        &self.projects
    }

    /// Every recorded file in creation order, across projects
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn project(&self, name: &str) -> Option<&ProjectRecord> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn count(&self, label: &str) -> usize {
        self.files
            .iter()
            .filter(|f| f.status.label() == label)
            .count()
    }

    pub(crate) fn record_file(&mut self, record: FileRecord) {
        self.files.push(record);
    }

    pub(crate) fn record_project(&mut self, record: ProjectRecord) {
        self.projects.push(record);
    }

    pub(crate) fn record_solution(&mut self, record: SolutionRecord) {
        self.solution = Some(record);
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled {
        phase: Phase,
        subject: String,
    },
    /// A subscriber or collaborator failed; `phase` and `subject` locate it
    Aborted {
        phase: Phase,
        subject: String,
        error: String,
    },
}

/// Outcome of one orchestration run
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub result: GenerationResult,
    /// Set when the run aborted
    pub error: Option<GenerationError>,
    /// Solution artifact, if the run got that far
    pub solution: Option<Artifact>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, RunStatus::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.status, RunStatus::Cancelled { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.status, RunStatus::Aborted { .. })
    }

    /// Marks the run aborted by a failure raised after the pipeline returned
    ///
    /// An earlier abort is kept; the later error is only logged.
    pub fn record_failure(&mut self, phase: Phase, subject: impl Into<String>, error: GenerationError) {
        if self.is_aborted() {
            warn!(run = %self.run_id, error = %error, "Ignoring failure after run already aborted");
            return;
        }
        self.status = RunStatus::Aborted {
            phase,
            subject: subject.into(),
            error: error.to_string(),
        };
        self.error = Some(error);
    }

    /// The result of a completed run, or the error that ended it
    pub fn into_result(self) -> Result<GenerationResult, GenerationError> {
        match self.status {
            RunStatus::Completed => Ok(self.result),
            RunStatus::Cancelled { phase, subject } => {
                Err(GenerationError::Cancelled { phase, subject })
            }
            RunStatus::Aborted {
                phase,
                subject,
                error,
            } => Err(self.error.unwrap_or(GenerationError::Aborted {
                phase,
                subject,
                error,
            })),
        }
    }
}
