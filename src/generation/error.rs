use super::messages::Phase;
use crate::artifact::TreeError;
use crate::bus::BusError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a generation run
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A subscriber failed while a phase message was delivered
    #[error("subscriber failed during {phase} of `{subject}`: {source}")]
    SubscriberFault {
        phase: Phase,
        subject: String,
        #[source]
        source: BusError,
    },

    /// Cancellation was requested; checked between phases
    #[error("generation cancelled before {phase} of `{subject}`")]
    Cancelled { phase: Phase, subject: String },

    #[error("failed to render {}: {error:#}", path.display())]
    Render { path: PathBuf, error: anyhow::Error },

    #[error("failed to persist {}: {error:#}", path.display())]
    Io { path: PathBuf, error: anyhow::Error },

    /// Materializing an artifact for `subject` broke a tree invariant
    #[error("artifact tree update for `{subject}` failed: {source}")]
    Tree {
        subject: String,
        #[source]
        source: TreeError,
    },

    #[error("schema unavailable: {0:#}")]
    Schema(anyhow::Error),

    #[error("generation already running for `{0}`")]
    AlreadyRunning(String),

    /// A run ended in [`Phase`] without a more specific error
    #[error("generation aborted during {phase} of `{subject}`: {error}")]
    Aborted {
        phase: Phase,
        subject: String,
        error: String,
    },
}
