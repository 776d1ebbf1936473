//! Tree mutation errors

use crate::bus::BusError;
use thiserror::Error;

/// A tree operation that would break the artifact tree's invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralViolation {
    #[error("artifact `{child}` already belongs to `{parent}`")]
    AlreadyParented { child: String, parent: String },

    #[error("artifact `{0}` cannot be its own child")]
    SelfParent(String),

    #[error("adding `{child}` under `{parent}` would create a cycle")]
    Cycle { parent: String, child: String },

    #[error("artifact `{child}` is not a child of `{parent}`")]
    NotAChild { parent: String, child: String },

    #[error("artifact `{artifact}` already has a decorator keyed `{key}`")]
    DuplicateDecorator { artifact: String, key: String },

    #[error("decorator `{key}` is already attached to `{owner}`")]
    DecoratorInUse { key: String, owner: String },

    #[error("artifact `{artifact}` has no decorator keyed `{key}`")]
    MissingDecorator { artifact: String, key: String },
}

/// Errors returned by artifact tree operations
#[derive(Debug, Error)]
pub enum TreeError {
    /// Rejected before any mutation happened
    #[error("structural violation: {0}")]
    Structural(#[from] StructuralViolation),

    /// The mutation was applied, but a subscriber failed while handling its notification
    #[error("tree notification failed: {0}")]
    Notification(#[from] BusError),
}

impl TreeError {
    pub fn violation(&self) -> Option<&StructuralViolation> {
        match self {
            TreeError::Structural(v) => Some(v),
            TreeError::Notification(_) => None,
        }
    }
}
