//! Notifications published on a workspace bus

use super::Artifact;
use crate::bus::{Bucket, Message};
use serde::Serialize;
use std::any::Any;

/// An artifact was created through [`Artifact::construct`]
#[derive(Debug, Clone)]
pub struct ArtifactConstructed {
    pub artifact: Artifact,
}

impl Message for ArtifactConstructed {}

/// Direction of a structural change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TreeChange {
    Added,
    Removed,
}

/// Base payload shared by [`ChildAdded`] and [`ChildRemoved`]
///
/// Subscribe to this type to observe every structural change of a tree.
#[derive(Debug, Clone)]
pub struct TreeMutation {
    pub parent: Artifact,
    pub child: Artifact,
    pub change: TreeChange,
}

#[derive(Debug, Clone)]
pub struct ChildAdded {
    pub mutation: TreeMutation,
}

impl ChildAdded {
    pub(crate) fn new(parent: Artifact, child: Artifact) -> Self {
        Self {
            mutation: TreeMutation {
                parent,
                child,
                change: TreeChange::Added,
            },
        }
    }

    pub fn parent(&self) -> &Artifact {
        &self.mutation.parent
    }

    pub fn child(&self) -> &Artifact {
        &self.mutation.child
    }
}

impl Message for ChildAdded {
    fn bases(&self) -> Vec<&(dyn Any + Send + Sync)> {
        vec![&self.mutation]
    }
}

#[derive(Debug, Clone)]
pub struct ChildRemoved {
    pub mutation: TreeMutation,
}

impl ChildRemoved {
    pub(crate) fn new(parent: Artifact, child: Artifact) -> Self {
        Self {
            mutation: TreeMutation {
                parent,
                child,
                change: TreeChange::Removed,
            },
        }
    }

    pub fn parent(&self) -> &Artifact {
        &self.mutation.parent
    }

    pub fn child(&self) -> &Artifact {
        &self.mutation.child
    }
}

impl Message for ChildRemoved {
    fn bases(&self) -> Vec<&(dyn Any + Send + Sync)> {
        vec![&self.mutation]
    }
}

#[derive(Debug, Clone)]
pub struct DecoratorAdded {
    pub artifact: Artifact,
    pub key: String,
}

impl Message for DecoratorAdded {}

#[derive(Debug, Clone)]
pub struct DecoratorRemoved {
    pub artifact: Artifact,
    pub key: String,
}

impl Message for DecoratorRemoved {}

/// A decorator's generation capability is about to run
#[derive(Debug, Clone)]
pub struct ArtifactGenerating {
    pub artifact: Artifact,
    pub decorator: String,
}

impl Message for ArtifactGenerating {}

/// Final state of one generation capability invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GenerationOutcome {
    Completed,
    Cancelled,
    Aborted(String),
}

/// A decorator's generation capability finished
#[derive(Debug, Clone)]
pub struct ArtifactGenerated {
    pub artifact: Artifact,
    pub decorator: String,
    pub outcome: GenerationOutcome,
}

impl Message for ArtifactGenerated {}

/// Entry contributed to an artifact's context menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuCommand {
    pub id: String,
    pub label: String,
    pub registered_by: String,
}

impl MenuCommand {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        registered_by: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            registered_by: registered_by.into(),
        }
    }
}

/// A context menu is being built for `artifact`
///
/// Subscribers append commands; the bucket is sealed once delivery finishes.
#[derive(Debug)]
pub struct ContextMenuOpening {
    pub artifact: Artifact,
    pub commands: Bucket<MenuCommand>,
}

impl ContextMenuOpening {
    pub fn new(artifact: Artifact) -> Self {
        Self {
            artifact,
            commands: Bucket::new("commands"),
        }
    }
}

impl Message for ContextMenuOpening {}
