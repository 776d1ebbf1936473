//! Artifact tree and decorators
//!
//! Artifacts form an ordered tree (workspace, layers, scopes, and the solutions,
//! projects and files a generation run materializes). Behavior is attached
//! through keyed decorators rather than artifact subtypes.

mod decorator;
mod error;
mod kind;
pub mod messages;
mod node;

pub use decorator::{ArtifactDecorator, AsAny, DecoratorBase, GenerationCapability, TagDecorator};
pub use error::{StructuralViolation, TreeError};
pub use kind::{ArtifactKind, ArtifactType, Entity, File, Layer, Project, Scope, Solution, WorkspaceRoot};
pub use messages::{
    ArtifactConstructed, ArtifactGenerated, ArtifactGenerating, ChildAdded, ChildRemoved,
    ContextMenuOpening, DecoratorAdded, DecoratorRemoved, GenerationOutcome, MenuCommand,
    TreeChange, TreeMutation,
};
pub use node::{Artifact, PropertyBag, WeakArtifact};
