//! Artifact kind tags
//!
//! Every artifact carries a static [`ArtifactKind`]. Marker types implementing
//! [`ArtifactType`] let subscribers filter on a kind at the type level, e.g.
//! `ArtifactChildAddedSubscriber<Project, File>`.

use serde::Serialize;
use std::fmt;

/// Exact kind of an artifact, compared by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ArtifactKind(&'static str);

impl ArtifactKind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Type-level handle for an [`ArtifactKind`]
pub trait ArtifactType: Send + Sync + 'static {
    const KIND: ArtifactKind;
}

macro_rules! artifact_types {
    ($($(#[$meta:meta])* $name:ident => $tag:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
            pub struct $name;

            impl ArtifactType for $name {
                const KIND: ArtifactKind = ArtifactKind::new($tag);
            }
        )*
    };
}

artifact_types! {
    /// Top of a workspace tree
    WorkspaceRoot => "workspace",
    /// Architectural layer, e.g. "Domain"
    Layer => "layer",
    /// Scope inside a layer, e.g. "Shared"
    Scope => "scope",
    /// Schema entity surfaced in the tree
    Entity => "entity",
    /// Output solution materialized by a generation run
    Solution => "solution",
    /// Output project inside a solution
    Project => "project",
    /// Output file inside a project
    File => "file",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_kinds_are_distinct() {
        let kinds = [
            WorkspaceRoot::KIND,
            Layer::KIND,
            Scope::KIND,
            Entity::KIND,
            Solution::KIND,
            Project::KIND,
            File::KIND,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_custom_kind_compares_by_name() {
        const TABLE: ArtifactKind = ArtifactKind::new("table");
        assert_eq!(TABLE, ArtifactKind::new("table"));
        assert_eq!(TABLE.to_string(), "table");
        assert_ne!(TABLE, Entity::KIND);
    }
}
