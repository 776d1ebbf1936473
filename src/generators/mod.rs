//! Generator modules that plug into the generation bus
//!
//! A generator is nothing more than a set of phase subscribers. The manifest
//! generator reads its projects, files and placeholder contributions from a
//! TOML file instead of code.

mod generator;
pub mod manifest;

pub use generator::{
    ManifestGenerator, ENTITY_PROPERTY, FILE_NAME_PROPERTY, PROJECT_INDEX_PROPERTY,
};
pub use manifest::{
    ContributionSpec, FileSpec, GenerationManifest, ManifestError, ProjectSpec, SkipRule,
    SolutionSpec,
};
