//! Multi-phase generation pipeline
//!
//! A run walks a fixed sequence of phases for one schema and layer/scope pair:
//!
//! 1. `CreatingSolution`: subscribers register projects
//! 2. `CreatingProject`, per project: subscribers register files
//! 3. `CreatingFile`, per file: subscribers may cancel the file; otherwise
//!    `PlaceholderContentRequested` is published for each placeholder and the
//!    contributions are joined by ascending priority
//! 4. `CreatedFile`, `CreatedProject` and `CreatedSolution` announce results
//!
//! Any subscriber error aborts the run. The partial [`GenerationResult`] is
//! still returned in the [`RunReport`].

mod binding;
mod cancel;
mod context;
mod decorator;
mod error;
pub mod messages;
mod orchestrator;
mod persistence;
pub mod placeholder;
mod registration;
mod renderer;
mod result;

pub use binding::{TemplateBinding, TEMPLATE_BINDING_KEY};
pub use cancel::CancellationSignal;
pub use context::{
    AttributeDef, EntityDef, GenerationContext, JsonSchemaProvider, Schema, SchemaProvider,
    StaticSchemaProvider,
};
pub use decorator::{GenerationDecorator, DEFAULT_SCOPE, GENERATION_KEY};
pub use error::GenerationError;
pub use messages::{
    CreatedFile, CreatedProject, CreatedSolution, CreatingFile, CreatingProject, CreatingSolution,
    Phase, PipelineNotice, PlaceholderContentRequested,
};
pub use orchestrator::{GenerationConfig, GenerationOrchestrator, DEFAULT_PLACEHOLDER_SEPARATOR};
pub use persistence::{MemoryPersistence, Persistence, WriteOutcome};
pub use registration::{FileRegistration, PlaceholderContent, ProjectRegistration, TemplateRef};
pub use renderer::{PlaceholderRenderer, TemplateRenderer};
pub use result::{
    FileRecord, FileStatus, GenerationResult, ProjectRecord, RunReport, RunStatus, SolutionRecord,
};
