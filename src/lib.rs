//! artigen - artifact tree and multi-phase code generation
//!
//! This library models a workspace as a tree of artifacts with pluggable
//! decorators, broadcasts every tree change on a typed message bus, and drives
//! code generation through a fixed sequence of phases that independently
//! written generator modules subscribe to.
//!
//! # Core Concepts
//!
//! - **Artifacts**: Nodes of the workspace tree (layers, scopes, solutions,
//!   projects, files) carrying properties and keyed decorators
//! - **Message Bus**: Synchronous, type-keyed publish/subscribe; a handler for a
//!   base payload also receives every message embedding it
//! - **Generation Phases**: Solution, project, file and placeholder requests
//!   whose buckets subscribers fill; placeholder contributions are joined by
//!   ascending priority
//!
//! # Example Usage
//!
//! ```
//! use artigen::bus::MessageBus;
//! use artigen::generation::{
//!     CancellationSignal, CreatingSolution, GenerationContext, GenerationOrchestrator,
//!     MemoryPersistence, PlaceholderRenderer, ProjectRegistration, Schema,
//! };
//! use artigen::progress::NoOpHandler;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = MessageBus::new("generation");
//! bus.subscribe(|m: &CreatingSolution| {
//!     m.projects
//!         .push(ProjectRegistration::new("Domain.Shared", "Domain", "Shared", "docs"))?;
//!     Ok(())
//! });
//!
//! let orchestrator = GenerationOrchestrator::new(
//!     bus,
//!     Arc::new(PlaceholderRenderer::new()),
//!     Arc::new(MemoryPersistence::new()),
//! );
//! let context = GenerationContext::new(Arc::new(Schema::new("Shop")), "Domain", "Shared");
//! let report = orchestrator
//!     .run(&MessageBus::new("tree"), context, &NoOpHandler, &CancellationSignal::new())
//!     .await;
//!
//! assert!(report.is_completed());
//! assert_eq!(report.result.projects()[0].name, "Domain.Shared");
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`artifact`]: Artifact tree, kinds, decorators and tree notifications
//! - [`bus`]: Message bus, delivery policies and buckets
//! - [`subscribers`]: Kind-filtered subscribers for tree notifications
//! - [`generation`]: Orchestrator, phase messages and collaborators
//! - [`generators`]: Manifest-driven generator module
//! - [`workspace`]: Workspace owning a tree and its bus

pub mod artifact;
pub mod bus;
pub mod cli;
pub mod config;
pub mod generation;
pub mod generators;
pub mod progress;
pub mod subscribers;
pub mod util;
pub mod workspace;

// Re-export key types for convenient access
pub use artifact::{Artifact, ArtifactDecorator, ArtifactKind, ArtifactType, TreeError};
pub use bus::{Bucket, BusError, DeliveryPolicy, Message, MessageBus};
pub use config::{ArtigenConfig, ConfigError};
pub use generation::{
    GenerationContext, GenerationError, GenerationOrchestrator, GenerationResult, RunReport,
    RunStatus,
};
pub use generators::{GenerationManifest, ManifestError, ManifestGenerator};
pub use progress::{LoggingHandler, NoOpHandler, ProgressEvent, ProgressHandler};
pub use util::{init_logging, LoggingConfig};
pub use workspace::Workspace;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
