//! Workspace: the artifact tree plus the bus its notifications travel on
//!
//! There is no process-wide registry. Code that needs to react to tree changes
//! receives the workspace (or its bus) explicitly.

use crate::artifact::{
    Artifact, ArtifactKind, ArtifactType, ContextMenuOpening, MenuCommand, TreeError,
    WorkspaceRoot,
};
use crate::bus::{BusError, DeliveryPolicy, MessageBus};
use crate::generation::{CancellationSignal, GenerationError, RunReport};
use crate::progress::ProgressHandler;
use tracing::{debug, info};

pub struct Workspace {
    name: String,
    bus: MessageBus,
    root: Artifact,
}

impl Workspace {
    /// Creates a workspace with a fresh bus and an empty root
    pub fn new(name: impl Into<String>) -> Result<Self, TreeError> {
        Self::with_policy(name, DeliveryPolicy::default())
    }

    pub fn with_policy(name: impl Into<String>, policy: DeliveryPolicy) -> Result<Self, TreeError> {
        let name = name.into();
        let bus = MessageBus::with_policy(format!("workspace:{}", name), policy);
        let root = Artifact::construct_as::<WorkspaceRoot>(&bus, name.clone())?;
        info!(workspace = %name, "Workspace created");
        Ok(Self { name, bus, root })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn root(&self) -> &Artifact {
        &self.root
    }

    /// Constructs a detached artifact on this workspace's bus
    pub fn create(&self, kind: ArtifactKind, id: impl Into<String>) -> Result<Artifact, TreeError> {
        Artifact::construct(&self.bus, kind, id)
    }

    pub fn create_typed<T: ArtifactType>(&self, id: impl Into<String>) -> Result<Artifact, TreeError> {
        Artifact::construct_as::<T>(&self.bus, id)
    }

    /// Every artifact reachable from the root, depth-first pre-order
    pub fn walk(&self) -> Vec<Artifact> {
        self.root.descendants()
    }

    /// First artifact in walk order with `id`
    pub fn find(&self, id: &str) -> Option<Artifact> {
        self.walk().into_iter().find(|a| a.id() == id)
    }

    /// Artifacts that currently expose a ready generation capability
    pub fn generators(&self) -> Vec<Artifact> {
        self.walk().into_iter().filter(|a| a.can_generate()).collect()
    }

    /// Collects the context menu for `artifact` from subscribed modules
    pub fn open_context_menu(&self, artifact: &Artifact) -> Result<Vec<MenuCommand>, BusError> {
        let message = ContextMenuOpening::new(artifact.clone());
        self.bus.publish(&message)?;
        let commands = message.commands.drain();
        debug!(artifact = %artifact.id(), commands = commands.len(), "Context menu built");
        Ok(commands)
    }

    /// Runs generation on every ready artifact, in walk order
    ///
    /// Stops at the first capability error. The walk is computed up front, so
    /// solutions attached by one run are not themselves generated.
    pub async fn generate_all(
        &self,
        progress: &dyn ProgressHandler,
        cancel: &CancellationSignal,
    ) -> Result<Vec<RunReport>, GenerationError> {
        let mut reports = Vec::new();
        for artifact in self.generators() {
            if cancel.is_cancelled() {
                break;
            }
            reports.extend(artifact.generate(progress, cancel).await?);
        }
        Ok(reports)
    }

    /// Detaches every subscriber and tears the tree down
    ///
    /// Returns the number of subscriptions removed.
    pub fn dispose(self) -> usize {
        let removed = self.bus.dispose();
        for artifact in self.root.descendants().into_iter().rev() {
            if let Err(e) = artifact.detach() {
                debug!(artifact = %artifact.id(), error = %e, "Failed to detach during dispose");
            }
        }
        info!(workspace = %self.name, subscribers = removed, "Workspace disposed");
        removed
    }
}
