//! Attachable capabilities
//!
//! A decorator adds behavior to any artifact without a dedicated artifact type.
//! Implementors embed a [`DecoratorBase`] for the key, owner link and property
//! bag, and override [`ArtifactDecorator::generator`] when they can generate.

use super::{Artifact, PropertyBag, WeakArtifact};
use crate::generation::{CancellationSignal, GenerationError, RunReport};
use crate::progress::ProgressHandler;
use async_trait::async_trait;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Upcasting helper so decorators can be probed by concrete type
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &(dyn Any + Send + Sync);
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Generation capability a decorator may expose
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    /// Whether [`GenerationCapability::generate`] may be invoked right now
    fn can_generate(&self) -> bool;

    /// Runs generation on behalf of `owner`
    async fn generate(
        &self,
        owner: &Artifact,
        progress: &dyn ProgressHandler,
        cancel: &CancellationSignal,
    ) -> Result<RunReport, GenerationError>;
}

/// Capability object attached to an [`Artifact`]
pub trait ArtifactDecorator: AsAny {
    fn base(&self) -> &DecoratorBase;

    /// Unique key within the owning artifact
    fn key(&self) -> &str {
        self.base().key()
    }

    fn owner(&self) -> Option<Artifact> {
        self.base().owner()
    }

    fn generator(&self) -> Option<&dyn GenerationCapability> {
        None
    }
}

/// State every decorator carries
pub struct DecoratorBase {
    key: String,
    owner: RwLock<Option<WeakArtifact>>,
    properties: RwLock<PropertyBag>,
}

impl DecoratorBase {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            owner: RwLock::new(None),
            properties: RwLock::new(PropertyBag::new()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Owning artifact, if attached and still alive
    pub fn owner(&self) -> Option<Artifact> {
        self.owner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(WeakArtifact::upgrade)
    }

    pub fn is_attached(&self) -> bool {
        self.owner().is_some()
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn set_property(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
    }

    pub fn properties(&self) -> PropertyBag {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records `owner`. Fails with the current owner's id if attached elsewhere.
    pub(crate) fn attach(&self, owner: &Artifact) -> Result<(), String> {
        let mut slot = self.owner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = slot.as_ref().and_then(WeakArtifact::upgrade) {
            if !current.ptr_eq(owner) {
                return Err(current.id().to_string());
            }
        }
        *slot = Some(owner.downgrade());
        Ok(())
    }

    pub(crate) fn detach(&self) {
        *self.owner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl fmt::Debug for DecoratorBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorBase")
            .field("key", &self.key)
            .field("owner", &self.owner().map(|o| o.id().to_string()))
            .finish()
    }
}

/// Plain decorator that only carries a key and properties
///
/// Useful as a marker capability ("has template binding", "is pinned").
#[derive(Debug)]
pub struct TagDecorator {
    base: DecoratorBase,
}

impl TagDecorator {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            base: DecoratorBase::new(key),
        }
    }

    pub fn with_property(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.base.set_property(name, value);
        self
    }
}

impl ArtifactDecorator for TagDecorator {
    fn base(&self) -> &DecoratorBase {
        &self.base
    }
}
