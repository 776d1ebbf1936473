use super::TreeSubscriber;
use crate::artifact::{Artifact, ArtifactConstructed, ArtifactType};
use crate::bus::HandlerResult;
use std::marker::PhantomData;

type ConstructedFn = Box<dyn Fn(&Artifact) -> HandlerResult + Send + Sync>;

/// Reacts to construction of artifacts whose exact kind is `T`
pub struct ArtifactConstructionSubscriber<T: ArtifactType> {
    handler: ConstructedFn,
    _kind: PhantomData<fn() -> T>,
}

impl<T: ArtifactType> ArtifactConstructionSubscriber<T> {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Artifact) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            _kind: PhantomData,
        }
    }
}

impl<T: ArtifactType> TreeSubscriber for ArtifactConstructionSubscriber<T> {
    type Message = ArtifactConstructed;

    fn matches(&self, message: &ArtifactConstructed) -> bool {
        message.artifact.is::<T>()
    }

    fn handle(&self, message: &ArtifactConstructed) -> HandlerResult {
        (self.handler)(&message.artifact)
    }
}
