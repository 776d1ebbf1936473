use super::TreeSubscriber;
use crate::artifact::{Artifact, ArtifactType, ChildAdded, ChildRemoved};
use crate::bus::HandlerResult;
use std::marker::PhantomData;

type ChildFn = Box<dyn Fn(&Artifact, &Artifact) -> HandlerResult + Send + Sync>;

/// Reacts when a `C` artifact is added under a `P` artifact
///
/// The handler receives `(parent, child)`.
pub struct ArtifactChildAddedSubscriber<P: ArtifactType, C: ArtifactType> {
    handler: ChildFn,
    _kinds: PhantomData<fn() -> (P, C)>,
}

impl<P: ArtifactType, C: ArtifactType> ArtifactChildAddedSubscriber<P, C> {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Artifact, &Artifact) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            _kinds: PhantomData,
        }
    }
}

impl<P: ArtifactType, C: ArtifactType> TreeSubscriber for ArtifactChildAddedSubscriber<P, C> {
    type Message = ChildAdded;

    fn matches(&self, message: &ChildAdded) -> bool {
        message.parent().is::<P>() && message.child().is::<C>()
    }

    fn handle(&self, message: &ChildAdded) -> HandlerResult {
        (self.handler)(message.parent(), message.child())
    }
}

/// Reacts when a `C` artifact is removed from a `P` artifact
pub struct ArtifactChildRemovedSubscriber<P: ArtifactType, C: ArtifactType> {
    handler: ChildFn,
    _kinds: PhantomData<fn() -> (P, C)>,
}

impl<P: ArtifactType, C: ArtifactType> ArtifactChildRemovedSubscriber<P, C> {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Artifact, &Artifact) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            _kinds: PhantomData,
        }
    }
}

impl<P: ArtifactType, C: ArtifactType> TreeSubscriber for ArtifactChildRemovedSubscriber<P, C> {
    type Message = ChildRemoved;

    fn matches(&self, message: &ChildRemoved) -> bool {
        message.parent().is::<P>() && message.child().is::<C>()
    }

    fn handle(&self, message: &ChildRemoved) -> HandlerResult {
        (self.handler)(message.parent(), message.child())
    }
}
