use super::TreeSubscriber;
use crate::artifact::{Artifact, ArtifactDecorator, ArtifactType, DecoratorAdded};
use crate::bus::HandlerResult;
use std::marker::PhantomData;
use std::sync::Arc;

type DecoratorFn = Box<dyn Fn(&Artifact, &Arc<dyn ArtifactDecorator>) -> HandlerResult + Send + Sync>;

/// Reacts when a decorator is attached to an artifact of kind `T`
///
/// The decorator is looked up by key at delivery time; if an earlier handler
/// already removed it, this subscriber does nothing.
pub struct DecoratorAddedSubscriber<T: ArtifactType> {
    handler: DecoratorFn,
    _kind: PhantomData<fn() -> T>,
}

impl<T: ArtifactType> DecoratorAddedSubscriber<T> {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Artifact, &Arc<dyn ArtifactDecorator>) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            _kind: PhantomData,
        }
    }
}

impl<T: ArtifactType> TreeSubscriber for DecoratorAddedSubscriber<T> {
    type Message = DecoratorAdded;

    fn matches(&self, message: &DecoratorAdded) -> bool {
        message.artifact.is::<T>()
    }

    fn handle(&self, message: &DecoratorAdded) -> HandlerResult {
        match message.artifact.decorator(&message.key) {
            Some(decorator) => (self.handler)(&message.artifact, &decorator),
            None => Ok(()),
        }
    }
}
