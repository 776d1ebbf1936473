use super::TreeSubscriber;
use crate::artifact::{Artifact, ArtifactType, ContextMenuOpening, MenuCommand};
use crate::bus::{Bucket, HandlerResult};
use std::marker::PhantomData;

type MenuFn = Box<dyn Fn(&Artifact, &Bucket<MenuCommand>) -> HandlerResult + Send + Sync>;

/// Contributes context menu commands for artifacts of kind `T`
///
/// Commands pushed into the bucket appear in the menu in push order, after
/// those of earlier subscribers.
pub struct ArtifactContextMenuOpeningSubscriber<T: ArtifactType> {
    handler: MenuFn,
    _kind: PhantomData<fn() -> T>,
}

impl<T: ArtifactType> ArtifactContextMenuOpeningSubscriber<T> {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Artifact, &Bucket<MenuCommand>) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            _kind: PhantomData,
        }
    }
}

impl<T: ArtifactType> TreeSubscriber for ArtifactContextMenuOpeningSubscriber<T> {
    type Message = ContextMenuOpening;

    fn matches(&self, message: &ContextMenuOpening) -> bool {
        message.artifact.is::<T>()
    }

    fn handle(&self, message: &ContextMenuOpening) -> HandlerResult {
        (self.handler)(&message.artifact, &message.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Layer, Scope};
    use crate::bus::MessageBus;

    #[test]
    fn test_commands_collected_in_subscription_order() {
        let bus = MessageBus::new("workspace");
        ArtifactContextMenuOpeningSubscriber::<Scope>::new(|scope, commands| {
            commands.push(MenuCommand::new(
                "generate",
                format!("Generate {}", scope.id()),
                "codegen",
            ))?;
            Ok(())
        })
        .attach(&bus);
        ArtifactContextMenuOpeningSubscriber::<Layer>::new(|_, commands| {
            commands.push(MenuCommand::new("rename-layer", "Rename", "layout"))?;
            Ok(())
        })
        .attach(&bus);
        ArtifactContextMenuOpeningSubscriber::<Scope>::new(|_, commands| {
            commands.push(MenuCommand::new("delete", "Delete", "layout"))?;
            Ok(())
        })
        .attach(&bus);

        let scope = Artifact::construct_as::<Scope>(&bus, "Shared").unwrap();
        let message = ContextMenuOpening::new(scope);
        bus.publish(&message).unwrap();

        let ids: Vec<String> = message.commands.drain().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["generate", "delete"]);
    }
}
