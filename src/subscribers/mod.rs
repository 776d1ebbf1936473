//! Kind-filtered reactions to artifact tree notifications
//!
//! Generator modules install these on a workspace bus instead of subscribing to
//! the raw messages and checking artifact kinds themselves. Filtering is on the
//! exact [`ArtifactKind`](crate::artifact::ArtifactKind) of each artifact.
//!
//! ```
//! use artigen::artifact::{Artifact, Layer, Scope};
//! use artigen::bus::MessageBus;
//! use artigen::subscribers::{ArtifactChildAddedSubscriber, TreeSubscriber};
//!
//! let bus = MessageBus::new("workspace");
//! ArtifactChildAddedSubscriber::<Layer, Scope>::new(|layer, scope| {
//!     scope.set_property("layer", layer.id());
//!     Ok(())
//! })
//! .attach(&bus);
//!
//! let layer = Artifact::construct_as::<Layer>(&bus, "Domain").unwrap();
//! let scope = Artifact::construct_as::<Scope>(&bus, "Shared").unwrap();
//! layer.add_child(&scope).unwrap();
//! assert_eq!(scope.property_str("layer").as_deref(), Some("Domain"));
//! ```

mod child;
mod construction;
mod decorator;
mod menu;

pub use child::{ArtifactChildAddedSubscriber, ArtifactChildRemovedSubscriber};
pub use construction::ArtifactConstructionSubscriber;
pub use decorator::DecoratorAddedSubscriber;
pub use menu::ArtifactContextMenuOpeningSubscriber;

use crate::bus::{HandlerResult, Message, MessageBus, SubscriptionId};

/// A filtered handler for one tree notification type
pub trait TreeSubscriber: Send + Sync + Sized + 'static {
    type Message: Message;

    /// Whether this subscriber reacts to `message`
    fn matches(&self, message: &Self::Message) -> bool;

    /// Handles a matching message
    fn handle(&self, message: &Self::Message) -> HandlerResult;

    /// Subscribes on `bus`
    fn attach(self, bus: &MessageBus) -> SubscriptionId {
        bus.subscribe(move |message: &Self::Message| {
            if self.matches(message) {
                self.handle(message)
            } else {
                Ok(())
            }
        })
    }

    /// Subscribes on `bus` under `owner`, see [`MessageBus::unsubscribe_owner`]
    fn attach_owned(self, bus: &MessageBus, owner: impl Into<String>) -> SubscriptionId {
        bus.subscribe_owned(owner, move |message: &Self::Message| {
            if self.matches(message) {
                self.handle(message)
            } else {
                Ok(())
            }
        })
    }
}
