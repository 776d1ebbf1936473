//! Typed publish/subscribe message bus
//!
//! Each functional area (workspace tree, generation pipeline) owns its own
//! [`MessageBus`]. Delivery is synchronous: [`MessageBus::publish`] runs every
//! matching handler to completion, in subscription order, before it returns.
//!
//! # Base payloads
//!
//! A message can expose embedded base payloads through [`Message::bases`]. A
//! handler subscribed to a base payload type receives every message that embeds
//! it, interleaved with exact-type handlers in subscription order.
//!
//! # Error policy
//!
//! With [`DeliveryPolicy::FailFast`] (the default) the first handler error is
//! returned to the publisher and the remaining handlers are not invoked.
//! [`DeliveryPolicy::CollectAll`] keeps delivering and returns every failure.
//!
//! # Example
//!
//! ```
//! use artigen::bus::{Message, MessageBus};
//!
//! struct Ping(u32);
//! impl Message for Ping {}
//!
//! let bus = MessageBus::new("example");
//! bus.subscribe(|ping: &Ping| {
//!     assert_eq!(ping.0, 7);
//!     Ok(())
//! });
//! bus.publish(&Ping(7)).unwrap();
//! ```

mod bucket;
mod error;

pub use bucket::Bucket;
pub use error::{BusError, HandlerFailure, HandlerFailures};

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Payload type accepted by [`MessageBus::publish`]
pub trait Message: Any + Send + Sync {
    /// Base payloads embedded in this message, most specific first
    fn bases(&self) -> Vec<&(dyn Any + Send + Sync)> {
        Vec::new()
    }
}

/// Result returned by message handlers
pub type HandlerResult = anyhow::Result<()>;

type ErasedHandler = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> HandlerResult + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How [`MessageBus::publish`] reacts to handler errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Stop at the first failing handler and return its error
    #[default]
    FailFast,
    /// Invoke every handler, then return all failures together
    CollectAll,
}

impl std::str::FromStr for DeliveryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail-fast" | "failfast" => Ok(DeliveryPolicy::FailFast),
            "collect-all" | "collectall" => Ok(DeliveryPolicy::CollectAll),
            other => Err(format!(
                "Invalid delivery policy: {}. Valid options: fail-fast, collect-all",
                other
            )),
        }
    }
}

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    payload_type: TypeId,
    owner: Option<String>,
    accepts: fn(&(dyn Any + Send + Sync)) -> bool,
    handler: ErasedHandler,
}

struct BusState {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

struct BusInner {
    name: String,
    policy: DeliveryPolicy,
    state: RwLock<BusState>,
}

/// Synchronous typed dispatcher, cheap to clone
///
/// Clones share the same subscription list.
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

fn accepts_payload<M: Any + Send + Sync>(payload: &(dyn Any + Send + Sync)) -> bool {
    payload.is::<M>()
}

impl MessageBus {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_policy(name, DeliveryPolicy::default())
    }

    pub fn with_policy(name: impl Into<String>, policy: DeliveryPolicy) -> Self {
        Self {
            inner: Arc::new(BusInner {
                name: name.into(),
                policy,
                state: RwLock::new(BusState {
                    subscriptions: Vec::new(),
                    next_id: 1,
                }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.inner.policy
    }

    /// Subscribes a handler to payloads of type `M`, exact or embedded as a base
    pub fn subscribe<M, F>(&self, handler: F) -> SubscriptionId
    where
        M: Any + Send + Sync,
        F: Fn(&M) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(None, handler)
    }

    /// Subscribes a handler on behalf of a named component
    ///
    /// Every subscription made under one owner can be removed at once with
    /// [`MessageBus::unsubscribe_owner`].
    pub fn subscribe_owned<M, F>(&self, owner: impl Into<String>, handler: F) -> SubscriptionId
    where
        M: Any + Send + Sync,
        F: Fn(&M) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Some(owner.into()), handler)
    }

    fn register<M, F>(&self, owner: Option<String>, handler: F) -> SubscriptionId
    where
        M: Any + Send + Sync,
        F: Fn(&M) -> HandlerResult + Send + Sync + 'static,
    {
        let erased: ErasedHandler = Arc::new(move |payload: &(dyn Any + Send + Sync)| {
            match payload.downcast_ref::<M>() {
                Some(message) => handler(message),
                None => Ok(()),
            }
        });

        let mut state = self.write_state();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.subscriptions.push(Subscription {
            id,
            payload_type: TypeId::of::<M>(),
            owner,
            accepts: accepts_payload::<M>,
            handler: erased,
        });

        trace!(bus = %self.inner.name, subscription = %id, payload = type_name::<M>(), "Subscribed");
        id
    }

    /// Removes a subscription. Returns `true` if it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.write_state();
        let before = state.subscriptions.len();
        state.subscriptions.retain(|s| s.id != id);
        state.subscriptions.len() < before
    }

    /// Removes every subscription registered under `owner`
    ///
    /// Returns the number of subscriptions removed.
    pub fn unsubscribe_owner(&self, owner: &str) -> usize {
        let mut state = self.write_state();
        let before = state.subscriptions.len();
        state
            .subscriptions
            .retain(|s| s.owner.as_deref() != Some(owner));
        before - state.subscriptions.len()
    }

    /// Detaches all subscribers. Returns how many were removed.
    pub fn dispose(&self) -> usize {
        let mut state = self.write_state();
        let removed = state.subscriptions.len();
        state.subscriptions.clear();
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.read_state().subscriptions.len()
    }

    /// Number of handlers subscribed to exactly payload type `M`
    pub fn subscriber_count_for<M: Any>(&self) -> usize {
        let wanted = TypeId::of::<M>();
        self.read_state()
            .subscriptions
            .iter()
            .filter(|s| s.payload_type == wanted)
            .count()
    }

    /// Delivers `message` to every matching handler, in subscription order
    ///
    /// The subscription list is snapshotted first, so handlers may publish,
    /// subscribe or unsubscribe reentrantly; changes apply to the next publish.
    pub fn publish<M: Message>(&self, message: &M) -> Result<(), BusError> {
        let subscriptions = self.read_state().subscriptions.clone();
        let bases = message.bases();
        let mut failures = Vec::new();
        let mut delivered = 0usize;

        for subscription in &subscriptions {
            let exact: &(dyn Any + Send + Sync) = message;
            let payload = std::iter::once(exact)
                .chain(bases.iter().copied())
                .find(|payload| (subscription.accepts)(*payload));

            let Some(payload) = payload else {
                continue;
            };

            delivered += 1;
            if let Err(error) = (subscription.handler)(payload) {
                let failure = HandlerFailure {
                    subscription: subscription.id,
                    owner: subscription.owner.clone(),
                    message_type: type_name::<M>(),
                    error,
                };

                match self.inner.policy {
                    DeliveryPolicy::FailFast => return Err(BusError::Handler(failure)),
                    DeliveryPolicy::CollectAll => failures.push(failure),
                }
            }
        }

        trace!(
            bus = %self.inner.name,
            message = type_name::<M>(),
            delivered,
            "Published message"
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BusError::Aggregate(HandlerFailures(failures)))
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, BusState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, BusState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("name", &self.inner.name)
            .field("policy", &self.inner.policy)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
