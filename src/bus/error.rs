//! Errors raised while delivering messages

use super::SubscriptionId;
use std::fmt;
use thiserror::Error;

/// A single handler that returned an error during delivery.
#[derive(Debug, Error)]
#[error("handler {subscription} for {message_type} failed: {error:#}")]
pub struct HandlerFailure {
    pub subscription: SubscriptionId,
    pub owner: Option<String>,
    pub message_type: &'static str,
    pub error: anyhow::Error,
}

/// All handler failures collected by a [`DeliveryPolicy::CollectAll`](super::DeliveryPolicy) bus.
#[derive(Debug)]
pub struct HandlerFailures(pub Vec<HandlerFailure>);

impl fmt::Display for HandlerFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} handler(s) failed", self.0.len())?;
        for failure in &self.0 {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

/// Errors returned by [`MessageBus::publish`](super::MessageBus::publish) and message buckets
#[derive(Debug, Error)]
pub enum BusError {
    /// First failing handler; remaining handlers were not invoked
    #[error(transparent)]
    Handler(HandlerFailure),

    /// Every handler ran; these ones failed
    #[error("{0}")]
    Aggregate(HandlerFailures),

    /// A contribution arrived after the phase that owned the bucket ended
    #[error("bucket `{0}` is sealed; contributions after the phase ended are rejected")]
    BucketSealed(&'static str),
}

impl BusError {
    /// Handler failures carried by this error, in delivery order
    pub fn failures(&self) -> &[HandlerFailure] {
        match self {
            BusError::Handler(failure) => std::slice::from_ref(failure),
            BusError::Aggregate(failures) => &failures.0,
            BusError::BucketSealed(_) => &[],
        }
    }
}
