//! Types for the event bus.

use crate::error::SubscriberError;
use crate::ids::SubscriptionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::EventBus;

/// Dispatch ordering key. Lower values run first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    pub const DEFAULT: Priority = Priority(10);
}

impl Default for Priority {
    fn default() -> Self {
        Priority::DEFAULT
    }
}

impl fmt::Debug for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Priority({})", self.0)
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

/// Bus configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Priority given to subscriptions that don't name one.
    /// Default: 10
    pub default_priority: Priority,

    /// Buffer size for channel subscriptions created without an explicit
    /// capacity.
    /// Default: 1000
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            default_priority: Priority::DEFAULT,
            channel_capacity: 1000,
        }
    }
}

/// Token identifying one subscription. Only good for `unsubscribe`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionHandle {
    topic: String,
    id: SubscriptionId,
}

impl SubscriptionHandle {
    pub(crate) fn new(topic: String, id: SubscriptionId) -> Self {
        Self { topic, id }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }
}

/// Receiver context handed to a callback while it runs.
///
/// Derefs to the bus, so a callback can publish, subscribe or unsubscribe
/// from inside a dispatch. Those changes apply to later publish cycles only.
pub struct Dispatch<'a, A> {
    pub(crate) bus: &'a EventBus<A>,
    pub(crate) topic: &'a str,
    pub(crate) id: &'a SubscriptionId,
}

impl<'a, A> Dispatch<'a, A> {
    pub fn bus(&self) -> &'a EventBus<A> {
        self.bus
    }

    /// Topic being published.
    pub fn topic(&self) -> &'a str {
        self.topic
    }

    /// Id of the subscription being invoked.
    pub fn subscription_id(&self) -> &'a SubscriptionId {
        self.id
    }

    /// Handle for the subscription being invoked.
    pub fn handle(&self) -> SubscriptionHandle {
        SubscriptionHandle::new(self.topic.to_string(), self.id.clone())
    }

    /// Remove the subscription being invoked.
    pub fn unsubscribe_self(&self) -> bool {
        self.bus.unsubscribe(&self.handle())
    }
}

impl<A> Deref for Dispatch<'_, A> {
    type Target = EventBus<A>;

    fn deref(&self) -> &Self::Target {
        self.bus
    }
}

/// A channel-backed subscription: every publish on the topic delivers its
/// arguments as one message.
pub struct ChannelSubscription<A> {
    pub handle: SubscriptionHandle,
    /// Channel to receive published arguments.
    pub receiver: crossbeam_channel::Receiver<Vec<A>>,
}

impl<A> ChannelSubscription<A> {
    /// Receive the next message (blocking).
    pub fn recv(&self) -> Result<Vec<A>, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message (non-blocking).
    pub fn try_recv(&self) -> Result<Vec<A>, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<Vec<A>, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Outcome of one callback invocation.
pub type CallbackResult = std::result::Result<(), SubscriberError>;

/// Shared subscriber callback.
pub type Callback<A> = Arc<dyn Fn(&Dispatch<'_, A>, &[A]) -> CallbackResult + Send + Sync>;
