//! Subscription identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Unique identifier for one subscription.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

impl SubscriptionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of subscription ids.
///
/// Implementations must never hand out the same id twice for the lifetime
/// of the process.
pub trait IdGenerator: Send + Sync {
    fn generate_id(&self) -> SubscriptionId;
}

/// Random v4 UUIDs. The default generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate_id(&self) -> SubscriptionId {
        SubscriptionId(Uuid::new_v4().to_string())
    }
}

/// Monotonic counter ids (`sub-1`, `sub-2`, ...).
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next_id: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate_id(&self) -> SubscriptionId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        SubscriptionId(format!("sub-{}", n))
    }
}
