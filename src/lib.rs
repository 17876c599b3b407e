//! # cursorbus
//!
//! Two small building blocks for automation scripts and tools:
//!
//! ## Core Concepts
//!
//! - **OrderedCollection**: a `Vec` with a traversal cursor, bounds-checked
//!   access, and in-place insertion and removal
//! - **EventBus**: topic-based publish/subscribe with priority ordering and
//!   handle-based unsubscription
//!
//! The two are independent; application code composes them.
//!
//! ## Example
//!
//! ```
//! use cursorbus::{EventBus, OrderedCollection};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let bus: Arc<EventBus> = Arc::new(EventBus::new());
//! let progress = bus.subscribe_channel("resized", 10, None);
//!
//! let mut artboards = OrderedCollection::from_items(vec!["icon-16", "icon-32"]);
//! let outcome = artboards.each(|name, idx| {
//!     bus.publish("resized", &[json!(idx), json!(name)]).map(|_| ())
//! });
//! assert!(outcome.completed);
//! assert_eq!(progress.try_recv().unwrap(), vec![json!(0), json!("icon-16")]);
//! ```

pub mod bus;
pub mod collection;
pub mod error;
pub mod ids;

// Re-exports
pub use bus::{
    BusConfig, Callback, CallbackResult, ChannelSubscription, Dispatch, EventBus, Priority,
    SubscriptionHandle,
};
pub use collection::{BoundsPolicy, EachOutcome, OrderedCollection};
pub use error::{BusError, BusResult, CollectionError, CollectionResult, SubscriberError};
pub use ids::{IdGenerator, SequentialIdGenerator, SubscriptionId, UuidGenerator};
