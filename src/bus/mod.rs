//! Priority-ordered publish/subscribe.
//!
//! An [`EventBus`] maps topic names to subscriber lists:
//! - Subscribers run in ascending priority order (default 10), ties in
//!   subscribe order
//! - Every subscription gets a unique id; the returned handle undoes it
//! - Dispatch is synchronous; a failing subscriber's error reaches the
//!   publisher
//!
//! # Example
//!
//! ```
//! use cursorbus::EventBus;
//! use serde_json::json;
//!
//! let bus: EventBus = EventBus::new();
//! let handle = bus.subscribe_with_priority("save", |_, args| {
//!     assert_eq!(args, &[json!("x")]);
//!     Ok(())
//! }, 5);
//!
//! assert_eq!(bus.publish("save", &[json!("x")]).unwrap(), 1);
//! bus.unsubscribe(&handle);
//! assert_eq!(bus.publish("save", &[json!("x")]).unwrap(), 0);
//! ```

mod manager;
mod types;

pub use manager::EventBus;
pub use types::{
    BusConfig, Callback, CallbackResult, ChannelSubscription, Dispatch, Priority,
    SubscriptionHandle,
};
