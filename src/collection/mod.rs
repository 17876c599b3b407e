//! Ordered collections with a traversal cursor.
//!
//! [`OrderedCollection`] wraps a `Vec` and adds:
//! - Cursor traversal (`first`, `next`, `previous`, `current`, `reset`)
//! - Bounds-checked access and mutation, with separate read and insert ranges
//! - An `each` walk that reports callback failures instead of propagating them
//!
//! # Example
//!
//! ```
//! use cursorbus::OrderedCollection;
//!
//! let mut oc = OrderedCollection::from_items(vec![10, 20, 30]);
//! oc.remove_at(1).unwrap();
//! assert_eq!(oc.get_items(), &[10, 30]);
//!
//! let mut total = 0;
//! let outcome = oc.each(|n, _| {
//!     total += n;
//!     Ok::<(), String>(())
//! });
//! assert!(outcome.completed);
//! assert_eq!(total, 40);
//! ```

mod ordered;
mod types;

pub use ordered::OrderedCollection;
pub use types::{BoundsPolicy, EachOutcome};
