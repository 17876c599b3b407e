//! Topic registry and synchronous dispatch.

use crate::error::{BusError, BusResult as Result};
use crate::ids::{IdGenerator, SubscriptionId, UuidGenerator};
use crossbeam_channel::{bounded, TrySendError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use super::types::{
    BusConfig, Callback, CallbackResult, ChannelSubscription, Dispatch, Priority,
    SubscriptionHandle,
};

/// One registered callback.
struct Subscriber<A> {
    id: SubscriptionId,
    priority: Priority,
    callback: Callback<A>,
}

impl<A> Clone for Subscriber<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            priority: self.priority,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Priority-ordered publish/subscribe registry.
///
/// Each topic keeps its subscribers sorted by ascending priority, with equal
/// priorities in subscribe order. `publish` snapshots that list and calls
/// every callback in turn on the calling thread; no lock is held while a
/// callback runs.
///
/// There is no global instance. Create one bus per session and share it
/// (`Arc<EventBus<_>>`) with the components that need it.
pub struct EventBus<A = serde_json::Value> {
    /// Subscriber lists by topic. Lists are created on first subscribe and
    /// never removed, only emptied.
    topics: RwLock<HashMap<String, Vec<Subscriber<A>>>>,
    /// Source of subscription ids.
    ids: Arc<dyn IdGenerator>,
    config: BusConfig,
}

impl<A> EventBus<A> {
    /// Create a bus with the default config and UUID subscription ids.
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Create a bus with a custom config.
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            ids: Arc::new(UuidGenerator),
            config,
        }
    }

    /// Replace the subscription id source.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Register a shared callback. The same `Arc` may be registered any
    /// number of times; every registration gets its own id and handle.
    pub fn subscribe_callback(
        &self,
        topic: impl Into<String>,
        callback: Callback<A>,
        priority: Priority,
    ) -> SubscriptionHandle {
        let topic = topic.into();
        let id = self.ids.generate_id();

        {
            let mut topics = self.topics.write();
            let subscribers = topics.entry(topic.clone()).or_default();
            // Insert after every subscriber with priority <= ours.
            let pos = subscribers.partition_point(|s| s.priority <= priority);
            subscribers.insert(
                pos,
                Subscriber {
                    id: id.clone(),
                    priority,
                    callback,
                },
            );
        }

        debug!(topic = %topic, id = %id, priority = priority.0, "subscribed");
        SubscriptionHandle::new(topic, id)
    }

    /// Remove the subscription behind `handle`.
    ///
    /// Returns false if it was already gone. Calling this twice is harmless.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let mut topics = self.topics.write();
        let Some(subscribers) = topics.get_mut(handle.topic()) else {
            return false;
        };

        let before = subscribers.len();
        subscribers.retain(|s| &s.id != handle.id());
        let removed = subscribers.len() < before;

        if removed {
            debug!(topic = handle.topic(), id = %handle.id(), "unsubscribed");
        }
        removed
    }

    /// Invoke every subscriber of `topic`, lowest priority value first.
    ///
    /// Returns the number of subscribers invoked; 0 if the topic has none.
    /// The first callback error stops dispatch and is returned; later
    /// subscribers are not called.
    pub fn publish(&self, topic: &str, args: &[A]) -> Result<usize> {
        let snapshot: Vec<Subscriber<A>> = match self.topics.read().get(topic) {
            Some(subscribers) if !subscribers.is_empty() => subscribers.clone(),
            _ => {
                trace!(topic, "publish with no subscribers");
                return Ok(0);
            }
        };

        debug!(topic, subscribers = snapshot.len(), "publish");

        for subscriber in &snapshot {
            let ctx = Dispatch {
                bus: self,
                topic,
                id: &subscriber.id,
            };
            trace!(topic, id = %subscriber.id, priority = subscriber.priority.0, "dispatch");

            (subscriber.callback)(&ctx, args).map_err(|source| BusError::Subscriber {
                topic: topic.to_string(),
                id: subscriber.id.clone(),
                source,
            })?;
        }

        Ok(snapshot.len())
    }

    /// Drop every subscriber of `topic`. Returns how many were removed.
    pub fn clear_topic(&self, topic: &str) -> usize {
        let mut topics = self.topics.write();
        let removed = topics
            .get_mut(topic)
            .map(|subscribers| subscribers.drain(..).count())
            .unwrap_or(0);

        if removed > 0 {
            debug!(topic, removed, "topic cleared");
        }
        removed
    }

    /// True once anything has ever subscribed to `topic`.
    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.read().contains_key(topic)
    }

    /// True while the subscription behind `handle` is registered.
    pub fn is_subscribed(&self, handle: &SubscriptionHandle) -> bool {
        self.topics
            .read()
            .get(handle.topic())
            .is_some_and(|subscribers| subscribers.iter().any(|s| &s.id == handle.id()))
    }

    /// Current subscriber count for `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.read().get(topic).map_or(0, Vec::len)
    }

    /// Number of topics ever subscribed to.
    pub fn topic_count(&self) -> usize {
        self.topics.read().len()
    }

    /// Known topic names, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Tear down: empty every subscriber list. Returns the number of
    /// subscriptions dropped.
    pub fn shutdown(&self) -> usize {
        let mut topics = self.topics.write();
        let mut dropped = 0;
        for subscribers in topics.values_mut() {
            dropped += subscribers.len();
            subscribers.clear();
        }
        info!(topics = topics.len(), dropped, "event bus shut down");
        dropped
    }
}

impl<A: 'static> EventBus<A> {
    /// Subscribe with the configured default priority.
    pub fn subscribe<F>(&self, topic: impl Into<String>, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Dispatch<'_, A>, &[A]) -> CallbackResult + Send + Sync + 'static,
    {
        self.subscribe_with_priority(topic, callback, self.config.default_priority)
    }

    /// Subscribe with an explicit priority. Lower values run first.
    pub fn subscribe_with_priority<F>(
        &self,
        topic: impl Into<String>,
        callback: F,
        priority: impl Into<Priority>,
    ) -> SubscriptionHandle
    where
        F: Fn(&Dispatch<'_, A>, &[A]) -> CallbackResult + Send + Sync + 'static,
    {
        let callback: Callback<A> = Arc::new(callback);
        self.subscribe_callback(topic, callback, priority.into())
    }

    /// Subscribe a bounded channel to `topic`.
    ///
    /// Each publish sends a copy of its arguments. A subscriber whose buffer
    /// is full, or whose receiver was dropped, is unsubscribed; the publish
    /// itself still succeeds. `capacity` defaults to the configured
    /// `channel_capacity` and is at least 1.
    pub fn subscribe_channel(
        &self,
        topic: impl Into<String>,
        priority: impl Into<Priority>,
        capacity: Option<usize>,
    ) -> ChannelSubscription<A>
    where
        A: Clone + Send,
    {
        let capacity = capacity.unwrap_or(self.config.channel_capacity).max(1);
        let (sender, receiver) = bounded(capacity);

        let handle = self.subscribe_with_priority(
            topic,
            move |ctx: &Dispatch<'_, A>, args: &[A]| {
                match sender.try_send(args.to_vec()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!(
                            topic = ctx.topic(),
                            id = %ctx.subscription_id(),
                            capacity,
                            "channel subscriber buffer full, dropping subscriber"
                        );
                        ctx.unsubscribe_self();
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        debug!(
                            topic = ctx.topic(),
                            id = %ctx.subscription_id(),
                            "channel subscriber disconnected"
                        );
                        ctx.unsubscribe_self();
                    }
                }
                Ok(())
            },
            priority,
        );

        ChannelSubscription { handle, receiver }
    }
}

impl<A> Default for EventBus<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for EventBus<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self.topics.read();
        f.debug_struct("EventBus")
            .field("topics", &topics.len())
            .field(
                "subscriptions",
                &topics.values().map(Vec::len).sum::<usize>(),
            )
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIdGenerator;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(
        log: &Log,
        name: &'static str,
    ) -> impl Fn(&Dispatch<'_, Value>, &[Value]) -> CallbackResult + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_, args| {
            let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
            log.lock().push(format!("{}({})", name, rendered.join(",")));
            Ok(())
        }
    }

    #[test]
    fn test_subscribe_unsubscribe() {
        let bus: EventBus = EventBus::new();

        let handle = bus.subscribe("save", |_, _| Ok(()));
        assert_eq!(bus.subscriber_count("save"), 1);
        assert!(bus.is_subscribed(&handle));

        assert!(bus.unsubscribe(&handle));
        assert_eq!(bus.subscriber_count("save"), 0);
        assert!(!bus.is_subscribed(&handle));

        // Topic survives, emptied in place
        assert!(bus.has_topic("save"));
        assert!(!bus.unsubscribe(&handle));
    }

    #[test]
    fn test_priority_order() {
        let bus: EventBus = EventBus::new();
        let log: Log = Arc::default();

        bus.subscribe_with_priority("t", recorder(&log, "p20"), 20);
        bus.subscribe_with_priority("t", recorder(&log, "p5"), 5);
        bus.subscribe_with_priority("t", recorder(&log, "p10"), 10);

        assert_eq!(bus.publish("t", &[]).unwrap(), 3);
        assert_eq!(*log.lock(), vec!["p5()", "p10()", "p20()"]);
    }

    #[test]
    fn test_equal_priority_keeps_subscribe_order() {
        let bus: EventBus = EventBus::new();
        let log: Log = Arc::default();

        bus.subscribe("t", recorder(&log, "a"));
        bus.subscribe_with_priority("t", recorder(&log, "early"), 1);
        bus.subscribe("t", recorder(&log, "b"));
        bus.subscribe("t", recorder(&log, "c"));

        bus.publish("t", &[]).unwrap();
        assert_eq!(*log.lock(), vec!["early()", "a()", "b()", "c()"]);
    }

    #[test]
    fn test_save_scenario() {
        let bus: EventBus = EventBus::new();
        let log: Log = Arc::default();

        bus.subscribe_with_priority("save", recorder(&log, "cb1"), 5);
        bus.subscribe_with_priority("save", recorder(&log, "cb2"), 1);
        bus.publish("save", &[json!("x")]).unwrap();

        assert_eq!(*log.lock(), vec![r#"cb2("x")"#, r#"cb1("x")"#]);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus: EventBus = EventBus::new();
        assert_eq!(bus.publish("nobody", &[json!(1)]).unwrap(), 0);
        assert!(!bus.has_topic("nobody"));
    }

    #[test]
    fn test_same_callback_registered_twice() {
        let bus: EventBus =
            EventBus::new().with_id_generator(Arc::new(SequentialIdGenerator::new()));
        let log: Log = Arc::default();
        let callback: Callback<Value> = Arc::new(recorder(&log, "cb"));

        let first = bus.subscribe_callback("t", Arc::clone(&callback), Priority::DEFAULT);
        let second = bus.subscribe_callback("t", callback, Priority::DEFAULT);
        assert_ne!(first, second);
        assert_eq!(first.id().as_str(), "sub-1");
        assert_eq!(second.id().as_str(), "sub-2");

        bus.publish("t", &[]).unwrap();
        assert_eq!(log.lock().len(), 2);

        bus.unsubscribe(&first);
        bus.publish("t", &[]).unwrap();
        assert_eq!(log.lock().len(), 3);
    }

    #[test]
    fn test_subscriber_error_stops_dispatch() {
        let bus: EventBus = EventBus::new();
        let log: Log = Arc::default();

        bus.subscribe_with_priority("t", recorder(&log, "first"), 1);
        let failing = bus.subscribe_with_priority("t", |_, _| Err("boom".into()), 2);
        bus.subscribe_with_priority("t", recorder(&log, "last"), 3);

        let err = bus.publish("t", &[]).unwrap_err();
        match err {
            BusError::Subscriber { topic, id, source } => {
                assert_eq!(topic, "t");
                assert_eq!(&id, failing.id());
                assert_eq!(source.to_string(), "boom");
            }
        }
        assert_eq!(*log.lock(), vec!["first()"]);
    }

    #[test]
    fn test_changes_during_dispatch_apply_to_next_cycle() {
        let bus: Arc<EventBus> = Arc::new(EventBus::new());
        let log: Log = Arc::default();

        let late_log = Arc::clone(&log);
        bus.subscribe_with_priority(
            "t",
            move |ctx, _| {
                let inner = Arc::clone(&late_log);
                ctx.subscribe_with_priority(
                    "t",
                    move |_, _| {
                        inner.lock().push("added".into());
                        Ok(())
                    },
                    0,
                );
                ctx.unsubscribe_self();
                Ok(())
            },
            1,
        );
        bus.subscribe_with_priority("t", recorder(&log, "second"), 2);

        assert_eq!(bus.publish("t", &[]).unwrap(), 2);
        assert_eq!(*log.lock(), vec!["second()"]);

        log.lock().clear();
        assert_eq!(bus.publish("t", &[]).unwrap(), 2);
        assert_eq!(*log.lock(), vec!["added", "second()"]);
    }

    #[test]
    fn test_nested_publish() {
        let bus: EventBus = EventBus::new();
        let log: Log = Arc::default();

        bus.subscribe("outer", |ctx, args| {
            ctx.publish("inner", args)?;
            Ok(())
        });
        bus.subscribe("inner", recorder(&log, "inner"));

        bus.publish("outer", &[json!(7)]).unwrap();
        assert_eq!(*log.lock(), vec!["inner(7)"]);
    }

    #[test]
    fn test_clear_topic_and_shutdown() {
        let bus: EventBus = EventBus::new();
        bus.subscribe("a", |_, _| Ok(()));
        bus.subscribe("a", |_, _| Ok(()));
        bus.subscribe("b", |_, _| Ok(()));

        assert_eq!(bus.clear_topic("a"), 2);
        assert_eq!(bus.clear_topic("missing"), 0);
        assert_eq!(bus.topics(), vec!["a".to_string(), "b".to_string()]);

        assert_eq!(bus.shutdown(), 1);
        assert_eq!(bus.subscriber_count("b"), 0);
        assert_eq!(bus.topic_count(), 2);
    }

    #[test]
    fn test_channel_subscription() {
        let bus: EventBus = EventBus::new();
        let sub = bus.subscribe_channel("progress", Priority::DEFAULT, None);

        bus.publish("progress", &[json!(1), json!("half")]).unwrap();
        let msg = sub.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(msg, vec![json!(1), json!("half")]);
    }

    #[test]
    fn test_drop_slow_channel_subscriber() {
        let bus: EventBus = EventBus::new();
        let sub = bus.subscribe_channel("progress", Priority::DEFAULT, Some(2));

        for i in 0..10 {
            bus.publish("progress", &[json!(i)]).unwrap();
        }

        assert!(!bus.is_subscribed(&sub.handle));
        assert_eq!(sub.try_recv().unwrap(), vec![json!(0)]);
        assert_eq!(sub.try_recv().unwrap(), vec![json!(1)]);
        assert!(sub.try_recv().is_err());
    }

    #[test]
    fn test_disconnected_channel_subscriber_is_removed() {
        let bus: EventBus = EventBus::new();
        let sub = bus.subscribe_channel("progress", Priority::DEFAULT, Some(4));
        let handle = sub.handle.clone();
        drop(sub);

        bus.publish("progress", &[]).unwrap();
        assert!(!bus.is_subscribed(&handle));
    }
}
