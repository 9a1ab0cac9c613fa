// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observer registry used by the counter and the notification store.
//!
//! Subscribers are keyed by a label: subscribing twice with the same label
//! replaces the earlier callback. Every publication carries a version, and a
//! subscriber never receives a version older than one it has already seen,
//! which lets a replay-on-subscribe race with a concurrent publish safely.
//!
//! Callbacks run outside every registry lock, in registration order, and may
//! publish into the same registry. A panicking callback is caught and logged;
//! the remaining subscribers still receive the value.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{debug, error};

/// Callback invoked with every published value.
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T> {
    id: u64,
    label: String,
    callback: Callback<T>,
    /// Last version claimed for delivery to this subscriber.
    delivered: Arc<Mutex<Option<u64>>>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            label: self.label.clone(),
            callback: Arc::clone(&self.callback),
            delivered: Arc::clone(&self.delivered),
        }
    }
}

struct Inner<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

/// Ordered set of subscriber callbacks for values of type `T`.
pub struct SubscriberRegistry<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T: 'static> Default for SubscriberRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> SubscriberRegistry<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }

    /// Registers `callback` under `label` without delivering anything.
    ///
    /// Callers that promise replay-on-subscribe follow up with [`Self::replay`].
    pub fn subscribe<F>(&self, label: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let label = label.into();
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;

        if let Some(pos) = inner.entries.iter().position(|e| e.label == label) {
            debug!(subscriber = %label, "replacing existing subscriber");
            inner.entries.remove(pos);
        }
        inner.entries.push(Entry {
            id,
            label: label.clone(),
            callback: Arc::new(callback),
            delivered: Arc::new(Mutex::new(None)),
        });
        drop(inner);

        let weak: Weak<Mutex<Inner<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            id,
            label,
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    lock(&inner).entries.retain(|e| e.id != id);
                }
            })),
        }
    }

    /// Delivers `value` to the single subscriber behind `subscription`.
    pub fn replay(&self, subscription: &Subscription, version: u64, value: &T) {
        let entry = lock(&self.inner)
            .entries
            .iter()
            .find(|e| e.id == subscription.id)
            .cloned();
        if let Some(entry) = entry {
            deliver(&entry, version, value);
        }
    }

    /// Delivers `value` to every subscriber, in registration order.
    ///
    /// Returns the number of callbacks that completed without panicking.
    pub fn publish(&self, version: u64, value: &T) -> usize {
        let entries: Vec<Entry<T>> = lock(&self.inner).entries.clone();
        entries
            .iter()
            .filter(|entry| deliver(entry, version, value))
            .count()
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels of the registered subscribers, in delivery order.
    pub fn labels(&self) -> Vec<String> {
        lock(&self.inner)
            .entries
            .iter()
            .map(|e| e.label.clone())
            .collect()
    }
}

/// Runs one callback. Returns false if it was skipped as stale or panicked.
fn deliver<T>(entry: &Entry<T>, version: u64, value: &T) -> bool {
    {
        let mut delivered = lock(&entry.delivered);
        if matches!(*delivered, Some(seen) if seen >= version) {
            return false;
        }
        *delivered = Some(version);
    }

    // No lock is held here: a callback may publish into the same registry.
    let callback = Arc::clone(&entry.callback);
    match catch_unwind(AssertUnwindSafe(|| callback(value))) {
        Ok(()) => true,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!(subscriber = %entry.label, reason = %reason, "subscriber callback panicked");
            false
        }
    }
}

fn lock<G>(mutex: &Mutex<G>) -> MutexGuard<'_, G> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to a registered subscriber. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    label: String,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Removes the subscriber. Equivalent to dropping the handle.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(&u32) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |v: &u32| sink.lock().unwrap().push(*v))
    }

    #[test]
    fn publish_reaches_every_subscriber_in_order() {
        let registry = SubscriberRegistry::<u32>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let (o1, o2) = (Arc::clone(&order), Arc::clone(&order));
        let _a = registry.subscribe("a", move |_| o1.lock().unwrap().push("a"));
        let _b = registry.subscribe("b", move |_| o2.lock().unwrap().push("b"));

        assert_eq!(registry.publish(1, &7), 2);
        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn panicking_subscriber_does_not_block_others() {
        let registry = SubscriberRegistry::<u32>::new();
        let (seen, sink) = recorder();
        let _bad = registry.subscribe("bad", |_| panic!("boom"));
        let _good = registry.subscribe("good", sink);

        assert_eq!(registry.publish(1, &3), 1);
        assert_eq!(*seen.lock().unwrap(), vec![3]);

        // The failing subscriber stays registered and keeps receiving.
        assert_eq!(registry.publish(2, &4), 1);
        assert_eq!(*seen.lock().unwrap(), vec![3, 4]);
    }

    #[test]
    fn dropping_subscription_unsubscribes_only_that_subscriber() {
        let registry = SubscriberRegistry::<u32>::new();
        let (seen_a, sink_a) = recorder();
        let (seen_b, sink_b) = recorder();
        let a = registry.subscribe("a", sink_a);
        let _b = registry.subscribe("b", sink_b);

        drop(a);
        registry.publish(1, &9);

        assert!(seen_a.lock().unwrap().is_empty());
        assert_eq!(*seen_b.lock().unwrap(), vec![9]);
        assert_eq!(registry.labels(), vec!["b".to_string()]);
    }

    #[test]
    fn same_label_replaces_previous_callback() {
        let registry = SubscriberRegistry::<u32>::new();
        let (old, old_sink) = recorder();
        let (new, new_sink) = recorder();
        let old_handle = registry.subscribe("screen", old_sink);
        let _new_handle = registry.subscribe("screen", new_sink);
        assert_eq!(registry.len(), 1);

        // Releasing the stale handle must not remove the replacement.
        old_handle.unsubscribe();
        registry.publish(1, &5);

        assert!(old.lock().unwrap().is_empty());
        assert_eq!(*new.lock().unwrap(), vec![5]);
    }

    #[test]
    fn stale_versions_are_not_delivered() {
        let registry = SubscriberRegistry::<u32>::new();
        let (seen, sink) = recorder();
        let sub = registry.subscribe("s", sink);

        registry.publish(3, &30);
        registry.replay(&sub, 2, &20);
        registry.publish(3, &31);
        registry.publish(4, &40);

        assert_eq!(*seen.lock().unwrap(), vec![30, 40]);
    }

    #[test]
    fn replay_delivers_initial_version_zero() {
        let registry = SubscriberRegistry::<u32>::new();
        let (seen, sink) = recorder();
        let sub = registry.subscribe("s", sink);
        registry.replay(&sub, 0, &0);
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn callback_may_publish_into_its_own_registry() {
        let registry = Arc::new(SubscriberRegistry::<u32>::new());
        let weak = Arc::downgrade(&registry);
        let (seen, sink) = recorder();
        let _sub = registry.subscribe("echo", move |v: &u32| {
            sink(v);
            if *v < 3 {
                if let Some(registry) = weak.upgrade() {
                    registry.publish(u64::from(*v) + 1, &(*v + 1));
                }
            }
        });

        registry.publish(1, &1);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let registry = SubscriberRegistry::<u32>::new();
        let sub = registry.subscribe("s", |_| {});
        drop(registry);
        sub.unsubscribe();
    }
}
