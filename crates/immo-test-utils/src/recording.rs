// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capturing sinks for subscriber callbacks and routed events.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use immo_core::traits::NewMessageRouter;
use immo_core::types::NewMessageEvent;

/// Records every value delivered to the callbacks it hands out.
#[derive(Debug)]
pub struct Recorder<T> {
    values: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
        }
    }
}

impl<T: Clone + Send + 'static> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callback suitable for `subscribe` that clones each value into the recorder.
    pub fn callback(&self) -> impl Fn(&T) + Send + Sync + 'static {
        let values = Arc::clone(&self.values);
        move |value: &T| lock(&values).push(value.clone())
    }

    pub fn values(&self) -> Vec<T> {
        lock(&self.values).clone()
    }

    pub fn last(&self) -> Option<T> {
        lock(&self.values).last().cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.values).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.values).clear();
    }
}

/// A [`NewMessageRouter`] that keeps every event it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingRouter {
    events: Arc<Mutex<Vec<NewMessageEvent>>>,
}

impl RecordingRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NewMessageEvent> {
        lock(&self.events).clone()
    }

    pub fn count(&self) -> usize {
        lock(&self.events).len()
    }
}

#[async_trait]
impl NewMessageRouter for RecordingRouter {
    async fn route(&self, event: NewMessageEvent) {
        lock(&self.events).push(event);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_callback_captures_clones() {
        let recorder = Recorder::<Vec<u8>>::new();
        let callback = recorder.callback();
        callback(&vec![1]);
        callback(&vec![2, 3]);
        assert_eq!(recorder.values(), vec![vec![1], vec![2, 3]]);
        assert_eq!(recorder.last(), Some(vec![2, 3]));
    }
}
