// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unread-count aggregator.
//!
//! The [`CountAggregator`] polls the message store for the signed-in user,
//! keeps per-conversation unread counts, publishes the full counts array to
//! subscribers whenever it changes, and routes genuinely new messages to a
//! [`NewMessageRouter`].
//!
//! Concurrency rules:
//! - one polling task per aggregator; switching users cancels it first;
//! - a timer tick that finds a poll in flight is dropped, while
//!   [`CountAggregator::force_recount`] waits for it;
//! - the count state mutex is never held across an `.await`;
//! - a poll result is discarded if the user changed or a local optimistic
//!   write happened while it was in flight;
//! - announcements still pending when the session stops or switches are dropped.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use immo_config::CounterConfig;
use immo_core::error::ImmoError;
use immo_core::traits::{MessageBackend, NewMessageRouter};
use immo_core::types::{
    ContextId, ConversationKey, MessageId, NewMessageEvent, UnreadCount, UnreadMessage, UserId,
};
use immo_core::{SubscriberRegistry, Subscription};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::diff::{CountMap, classify_new, group_counts, has_counts_changed, to_snapshot};

/// What a single poll did with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Counts changed and were published; `announced` messages were routed.
    Published { announced: usize },
    /// Counts were identical to the last published ones.
    Unchanged,
    /// The session or the counts changed while the query was in flight.
    Discarded,
    /// The timer fired while another poll was still running.
    Skipped,
    /// The backend query failed; nothing changed.
    Failed,
}

#[derive(Debug, Default)]
struct CountState {
    user: Option<UserId>,
    last_counts: CountMap,
    seen: HashSet<MessageId>,
    /// Bumped by every local write; in-flight polls compare against it.
    revision: u64,
    /// Bumped on every start, user switch and stop.
    epoch: u64,
    /// Version of the last published snapshot.
    version: u64,
}

impl CountState {
    /// Bumps the published version and returns it with the current snapshot.
    fn next_snapshot(&mut self) -> (u64, Vec<UnreadCount>) {
        self.version += 1;
        (self.version, to_snapshot(&self.last_counts))
    }
}

struct PollSession {
    user: UserId,
    token: CancellationToken,
}

/// Polls unread messages for one user at a time and fans out count changes.
pub struct CountAggregator {
    backend: Arc<dyn MessageBackend>,
    router: Option<Arc<dyn NewMessageRouter>>,
    poll_interval: Duration,
    unknown_sender_label: String,
    unknown_context_label: String,
    state: Mutex<CountState>,
    session: Mutex<Option<PollSession>>,
    poll_guard: tokio::sync::Mutex<()>,
    subscribers: SubscriberRegistry<Vec<UnreadCount>>,
}

impl CountAggregator {
    pub fn new(config: &CounterConfig, backend: Arc<dyn MessageBackend>) -> Self {
        Self {
            backend,
            router: None,
            poll_interval: config.poll_interval().max(Duration::from_secs(1)),
            unknown_sender_label: config.unknown_sender_label.clone(),
            unknown_context_label: config.unknown_context_label.clone(),
            state: Mutex::new(CountState::default()),
            session: Mutex::new(None),
            poll_guard: tokio::sync::Mutex::new(()),
            subscribers: SubscriberRegistry::new(),
        }
    }

    /// Routes genuinely new messages to `router`.
    pub fn with_router(mut self, router: Arc<dyn NewMessageRouter>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Starts polling for `user`: one poll right away, then one per interval.
    ///
    /// Calling it again for the user already being polled does nothing.
    /// Switching users stops the previous timer and forgets the previous
    /// user's counts and seen messages.
    pub async fn start_for_user(self: &Arc<Self>, user: impl Into<UserId>) {
        let user = user.into();
        let cleared = {
            let mut session = lock(&self.session);
            if session.as_ref().is_some_and(|s| s.user == user) {
                debug!(user = %user, "already polling for user");
                return;
            }
            if let Some(previous) = session.take() {
                previous.token.cancel();
                info!(previous = %previous.user, user = %user, "switching polling user");
            }

            let cleared = self.reset_state(Some(user.clone()));
            let token = CancellationToken::new();
            tokio::spawn(run_timer(
                Arc::downgrade(self),
                token.clone(),
                self.poll_interval,
            ));
            *session = Some(PollSession {
                user: user.clone(),
                token,
            });
            cleared
        };
        if let Some((version, snapshot)) = cleared {
            self.subscribers.publish(version, &snapshot);
        }

        info!(
            user = %user,
            interval_secs = self.poll_interval.as_secs(),
            "unread count polling started"
        );
        // Failures are logged; the timer retries on schedule.
        let _ = self.force_recount().await;
    }

    /// Stops polling and forgets the current user. Idempotent.
    pub fn stop(&self) {
        let previous = lock(&self.session).take();
        let Some(previous) = previous else {
            return;
        };
        previous.token.cancel();
        if let Some((version, snapshot)) = self.reset_state(None) {
            self.subscribers.publish(version, &snapshot);
        }
        info!(user = %previous.user, "unread count polling stopped");
    }

    /// User currently being polled, if any.
    pub fn current_user(&self) -> Option<UserId> {
        lock(&self.state).user.clone()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.session).is_some()
    }

    /// Registers `callback` for the counts array and delivers the current one at once.
    ///
    /// Subscribing again with the same label replaces the earlier callback.
    pub fn subscribe<F>(&self, label: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&Vec<UnreadCount>) + Send + Sync + 'static,
    {
        let (subscription, version, snapshot) = {
            let state = lock(&self.state);
            let subscription = self.subscribers.subscribe(label, callback);
            (subscription, state.version, to_snapshot(&state.last_counts))
        };
        self.subscribers.replay(&subscription, version, &snapshot);
        subscription
    }

    /// Last published counts.
    pub fn counts(&self) -> Vec<UnreadCount> {
        to_snapshot(&lock(&self.state).last_counts)
    }

    /// Sum of all conversation counts.
    pub fn total_unread(&self) -> usize {
        lock(&self.state).last_counts.values().sum()
    }

    /// Marks one conversation read.
    ///
    /// The local count is zeroed and published before the backend is called.
    /// On success a full recount reconciles with the backend; on failure the
    /// error is returned and the zero stays until the next regular poll.
    pub async fn mark_conversation_read(
        &self,
        context: impl Into<ContextId>,
        counterparty: impl Into<UserId>,
    ) -> Result<(), ImmoError> {
        let context = context.into();
        let counterparty = counterparty.into();
        let key = ConversationKey::new(context.clone(), counterparty.clone());

        let (user, version, snapshot) = {
            let mut state = lock(&self.state);
            let user = state.user.clone().ok_or(ImmoError::NoActiveSession)?;
            state.last_counts.insert(key.clone(), 0);
            state.revision += 1;
            let (version, snapshot) = state.next_snapshot();
            (user, version, snapshot)
        };
        debug!(conversation = %key, "optimistically zeroed conversation");
        self.subscribers.publish(version, &snapshot);

        if let Err(e) = self
            .backend
            .mark_messages_read(&context, &counterparty, &user)
            .await
        {
            warn!(conversation = %key, error = %e, "mark-as-read failed, next poll will reconcile");
            return Err(e);
        }

        if self.force_recount().await.is_err() {
            debug!(conversation = %key, "reconcile deferred to the next tick");
        }
        Ok(())
    }

    /// Polls now, waiting for an in-flight poll to finish first.
    pub async fn force_recount(&self) -> Result<PollOutcome, ImmoError> {
        let _guard = self.poll_guard.lock().await;
        self.poll_locked().await.inspect_err(|e| {
            warn!(error = %e, "unread count poll failed");
        })
    }

    /// Timer entry point: drops the tick if a poll is already running.
    async fn poll_tick(&self) -> PollOutcome {
        let Ok(_guard) = self.poll_guard.try_lock() else {
            debug!("poll still in flight, dropping tick");
            return PollOutcome::Skipped;
        };
        match self.poll_locked().await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "unread count poll failed");
                PollOutcome::Failed
            }
        }
    }

    /// Exact unread count of one conversation, asked from the backend.
    ///
    /// Returns 0 without an active user or when the backend fails.
    pub async fn count_for_conversation(
        &self,
        context: impl Into<ContextId>,
        counterparty: impl Into<UserId>,
    ) -> usize {
        let Some(user) = self.current_user() else {
            return 0;
        };
        let (context, counterparty) = (context.into(), counterparty.into());
        match self
            .backend
            .count_unread(&context, &counterparty, &user)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(context = %context, counterparty = %counterparty, error = %e, "conversation count failed");
                0
            }
        }
    }

    /// Latest messages exchanged with `counterparty` about `context`, newest first.
    pub async fn inspect_conversation(
        &self,
        context: impl Into<ContextId>,
        counterparty: impl Into<UserId>,
        limit: usize,
    ) -> Result<Vec<UnreadMessage>, ImmoError> {
        let user = self.current_user().ok_or(ImmoError::NoActiveSession)?;
        self.backend
            .recent_messages(&context.into(), &user, &counterparty.into(), limit)
            .await
    }

    /// One poll cycle. Callers hold `poll_guard`.
    async fn poll_locked(&self) -> Result<PollOutcome, ImmoError> {
        let (user, revision, epoch) = {
            let state = lock(&self.state);
            let user = state.user.clone().ok_or(ImmoError::NoActiveSession)?;
            (user, state.revision, state.epoch)
        };

        let messages = self.backend.query_unread_messages(&user).await?;

        let (published, fresh) = {
            let mut guard = lock(&self.state);
            let state = &mut *guard;
            if state.revision != revision || state.user.as_ref() != Some(&user) {
                debug!(user = %user, "discarding stale poll result");
                return Ok(PollOutcome::Discarded);
            }

            let counts = group_counts(&messages);
            let fresh = classify_new(&messages, &state.last_counts, &mut state.seen);
            if !has_counts_changed(&state.last_counts, &counts) {
                return Ok(PollOutcome::Unchanged);
            }
            state.last_counts = counts;
            (state.next_snapshot(), fresh)
        };

        let (version, snapshot) = published;
        debug!(
            user = %user,
            conversations = snapshot.len(),
            new_messages = fresh.len(),
            "unread counts changed"
        );
        self.subscribers.publish(version, &snapshot);

        let mut announced = 0;
        for message in fresh {
            if lock(&self.state).epoch != epoch {
                debug!(user = %user, "session ended, dropping remaining announcements");
                break;
            }
            self.announce(message).await;
            announced += 1;
        }
        Ok(PollOutcome::Published { announced })
    }

    /// Enriches a new message with display strings and hands it to the router.
    async fn announce(&self, message: UnreadMessage) {
        let Some(router) = &self.router else {
            return;
        };

        let (name, title) = tokio::join!(
            self.backend.lookup_display_name(&message.sender_id),
            self.backend.lookup_context_title(&message.context_id),
        );
        let sender_name = name.unwrap_or_else(|e| {
            debug!(sender = %message.sender_id, error = %e, "sender name lookup failed");
            self.unknown_sender_label.clone()
        });
        let context_title = title.unwrap_or_else(|e| {
            debug!(context = %message.context_id, error = %e, "listing title lookup failed");
            self.unknown_context_label.clone()
        });

        router
            .route(NewMessageEvent {
                message,
                sender_name,
                context_title,
            })
            .await;
    }

    /// Replaces the session state. Returns an empty snapshot to publish when
    /// counts were visible before.
    fn reset_state(&self, user: Option<UserId>) -> Option<(u64, Vec<UnreadCount>)> {
        let mut state = lock(&self.state);
        state.user = user;
        state.seen.clear();
        state.revision += 1;
        state.epoch += 1;
        if state.last_counts.is_empty() {
            return None;
        }
        state.last_counts.clear();
        Some(state.next_snapshot())
    }
}

impl Drop for CountAggregator {
    fn drop(&mut self) {
        if let Some(session) = lock(&self.session).take() {
            session.token.cancel();
        }
    }
}

/// Periodic polling loop. Holds only a weak reference between ticks.
async fn run_timer(aggregator: Weak<CountAggregator>, token: CancellationToken, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; the initial poll is done by the caller.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }
        let Some(aggregator) = aggregator.upgrade() else {
            break;
        };
        tokio::select! {
            _ = token.cancelled() => break,
            outcome = aggregator.poll_tick() => {
                debug!(?outcome, "scheduled poll finished");
            }
        }
    }
    debug!("unread count polling task shutting down");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
