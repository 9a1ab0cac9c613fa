// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations. `main` only parses arguments and dispatches.

use std::collections::HashSet;
use std::io::IsTerminal;
use std::sync::{Arc, Mutex};

use immo_config::ImmoConfig;
use immo_core::error::ImmoError;
use immo_core::traits::{MessageBackend, NotificationHost, PluginAdapter};
use immo_core::types::{HealthStatus, NotificationId, PermissionState, UserId};
use immo_counter::CountAggregator;
use immo_notify::NotificationStore;
use immo_supabase::SupabaseBackend;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::output::{format_counts, format_message, format_record};
use crate::shutdown;
use crate::terminal_host::TerminalHost;

/// Services wired for one signed-in user.
pub struct Client {
    pub aggregator: Arc<CountAggregator>,
    pub store: Arc<NotificationStore>,
}

impl Client {
    /// Wires the aggregator to route new messages into the store.
    pub fn build(
        config: &ImmoConfig,
        backend: Arc<dyn MessageBackend>,
        host: Arc<dyn NotificationHost>,
    ) -> Self {
        let store = Arc::new(NotificationStore::new(&config.notifications, host));
        let aggregator = Arc::new(
            CountAggregator::new(&config.counter, backend).with_router(store.clone()),
        );
        Self { aggregator, store }
    }

    /// Starts the notification session and then polling for `user`.
    pub async fn sign_in(&self, user: &UserId) -> PermissionState {
        let permission = self.store.begin_session(user).await;
        self.aggregator.start_for_user(user.clone()).await;
        permission
    }

    pub fn sign_out(&self) {
        self.aggregator.stop();
        self.store.end_session();
    }
}

fn backend(config: &ImmoConfig) -> Result<Arc<SupabaseBackend>, ImmoError> {
    SupabaseBackend::from_config(&config.backend).map(Arc::new)
}

fn stdout_color(plain: bool) -> bool {
    !plain && std::io::stdout().is_terminal()
}

/// Polls until interrupted, printing count changes and new notifications.
pub async fn watch(config: &ImmoConfig, user: UserId, plain: bool) -> Result<(), ImmoError> {
    let backend = backend(config)?;
    match backend.health_check().await? {
        HealthStatus::Healthy => info!(backend = backend.name(), "backend reachable"),
        HealthStatus::Degraded(reason) => warn!(reason = %reason, "backend degraded"),
        HealthStatus::Unhealthy(reason) => {
            warn!(reason = %reason, "backend is unreachable, polling will keep retrying");
        }
    }
    let host: Arc<dyn NotificationHost> = Arc::new(TerminalHost::detect(plain));
    let client = Client::build(config, backend, host);
    let cancel = shutdown::install_signal_handler();
    run_watch(&client, user, stdout_color(plain), cancel).await;
    Ok(())
}

/// Body of `watch`, separated from wiring so it can run against any backend.
pub async fn run_watch(client: &Client, user: UserId, use_color: bool, cancel: CancellationToken) {
    let _counts = client
        .aggregator
        .subscribe("cli-counts", move |counts| {
            println!("{}", format_counts(counts, use_color));
        });
    let printed: Mutex<HashSet<NotificationId>> = Mutex::new(HashSet::new());
    let _records = client.store.subscribe("cli-notifications", move |records| {
        let mut printed = printed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Records are newest first; print the unseen ones oldest first.
        for record in records.iter().rev() {
            if printed.insert(record.id.clone()) {
                println!("{}", format_record(record, use_color));
            }
        }
    });

    let permission = client.sign_in(&user).await;
    info!(user = %user, permission = %permission, "watching for new messages");

    cancel.cancelled().await;
    client.sign_out();
    info!("immo watch shutdown complete");
}

/// Prints the unread counts of `user`, or the exact count of one conversation.
pub async fn count(
    config: &ImmoConfig,
    user: UserId,
    conversation: Option<(String, String)>,
    plain: bool,
) -> Result<(), ImmoError> {
    let aggregator = Arc::new(CountAggregator::new(&config.counter, backend(config)?));
    aggregator.start_for_user(user).await;

    match conversation {
        Some((context, from)) => {
            let n = aggregator.count_for_conversation(context, from).await;
            println!("{n}");
        }
        None => println!("{}", format_counts(&aggregator.counts(), stdout_color(plain))),
    }
    aggregator.stop();
    Ok(())
}

/// Marks one conversation read and prints the reconciled counts.
pub async fn mark_read(
    config: &ImmoConfig,
    user: UserId,
    context: String,
    from: String,
    plain: bool,
) -> Result<(), ImmoError> {
    let aggregator = Arc::new(CountAggregator::new(&config.counter, backend(config)?));
    aggregator.start_for_user(user).await;
    let result = aggregator.mark_conversation_read(context, from).await;
    if result.is_ok() {
        println!("{}", format_counts(&aggregator.counts(), stdout_color(plain)));
    }
    aggregator.stop();
    result
}

/// Prints the latest messages of one conversation, newest first.
pub async fn inspect(
    config: &ImmoConfig,
    user: UserId,
    context: String,
    with: String,
    limit: usize,
) -> Result<(), ImmoError> {
    let aggregator = Arc::new(CountAggregator::new(&config.counter, backend(config)?));
    aggregator.start_for_user(user).await;
    let result = aggregator.inspect_conversation(context, with, limit).await;
    aggregator.stop();

    let messages = result?;
    if messages.is_empty() {
        println!("no messages");
    }
    for message in &messages {
        println!("{}", format_message(message));
    }
    Ok(())
}

/// Prints the effective configuration as TOML.
pub fn print_config(config: &ImmoConfig) -> Result<(), ImmoError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| ImmoError::Config(format!("failed to render configuration: {e}")))?;
    print!("{rendered}");
    Ok(())
}
