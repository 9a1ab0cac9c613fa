// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Native notification host for an interactive terminal.
//!
//! The permission prompt is a y/N question on stdin; notifications are banners
//! printed to stderr. Without a terminal on both ends the host reports itself
//! unsupported and the store degrades to in-app records only.

use std::io::{BufRead, IsTerminal, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use immo_core::error::ImmoError;
use immo_core::traits::NotificationHost;
use immo_core::types::{BrowserNotificationOptions, HostNotificationId, PermissionState};
use tracing::debug;

const PROMPT: &str = "Show new-message notifications in this terminal? [y/N] ";

pub struct TerminalHost {
    supported: bool,
    use_color: bool,
    permission: Mutex<PermissionState>,
    next_id: AtomicU64,
}

impl TerminalHost {
    /// Inspects stdin and stderr to decide whether prompting is possible.
    pub fn detect(plain: bool) -> Self {
        let stderr_tty = std::io::stderr().is_terminal();
        let supported = std::io::stdin().is_terminal() && stderr_tty;
        Self::new(supported, !plain && stderr_tty)
    }

    pub fn new(supported: bool, use_color: bool) -> Self {
        Self {
            supported,
            use_color,
            permission: Mutex::new(PermissionState::Default),
            next_id: AtomicU64::new(1),
        }
    }

    /// Starts from an already decided permission, as from a `--notify` flag.
    pub fn with_permission(self, permission: PermissionState) -> Self {
        *self.lock() = permission;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PermissionState> {
        self.permission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Interprets a prompt answer. Anything but yes is a refusal.
pub fn parse_answer(answer: &str) -> PermissionState {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => PermissionState::Granted,
        _ => PermissionState::Denied,
    }
}

/// One-line banner for a native notification.
pub fn format_banner(title: &str, options: &BrowserNotificationOptions, use_color: bool) -> String {
    let body = options.body.as_deref().unwrap_or_default();
    if use_color {
        use colored::Colorize;
        format!("{} {} {}", "●".cyan(), title.bold(), body.dimmed())
    } else {
        format!("[notify] {title} {body}").trim_end().to_string()
    }
}

#[async_trait]
impl NotificationHost for TerminalHost {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn permission(&self) -> PermissionState {
        if !self.supported {
            return PermissionState::Denied;
        }
        *self.lock()
    }

    async fn request_permission(&self) -> Result<PermissionState, ImmoError> {
        let current = self.permission();
        if current != PermissionState::Default {
            return Ok(current);
        }

        let answer = tokio::task::spawn_blocking(|| {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "{PROMPT}");
            let _ = stderr.flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await
        .map_err(|e| ImmoError::Host {
            message: format!("permission prompt task failed: {e}"),
        })?
        .map_err(|e| ImmoError::Host {
            message: format!("failed to read permission answer: {e}"),
        })?;

        let decided = parse_answer(&answer);
        *self.lock() = decided;
        debug!(permission = %decided, "terminal notification permission decided");
        Ok(decided)
    }

    async fn show(
        &self,
        title: &str,
        options: &BrowserNotificationOptions,
    ) -> Result<HostNotificationId, ImmoError> {
        if self.permission() != PermissionState::Granted {
            return Err(ImmoError::Host {
                message: "terminal notifications are not permitted".into(),
            });
        }
        eprintln!("{}", format_banner(title, options, self.use_color));
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(HostNotificationId(format!("terminal-{n}")))
    }

    async fn close(&self, _id: &HostNotificationId) -> Result<(), ImmoError> {
        Ok(())
    }

    /// Printed banners scroll away; there is nothing to dismiss.
    fn auto_dismisses(&self) -> bool {
        true
    }
}
