// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line formatting for command output.

use immo_core::types::{NotificationRecord, UnreadCount, UnreadMessage};

/// Summary line for a counts snapshot, e.g. `unread: 3 (42-u7: 2, 43-u8: 1)`.
pub fn format_counts(counts: &[UnreadCount], use_color: bool) -> String {
    let total: usize = counts.iter().map(|c| c.count).sum();
    let detail: Vec<String> = counts
        .iter()
        .filter(|c| c.count > 0)
        .map(|c| format!("{}: {}", c.conversation_key, c.count))
        .collect();

    let total = if use_color && total > 0 {
        use colored::Colorize;
        total.to_string().yellow().bold().to_string()
    } else {
        total.to_string()
    };

    if detail.is_empty() {
        format!("unread: {total}")
    } else {
        format!("unread: {total} ({})", detail.join(", "))
    }
}

pub fn format_record(record: &NotificationRecord, use_color: bool) -> String {
    let link = record
        .link
        .as_deref()
        .map(|l| format!(" -> {l}"))
        .unwrap_or_default();
    if use_color {
        use colored::Colorize;
        format!("  {} {}{}", record.title.bold(), record.body, link.dimmed())
    } else {
        format!("  {} {}{}", record.title, record.body, link)
    }
}

pub fn format_message(message: &UnreadMessage) -> String {
    let marker = if message.read { " " } else { "*" };
    format!(
        "{marker} {} {} -> {}: {}",
        message.created_at.format("%Y-%m-%d %H:%M"),
        message.sender_id,
        message.receiver_id,
        message.content
    )
}

#[cfg(test)]
mod tests {
    use immo_core::types::ConversationKey;

    use super::*;

    fn count(context: &str, sender: &str, n: usize) -> UnreadCount {
        UnreadCount {
            conversation_key: ConversationKey::new(context, sender),
            count: n,
        }
    }

    #[test]
    fn counts_line_lists_non_zero_conversations() {
        let line = format_counts(&[count("42", "u7", 2), count("43", "u8", 0)], false);
        assert_eq!(line, "unread: 2 (42-u7: 2)");
    }

    #[test]
    fn empty_counts_line() {
        assert_eq!(format_counts(&[], false), "unread: 0");
    }
}
