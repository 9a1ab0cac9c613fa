// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure functions behind one poll cycle: grouping, new-message
//! classification and change detection.

use std::collections::{BTreeMap, HashSet};

use immo_core::types::{ConversationKey, MessageId, UnreadCount, UnreadMessage};

/// Unread counts per conversation.
pub type CountMap = BTreeMap<ConversationKey, usize>;

/// Counts unread messages per conversation key.
pub fn group_counts(messages: &[UnreadMessage]) -> CountMap {
    let mut counts = CountMap::new();
    for message in messages {
        *counts.entry(message.conversation_key()).or_insert(0) += 1;
    }
    counts
}

/// Picks the messages worth announcing and records every unseen id in `seen`.
///
/// An unseen message is new only if its conversation had no unread messages
/// before this cycle. At most one message per conversation is returned: the
/// first unseen one in `messages` order.
pub fn classify_new(
    messages: &[UnreadMessage],
    previous: &CountMap,
    seen: &mut HashSet<MessageId>,
) -> Vec<UnreadMessage> {
    let mut announced: HashSet<ConversationKey> = HashSet::new();
    let mut fresh = Vec::new();

    for message in messages {
        if !seen.insert(message.id.clone()) {
            continue;
        }
        let key = message.conversation_key();
        let was_quiet = previous.get(&key).copied().unwrap_or(0) == 0;
        if was_quiet && announced.insert(key) {
            fresh.push(message.clone());
        }
    }
    fresh
}

/// True when a key appeared or disappeared, or any count differs.
pub fn has_counts_changed(previous: &CountMap, next: &CountMap) -> bool {
    previous.len() != next.len()
        || next
            .iter()
            .any(|(key, count)| previous.get(key) != Some(count))
}

/// Counts as the ordered array handed to subscribers.
pub fn to_snapshot(counts: &CountMap) -> Vec<UnreadCount> {
    counts
        .iter()
        .map(|(key, count)| UnreadCount {
            conversation_key: key.clone(),
            count: *count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    use super::*;

    fn msg(id: &str, context: &str, sender: &str) -> UnreadMessage {
        UnreadMessage {
            id: id.into(),
            sender_id: sender.into(),
            receiver_id: "me".into(),
            context_id: context.into(),
            content: String::new(),
            read: false,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
            deleted_at: None,
        }
    }

    fn key(context: &str, sender: &str) -> ConversationKey {
        ConversationKey::new(context, sender)
    }

    #[test]
    fn groups_by_context_and_sender() {
        let counts = group_counts(&[
            msg("m1", "42", "u7"),
            msg("m2", "42", "u7"),
            msg("m3", "42", "u8"),
            msg("m4", "43", "u7"),
        ]);
        assert_eq!(counts[&key("42", "u7")], 2);
        assert_eq!(counts[&key("42", "u8")], 1);
        assert_eq!(counts[&key("43", "u7")], 1);
    }

    #[test]
    fn burst_in_quiet_conversation_yields_one_new_message() {
        let messages = [msg("m2", "42", "u7"), msg("m1", "42", "u7")];
        let mut seen = HashSet::new();

        let fresh = classify_new(&messages, &CountMap::new(), &mut seen);

        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id.as_str(), "m2");
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn unseen_message_in_busy_conversation_is_backlog() {
        let mut previous = CountMap::new();
        previous.insert(key("42", "u7"), 1);
        let mut seen: HashSet<MessageId> = ["m1".into()].into_iter().collect();

        let fresh = classify_new(
            &[msg("m2", "42", "u7"), msg("m1", "42", "u7")],
            &previous,
            &mut seen,
        );

        assert!(fresh.is_empty());
        assert!(seen.contains(&MessageId::from("m2")));
    }

    #[test]
    fn zeroed_conversation_announces_again() {
        let mut previous = CountMap::new();
        previous.insert(key("42", "u7"), 0);
        let mut seen = HashSet::new();

        let fresh = classify_new(&[msg("m9", "42", "u7")], &previous, &mut seen);
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn change_detection_covers_size_value_and_disappearance() {
        let mut a = CountMap::new();
        a.insert(key("42", "u7"), 2);

        let mut grown = a.clone();
        grown.insert(key("43", "u8"), 1);
        assert!(has_counts_changed(&a, &grown));

        let mut bumped = a.clone();
        bumped.insert(key("42", "u7"), 3);
        assert!(has_counts_changed(&a, &bumped));

        let mut swapped = CountMap::new();
        swapped.insert(key("43", "u8"), 2);
        assert!(has_counts_changed(&a, &swapped));

        assert!(has_counts_changed(&a, &CountMap::new()));
        assert!(!has_counts_changed(&a, &a.clone()));
    }

    #[test]
    fn snapshot_is_ordered_by_key() {
        let counts = group_counts(&[msg("m1", "43", "u7"), msg("m2", "42", "u9")]);
        let snapshot = to_snapshot(&counts);
        assert_eq!(snapshot[0].conversation_key, key("42", "u9"));
        assert_eq!(snapshot[1].conversation_key, key("43", "u7"));
    }

    fn arb_messages() -> impl Strategy<Value = Vec<UnreadMessage>> {
        prop::collection::vec((0u8..20, 0u8..3, 0u8..3), 0..30).prop_map(|items| {
            let mut seen_ids = HashSet::new();
            items
                .into_iter()
                .filter(|(id, _, _)| seen_ids.insert(*id))
                .map(|(id, ctx, sender)| {
                    msg(&format!("m{id}"), &format!("c{ctx}"), &format!("u{sender}"))
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn counts_sum_to_message_total(messages in arb_messages()) {
            let counts = group_counts(&messages);
            prop_assert_eq!(counts.values().sum::<usize>(), messages.len());
        }

        #[test]
        fn a_message_is_announced_at_most_once(
            first in arb_messages(),
            second in arb_messages(),
        ) {
            let mut seen = HashSet::new();
            let mut last = CountMap::new();
            let mut announced = Vec::new();

            for poll in [&first, &second, &first] {
                let fresh = classify_new(poll, &last, &mut seen);
                announced.extend(fresh.into_iter().map(|m| m.id));
                last = group_counts(poll);
            }

            let unique: HashSet<_> = announced.iter().cloned().collect();
            prop_assert_eq!(unique.len(), announced.len());
        }

        #[test]
        fn identical_maps_never_change(messages in arb_messages()) {
            let counts = group_counts(&messages);
            prop_assert!(!has_counts_changed(&counts, &counts.clone()));
        }
    }
}
