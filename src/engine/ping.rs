//! Ping-protection engine
//!
//! Tracks mentions of protected targets inside a sliding 60 second window
//! and sanctions an author who pings the same protected target twice.

use crate::engine::{Action, MessageEvent, TrackerStore};
use std::time::Duration;
use tracing::info;

/// How long a mention stays in a target's history
pub const PING_WINDOW: Duration = Duration::from_secs(60);

/// Duration of the timeout applied to a double-pinger
pub const SANCTION_DURATION: Duration = Duration::from_secs(60);

/// Outcome of a protect operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectOutcome {
    /// The target is now protected
    Protected,
    /// The target was already protected; nothing changed
    AlreadyProtected,
}

/// Outcome of an unprotect operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnprotectOutcome {
    /// Protection removed
    Unprotected,
    /// The target was not protected; nothing changed
    NotProtected,
}

/// Start protecting a member or role from double pings
pub fn protect(store: &TrackerStore, guild_id: u64, target_id: u64) -> ProtectOutcome {
    if store.protect(guild_id, target_id) {
        info!(guild_id, target_id, "target protected from double pings");
        ProtectOutcome::Protected
    } else {
        ProtectOutcome::AlreadyProtected
    }
}

/// Stop protecting a member or role
pub fn unprotect(store: &TrackerStore, guild_id: u64, target_id: u64) -> UnprotectOutcome {
    if store.unprotect(guild_id, target_id) {
        info!(guild_id, target_id, "target protection removed");
        UnprotectOutcome::Unprotected
    } else {
        UnprotectOutcome::NotProtected
    }
}

/// Run one message through ping protection.
///
/// For each protected target the message mentions, expired entries are
/// pruned and the new timestamp appended under a single guild guard. The
/// first target (lowest id) whose history reaches two entries triggers a
/// sanction against the author; its history resets and the scan stops.
pub fn handle_message(store: &TrackerStore, event: &MessageEvent) -> Vec<Action> {
    let mut actions = Vec::new();
    if event.author_is_bot {
        return actions;
    }

    let Some(mut targets) = store.protected_targets_mut(event.guild_id) else {
        return actions;
    };

    for (&target_id, history) in targets.iter_mut() {
        if !event.mentions(target_id) {
            continue;
        }

        history.retain(|&t| event.now.duration_since(t) < PING_WINDOW);
        history.push(event.now);

        if history.len() >= 2 {
            info!(
                guild_id = event.guild_id,
                author_id = event.author_id,
                target_id,
                "double ping detected, sanctioning author"
            );
            actions.push(Action::ApplySanction {
                user_id: event.author_id,
                duration: SANCTION_DURATION,
                reason: format!("Pinged protected target {target_id} twice within 60 seconds"),
            });
            actions.push(Action::Notify {
                channel_id: event.channel_id,
                text: format!(
                    "<@{}> was muted for pinging <@{}> twice within 60 seconds.",
                    event.author_id, target_id
                ),
            });
            history.clear();
            break;
        }
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn event_mentioning(
        store_now: Instant,
        author_id: u64,
        users: Vec<u64>,
        roles: Vec<u64>,
    ) -> MessageEvent {
        MessageEvent {
            guild_id: 1,
            channel_id: 2,
            author_id,
            author_is_bot: false,
            body: String::new(),
            mentioned_user_ids: users,
            mentioned_role_ids: roles,
            now: store_now,
        }
    }

    #[test]
    fn test_double_ping_within_window_sanctions_once() {
        let store = TrackerStore::new();
        protect(&store, 1, 100);
        let start = Instant::now();

        let first = event_mentioning(start, 7, vec![100], vec![]);
        assert!(handle_message(&store, &first).is_empty());
        assert_eq!(store.ping_history(1, 100).unwrap().len(), 1);

        let second = event_mentioning(start + Duration::from_secs(30), 7, vec![100], vec![]);
        let actions = handle_message(&store, &second);
        assert_eq!(actions.len(), 2);
        match &actions[0] {
            Action::ApplySanction {
                user_id, duration, ..
            } => {
                assert_eq!(*user_id, 7);
                assert_eq!(*duration, SANCTION_DURATION);
            }
            other => panic!("expected sanction, got {other}"),
        }
        assert!(matches!(actions[1], Action::Notify { channel_id: 2, .. }));

        // History resets to empty after the sanction fires
        assert_eq!(store.ping_history(1, 100), Some(vec![]));
    }

    #[test]
    fn test_mentions_outside_window_do_not_sanction() {
        let store = TrackerStore::new();
        protect(&store, 1, 100);
        let start = Instant::now();

        let first = event_mentioning(start, 7, vec![100], vec![]);
        assert!(handle_message(&store, &first).is_empty());

        let second = event_mentioning(start + Duration::from_secs(61), 7, vec![100], vec![]);
        assert!(handle_message(&store, &second).is_empty());

        // Only the unexpired entry remains
        assert_eq!(store.ping_history(1, 100).unwrap().len(), 1);
    }

    #[test]
    fn test_role_mentions_count() {
        let store = TrackerStore::new();
        protect(&store, 1, 500);
        let start = Instant::now();

        handle_message(&store, &event_mentioning(start, 7, vec![], vec![500]));
        let actions = handle_message(
            &store,
            &event_mentioning(start + Duration::from_secs(1), 7, vec![], vec![500]),
        );
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_first_match_wins_lowest_target_id() {
        let store = TrackerStore::new();
        protect(&store, 1, 200);
        protect(&store, 1, 100);
        let start = Instant::now();

        // Prime both targets with one mention each
        handle_message(&store, &event_mentioning(start, 7, vec![100, 200], vec![]));

        // Second mention of both: only the lowest target id triggers
        let actions = handle_message(
            &store,
            &event_mentioning(start + Duration::from_secs(1), 7, vec![100, 200], vec![]),
        );
        assert_eq!(actions.len(), 2);
        match &actions[0] {
            Action::ApplySanction { reason, .. } => assert!(reason.contains("100")),
            other => panic!("expected sanction, got {other}"),
        }

        // The triggering target resets; the scan stopped before target 200,
        // which keeps only its primed entry
        assert_eq!(store.ping_history(1, 100), Some(vec![]));
        assert_eq!(store.ping_history(1, 200).unwrap().len(), 1);
    }

    #[test]
    fn test_unprotected_mentions_are_noop() {
        let store = TrackerStore::new();
        protect(&store, 1, 100);

        let event = event_mentioning(Instant::now(), 7, vec![999], vec![]);
        assert!(handle_message(&store, &event).is_empty());
        assert_eq!(store.ping_history(1, 100), Some(vec![]));
    }

    #[test]
    fn test_bot_authors_ignored() {
        let store = TrackerStore::new();
        protect(&store, 1, 100);
        let start = Instant::now();

        let mut event = event_mentioning(start, 7, vec![100], vec![]);
        event.author_is_bot = true;
        assert!(handle_message(&store, &event).is_empty());
        assert_eq!(store.ping_history(1, 100), Some(vec![]));
    }

    #[test]
    fn test_protect_outcomes() {
        let store = TrackerStore::new();
        assert_eq!(protect(&store, 1, 100), ProtectOutcome::Protected);
        assert_eq!(protect(&store, 1, 100), ProtectOutcome::AlreadyProtected);
        assert_eq!(unprotect(&store, 1, 100), UnprotectOutcome::Unprotected);
        assert_eq!(unprotect(&store, 1, 100), UnprotectOutcome::NotProtected);
    }
}
