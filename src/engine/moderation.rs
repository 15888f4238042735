//! Moderation-action engine
//!
//! Bans record the target's case-folded name so a later unban can be
//! requested with a half-remembered spelling. Unban scores every recorded
//! name with Jaro-Winkler similarity and takes the best match above the
//! floor; candidates are scanned in ascending name order so the result is
//! deterministic for a given store.

use crate::engine::{Action, TrackerStore};
use tracing::info;

/// Minimum similarity for an unban query to match a recorded name
pub const SIMILARITY_FLOOR: f64 = 0.75;

/// Outcome of a ban operation
#[derive(Debug, Clone, PartialEq)]
pub enum BanOutcome {
    /// The ban was recorded; actions carry a best-effort notification to
    /// the target followed by the platform ban. The notification goes out
    /// first because a banned user no longer shares a guild with the bot
    /// and can no longer be messaged.
    Banned { actions: Vec<Action> },
    /// A moderator may not ban themselves
    SelfTarget,
}

/// Outcome of an unban operation
#[derive(Debug, Clone, PartialEq)]
pub enum UnbanOutcome {
    /// A recorded name matched the query
    Unbanned {
        /// The canonical recorded name that matched, reported back to the
        /// caller since they supplied a fuzzy query
        matched_name: String,
        user_id: u64,
        actions: Vec<Action>,
    },
    /// No recorded name cleared the similarity floor
    NotFound,
}

/// Ban a user, recording their name for fuzzy recall on unban.
///
/// The record is made before the platform ban is applied; if the platform
/// ban fails for any reason the caller reverts the record with
/// [`revert_ban`].
pub fn ban(
    store: &TrackerStore,
    guild_id: u64,
    moderator_id: u64,
    target_id: u64,
    target_name: &str,
    reason: &str,
) -> BanOutcome {
    if target_id == moderator_id {
        return BanOutcome::SelfTarget;
    }

    let name = target_name.to_lowercase();
    store.record_ban(guild_id, name.clone(), target_id);
    info!(guild_id, target_id, name = %name, "ban recorded");

    BanOutcome::Banned {
        actions: vec![
            Action::DirectMessage {
                user_id: target_id,
                text: format!("You have been banned: {reason}"),
            },
            Action::ApplyPermanentBan {
                user_id: target_id,
                reason: reason.to_string(),
            },
        ],
    }
}

/// Undo a ban record after the platform ban failed. The store must end up
/// consistent with the platform no matter why the ban failed.
pub fn revert_ban(store: &TrackerStore, guild_id: u64, target_name: &str) {
    store.remove_ban(guild_id, &target_name.to_lowercase());
    info!(guild_id, name = %target_name.to_lowercase(), "ban record reverted");
}

/// Restore a ban record after the platform unban failed, so a retry can
/// match it again.
pub fn restore_ban(store: &TrackerStore, guild_id: u64, matched_name: String, user_id: u64) {
    info!(guild_id, user_id, matched_name = %matched_name, "ban record restored");
    store.record_ban(guild_id, matched_name, user_id);
}

/// Unban by free-text name, matching the closest recorded ban name.
pub fn unban(store: &TrackerStore, guild_id: u64, query: &str) -> UnbanOutcome {
    let query = query.to_lowercase();

    let mut best: Option<(String, u64, f64)> = None;
    for (name, user_id) in store.ban_records(guild_id) {
        let score = strsim::jaro_winkler(&query, &name);
        if score < SIMILARITY_FLOOR {
            continue;
        }
        // Strictly greater keeps the first name encountered on ties
        if best.as_ref().is_none_or(|&(_, _, s)| score > s) {
            best = Some((name, user_id, score));
        }
    }

    let Some((matched_name, user_id, score)) = best else {
        return UnbanOutcome::NotFound;
    };

    store.remove_ban(guild_id, &matched_name);
    info!(guild_id, user_id, matched_name = %matched_name, score, "ban lifted by fuzzy match");

    UnbanOutcome::Unbanned {
        matched_name: matched_name.clone(),
        user_id,
        actions: vec![
            Action::LiftBan { user_id },
            Action::DirectMessage {
                user_id,
                text: "Your ban has been lifted.".to_string(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_ban_rejected() {
        let store = TrackerStore::new();
        let outcome = ban(&store, 1, 7, 7, "Mod", "reason");
        assert_eq!(outcome, BanOutcome::SelfTarget);
        assert!(store.ban_records(1).is_empty());
    }

    #[test]
    fn test_ban_records_case_folded_name() {
        let store = TrackerStore::new();
        let outcome = ban(&store, 1, 7, 42, "Alice", "spamming");

        let BanOutcome::Banned { actions } = outcome else {
            panic!("expected ban");
        };
        // Notify first: once banned the user is unreachable by DM
        assert!(matches!(actions[0], Action::DirectMessage { user_id: 42, .. }));
        assert!(matches!(
            actions[1],
            Action::ApplyPermanentBan { user_id: 42, .. }
        ));
        assert_eq!(store.ban_records(1), vec![("alice".to_string(), 42)]);
    }

    #[test]
    fn test_revert_ban_after_platform_failure() {
        let store = TrackerStore::new();
        ban(&store, 1, 7, 42, "Alice", "spamming");
        assert_eq!(store.ban_records(1).len(), 1);

        // Any dispatch failure unwinds the record, not just privilege ones
        revert_ban(&store, 1, "Alice");
        assert!(store.ban_records(1).is_empty());
        assert_eq!(unban(&store, 1, "alice"), UnbanOutcome::NotFound);
    }

    #[test]
    fn test_restore_ban_after_platform_failure() {
        let store = TrackerStore::new();
        ban(&store, 1, 7, 42, "alice", "x");

        let UnbanOutcome::Unbanned {
            matched_name,
            user_id,
            ..
        } = unban(&store, 1, "alice")
        else {
            panic!("expected match");
        };
        assert!(store.ban_records(1).is_empty());

        // The platform unban failed; a retry must find the record again
        restore_ban(&store, 1, matched_name, user_id);
        assert!(matches!(
            unban(&store, 1, "alice"),
            UnbanOutcome::Unbanned { user_id: 42, .. }
        ));
    }

    #[test]
    fn test_unban_fuzzy_match() {
        let store = TrackerStore::new();
        ban(&store, 1, 7, 42, "alice", "x");
        ban(&store, 1, 7, 43, "alicia", "x");

        let outcome = unban(&store, 1, "alicee");
        let UnbanOutcome::Unbanned {
            matched_name,
            user_id,
            actions,
        } = outcome
        else {
            panic!("expected match");
        };
        // "alicee" is closer to "alice" than to "alicia"
        assert_eq!(matched_name, "alice");
        assert_eq!(user_id, 42);
        assert!(matches!(actions[0], Action::LiftBan { user_id: 42 }));

        // The matched record is gone, the other remains
        assert_eq!(store.ban_records(1), vec![("alicia".to_string(), 43)]);
    }

    #[test]
    fn test_unban_is_deterministic() {
        let first = {
            let store = TrackerStore::new();
            ban(&store, 1, 7, 42, "alice", "x");
            ban(&store, 1, 7, 43, "alicia", "x");
            unban(&store, 1, "alic")
        };
        for _ in 0..10 {
            let store = TrackerStore::new();
            ban(&store, 1, 7, 42, "alice", "x");
            ban(&store, 1, 7, 43, "alicia", "x");
            assert_eq!(unban(&store, 1, "alic"), first);
        }
    }

    #[test]
    fn test_unban_below_floor_not_found() {
        let store = TrackerStore::new();
        ban(&store, 1, 7, 42, "alice", "x");

        assert_eq!(unban(&store, 1, "zzzzqqqq"), UnbanOutcome::NotFound);
        assert_eq!(store.ban_records(1).len(), 1);
    }

    #[test]
    fn test_unban_empty_store_not_found() {
        let store = TrackerStore::new();
        assert_eq!(unban(&store, 1, "anyone"), UnbanOutcome::NotFound);
    }

    #[test]
    fn test_unban_query_case_folded() {
        let store = TrackerStore::new();
        ban(&store, 1, 7, 42, "Alice", "x");

        let outcome = unban(&store, 1, "ALICE");
        assert!(matches!(outcome, UnbanOutcome::Unbanned { ref matched_name, .. } if matched_name == "alice"));
    }
}
