//! Tracker store
//!
//! Per-guild mutable state for the rule engines: protected-target ping
//! histories, counting sessions, and recorded ban names. Intentionally
//! ephemeral; nothing here survives a restart.
//!
//! Protected targets are kept in a `BTreeMap` so a message mentioning two
//! protected targets always resolves in ascending target-id order.

use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

/// Per-guild counting mini-game state
#[derive(Debug, Clone)]
pub struct CountingSession {
    /// Channel the game runs in
    pub channel_id: u64,
    /// Running count; 0 means the next expected value is 1
    pub current_count: u64,
    /// Per-user suppression windows after a miss
    pub cooldown_until: HashMap<u64, Instant>,
}

impl CountingSession {
    /// Create a fresh session for a channel
    #[must_use]
    pub fn new(channel_id: u64) -> Self {
        Self {
            channel_id,
            current_count: 0,
            cooldown_until: HashMap::new(),
        }
    }
}

/// Shared mutable state for the rule engines, keyed by guild id
///
/// Mutating one guild's entry never locks another's. Cloning the store is
/// cheap and shares the underlying maps.
#[derive(Debug, Clone, Default)]
pub struct TrackerStore {
    /// guild_id -> target_id -> recent mention timestamps
    protected: Arc<DashMap<u64, BTreeMap<u64, Vec<Instant>>>>,
    /// guild_id -> counting session
    counting: Arc<DashMap<u64, CountingSession>>,
    /// guild_id -> case-folded name -> banned user id
    bans: Arc<DashMap<u64, BTreeMap<String, u64>>>,
}

impl TrackerStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a target as protected. Returns false if it already was,
    /// leaving any existing ping history untouched.
    pub fn protect(&self, guild_id: u64, target_id: u64) -> bool {
        let mut targets = self.protected.entry(guild_id).or_default();
        if targets.contains_key(&target_id) {
            return false;
        }
        targets.insert(target_id, Vec::new());
        true
    }

    /// Remove protection from a target. Returns false if it was not protected.
    pub fn unprotect(&self, guild_id: u64, target_id: u64) -> bool {
        self.protected
            .get_mut(&guild_id)
            .is_some_and(|mut targets| targets.remove(&target_id).is_some())
    }

    /// Whether a target is currently protected. Presence in the map is what
    /// counts; an empty history is still protected.
    #[must_use]
    pub fn is_protected(&self, guild_id: u64, target_id: u64) -> bool {
        self.protected
            .get(&guild_id)
            .is_some_and(|targets| targets.contains_key(&target_id))
    }

    /// Snapshot of a target's ping history
    #[must_use]
    pub fn ping_history(&self, guild_id: u64, target_id: u64) -> Option<Vec<Instant>> {
        self.protected
            .get(&guild_id)
            .and_then(|targets| targets.get(&target_id).cloned())
    }

    /// Exclusive access to a guild's protected-target map. The returned
    /// guard holds the guild's shard for its lifetime, so a prune-then-append
    /// done through it cannot lose updates to a concurrent message.
    pub fn protected_targets_mut(
        &self,
        guild_id: u64,
    ) -> Option<RefMut<'_, u64, BTreeMap<u64, Vec<Instant>>>> {
        self.protected.get_mut(&guild_id)
    }

    /// Configure (or reconfigure) the counting channel for a guild,
    /// resetting the count and clearing all cooldowns.
    pub fn set_counting_channel(&self, guild_id: u64, channel_id: u64) {
        self.counting.insert(guild_id, CountingSession::new(channel_id));
    }

    /// Snapshot of a guild's counting session
    #[must_use]
    pub fn counting_session(&self, guild_id: u64) -> Option<CountingSession> {
        self.counting.get(&guild_id).map(|entry| entry.clone())
    }

    /// Exclusive access to a guild's counting session
    pub fn counting_session_mut(&self, guild_id: u64) -> Option<RefMut<'_, u64, CountingSession>> {
        self.counting.get_mut(&guild_id)
    }

    /// Record a ban under a case-folded name
    pub fn record_ban(&self, guild_id: u64, name: impl Into<String>, user_id: u64) {
        self.bans
            .entry(guild_id)
            .or_default()
            .insert(name.into(), user_id);
    }

    /// Remove a recorded ban, returning the banned user id if present
    pub fn remove_ban(&self, guild_id: u64, name: &str) -> Option<u64> {
        self.bans
            .get_mut(&guild_id)
            .and_then(|mut names| names.remove(name))
    }

    /// All recorded ban names for a guild, in ascending name order
    #[must_use]
    pub fn ban_records(&self, guild_id: u64) -> Vec<(String, u64)> {
        self.bans
            .get(&guild_id)
            .map(|names| {
                names
                    .iter()
                    .map(|(name, &user_id)| (name.clone(), user_id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_protect_and_unprotect() {
        let store = TrackerStore::new();

        assert!(store.protect(1, 100));
        assert!(store.is_protected(1, 100));
        assert_eq!(store.ping_history(1, 100), Some(vec![]));

        // Already protected: rejected, history untouched
        assert!(!store.protect(1, 100));

        assert!(store.unprotect(1, 100));
        assert!(!store.is_protected(1, 100));

        // Not protected: informational, no error
        assert!(!store.unprotect(1, 100));
        assert!(!store.unprotect(2, 100));
    }

    #[test]
    fn test_protect_preserves_history_on_duplicate() {
        let store = TrackerStore::new();
        store.protect(1, 100);

        let now = Instant::now();
        store
            .protected_targets_mut(1)
            .unwrap()
            .get_mut(&100)
            .unwrap()
            .push(now);

        assert!(!store.protect(1, 100));
        assert_eq!(store.ping_history(1, 100).unwrap().len(), 1);
    }

    #[test]
    fn test_guild_isolation() {
        let store = TrackerStore::new();
        store.protect(1, 100);
        assert!(!store.is_protected(2, 100));

        store.record_ban(1, "alice", 42);
        assert!(store.ban_records(2).is_empty());
    }

    #[test]
    fn test_counting_reconfigure_resets() {
        let store = TrackerStore::new();
        store.set_counting_channel(1, 555);

        {
            let mut session = store.counting_session_mut(1).unwrap();
            session.current_count = 7;
            session
                .cooldown_until
                .insert(42, Instant::now() + Duration::from_secs(10));
        }

        store.set_counting_channel(1, 666);
        let session = store.counting_session(1).unwrap();
        assert_eq!(session.channel_id, 666);
        assert_eq!(session.current_count, 0);
        assert!(session.cooldown_until.is_empty());
    }

    #[test]
    fn test_ban_records_sorted() {
        let store = TrackerStore::new();
        store.record_ban(1, "carol", 3);
        store.record_ban(1, "alice", 1);
        store.record_ban(1, "bob", 2);

        let names: Vec<String> = store
            .ban_records(1)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);

        assert_eq!(store.remove_ban(1, "bob"), Some(2));
        assert_eq!(store.remove_ban(1, "bob"), None);
    }
}
