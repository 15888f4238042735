//! Permission engine
//!
//! Resolves the role required to invoke a command: a per-guild override if
//! one is set, otherwise the static default table. The `role` command, which
//! edits the override table itself, answers to guild ownership alone and can
//! never be delegated through that table.

use crate::engine::CommandEvent;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Role required for the admin commands when no override is set.
/// Mirrors the single moderator role the bot was originally deployed with.
pub const DEFAULT_MOD_ROLE_ID: u64 = 1_391_654_796_989_169_707;

/// Name of the override-editing command, authorized by ownership only
pub const ROLE_COMMAND: &str = "role";

/// Commands gated behind the moderator role by default
const GATED_COMMANDS: &[&str] = &[
    "pingpunish",
    "pingpardon",
    "setcount",
    "ban",
    "unban",
    "setprefix",
];

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized,
    Unauthorized,
}

/// Command-to-role resolution table, defaults plus per-guild overrides
#[derive(Debug)]
pub struct PermissionTable {
    defaults: HashMap<String, u64>,
    overrides: DashMap<u64, HashMap<String, u64>>,
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::new(default_command_roles())
    }
}

/// The built-in default table: every gated command requires the moderator role
#[must_use]
pub fn default_command_roles() -> HashMap<String, u64> {
    GATED_COMMANDS
        .iter()
        .map(|&name| (name.to_string(), DEFAULT_MOD_ROLE_ID))
        .collect()
}

impl PermissionTable {
    /// Create a table with the given defaults and no overrides
    #[must_use]
    pub fn new(defaults: HashMap<String, u64>) -> Self {
        Self {
            defaults,
            overrides: DashMap::new(),
        }
    }

    /// Role required to invoke a command in a guild, if any.
    /// Commands absent from both tables are open to everyone.
    #[must_use]
    pub fn required_role(&self, guild_id: u64, command: &str) -> Option<u64> {
        self.overrides
            .get(&guild_id)
            .and_then(|table| table.get(command).copied())
            .or_else(|| self.defaults.get(command).copied())
    }

    /// Set a per-guild override. The `role` command itself cannot be
    /// delegated; an override for it is refused.
    pub fn set_override(&self, guild_id: u64, command: &str, role_id: u64) -> bool {
        if command == ROLE_COMMAND {
            return false;
        }
        info!(guild_id, command, role_id, "command role override set");
        self.overrides
            .entry(guild_id)
            .or_default()
            .insert(command.to_string(), role_id);
        true
    }

    /// Remove a per-guild override, restoring the default
    pub fn clear_override(&self, guild_id: u64, command: &str) -> bool {
        self.overrides
            .get_mut(&guild_id)
            .is_some_and(|mut table| table.remove(command).is_some())
    }

    /// Authorize a command invocation against this table
    #[must_use]
    pub fn authorize(&self, event: &CommandEvent) -> AuthOutcome {
        match self.required_role(event.guild_id, &event.command) {
            Some(role_id) if event.caller_roles.contains(&role_id) => AuthOutcome::Authorized,
            Some(_) => AuthOutcome::Unauthorized,
            None => AuthOutcome::Authorized,
        }
    }

    /// Export all overrides for persistence. The sorted shape round-trips
    /// identically through load and save.
    #[must_use]
    pub fn export(&self) -> BTreeMap<u64, BTreeMap<String, u64>> {
        self.overrides
            .iter()
            .map(|entry| {
                let table = entry
                    .value()
                    .iter()
                    .map(|(name, &role)| (name.clone(), role))
                    .collect();
                (*entry.key(), table)
            })
            .collect()
    }

    /// Import persisted overrides, replacing any existing entries for the
    /// same guilds
    pub fn import(&self, overrides: BTreeMap<u64, BTreeMap<String, u64>>) {
        for (guild_id, table) in overrides {
            self.overrides
                .insert(guild_id, table.into_iter().collect());
        }
    }
}

/// Authorize the `role` command: guild owner only, bypassing both tables
#[must_use]
pub fn authorize_owner(caller_id: u64, owner_id: u64) -> AuthOutcome {
    if caller_id == owner_id {
        AuthOutcome::Authorized
    } else {
        AuthOutcome::Unauthorized
    }
}
