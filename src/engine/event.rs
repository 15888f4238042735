//! Inbound events consumed by the rule engines
//!
//! Events carry plain ids and a caller-supplied `now` so engines stay
//! independent of the gateway and of the wall clock.

use std::time::Instant;

/// A plain guild message, as seen by the ping-protection and counting engines
#[derive(Debug, Clone)]
pub struct MessageEvent {
    /// Guild the message was posted in
    pub guild_id: u64,
    /// Channel the message was posted in
    pub channel_id: u64,
    /// Author of the message
    pub author_id: u64,
    /// Whether the author is a bot account
    pub author_is_bot: bool,
    /// Raw message body
    pub body: String,
    /// Ids of all mentioned members
    pub mentioned_user_ids: Vec<u64>,
    /// Ids of all mentioned roles
    pub mentioned_role_ids: Vec<u64>,
    /// Monotonic timestamp of arrival
    pub now: Instant,
}

impl MessageEvent {
    /// Whether the message mentions the given member or role id
    #[must_use]
    pub fn mentions(&self, target_id: u64) -> bool {
        self.mentioned_user_ids.contains(&target_id)
            || self.mentioned_role_ids.contains(&target_id)
    }
}

/// An invoked command, as seen by the permission engine
#[derive(Debug, Clone)]
pub struct CommandEvent {
    /// Guild the command was invoked in
    pub guild_id: u64,
    /// Id of the invoking user
    pub caller_id: u64,
    /// Role ids held by the invoking user
    pub caller_roles: Vec<u64>,
    /// Name of the invoked command
    pub command: String,
}
