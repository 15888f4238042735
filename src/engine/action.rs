//! Outbound actions emitted by the rule engines
//!
//! The engines never talk to Discord. They emit these values and the
//! dispatcher applies them in emission order.

use std::fmt;
use std::time::Duration;

/// A side effect to apply against the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Post a message to a channel
    Notify { channel_id: u64, text: String },
    /// Reply to the invoking user only (command responses)
    NotifyEphemeral { text: String },
    /// Apply a temporary sanction (timeout) to a user
    ApplySanction {
        user_id: u64,
        duration: Duration,
        reason: String,
    },
    /// Lift a sanction from a user; a no-op if none is active
    LiftSanction { user_id: u64 },
    /// Permanently ban a user
    ApplyPermanentBan { user_id: u64, reason: String },
    /// Remove a permanent ban
    LiftBan { user_id: u64 },
    /// Best-effort direct message; delivery failure is swallowed
    DirectMessage { user_id: u64, text: String },
    /// Run a countdown in a channel: one message edited from `from` down
    /// to 1, one tick per second, deleted when done
    Countdown { channel_id: u64, from: u8 },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notify { channel_id, .. } => write!(f, "Notify(channel {channel_id})"),
            Self::NotifyEphemeral { .. } => write!(f, "NotifyEphemeral"),
            Self::ApplySanction {
                user_id, duration, ..
            } => write!(f, "ApplySanction(user {user_id}, {}s)", duration.as_secs()),
            Self::LiftSanction { user_id } => write!(f, "LiftSanction(user {user_id})"),
            Self::ApplyPermanentBan { user_id, .. } => {
                write!(f, "ApplyPermanentBan(user {user_id})")
            }
            Self::LiftBan { user_id } => write!(f, "LiftBan(user {user_id})"),
            Self::DirectMessage { user_id, .. } => write!(f, "DirectMessage(user {user_id})"),
            Self::Countdown { channel_id, from } => {
                write!(f, "Countdown(channel {channel_id}, from {from})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let action = Action::ApplySanction {
            user_id: 42,
            duration: Duration::from_secs(60),
            reason: "reason".to_string(),
        };
        assert_eq!(action.to_string(), "ApplySanction(user 42, 60s)");

        let action = Action::Countdown {
            channel_id: 7,
            from: 10,
        };
        assert_eq!(action.to_string(), "Countdown(channel 7, from 10)");
    }
}
