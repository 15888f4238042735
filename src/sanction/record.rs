//! Sanction record and state machine
//!
//! A sanction is a temporary timeout with a fixed lift time. The lifecycle
//! is two states: applied, then lifted once the duration elapses. There is
//! no cancellation path; the domain tolerates a superfluous lift better
//! than a missed one.

use crate::error::{WardenError, WardenResult};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Sanction lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SanctionState {
    /// Timeout applied, waiting for the duration to expire
    #[default]
    Applied,
    /// Timeout lifted
    Lifted,
}

impl std::fmt::Display for SanctionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied => write!(f, "Applied"),
            Self::Lifted => write!(f, "Lifted"),
        }
    }
}

/// Record of one applied sanction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanctionRecord {
    /// Unique id of this sanction
    pub id: String,
    /// Sanctioned user
    pub user_id: u64,
    /// Guild the sanction applies in
    pub guild_id: u64,
    /// Why the sanction was applied
    pub reason: String,
    /// When the sanction was applied
    pub applied_at: DateTime<Utc>,
    /// When the lift fires
    pub lift_at: DateTime<Utc>,
    /// Current state
    pub state: SanctionState,
    /// When the lift actually happened
    pub lifted_at: Option<DateTime<Utc>>,
}

impl SanctionRecord {
    /// Create a new record in the Applied state
    #[must_use]
    pub fn new(user_id: u64, guild_id: u64, duration: Duration, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        let lift_at = now
            + ChronoDuration::seconds(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX));
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            guild_id,
            reason: reason.into(),
            applied_at: now,
            lift_at,
            state: SanctionState::Applied,
            lifted_at: None,
        }
    }

    /// Transition to Lifted
    ///
    /// # Errors
    /// Returns an error if the record is not in the Applied state
    pub fn lift(&mut self) -> WardenResult<()> {
        if self.state != SanctionState::Applied {
            return Err(WardenError::InvalidStateTransition);
        }

        self.state = SanctionState::Lifted;
        self.lifted_at = Some(Utc::now());

        info!(
            sanction_id = %self.id,
            user_id = %self.user_id,
            guild_id = %self.guild_id,
            "sanction lifted"
        );

        Ok(())
    }

    /// Whether the lift time has passed for a still-applied sanction
    #[must_use]
    pub fn is_due_for_lift(&self) -> bool {
        self.state == SanctionState::Applied && self.lift_at <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut record = SanctionRecord::new(12345, 67890, Duration::from_secs(60), "double ping");

        assert_eq!(record.state, SanctionState::Applied);
        assert!(record.lifted_at.is_none());
        assert!(!record.is_due_for_lift());

        record.lift().unwrap();
        assert_eq!(record.state, SanctionState::Lifted);
        assert!(record.lifted_at.is_some());

        // Lifting twice is a state-machine error
        assert!(record.lift().is_err());
    }

    #[test]
    fn test_due_for_lift() {
        let mut record = SanctionRecord::new(12345, 67890, Duration::from_secs(60), "double ping");
        record.lift_at = Utc::now() - ChronoDuration::seconds(1);
        assert!(record.is_due_for_lift());

        record.lift().unwrap();
        assert!(!record.is_due_for_lift());
    }

    #[test]
    fn test_lift_time_matches_duration() {
        let record = SanctionRecord::new(1, 2, Duration::from_secs(60), "r");
        let span = record.lift_at - record.applied_at;
        assert_eq!(span.num_seconds(), 60);
    }
}
