//! Sanction service
//!
//! Applies timeouts against Discord and schedules their lifts. Each apply
//! spawns a one-shot task that sleeps for the sanction duration and then
//! lifts unconditionally; there is no cancellation path.

use crate::error::{WardenError, WardenResult};
use crate::sanction::{SanctionRecord, SanctionStore};
use poise::serenity_prelude::{GuildId, Http, UserId};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Service for applying and lifting sanctions
#[derive(Debug, Clone, Default)]
pub struct SanctionService {
    /// Store for sanction records
    pub store: SanctionStore,
}

impl SanctionService {
    /// Create a new sanction service
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a timeout to a user and schedule its lift.
    ///
    /// # Errors
    /// Returns `PlatformForbidden` if Discord rejects the timeout for lack
    /// of privilege, or a generic API error otherwise. On failure no record
    /// is kept and no lift is scheduled.
    pub async fn apply(
        &self,
        http: &Arc<Http>,
        guild_id: u64,
        user_id: u64,
        duration: Duration,
        reason: impl Into<String>,
    ) -> WardenResult<SanctionRecord> {
        let record = SanctionRecord::new(user_id, guild_id, duration, reason);

        let mut member = GuildId::new(guild_id)
            .member(http, UserId::new(user_id))
            .await
            .map_err(WardenError::from_platform)?;
        member
            .disable_communication_until_datetime(http, record.lift_at.into())
            .await
            .map_err(WardenError::from_platform)?;

        info!(
            sanction_id = %record.id,
            user_id,
            guild_id,
            duration_secs = duration.as_secs(),
            "sanction applied"
        );

        self.store.add(record.clone());

        let store = self.store.clone();
        let http = Arc::clone(http);
        let id = record.id.clone();
        schedule(duration, async move {
            if let Err(e) = Self::lift(&http, guild_id, user_id).await {
                warn!(sanction_id = %id, error = %e, "scheduled lift failed");
            }
            if let Err(e) = store.mark_lifted(&id) {
                warn!(sanction_id = %id, error = %e, "could not mark sanction lifted");
            }
        });

        Ok(record)
    }

    /// Lift a timeout. Idempotent at the platform boundary: lifting a user
    /// with no active timeout succeeds.
    ///
    /// # Errors
    /// Returns an error only if the Discord API call itself fails.
    pub async fn lift(http: &Arc<Http>, guild_id: u64, user_id: u64) -> WardenResult<()> {
        let mut member = GuildId::new(guild_id)
            .member(http, UserId::new(user_id))
            .await
            .map_err(WardenError::from_platform)?;
        member
            .enable_communication(http)
            .await
            .map_err(WardenError::from_platform)?;

        info!(user_id, guild_id, "sanction lifted on platform");
        Ok(())
    }
}

/// Run a task once after a fixed delay
pub(crate) fn schedule<F>(delay: Duration, task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        task.await;
    });
}
