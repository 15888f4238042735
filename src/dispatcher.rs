//! Action dispatcher
//!
//! Applies the actions emitted by the rule engines against Discord, in
//! emission order. Sanctions go through the sanction service so their lifts
//! get scheduled; countdown sequences run as independent spawned tasks so a
//! ten second countdown in one guild never stalls another guild's events.

use crate::engine::counting::countdown_ticks;
use crate::engine::Action;
use crate::error::{WardenError, WardenResult};
use crate::sanction::SanctionService;
use poise::serenity_prelude::{ChannelId, EditMessage, GuildId, Http, UserId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Seconds between countdown ticks
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Applies engine actions against the chat platform
#[derive(Clone)]
pub struct Dispatcher {
    http: Arc<Http>,
    sanctions: SanctionService,
}

impl Dispatcher {
    /// Create a dispatcher over an HTTP client and sanction service
    #[must_use]
    pub fn new(http: Arc<Http>, sanctions: SanctionService) -> Self {
        Self { http, sanctions }
    }

    /// Apply a batch of actions in order, stopping at the first failure.
    ///
    /// # Errors
    /// Returns `PlatformForbidden` when Discord rejects a sanction or ban
    /// for lack of privilege; the remaining actions are abandoned, never
    /// retried. Best-effort direct messages never fail the batch.
    pub async fn dispatch(&self, guild_id: u64, actions: Vec<Action>) -> WardenResult<()> {
        for action in actions {
            debug!(guild_id, %action, "dispatching action");
            self.apply(guild_id, action).await?;
        }
        Ok(())
    }

    async fn apply(&self, guild_id: u64, action: Action) -> WardenResult<()> {
        match action {
            Action::Notify { channel_id, text } => {
                ChannelId::new(channel_id)
                    .say(&self.http, text)
                    .await
                    .map_err(WardenError::from_platform)?;
            }
            Action::NotifyEphemeral { .. } => {
                // Ephemeral replies only exist inside a command invocation;
                // command handlers send them through their own context.
                warn!(guild_id, "ephemeral notification outside a command context, dropped");
            }
            Action::ApplySanction {
                user_id,
                duration,
                reason,
            } => {
                self.sanctions
                    .apply(&self.http, guild_id, user_id, duration, reason)
                    .await?;
            }
            Action::LiftSanction { user_id } => {
                SanctionService::lift(&self.http, guild_id, user_id).await?;
            }
            Action::ApplyPermanentBan { user_id, reason } => {
                GuildId::new(guild_id)
                    .ban_with_reason(&self.http, UserId::new(user_id), 0, &reason)
                    .await
                    .map_err(WardenError::from_platform)?;
                info!(guild_id, user_id, "user banned");
            }
            Action::LiftBan { user_id } => {
                GuildId::new(guild_id)
                    .unban(&self.http, UserId::new(user_id))
                    .await
                    .map_err(WardenError::from_platform)?;
                info!(guild_id, user_id, "user unbanned");
            }
            Action::DirectMessage { user_id, text } => {
                // Best effort: delivery failure is swallowed and never
                // blocks the actions around it.
                if let Err(e) = self.direct_message(user_id, text).await {
                    warn!(user_id, error = %e, "direct message not delivered");
                }
            }
            Action::Countdown { channel_id, from } => {
                self.spawn_countdown(channel_id, from);
            }
        }
        Ok(())
    }

    async fn direct_message(&self, user_id: u64, text: String) -> WardenResult<()> {
        let channel = UserId::new(user_id)
            .create_dm_channel(&self.http)
            .await
            .map_err(WardenError::from_platform)?;
        channel
            .id
            .say(&self.http, text)
            .await
            .map_err(WardenError::from_platform)?;
        Ok(())
    }

    /// Start a countdown sequence as its own task. The task owns only the
    /// message it posts and the channel id it captured; it holds no lock
    /// across its ticks.
    fn spawn_countdown(&self, channel_id: u64, from: u8) {
        let http = Arc::clone(&self.http);
        tokio::spawn(async move {
            if let Err(e) = run_countdown(&http, channel_id, from).await {
                warn!(channel_id, error = %e, "countdown sequence failed");
            }
        });
    }
}

/// Post a countdown message, edit it once per second down to 1, then
/// delete it.
async fn run_countdown(http: &Arc<Http>, channel_id: u64, from: u8) -> WardenResult<()> {
    let channel = ChannelId::new(channel_id);
    let ticks = countdown_ticks(from);
    let Some((&first, rest)) = ticks.split_first() else {
        return Ok(());
    };

    let message = channel
        .say(http, first.to_string())
        .await
        .map_err(WardenError::from_platform)?;

    for &tick in rest {
        tokio::time::sleep(TICK_INTERVAL).await;
        channel
            .edit_message(
                http,
                message.id,
                EditMessage::new().content(tick.to_string()),
            )
            .await
            .map_err(WardenError::from_platform)?;
    }

    tokio::time::sleep(TICK_INTERVAL).await;
    channel
        .delete_message(http, message.id)
        .await
        .map_err(WardenError::from_platform)?;

    debug!(channel_id, "countdown sequence complete");
    Ok(())
}
