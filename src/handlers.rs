//! Gateway event handlers
//!
//! Every guild message flows through the ping-protection engine and then
//! the counting engine; the accumulated actions are dispatched in order.

use crate::data::Data;
use crate::dispatcher::Dispatcher;
use crate::engine::{MessageEvent, counting, ping};
use crate::error::WardenError;
use crate::EVENT_TARGET;
use poise::serenity_prelude::{
    self as serenity, ChannelId, Context, EventHandler, GuildId, Message, Ready,
};
use std::time::Instant;
use tracing::{error, info, warn};

pub struct Handler;

#[serenity::async_trait]
impl EventHandler for Handler {
    /// Called when the bot is ready, but the cache may not be fully populated yet.
    async fn ready(&self, ctx: Context, ready: Ready) {
        let user_name = ready.user.name.clone();
        let shard_id = ctx.shard_id;
        info!("Connected as {user_name}, shard {shard_id}");
    }

    /// Called when the cache is fully populated.
    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        let guild_count_cache = ctx.cache.guild_count();
        let guild_count = guilds.len();
        if guild_count != guild_count_cache {
            warn!(
                "Cache guild count mismatch: {guild_count_cache} (cache) vs {guild_count} (actual)"
            );
        }
        info!("Cache ready! The bot is in {guild_count} guild(s)");
    }

    async fn message(&self, ctx: Context, message: Message) {
        let Some(guild_id) = message.guild_id else {
            return;
        };
        if message.author.bot {
            return;
        }

        let Some(data) = ctx.data.read().await.get::<Data>().cloned() else {
            error!(target: EVENT_TARGET, "bot data not registered, dropping message event");
            return;
        };

        let event = MessageEvent {
            guild_id: guild_id.get(),
            channel_id: message.channel_id.get(),
            author_id: message.author.id.get(),
            author_is_bot: message.author.bot,
            body: message.content.clone(),
            mentioned_user_ids: message.mentions.iter().map(|user| user.id.get()).collect(),
            mentioned_role_ids: message.mention_roles.iter().map(|role| role.get()).collect(),
            now: Instant::now(),
        };

        let mut actions = ping::handle_message(&data.tracker, &event);
        actions.extend(counting::handle_message(&data.tracker, &event));
        if actions.is_empty() {
            return;
        }

        let dispatcher = Dispatcher::new(ctx.http.clone(), data.sanctions.clone());
        match dispatcher.dispatch(event.guild_id, actions).await {
            Ok(()) => {}
            Err(WardenError::PlatformForbidden) => {
                // Report to the channel the event came from and abandon
                let notice = ChannelId::new(event.channel_id)
                    .say(&ctx.http, "I don't have permission to do that.")
                    .await;
                if let Err(e) = notice {
                    warn!(target: EVENT_TARGET, error = %e, "could not report missing permission");
                }
            }
            Err(e) => {
                error!(target: EVENT_TARGET, error = %e, "failed to dispatch message actions");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // This test verifies at compile time that Handler implements EventHandler
    #[test]
    fn test_handler_implements_event_handler() {
        fn assert_impl<T: EventHandler>() {}
        assert_impl::<Handler>();
    }
}
