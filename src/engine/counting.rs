//! Counting-game engine
//!
//! One shared counter per guild, played in a single configured channel.
//! Posting the next expected number advances the count; the engine then
//! counts the following number back on the guild's behalf, so the count
//! advances by two per successful human turn. That doubling is the game
//! rule, not an accident.
//!
//! A wrong number is a miss: the author gets a short cooldown, the count
//! resets, and a countdown sequence runs in the channel. Non-numeric
//! chatter is ignored entirely and never resets the count.

use crate::engine::{Action, MessageEvent, TrackerStore};
use std::time::Duration;
use tracing::info;

/// Suppression window applied to an author after a miss
pub const MISS_COOLDOWN: Duration = Duration::from_secs(10);

/// Starting value of the miss countdown sequence
pub const COUNTDOWN_START: u8 = 10;

/// Configure (or move) the counting channel for a guild. Always resets the
/// count to 0 and clears every cooldown, even mid-game.
pub fn configure_channel(store: &TrackerStore, guild_id: u64, channel_id: u64) {
    info!(guild_id, channel_id, "counting channel configured");
    store.set_counting_channel(guild_id, channel_id);
}

/// The tick values a countdown displays, in order
#[must_use]
pub fn countdown_ticks(from: u8) -> Vec<u8> {
    (1..=from).rev().collect()
}

/// Run one message through the counting game.
///
/// Only activates for the configured channel. A cooled-down author is
/// ignored in complete silence, cooldown and count untouched.
pub fn handle_message(store: &TrackerStore, event: &MessageEvent) -> Vec<Action> {
    if event.author_is_bot {
        return Vec::new();
    }

    let Some(mut session) = store.counting_session_mut(event.guild_id) else {
        return Vec::new();
    };
    if session.channel_id != event.channel_id {
        return Vec::new();
    }

    match session.cooldown_until.get(&event.author_id) {
        Some(&until) if event.now < until => return Vec::new(),
        Some(_) => {
            session.cooldown_until.remove(&event.author_id);
        }
        None => {}
    }

    // Non-numeric chatter is not a miss
    let Ok(number) = event.body.trim().parse::<i64>() else {
        return Vec::new();
    };

    let expected = session.current_count + 1;
    if number != expected as i64 {
        info!(
            guild_id = event.guild_id,
            author_id = event.author_id,
            got = number,
            expected,
            "counting miss, resetting count"
        );
        session
            .cooldown_until
            .insert(event.author_id, event.now + MISS_COOLDOWN);
        session.current_count = 0;
        return vec![Action::Countdown {
            channel_id: event.channel_id,
            from: COUNTDOWN_START,
        }];
    }

    // Count the next number back on the guild's behalf
    session.current_count = expected + 1;
    vec![Action::Notify {
        channel_id: event.channel_id,
        text: (expected + 1).to_string(),
    }]
}
