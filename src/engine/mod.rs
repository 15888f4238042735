//! Stateful event-reaction core
//!
//! Each rule engine consumes one inbound event plus the shared tracker
//! store and produces zero or more actions for the dispatcher to apply.
//! Nothing in this module touches Discord.

mod action;
mod event;
mod store;

pub mod counting;
pub mod moderation;
pub mod permission;
pub mod ping;

pub use action::Action;
pub use event::{CommandEvent, MessageEvent};
pub use store::{CountingSession, TrackerStore};
