pub mod commands;
pub mod data;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod sanction;

// Customize these constants for your bot
pub const BOT_NAME: &str = "ping_warden";
pub const COMMAND_TARGET: &str = "ping_warden::command";
pub const ERROR_TARGET: &str = "ping_warden::error";
pub const EVENT_TARGET: &str = "ping_warden::handlers";
pub const CONSOLE_TARGET: &str = "ping_warden";

pub use data::{Data, DataInner, WardenConfig};
pub use engine::{Action, CommandEvent, MessageEvent, TrackerStore};
pub use error::{WardenError, WardenResult};
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
