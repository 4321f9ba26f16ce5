//! Herald Discord - serenity adapter and bot lifecycle
//!
//! Connects the platform-agnostic command tree from `herald-core` to a
//! live Discord gateway: interactions are wrapped as [`DiscordEvent`]s and
//! routed, commands are reconciled through [`SerenityRegistry`], and
//! [`ShardLauncher`] runs one worker process per shard.

pub mod bot;
pub mod builtin;
pub mod config;
pub mod error;
pub mod event;
pub mod handlers;
pub mod registry;
pub mod shard;

pub use bot::{Bot, BotContext, BotOptions, VERSION};
pub use config::{BotConfig, ShardInfo, resolve_token};
pub use error::{ConfigError, DiscordError, Result};
pub use event::DiscordEvent;
pub use handlers::{BotCommand, TypedHandlers};
pub use registry::SerenityRegistry;
pub use shard::ShardLauncher;

// Re-export serenity so bots build responses against the same version.
pub use serenity;
