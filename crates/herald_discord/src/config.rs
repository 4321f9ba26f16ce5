use std::path::Path;

use serde::{Deserialize, Serialize};
use serenity::all::{Colour, GatewayIntents};

use crate::error::ConfigError;

/// Environment variable holding the bot token.
pub const TOKEN_VAR: &str = "TOKEN";
/// Environment variables a launcher sets for each worker process.
pub const SHARD_ID_VAR: &str = "HERALD_SHARD_ID";
pub const SHARD_COUNT_VAR: &str = "HERALD_SHARD_COUNT";

const DEFAULT_COLOUR: &str = "#e91e63";

/// Bot settings loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub name: String,
    /// Hex colour, with or without a leading `#`.
    pub colour: String,
    /// Gateway intent names, e.g. `GUILDS`.
    pub intents: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "Herald".to_string(),
            colour: DEFAULT_COLOUR.to_string(),
            intents: vec!["GUILDS".to_string()],
        }
    }
}

impl BotConfig {
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|cause| ConfigError::ReadFailed {
                    path: path.display().to_string(),
                    cause,
                })?;
        Self::parse(&path.display().to_string(), &content)
    }

    pub fn parse(path: &str, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|cause| ConfigError::ParseFailed {
            path: path.to_string(),
            cause,
        })
    }

    pub fn colour(&self) -> Result<Colour, ConfigError> {
        parse_colour(&self.colour)
    }

    pub fn intents(&self) -> Result<GatewayIntents, ConfigError> {
        self.intents
            .iter()
            .try_fold(GatewayIntents::empty(), |intents, name| {
                GatewayIntents::from_name(name.trim())
                    .map(|intent| intents | intent)
                    .ok_or_else(|| ConfigError::UnknownIntent { name: name.clone() })
            })
    }
}

pub fn parse_colour(value: &str) -> Result<Colour, ConfigError> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return Err(ConfigError::InvalidColour {
            value: value.to_string(),
        });
    }
    u32::from_str_radix(hex, 16)
        .map(Colour::new)
        .map_err(|_| ConfigError::InvalidColour {
            value: value.to_string(),
        })
}

/// The explicit token if given, otherwise `TOKEN` from the environment
/// after loading `.env`.
pub fn resolve_token(explicit: Option<String>) -> Result<String, ConfigError> {
    dotenvy::dotenv().ok();
    pick_token(explicit, std::env::var(TOKEN_VAR).ok())
}

fn pick_token(explicit: Option<String>, from_env: Option<String>) -> Result<String, ConfigError> {
    explicit
        .or(from_env)
        .filter(|token| !token.trim().is_empty())
        .ok_or(ConfigError::MissingToken)
}

/// Which shard this process runs, when launched as a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardInfo {
    pub id: u32,
    pub count: u32,
}

impl ShardInfo {
    /// Reads the worker variables; `None` when neither is set.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::parse(
            std::env::var(SHARD_ID_VAR).ok(),
            std::env::var(SHARD_COUNT_VAR).ok(),
        )
    }

    fn parse(id: Option<String>, count: Option<String>) -> Result<Option<Self>, ConfigError> {
        let (id, count) = match (id, count) {
            (None, None) => return Ok(None),
            (Some(id), Some(count)) => (id, count),
            (None, Some(count)) => {
                return Err(ConfigError::InvalidShard {
                    variable: SHARD_COUNT_VAR,
                    value: count,
                    expected: format!("{} must be set as well", SHARD_ID_VAR),
                });
            }
            (Some(id), None) => {
                return Err(ConfigError::InvalidShard {
                    variable: SHARD_ID_VAR,
                    value: id,
                    expected: format!("{} must be set as well", SHARD_COUNT_VAR),
                });
            }
        };

        let count: u32 = match count.trim().parse() {
            Ok(count) if count > 0 => count,
            _ => {
                return Err(ConfigError::InvalidShard {
                    variable: SHARD_COUNT_VAR,
                    value: count,
                    expected: "a positive integer".to_string(),
                });
            }
        };
        let id: u32 = match id.trim().parse() {
            Ok(id) if id < count => id,
            _ => {
                return Err(ConfigError::InvalidShard {
                    variable: SHARD_ID_VAR,
                    value: id,
                    expected: format!("an integer below the shard count {}", count),
                });
            }
        };

        Ok(Some(Self { id, count }))
    }
}
