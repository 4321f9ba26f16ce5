use herald_core::InteractionKind;
use miette::Diagnostic;
use thiserror::Error;

/// Problems with the bot's configuration, found before connecting.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Token is not defined")]
    #[diagnostic(
        code(herald::config::missing_token),
        help("Pass a token explicitly or set TOKEN in the environment or a .env file")
    )]
    MissingToken,

    #[error("Application owner is not defined")]
    #[diagnostic(
        code(herald::config::missing_application),
        help("The application info returned neither an owner nor a team")
    )]
    MissingApplication,

    #[error("Invalid colour '{value}'")]
    #[diagnostic(
        code(herald::config::invalid_colour),
        help("Use a hex colour such as \"#e91e63\" or \"e91e63\"")
    )]
    InvalidColour { value: String },

    #[error("Unknown gateway intent '{name}'")]
    #[diagnostic(
        code(herald::config::unknown_intent),
        help("Intent names are upper case, e.g. GUILDS or GUILD_MESSAGES")
    )]
    UnknownIntent { name: String },

    #[error("Invalid shard setting {variable}={value}")]
    #[diagnostic(
        code(herald::config::invalid_shard),
        help("{expected}")
    )]
    InvalidShard {
        variable: &'static str,
        value: String,
        expected: String,
    },

    #[error("Failed to read config file {path}")]
    #[diagnostic(code(herald::config::read_failed))]
    ReadFailed {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("Failed to parse config file {path}")]
    #[diagnostic(
        code(herald::config::parse_failed),
        help("Expected a TOML file with `name`, `colour` and `intents` keys")
    )]
    ParseFailed {
        path: String,
        #[source]
        cause: toml::de::Error,
    },
}

#[derive(Error, Diagnostic, Debug)]
pub enum DiscordError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build the Discord client")]
    #[diagnostic(
        code(herald::discord::client_build_failed),
        help("Check that your Discord bot token is valid and has not been regenerated")
    )]
    ClientBuildFailed {
        #[source]
        cause: serenity::Error,
    },

    #[error("Gateway connection failed")]
    #[diagnostic(
        code(herald::discord::gateway_failed),
        help("The client stopped with an error; check the enabled intents in the Developer Portal")
    )]
    GatewayFailed {
        #[source]
        cause: serenity::Error,
    },

    #[error("Failed to fetch application info")]
    #[diagnostic(code(herald::discord::application_info_failed))]
    ApplicationInfoFailed {
        #[source]
        cause: serenity::Error,
    },

    #[error("Failed to fetch the recommended shard count")]
    #[diagnostic(
        code(herald::discord::gateway_info_failed),
        help("Pass an explicit shard count to skip the gateway lookup")
    )]
    GatewayInfoFailed {
        #[source]
        cause: serenity::Error,
    },

    #[error("Failed to launch shard {shard}")]
    #[diagnostic(code(herald::discord::shard_spawn_failed))]
    ShardSpawnFailed {
        shard: u32,
        #[source]
        cause: std::io::Error,
    },

    #[error("Shard {shard} exited with {status}")]
    #[diagnostic(
        code(herald::discord::shard_exited),
        help("See the worker's own log output for the cause")
    )]
    ShardExited { shard: u32, status: String },

    #[error("Handler for {expected} received a different interaction")]
    #[diagnostic(code(herald::discord::interaction_mismatch))]
    InteractionMismatch { expected: InteractionKind },
}

pub type Result<T> = std::result::Result<T, DiscordError>;
