use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock};

use herald_core::{CommandSet, Owners, Router, reconcile};
use serenity::all::{
    Cache, Colour, Context, CreateEmbed, CurrentApplicationInfo, EventHandler, GatewayIntents,
    Interaction, Ready,
};
use serenity::{Client, async_trait};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::config::{BotConfig, ShardInfo, resolve_token};
use crate::error::{ConfigError, DiscordError, Result};
use crate::event::DiscordEvent;
use crate::handlers::BotCommand;
use crate::registry::SerenityRegistry;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How the bot presents itself and connects.
#[derive(Debug, Clone)]
pub struct BotOptions {
    pub name: String,
    pub colour: Colour,
    /// Defaults to the guilds intent only.
    pub intents: GatewayIntents,
}

impl BotOptions {
    pub fn new(name: impl Into<String>, colour: Colour) -> Self {
        Self {
            name: name.into(),
            colour,
            intents: GatewayIntents::GUILDS,
        }
    }

    pub fn with_intents(mut self, intents: GatewayIntents) -> Self {
        self.intents = intents;
        self
    }

    pub fn from_config(config: &BotConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(config.name.clone(), config.colour()?).with_intents(config.intents()?))
    }
}

/// Shared state handed to every handler.
pub struct BotContext {
    pub name: String,
    pub colour: Colour,
    pub version: &'static str,
    pub owners: Owners,
    pub shard: Option<ShardInfo>,
    cache: Arc<Cache>,
}

impl BotContext {
    pub fn is_sharding(&self) -> bool {
        self.shard.is_some()
    }

    pub fn shard_id(&self) -> Option<u32> {
        self.shard.map(|shard| shard.id)
    }

    pub fn shard_count(&self) -> u32 {
        self.shard.map_or(1, |shard| shard.count)
    }

    /// An embed in the bot's colour.
    pub fn embed(&self) -> CreateEmbed {
        CreateEmbed::new().colour(self.colour)
    }

    /// Guilds visible to this process.
    pub fn guild_count(&self) -> usize {
        self.cache.guild_count()
    }

    /// Members across the guilds visible to this process.
    pub fn member_count(&self) -> u64 {
        self.cache
            .guilds()
            .into_iter()
            .filter_map(|id| self.cache.guild(id).map(|guild| guild.member_count))
            .sum()
    }
}

impl std::fmt::Debug for BotContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotContext")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("owners", &self.owners.len())
            .field("shard", &self.shard)
            .finish()
    }
}

/// Owners from application info: the team's members, else the owner.
pub fn owners_of(info: &CurrentApplicationInfo) -> std::result::Result<Owners, ConfigError> {
    let team = info.team.as_ref().map(|team| {
        team.members
            .iter()
            .map(|member| member.user.id.get())
            .collect::<Vec<_>>()
    });
    derive_owners(info.owner.as_ref().map(|owner| owner.id.get()), team)
}

fn derive_owners(
    owner: Option<u64>,
    team: Option<Vec<u64>>,
) -> std::result::Result<Owners, ConfigError> {
    match (team, owner) {
        (Some(members), _) => Ok(Owners::team(members)),
        (None, Some(owner)) => Ok(Owners::single(owner)),
        (None, None) => Err(ConfigError::MissingApplication),
    }
}

/// A bot with its command set, ready to connect.
pub struct Bot {
    options: BotOptions,
    commands: CommandSet<Arc<BotContext>, DiscordEvent>,
}

impl Bot {
    pub fn new(options: BotOptions) -> Self {
        Self {
            options,
            commands: CommandSet::new(),
        }
    }

    pub fn register_commands(mut self, commands: impl IntoIterator<Item = BotCommand>) -> Self {
        self.commands.register(commands);
        self
    }

    pub fn options(&self) -> &BotOptions {
        &self.options
    }

    /// Connects and runs until the gateway stops.
    ///
    /// Commands are reconciled and the router installed once the first
    /// shard is ready; interactions arriving before that are dropped. If
    /// that setup fails, every shard is shut down and the error returned.
    pub async fn init(self, token: Option<String>) -> Result<()> {
        info!("Initializing {}", self.options.name);
        let token = resolve_token(token)?;
        let shard = ShardInfo::from_env()?;
        let (startup, failed) = Startup::new();

        let handler = HeraldHandler {
            options: self.options.clone(),
            commands: Arc::new(self.commands),
            shard,
            state: OnceLock::new(),
            startup,
        };

        let mut client = Client::builder(&token, self.options.intents)
            .event_handler(handler)
            .await
            .map_err(|cause| DiscordError::ClientBuildFailed { cause })?;

        let shard_manager = client.shard_manager.clone();
        let connection = async {
            let started = match shard {
                Some(shard) => {
                    info!("Starting shard {} of {}", shard.id, shard.count);
                    client.start_shard(shard.id, shard.count).await
                }
                None => client.start().await,
            };
            started.map_err(|cause| DiscordError::GatewayFailed { cause })
        };
        let shutdown = async move { shard_manager.shutdown_all().await };

        supervise(connection, failed, shutdown).await
    }
}

/// Carries the outcome of the first ready event back to [`Bot::init`].
struct Startup {
    failed: Mutex<Option<oneshot::Sender<DiscordError>>>,
}

impl Startup {
    fn new() -> (Self, oneshot::Receiver<DiscordError>) {
        let (tx, rx) = oneshot::channel();
        let startup = Self {
            failed: Mutex::new(Some(tx)),
        };
        (startup, rx)
    }

    /// Reports `outcome` once. Success releases the sender so the
    /// connection runs on unsupervised. Returns whether this call reported.
    fn finish(&self, outcome: Result<()>) -> bool {
        let Some(tx) = self.failed.lock().ok().and_then(|mut slot| slot.take()) else {
            return false;
        };
        if let Err(e) = outcome {
            if let Err(e) = tx.send(e) {
                error!("Startup failed after the client stopped: {:?}", e);
            }
        }
        true
    }
}

/// Runs `connection` until it ends or startup reports a failure, in which
/// case `shutdown` runs and the failure is returned.
async fn supervise<F, S>(
    connection: F,
    failed: oneshot::Receiver<DiscordError>,
    shutdown: S,
) -> Result<()>
where
    F: Future<Output = Result<()>>,
    S: Future<Output = ()>,
{
    tokio::select! {
        result = connection => result,
        Ok(failure) = failed => {
            error!("Shutting down: {}", failure);
            shutdown.await;
            Err(failure)
        }
    }
}

struct HeraldHandler {
    options: BotOptions,
    commands: Arc<CommandSet<Arc<BotContext>, DiscordEvent>>,
    shard: Option<ShardInfo>,
    state: OnceLock<(Arc<BotContext>, Router<Arc<BotContext>, DiscordEvent>)>,
    startup: Startup,
}

impl HeraldHandler {
    async fn install(&self, ctx: &Context, ready: &Ready) -> Result<()> {
        ctx.http.set_application_id(ready.application.id);
        let info = ctx
            .http
            .get_current_application_info()
            .await
            .map_err(|cause| DiscordError::ApplicationInfoFailed { cause })?;
        let owners = owners_of(&info)?;
        debug!("Loaded {} owner(s)", owners.len());

        let registry = SerenityRegistry::new(ctx.http.clone());
        let guilds: Vec<u64> = ready.guilds.iter().map(|guild| guild.id.get()).collect();
        let report = reconcile(&registry, self.commands.as_ref(), &guilds).await;
        let failures = report.failures().count();
        if failures > 0 {
            warn!("Command registration finished with {} failure(s)", failures);
        }

        let bot = Arc::new(BotContext {
            name: self.options.name.clone(),
            colour: self.options.colour,
            version: VERSION,
            owners: owners.clone(),
            shard: self.shard,
            cache: ctx.cache.clone(),
        });
        let router = Router::new(self.commands.clone(), owners);
        if self.state.set((bot, router)).is_err() {
            debug!("Router was installed concurrently");
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for HeraldHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        if self.state.get().is_some() {
            debug!("Resumed as {}", ready.user.tag());
            return;
        }

        let outcome = self.install(&ctx, &ready).await;
        match &outcome {
            Ok(()) => info!(
                "Logged in as {}! (colour {})",
                ready.user.tag(),
                self.options.colour.hex()
            ),
            Err(e) => error!("Failed to initialize {}: {:?}", self.options.name, e),
        }
        self.startup.finish(outcome);
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Some((bot, router)) = self.state.get() else {
            warn!("Interaction received before the bot was ready");
            return;
        };
        let Some(event) = DiscordEvent::new(ctx, interaction) else {
            debug!("Ignoring unsupported interaction");
            return;
        };
        router.dispatch(bot.clone(), event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_single_owner() {
        let owners = derive_owners(Some(7), None).unwrap();
        assert!(owners.contains(7));
        assert_eq!(owners.len(), 1);
    }

    #[test]
    fn test_team_members_are_owners() {
        let owners = derive_owners(Some(7), Some(vec![7, 8])).unwrap();
        assert!(owners.contains(8));
        assert_eq!(owners.len(), 2);
    }

    #[test]
    fn test_missing_owner() {
        assert!(matches!(
            derive_owners(None, None),
            Err(ConfigError::MissingApplication)
        ));
    }

    #[tokio::test]
    async fn test_startup_failure_shuts_down() {
        let (startup, failed) = Startup::new();
        let stopped = Arc::new(AtomicBool::new(false));

        assert!(startup.finish(Err(ConfigError::MissingApplication.into())));
        let result = supervise(
            std::future::pending::<Result<()>>(),
            failed,
            {
                let stopped = stopped.clone();
                async move { stopped.store(true, Ordering::SeqCst) }
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(DiscordError::Config(ConfigError::MissingApplication))
        ));
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_successful_startup_leaves_connection_running() {
        let (startup, failed) = Startup::new();
        let stopped = Arc::new(AtomicBool::new(false));

        assert!(startup.finish(Ok(())));
        assert!(!startup.finish(Err(ConfigError::MissingApplication.into())));
        let result = supervise(
            async {
                tokio::task::yield_now().await;
                Ok(())
            },
            failed,
            {
                let stopped = stopped.clone();
                async move { stopped.store(true, Ordering::SeqCst) }
            },
        )
        .await;

        assert!(result.is_ok());
        assert!(!stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_embed_uses_bot_colour() {
        let bot = BotContext {
            name: "Herald".to_string(),
            colour: Colour::new(0xe91e63),
            version: VERSION,
            owners: Owners::single(1),
            shard: None,
            cache: Arc::new(Cache::new()),
        };
        let embed = serde_json::to_value(bot.embed()).unwrap();
        assert_eq!(embed["color"], serde_json::json!(0xe91e63));
    }

    #[test]
    fn test_options_from_config() {
        let options = BotOptions::from_config(&BotConfig::default()).unwrap();
        assert_eq!(options.name, "Herald");
        assert_eq!(options.intents, GatewayIntents::GUILDS);
    }
}
