mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use herald_discord::{Bot, BotConfig, BotOptions, ShardLauncher};
use miette::{IntoDiagnostic, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "herald")]
#[command(about = "Herald demo bot and shard launcher")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo bot with the test command set
    Run {
        /// Bot config file (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Bot token (defaults to TOKEN from the environment)
        #[arg(long)]
        token: Option<String>,
    },
    /// Launch one `herald run` worker process per shard
    Shard {
        /// Number of shards (defaults to the gateway's recommendation)
        #[arg(long)]
        shards: Option<u32>,

        /// Bot config file passed on to every worker
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Bot token (defaults to TOKEN from the environment)
        #[arg(long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.debug);

    match cli.command {
        Commands::Run { config, token } => run(config, token).await,
        Commands::Shard {
            shards,
            config,
            token,
        } => shard(shards, config, token).await,
    }
}

async fn run(config: Option<PathBuf>, token: Option<String>) -> Result<()> {
    let config = match config {
        Some(path) => BotConfig::load(&path).await?,
        None => BotConfig::default(),
    };
    let options = BotOptions::from_config(&config)?;

    let commands = commands::demo()?;
    info!("Registering {} commands", commands.len());

    Bot::new(options)
        .register_commands(commands)
        .init(token)
        .await?;
    Ok(())
}

async fn shard(shards: Option<u32>, config: Option<PathBuf>, token: Option<String>) -> Result<()> {
    let program = std::env::current_exe().into_diagnostic()?;
    let mut args = vec!["run".into()];
    if let Some(config) = config {
        args.push("--config".into());
        args.push(config.into_os_string());
    }

    let mut launcher = ShardLauncher::new(program, args, token)?;
    if let Some(count) = shards {
        launcher = launcher.shards(count);
    }
    launcher.launch().await?;
    Ok(())
}

/// Herald's crates at `level`, serenity at warnings only.
fn crate_targets(level: LevelFilter) -> Targets {
    Targets::new()
        .with_target("herald_cli", level)
        .with_target("herald_core", level)
        .with_target("herald_discord", level)
        .with_target("serenity", LevelFilter::WARN)
}

/// The console follows `RUST_LOG` when it is set; the daily file in
/// `logs/` always records [`crate_targets`] at the `--debug` level.
fn init_logging(debug: bool) -> WorkerGuard {
    let level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let targets = crate_targets(level);

    if let Err(e) = std::fs::create_dir_all("logs") {
        eprintln!("Cannot create logs directory: {e}");
    }
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily("logs", "herald.log"));

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(targets.to_string()));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_line_number(true)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_filter(targets),
        )
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_debug_flag_raises_crate_level() {
        let quiet = crate_targets(LevelFilter::INFO);
        assert!(quiet.would_enable("herald_core", &Level::INFO));
        assert!(!quiet.would_enable("herald_discord::bot", &Level::DEBUG));

        let verbose = crate_targets(LevelFilter::DEBUG);
        assert!(verbose.would_enable("herald_discord::bot", &Level::DEBUG));
        assert!(!verbose.would_enable("serenity::gateway", &Level::INFO));
    }
}
