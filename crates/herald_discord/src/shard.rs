use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitStatus;

use futures::future::join_all;
use serenity::all::Http;
use tokio::process::{Child, Command};
use tracing::{error, info};

use crate::config::{SHARD_COUNT_VAR, SHARD_ID_VAR, TOKEN_VAR, resolve_token};
use crate::error::{DiscordError, Result};

/// Runs one worker process per shard and waits for all of them.
///
/// Each worker gets the token and its shard id/count through the
/// environment; see [`crate::config::ShardInfo::from_env`].
#[derive(Debug, Clone)]
pub struct ShardLauncher {
    program: PathBuf,
    args: Vec<OsString>,
    token: String,
    shards: Option<u32>,
}

impl ShardLauncher {
    /// Launches `program` with `args` for every shard.
    pub fn new(
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
        token: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            token: resolve_token(token)?,
            shards: None,
        })
    }

    /// Uses a fixed shard count instead of the gateway's recommendation.
    pub fn shards(mut self, count: u32) -> Self {
        self.shards = Some(count.max(1));
        self
    }

    pub async fn launch(self) -> Result<()> {
        let count = match self.shards {
            Some(count) => count,
            None => self.recommended_shards().await?,
        };

        let mut workers = Vec::with_capacity(count as usize);
        for id in 0..count {
            workers.push((id, self.spawn(id, count)?));
            info!("Launched shard {}", id);
        }

        let results = join_all(
            workers
                .into_iter()
                .map(|(id, mut child)| async move { (id, child.wait().await) }),
        )
        .await;

        let mut first_failure = None;
        for (id, result) in results {
            let failure = match result {
                Ok(status) if status.success() => {
                    info!("Shard {} exited", id);
                    continue;
                }
                Ok(status) => exit_failure(id, status),
                Err(cause) => DiscordError::ShardSpawnFailed { shard: id, cause },
            };
            error!("{}", failure);
            first_failure.get_or_insert(failure);
        }

        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    async fn recommended_shards(&self) -> Result<u32> {
        let gateway = Http::new(&self.token)
            .get_bot_gateway()
            .await
            .map_err(|cause| DiscordError::GatewayInfoFailed { cause })?;
        info!("Gateway recommends {} shard(s)", gateway.shards);
        Ok(gateway.shards.max(1))
    }

    fn spawn(&self, id: u32, count: u32) -> Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .env(TOKEN_VAR, &self.token)
            .env(SHARD_ID_VAR, id.to_string())
            .env(SHARD_COUNT_VAR, count.to_string())
            .kill_on_drop(true)
            .spawn()
            .map_err(|cause| DiscordError::ShardSpawnFailed { shard: id, cause })
    }
}

fn exit_failure(shard: u32, status: ExitStatus) -> DiscordError {
    DiscordError::ShardExited {
        shard,
        status: status.to_string(),
    }
}
