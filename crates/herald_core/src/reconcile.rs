//! Brings the platform's registered commands in line with the local set.
//!
//! Each scope is handled independently: fetch what is registered, compute
//! a [`ChangeSet`], then delete, add and update in that order. Writes are
//! best effort; a failed write is recorded in the [`ScopeReport`] and the
//! pass moves on to the next command.

use std::future::Future;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, error, info};

use crate::error::{BoxError, RegistrationError, RegistryOperation};
use crate::event::Snowflake;
use crate::payload::CommandPayload;
use crate::registry::{CommandRegistry, RemoteCommand, Scope};
use crate::set::CommandSet;

/// What needs to change in one scope.
#[derive(Debug, Default, PartialEq)]
pub struct ChangeSet<'a> {
    /// Registered remotely with no local command of the same name.
    pub removing: Vec<&'a RemoteCommand>,
    /// Local commands with no registered command of the same name.
    pub adding: Vec<&'a CommandPayload>,
    /// Same name on both sides but not equivalent.
    pub updating: Vec<(&'a CommandPayload, &'a RemoteCommand)>,
}

impl ChangeSet<'_> {
    pub fn is_empty(&self) -> bool {
        self.removing.is_empty() && self.adding.is_empty() && self.updating.is_empty()
    }
}

/// Compares local payloads against a registry snapshot by name.
pub fn diff<'a>(local: &'a [CommandPayload], remote: &'a [RemoteCommand]) -> ChangeSet<'a> {
    let mut changes = ChangeSet::default();

    for registered in remote {
        if !local.iter().any(|payload| payload.name == registered.name) {
            changes.removing.push(registered);
        }
    }

    for payload in local {
        match remote.iter().find(|registered| registered.name == payload.name) {
            None => changes.adding.push(payload),
            Some(registered) if !registered.equivalent_to(payload) => {
                changes.updating.push((payload, registered))
            }
            Some(_) => {}
        }
    }

    changes
}

/// Outcome of reconciling one scope.
#[derive(Debug)]
pub struct ScopeReport {
    pub scope: Scope,
    pub removed: usize,
    pub added: usize,
    pub updated: usize,
    pub failures: Vec<RegistrationError>,
}

impl ScopeReport {
    fn new(scope: Scope) -> Self {
        Self {
            scope,
            removed: 0,
            added: 0,
            updated: 0,
            failures: Vec::new(),
        }
    }

    /// Successful writes.
    pub fn writes(&self) -> usize {
        self.removed + self.added + self.updated
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, operation: RegistryOperation, command: &str, cause: BoxError) {
        let e = RegistrationError::write(self.scope, operation, command, cause);
        error!("{}", e);
        self.failures.push(e);
    }
}

/// Outcome of a full pass over every scope.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub global: Option<ScopeReport>,
    pub guilds: Vec<ScopeReport>,
}

impl ReconcileReport {
    pub fn scopes(&self) -> impl Iterator<Item = &ScopeReport> {
        self.guilds.iter().chain(self.global.iter())
    }

    pub fn writes(&self) -> usize {
        self.scopes().map(ScopeReport::writes).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RegistrationError> {
        self.scopes().flat_map(|report| report.failures.iter())
    }
}

/// Reconciles `local` against whatever is registered in `scope`.
///
/// Additions in the global scope are made with a single bulk overwrite of
/// the whole local set; guild additions are created one by one.
pub async fn reconcile_scope<R>(registry: &R, scope: Scope, local: &[CommandPayload]) -> ScopeReport
where
    R: CommandRegistry + ?Sized,
{
    let mut report = ScopeReport::new(scope);

    let remote = match registry.fetch(scope).await {
        Ok(remote) => remote,
        Err(cause) => {
            let e = RegistrationError::fetch(scope, cause);
            error!("{}", e);
            report.failures.push(e);
            return report;
        }
    };

    let changes = diff(local, &remote);
    if changes.is_empty() {
        debug!("No changes for {} commands", scope);
        return report;
    }
    info!(
        "Reconciling {} commands: {} to remove, {} to add, {} to update",
        scope,
        changes.removing.len(),
        changes.adding.len(),
        changes.updating.len()
    );

    for registered in &changes.removing {
        let result = timed(
            format!("Deleted {} command '{}'", scope, registered.name),
            registry.delete(scope, registered.id),
        )
        .await;
        match result {
            Ok(()) => report.removed += 1,
            Err(cause) => report.fail(RegistryOperation::Delete, &registered.name, cause),
        }
    }

    if !changes.adding.is_empty() {
        match scope {
            Scope::Global => {
                let result = timed(
                    format!("Overwrote {} global commands", local.len()),
                    registry.bulk_overwrite_global(local.to_vec()),
                )
                .await;
                match result {
                    Ok(()) => report.added += changes.adding.len(),
                    Err(cause) => report.fail(RegistryOperation::BulkOverwrite, "*", cause),
                }
            }
            Scope::Guild(_) => {
                for payload in &changes.adding {
                    let result = timed(
                        format!("Created {} command '{}'", scope, payload.name),
                        registry.create(scope, (*payload).clone()),
                    )
                    .await;
                    match result {
                        Ok(()) => report.added += 1,
                        Err(cause) => report.fail(RegistryOperation::Create, &payload.name, cause),
                    }
                }
            }
        }
    }

    for (payload, registered) in &changes.updating {
        let result = timed(
            format!("Edited {} command '{}'", scope, payload.name),
            registry.edit(scope, registered.id, (*payload).clone()),
        )
        .await;
        match result {
            Ok(()) => report.updated += 1,
            Err(cause) => report.fail(RegistryOperation::Edit, &payload.name, cause),
        }
    }

    report
}

async fn timed<F>(label: String, call: F) -> Result<(), BoxError>
where
    F: Future<Output = Result<(), BoxError>>,
{
    let started = Instant::now();
    let result = call.await;
    if result.is_ok() {
        info!("{} in {}ms", label, started.elapsed().as_millis());
    }
    result
}

/// Reconciles every guild in `guilds` concurrently, then the global scope.
///
/// Scopes without local commands are not fetched at all.
pub async fn reconcile<R, C, E>(
    registry: &R,
    commands: &CommandSet<C, E>,
    guilds: &[Snowflake],
) -> ReconcileReport
where
    R: CommandRegistry + ?Sized,
{
    let mut report = ReconcileReport::default();
    if commands.is_empty() {
        info!("No commands to register");
        return report;
    }

    let (global, guild) = commands.partition_scopes();
    let global: Vec<CommandPayload> = global.iter().map(|c| c.to_wire_format()).collect();
    let guild: Vec<CommandPayload> = guild.iter().map(|c| c.to_wire_format()).collect();

    if !guild.is_empty() {
        report.guilds = join_all(
            guilds
                .iter()
                .map(|&id| reconcile_scope(registry, Scope::Guild(id), &guild)),
        )
        .await;
    }

    if !global.is_empty() {
        report.global = Some(reconcile_scope(registry, Scope::Global, &global).await);
    }

    info!(
        "Reconciled {} commands across {} scopes with {} writes",
        commands.len(),
        report.scopes().count(),
        report.writes()
    );
    report
}
