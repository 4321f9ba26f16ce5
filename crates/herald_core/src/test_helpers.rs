//! In-memory stand-ins for the platform, shared by unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::BoxError;
use crate::event::{InteractionEvent, InteractionKind, Snowflake};
use crate::payload::CommandPayload;
use crate::registry::{CommandRegistry, RemoteCommand, Scope};

/// Shared list of things handlers saw; used as the handler context.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone)]
pub struct FakeEvent {
    kind: InteractionKind,
    user_id: Snowflake,
    user_name: String,
    command: Option<String>,
    group: Option<String>,
    subcommand: Option<String>,
    custom_id: Option<String>,
    origin: Option<String>,
    replies: Arc<Mutex<Vec<String>>>,
}

impl FakeEvent {
    pub fn new(kind: InteractionKind, user_id: Snowflake) -> Self {
        Self {
            kind,
            user_id,
            user_name: format!("user{user_id}"),
            command: None,
            group: None,
            subcommand: None,
            custom_id: None,
            origin: None,
            replies: Arc::default(),
        }
    }

    pub fn chat(user_id: Snowflake, command: &str) -> Self {
        Self::new(InteractionKind::ChatInput, user_id).with_command(command)
    }

    pub fn button(user_id: Snowflake, custom_id: &str) -> Self {
        Self::new(InteractionKind::Button, user_id).with_custom_id(custom_id)
    }

    pub fn modal(user_id: Snowflake, custom_id: &str) -> Self {
        Self::new(InteractionKind::ModalSubmit, user_id).with_custom_id(custom_id)
    }

    pub fn with_command(mut self, name: &str) -> Self {
        self.command = Some(name.to_string());
        self
    }

    pub fn with_subcommand(mut self, group: Option<&str>, subcommand: &str) -> Self {
        self.group = group.map(str::to_string);
        self.subcommand = Some(subcommand.to_string());
        self
    }

    pub fn with_custom_id(mut self, custom_id: &str) -> Self {
        self.custom_id = Some(custom_id.to_string());
        self
    }

    pub fn with_origin(mut self, name: &str) -> Self {
        self.origin = Some(name.to_string());
        self
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl InteractionEvent for FakeEvent {
    fn kind(&self) -> InteractionKind {
        self.kind
    }

    fn user_id(&self) -> Snowflake {
        self.user_id
    }

    fn user_name(&self) -> &str {
        &self.user_name
    }

    fn command_name(&self) -> Option<&str> {
        self.command.as_deref()
    }

    fn subcommand_group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    fn subcommand(&self) -> Option<&str> {
        self.subcommand.as_deref()
    }

    fn custom_id(&self) -> Option<&str> {
        self.custom_id.as_deref()
    }

    fn origin_command_name(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    fn is_repliable(&self) -> bool {
        self.kind != InteractionKind::Autocomplete
    }

    async fn reply_failure(&self, content: &str) -> Result<(), BoxError> {
        self.replies.lock().unwrap().push(content.to_string());
        Ok(())
    }
}

/// Stateful registry that applies writes the way the platform does.
#[derive(Debug, Default)]
pub struct FakeRegistry {
    scopes: Mutex<BTreeMap<String, Vec<RemoteCommand>>>,
    next_id: AtomicUsize,
    failing: Mutex<Vec<String>>,
    pub fetches: AtomicUsize,
    pub bulk_overwrites: AtomicUsize,
    pub creates: AtomicUsize,
    pub edits: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl FakeRegistry {
    pub fn seed(&self, scope: Scope, commands: Vec<RemoteCommand>) {
        self.scopes.lock().unwrap().insert(scope.to_string(), commands);
    }

    /// Every write naming `command` fails from now on.
    pub fn fail_writes_for(&self, command: &str) {
        self.failing.lock().unwrap().push(command.to_string());
    }

    pub fn commands(&self, scope: Scope) -> Vec<RemoteCommand> {
        self.scopes
            .lock()
            .unwrap()
            .get(&scope.to_string())
            .cloned()
            .unwrap_or_default()
    }

    pub fn writes(&self) -> usize {
        [
            &self.bulk_overwrites,
            &self.creates,
            &self.edits,
            &self.deletes,
        ]
        .iter()
        .map(|counter| counter.load(Ordering::SeqCst))
        .sum()
    }

    fn next_id(&self) -> Snowflake {
        self.next_id.fetch_add(1, Ordering::SeqCst) as Snowflake + 1000
    }

    fn check(&self, name: &str) -> Result<(), BoxError> {
        if self.failing.lock().unwrap().iter().any(|failing| failing == name) {
            return Err(format!("rejected {name}").into());
        }
        Ok(())
    }
}

#[async_trait]
impl CommandRegistry for FakeRegistry {
    async fn fetch(&self, scope: Scope) -> Result<Vec<RemoteCommand>, BoxError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.commands(scope))
    }

    async fn bulk_overwrite_global(&self, commands: Vec<CommandPayload>) -> Result<(), BoxError> {
        self.bulk_overwrites.fetch_add(1, Ordering::SeqCst);
        for command in &commands {
            self.check(&command.name)?;
        }
        // Commands that keep their name keep their id.
        let current = self.commands(Scope::Global);
        let remote = commands
            .iter()
            .map(|payload| {
                let id = current
                    .iter()
                    .find(|existing| existing.name == payload.name)
                    .map_or_else(|| self.next_id(), |existing| existing.id);
                RemoteCommand::from_payload(id, payload)
            })
            .collect();
        self.seed(Scope::Global, remote);
        Ok(())
    }

    async fn create(&self, scope: Scope, command: CommandPayload) -> Result<(), BoxError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check(&command.name)?;
        let remote = RemoteCommand::from_payload(self.next_id(), &command);
        let mut scopes = self.scopes.lock().unwrap();
        let existing = scopes.entry(scope.to_string()).or_default();
        existing.retain(|current| current.name != command.name);
        existing.push(remote);
        Ok(())
    }

    async fn edit(
        &self,
        scope: Scope,
        id: Snowflake,
        command: CommandPayload,
    ) -> Result<(), BoxError> {
        self.edits.fetch_add(1, Ordering::SeqCst);
        self.check(&command.name)?;
        let mut scopes = self.scopes.lock().unwrap();
        let existing = scopes.entry(scope.to_string()).or_default();
        match existing.iter_mut().find(|current| current.id == id) {
            Some(current) => {
                *current = RemoteCommand::from_payload(id, &command);
                Ok(())
            }
            None => Err(format!("unknown command {id}").into()),
        }
    }

    async fn delete(&self, scope: Scope, id: Snowflake) -> Result<(), BoxError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut scopes = self.scopes.lock().unwrap();
        let existing = scopes.entry(scope.to_string()).or_default();
        if let Some(current) = existing.iter().find(|current| current.id == id) {
            self.check(&current.name)?;
        }
        existing.retain(|current| current.id != id);
        Ok(())
    }
}
