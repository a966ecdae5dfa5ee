//! Command discovery across installed apps
//!
//! Each [`App`] may provide a commands extension: a factory returning the commands it
//! defines. Discovery walks the built-in app first, then the installed apps in order,
//! merging everything into one name -> command map. A later app replaces an earlier
//! app's command of the same name unless [`CollisionPolicy::Error`] is selected.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::command::Command;
use crate::error::{ConfigError, DiscoveryError};

/// Label of the app providing the built-in commands.
pub const BUILTIN_APP: &str = "djboss";

/// Behaviour when two apps define a command with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// The later app wins.
    #[default]
    Override,
    /// Discovery fails.
    Error,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "override" => Ok(Self::Override),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown command collision policy '{other}' (expected 'override' or 'error')"
            )),
        }
    }
}

type CommandsFactory = dyn Fn() -> Result<Vec<Command>, ConfigError> + Send + Sync;

/// An installed application.
#[derive(Clone)]
pub struct App {
    label: String,
    commands: Option<Arc<CommandsFactory>>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("label", &self.label)
            .field("has_commands", &self.has_commands())
            .finish()
    }
}

impl App {
    /// An app without a commands extension.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: None,
        }
    }

    /// An app whose commands extension is `factory`.
    pub fn with_commands<F>(label: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Vec<Command>, ConfigError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            commands: Some(Arc::new(factory)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn has_commands(&self) -> bool {
        self.commands.is_some()
    }

    /// Build the app's commands. No extension means no commands.
    pub fn commands(&self) -> Result<Vec<Command>, ConfigError> {
        match &self.commands {
            Some(factory) => factory(),
            None => Ok(Vec::new()),
        }
    }
}

/// Every app the program knows about, by label.
#[derive(Debug, Clone, Default)]
pub struct AppRegistry {
    apps: Vec<App>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `app`, replacing any app with the same label.
    pub fn register(&mut self, app: App) -> &mut Self {
        match self.apps.iter_mut().find(|a| a.label == app.label) {
            Some(existing) => *existing = app,
            None => self.apps.push(app),
        }
        self
    }

    pub fn with(mut self, app: App) -> Self {
        self.register(app);
        self
    }

    pub fn get(&self, label: &str) -> Option<&App> {
        self.apps.iter().find(|a| a.label == label)
    }

    /// The app named `label`; an unknown app is a configuration fault.
    pub fn load(&self, label: &str) -> Result<&App, DiscoveryError> {
        self.get(label)
            .ok_or_else(|| DiscoveryError::AppNotFound(label.to_string()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.apps.iter().map(|a| a.label.as_str())
    }
}

/// Discovered commands by name, each with the label of the app that defined it.
#[derive(Debug, Clone, Default)]
pub struct CommandMap {
    commands: BTreeMap<String, (String, Command)>,
}

impl CommandMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `command` from `app`, returning the entry it replaced.
    pub fn insert(&mut self, app: &str, command: Command) -> Option<(String, Command)> {
        self.commands
            .insert(command.name().to_string(), (app.to_string(), command))
    }

    /// Merge `other` into this map; entries of `other` win unless `policy` forbids collisions.
    pub fn merge(
        &mut self,
        other: CommandMap,
        policy: CollisionPolicy,
    ) -> Result<(), DiscoveryError> {
        for (name, (app, command)) in other.commands {
            if let Some(first) = self.origin(&name) {
                if first != app {
                    if policy == CollisionPolicy::Error {
                        return Err(DiscoveryError::DuplicateCommand {
                            name,
                            first: first.to_string(),
                            second: app,
                        });
                    }
                    debug!(command = %name, from = first, by = %app, "command overridden");
                }
            }
            self.commands.insert(name, (app, command));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name).map(|(_, command)| command)
    }

    /// Label of the app that defined `name`.
    pub fn origin(&self, name: &str) -> Option<&str> {
        self.commands.get(name).map(|(app, _)| app.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values().map(|(_, command)| command)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Commands defined by the app `label`.
pub fn find_commands(apps: &AppRegistry, label: &str) -> Result<CommandMap, DiscoveryError> {
    let app = apps.load(label)?;
    if !app.has_commands() {
        debug!(app = label, "no commands extension");
        return Ok(CommandMap::new());
    }
    let commands = app.commands().map_err(|source| DiscoveryError::Commands {
        app: label.to_string(),
        source,
    })?;

    let mut map = CommandMap::new();
    for command in commands {
        debug!(app = label, command = command.name(), "found command");
        map.insert(label, command);
    }
    Ok(map)
}

/// Commands of the built-in app followed by those of each installed app.
#[instrument(skip(apps))]
pub fn find_all_commands<S>(
    apps: &AppRegistry,
    installed: &[S],
    policy: CollisionPolicy,
) -> Result<CommandMap, DiscoveryError>
where
    S: AsRef<str> + fmt::Debug,
{
    let mut all = find_commands(apps, BUILTIN_APP)?;
    for label in installed {
        all.merge(find_commands(apps, label.as_ref())?, policy)?;
    }
    debug!(commands = ?all.names().collect::<Vec<_>>(), "discovery complete");
    Ok(all)
}
