//! Library errors: command configuration, discovery, settings and command failures

use std::path::PathBuf;

use thiserror::Error;

/// Error type returned by command bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Malformed command or argument declarations.
///
/// Argument specs are not checked when they are declared; these surface when the
/// command's subparser is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("command '{command}': invalid argument {argument}: {reason}")]
    InvalidArgument {
        command: String,
        argument: String,
        reason: String,
    },

    #[error("invalid command name '{name}': {reason}")]
    InvalidCommandName { name: String, reason: String },
}

impl ConfigError {
    pub(crate) fn argument(
        command: &str,
        argument: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            command: command.to_string(),
            argument: argument.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while collecting commands from installed apps.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("no installed app named '{0}'")]
    AppNotFound(String),

    #[error("commands of app '{app}' could not be built")]
    Commands {
        app: String,
        #[source]
        source: ConfigError,
    },

    #[error("command '{name}' is defined by both '{first}' and '{second}'")]
    DuplicateCommand {
        name: String,
        first: String,
        second: String,
    },
}

/// Underlying cause of a settings lookup failure.
#[derive(Error, Debug)]
pub enum SettingsLoadError {
    #[error("'{0}' is not a valid module name")]
    InvalidModuleName(String),

    #[error("no settings module named '{module}' (looked for {})", .path.display())]
    NotFound { module: String, path: PathBuf },

    #[error("cannot read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid DJBOSS_* override")]
    Env(#[from] config::ConfigError),
}

/// Settings could not be resolved.
///
/// `message` explains the lookup strategy that failed; `cause` is what actually went wrong.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct SettingsError {
    pub message: String,
    pub module: String,
    #[source]
    pub cause: SettingsLoadError,
}

/// A command body returned an error.
#[derive(Error, Debug)]
#[error("command '{command}' failed")]
pub struct CommandError {
    pub command: String,
    #[source]
    pub source: BoxError,
}

/// The management utility could not run to completion.
#[derive(Error, Debug)]
pub enum ManageError {
    #[error("cannot run '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with status {}", exit_status(.code))]
    Exit { program: String, code: Option<i32> },
}

fn exit_status(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}
