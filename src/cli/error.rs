//! CLI-level errors (wraps settings, discovery, parse and command errors)

use thiserror::Error;

use crate::error::{CommandError, DiscoveryError, SettingsError};

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Parse(#[from] clap::Error),

    #[error("no command named '{0}'")]
    UnknownCommand(String),

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Settings(_) | CliError::Command(_) => crate::exitcode::FAILURE,
            CliError::Discovery(_) => crate::exitcode::CONFIG,
            CliError::Parse(e) => e.exit_code(),
            CliError::UnknownCommand(_) => crate::exitcode::USAGE,
        }
    }
}
