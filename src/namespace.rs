//! Parsed arguments handed to a command

use std::sync::Arc;

use clap::ArgMatches;

use crate::parser::LogLevel;
use crate::settings::Settings;

/// Result of parsing argv: the selected command, global options, the settings
/// injected as a default, and the command's own argument values.
///
/// Lookups by destination never panic; an unknown destination reads as absent.
#[derive(Debug, Clone)]
pub struct Namespace {
    command: String,
    log_level: LogLevel,
    settings: Arc<Settings>,
    matches: ArgMatches,
}

impl Namespace {
    pub fn new(
        command: impl Into<String>,
        log_level: LogLevel,
        settings: Arc<Settings>,
        matches: ArgMatches,
    ) -> Self {
        Self {
            command: command.into(),
            log_level,
            settings,
            matches,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Value of a `store_true`/`store_false` option.
    pub fn flag(&self, dest: &str) -> bool {
        self.matches
            .try_get_one::<bool>(dest)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false)
    }

    /// Number of occurrences of a `count` option.
    pub fn count(&self, dest: &str) -> u8 {
        self.matches
            .try_get_one::<u8>(dest)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(0)
    }

    /// First value stored under `dest`.
    pub fn value(&self, dest: &str) -> Option<&str> {
        self.matches
            .try_get_one::<String>(dest)
            .ok()
            .flatten()
            .map(String::as_str)
    }

    /// All values stored under `dest`, in command-line order.
    pub fn values(&self, dest: &str) -> Vec<&str> {
        self.matches
            .try_get_many::<String>(dest)
            .ok()
            .flatten()
            .map(|values| values.map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Raw clap matches of the selected command.
    pub fn matches(&self) -> &ArgMatches {
        &self.matches
    }
}
