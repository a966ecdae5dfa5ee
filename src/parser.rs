//! Root parser and the subparser group commands register into

use std::ffi::OsString;
use std::fmt;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{Arg, ValueEnum};
use tracing::debug;
use tracing::level_filters::LevelFilter;

use crate::command::Command;
use crate::namespace::Namespace;
use crate::settings::Settings;

pub const PROG: &str = "djboss";

const DESCRIPTION: &str = "Run django-boss management commands.";

const EPILOG: &str = "\
To discover sub-commands, djboss first finds and imports your Django
settings. The DJANGO_SETTINGS_MODULE environment variable takes precedence,
but if unspecified, djboss will look for a `settings` module in the current
directory.

Commands should be defined in a `commands` extension of each app. djboss
will search each of your INSTALLED_APPS for management commands.";

/// Global log level choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    #[value(name = "DEBUG")]
    Debug,
    #[value(name = "INFO")]
    Info,
    #[default]
    #[value(name = "WARN")]
    Warn,
    #[value(name = "ERROR")]
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// The root parser with its global options, plus one subparser per registered command.
///
/// Global options exist from construction on; commands are added with [`register`].
/// Registering a name twice replaces the earlier subparser in place.
///
/// [`register`]: ParserRegistry::register
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    root: clap::Command,
    subparsers: Vec<clap::Command>,
    settings: Option<Arc<Settings>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry {
    pub fn new() -> Self {
        let root = clap::Command::new(PROG)
            .version(env!("CARGO_PKG_VERSION"))
            .about(DESCRIPTION)
            .after_help(EPILOG)
            .subcommand_required(true)
            .subcommand_value_name("COMMAND")
            .subcommand_help_heading("commands")
            .disable_help_subcommand(true)
            .arg(
                Arg::new("log_level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .value_parser(clap::value_parser!(LogLevel))
                    .default_value("WARN")
                    .hide_possible_values(true)
                    .hide_default_value(true)
                    .help("Choose a log level from DEBUG, INFO, WARN or ERROR (default: WARN)"),
            );
        Self {
            root,
            subparsers: Vec::new(),
            settings: None,
        }
    }

    /// Add `command`'s subparser to the group.
    pub fn register(&mut self, command: &Command) {
        let parser = command.parser().clone();
        match self
            .subparsers
            .iter_mut()
            .find(|p| p.get_name() == command.name())
        {
            Some(existing) => {
                debug!(command = command.name(), "replacing registered subparser");
                *existing = parser;
            }
            None => {
                debug!(command = command.name(), "registering subparser");
                self.subparsers.push(parser);
            }
        }
    }

    /// Settings carried by every parsed [`Namespace`].
    pub fn set_defaults(&mut self, settings: Arc<Settings>) {
        self.settings = Some(settings);
    }

    pub fn command_names(&self) -> Vec<&str> {
        self.subparsers.iter().map(|p| p.get_name()).collect()
    }

    /// The assembled clap command: root options plus every registered subparser.
    pub fn build(&self) -> clap::Command {
        self.root.clone().subcommands(self.subparsers.iter().cloned())
    }

    /// Parse `argv` (program name first) into a [`Namespace`].
    pub fn parse_from<I, T>(&self, argv: I) -> Result<Namespace, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut cmd = self.build();
        let matches = cmd.try_get_matches_from_mut(argv)?;
        let log_level = matches
            .get_one::<LogLevel>("log_level")
            .copied()
            .unwrap_or_default();
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| cmd.error(ErrorKind::MissingSubcommand, "a command is required"))?;
        let settings = self.settings.clone().unwrap_or_default();
        Ok(Namespace::new(name, log_level, settings, sub_matches.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{Action, ArgumentSpec, Nargs};
    use crate::error::BoxError;
    use std::io::Write;

    fn noop(_: &Namespace, _: &mut dyn Write) -> Result<(), BoxError> {
        Ok(())
    }

    fn registry_with_echo() -> ParserRegistry {
        let echo = Command::builder("echo")
            .doc("Echo the arguments back to the console.")
            .argument(ArgumentSpec::new(["words"]).nargs(Nargs::ZeroOrMore))
            .argument(ArgumentSpec::new(["-n", "--no-newline"]).action(Action::StoreTrue))
            .build(noop)
            .unwrap();
        let mut registry = ParserRegistry::new();
        registry.register(&echo);
        registry
    }

    #[test]
    fn verify_cli() {
        registry_with_echo().build().debug_assert();
    }

    #[test]
    fn given_no_log_level_when_parse_then_defaults_to_warn() {
        let ns = registry_with_echo()
            .parse_from(["djboss", "echo", "hi"])
            .unwrap();
        assert_eq!(ns.log_level(), LogLevel::Warn);
        assert_eq!(ns.command(), "echo");
        assert_eq!(ns.values("words"), ["hi"]);
    }

    #[test]
    fn given_log_level_when_parse_then_stored() {
        let ns = registry_with_echo()
            .parse_from(["djboss", "--log-level", "ERROR", "echo"])
            .unwrap();
        assert_eq!(ns.log_level(), LogLevel::Error);
    }

    #[test]
    fn given_invalid_log_level_when_parse_then_error() {
        let err = registry_with_echo()
            .parse_from(["djboss", "-l", "TRACE", "echo"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn given_unknown_command_when_parse_then_error() {
        let err = registry_with_echo()
            .parse_from(["djboss", "nope"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn given_no_command_when_parse_then_error() {
        let err = registry_with_echo().parse_from(["djboss"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingSubcommand);
    }

    #[test]
    fn given_same_name_twice_when_register_then_replaced_in_place() {
        let mut registry = registry_with_echo();
        let other = Command::builder("other").build(noop).unwrap();
        registry.register(&other);
        let echo = Command::builder("echo").doc("Second echo.").build(noop).unwrap();
        registry.register(&echo);

        assert_eq!(registry.command_names(), ["echo", "other"]);
        let built = registry.build();
        let about = built
            .find_subcommand("echo")
            .and_then(|c| c.get_about())
            .map(ToString::to_string);
        assert_eq!(about.as_deref(), Some("Second echo."));
    }

    #[test]
    fn given_defaults_when_parse_then_settings_injected() {
        let mut registry = registry_with_echo();
        let settings = Settings {
            installed_apps: vec!["echoapp".into()],
            ..Settings::default()
        };
        registry.set_defaults(Arc::new(settings));
        let ns = registry.parse_from(["djboss", "echo"]).unwrap();
        assert_eq!(ns.settings().installed_apps, ["echoapp"]);
    }
}
