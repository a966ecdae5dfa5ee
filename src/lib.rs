//! djboss: Django management commands, revisited
//!
//! Apps declare commands with [`Command::builder`]; the CLI discovers the commands of
//! every installed app, assembles one parser with a subcommand per command and
//! dispatches to the one selected on the command line.

pub mod apps;
pub mod argument;
pub mod cli;
pub mod command;
pub mod discovery;
pub mod error;
pub mod exitcode;
pub mod logging;
pub mod manage;
pub mod namespace;
pub mod parser;
pub mod settings;
pub mod util;

pub use argument::{Action, ArgumentOrder, ArgumentSpec, ArgumentSpecs, Nargs};
pub use command::{Command, CommandBuilder, SubparserOptions};
pub use discovery::{App, AppRegistry, CollisionPolicy, CommandMap};
pub use error::{BoxError, CommandError, ConfigError, DiscoveryError, SettingsError};
pub use namespace::Namespace;
pub use parser::{LogLevel, ParserRegistry};
pub use settings::{Settings, SettingsLocator};
