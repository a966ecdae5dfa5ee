//! CLI layer: settings, discovery, argument parsing and command dispatch

pub mod error;
pub mod output;

pub use error::{CliError, CliResult};

use std::ffi::OsString;
use std::io::Write;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::discovery::{find_all_commands, AppRegistry};
use crate::logging;
use crate::parser::ParserRegistry;
use crate::settings::SettingsLocator;

/// One invocation from argv to the command's result.
///
/// 1. resolve settings
/// 2. discover commands of the built-in app and every installed app
/// 3. register them on a fresh parser and inject the settings as a default
/// 4. parse `argv` (program name first)
/// 5. apply the chosen log level
/// 6. call the selected command, writing its output to `out`
#[instrument(skip_all)]
pub fn run<I, T>(
    apps: &AppRegistry,
    locator: &SettingsLocator,
    argv: I,
    out: &mut dyn Write,
) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let settings = Arc::new(locator.resolve()?);
    let commands = find_all_commands(
        apps,
        &settings.installed_apps,
        settings.command_collisions,
    )?;

    let mut parser = ParserRegistry::new();
    for command in commands.commands() {
        parser.register(command);
    }
    parser.set_defaults(Arc::clone(&settings));

    let args = parser.parse_from(argv)?;
    logging::set_level(args.log_level());

    let command = commands
        .get(args.command())
        .ok_or_else(|| CliError::UnknownCommand(args.command().to_string()))?;
    info!(command = command.name(), app = commands.origin(command.name()), "dispatching");
    command.call(&args, out)?;
    Ok(())
}
