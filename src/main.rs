use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use djboss::cli::{self, output, CliError};
use djboss::logging;
use djboss::manage::ProcessManagementUtility;
use djboss::parser::LogLevel;
use djboss::settings::SettingsLocator;

fn main() {
    logging::set_level(LogLevel::default());

    let apps = djboss::apps::installed(Arc::new(ProcessManagementUtility));
    let locator = SettingsLocator::from_env();

    let mut stdout = io::stdout().lock();
    let result = cli::run(&apps, &locator, std::env::args_os(), &mut stdout);
    let _ = stdout.flush();
    drop(stdout);

    match result {
        Ok(()) => process::exit(djboss::exitcode::OK),
        Err(CliError::Parse(e)) => e.exit(),
        Err(e) => {
            output::report(&e);
            process::exit(e.exit_code());
        }
    }
}
