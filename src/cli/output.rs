//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use std::error::Error;
use std::io::{self, Write};

use colored::Colorize;
use itertools::Itertools;

use crate::cli::CliError;
use crate::error::SettingsError;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// An error followed by its causes, separated by ": ".
pub fn chain(err: &(dyn Error + 'static)) -> String {
    std::iter::successors(Some(err), |&e| e.source()).join(": ")
}

/// Write the settings failure report: explanation, then the underlying cause.
pub fn settings_failure(err: &SettingsError, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}", err.message)?;
    writeln!(w)?;
    writeln!(w, "The original exception was:")?;
    writeln!(w, "\t{}", chain(&err.cause))
}

/// Report a CLI failure on stderr.
pub fn report(err: &CliError) {
    match err {
        CliError::Settings(e) => {
            let _ = settings_failure(e, &mut io::stderr().lock());
        }
        other => error(&chain(other)),
    }
}
