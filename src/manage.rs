//! The `manage` passthrough: relay arguments to the framework's own command utility

use std::sync::Arc;

use tracing::{debug, info};

use crate::argument::{ArgumentSpec, Nargs};
use crate::command::{Command, SubparserOptions};
use crate::discovery::{App, BUILTIN_APP};
use crate::error::{ConfigError, ManageError};
use crate::settings::Settings;

/// Program name reported by the relayed utility.
pub const MANAGE_PROG: &str = "djboss manage";

/// The framework's command-execution utility.
pub trait ManagementUtility: Send + Sync {
    /// Run the utility with `args`, reporting itself as `prog_name`. Blocks until done.
    fn execute(
        &self,
        prog_name: &str,
        args: &[String],
        settings: &Settings,
    ) -> Result<(), ManageError>;
}

/// Runs `settings.manage.program` as a child process with inherited stdio.
#[derive(Debug, Default)]
pub struct ProcessManagementUtility;

impl ManagementUtility for ProcessManagementUtility {
    fn execute(
        &self,
        prog_name: &str,
        args: &[String],
        settings: &Settings,
    ) -> Result<(), ManageError> {
        let manage = &settings.manage;
        let mut cmd = std::process::Command::new(&manage.program);
        cmd.args(&manage.args).args(args);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.arg0(prog_name);
        }

        info!(program = %manage.program, ?args, "running management utility");
        let status = cmd.status().map_err(|source| ManageError::Spawn {
            program: manage.program.clone(),
            source,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(ManageError::Exit {
                program: manage.program.clone(),
                code: status.code(),
            })
        }
    }
}

/// The `manage` command: no help flag, no option parsing, every argument relayed as-is.
pub fn manage_command(utility: Arc<dyn ManagementUtility>) -> Result<Command, ConfigError> {
    Command::with_options("manage", SubparserOptions::passthrough())
        .doc("Run native Django management commands under djboss.")
        .argument(ArgumentSpec::new(["args"]).nargs(Nargs::ZeroOrMore))
        .build(move |args, _out| {
            let argv: Vec<String> = args.values("args").into_iter().map(String::from).collect();
            debug!(?argv, "relaying to management utility");
            utility.execute(MANAGE_PROG, &argv, args.settings())?;
            Ok(())
        })
}

/// The built-in app, discovered before any installed app.
pub fn builtin_app(utility: Arc<dyn ManagementUtility>) -> App {
    App::with_commands(BUILTIN_APP, move || Ok(vec![manage_command(Arc::clone(&utility))?]))
}
