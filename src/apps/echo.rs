//! Sample app: `echo` and `hello`

use crate::argument::{Action, ArgumentSpec, Nargs};
use crate::command::Command;
use crate::discovery::App;
use crate::error::ConfigError;

pub const LABEL: &str = "echoapp";

pub fn app() -> App {
    App::with_commands(LABEL, commands)
}

pub fn commands() -> Result<Vec<Command>, ConfigError> {
    Ok(vec![echo()?, hello()?])
}

fn echo() -> Result<Command, ConfigError> {
    Command::builder("echo")
        .doc("Echo the arguments back to the console.")
        .argument(ArgumentSpec::new(["words"]).nargs(Nargs::ZeroOrMore))
        .argument(
            ArgumentSpec::new(["-n", "--no-newline"])
                .action(Action::StoreTrue)
                .help("Don't print a newline afterwards."),
        )
        .build(|args, out| {
            let line = args.values("words").join(" ");
            if args.flag("no_newline") {
                write!(out, "{line}")?;
            } else {
                writeln!(out, "{line}")?;
            }
            Ok(())
        })
}

fn hello() -> Result<Command, ConfigError> {
    Command::builder("hello")
        .doc("Print a cliche to the console.")
        .build(|_, out| {
            writeln!(out, "Hello, World!")?;
            Ok(())
        })
}
