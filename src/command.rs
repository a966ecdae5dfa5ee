//! Commands: a function plus the subparser built from its declared arguments
//!
//! Two ways to declare one, matching the bare and configured decorator forms:
//!
//! ```ignore
//! let hello = Command::new("hello", |_, out| Ok(writeln!(out, "Hello, World!")?))?;
//!
//! let manage = Command::with_options("manage", SubparserOptions::passthrough())
//!     .argument(ArgumentSpec::new(["args"]).nargs(Nargs::ZeroOrMore))
//!     .build(run_manage)?;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use tracing::debug;

use crate::argument::{ArgumentOrder, ArgumentSpec, ArgumentSpecs, Nargs};
use crate::error::{BoxError, CommandError, ConfigError};
use crate::namespace::Namespace;

/// Signature of a command body.
pub type CommandFn = dyn Fn(&Namespace, &mut dyn Write) -> Result<(), BoxError> + Send + Sync;

/// Options applied to a command's own subparser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubparserOptions {
    /// Add `-h/--help` to the subparser.
    pub add_help: bool,
    /// Recognise option prefixes. Without them every token is a positional value.
    pub prefix_chars: bool,
}

impl Default for SubparserOptions {
    fn default() -> Self {
        Self {
            add_help: true,
            prefix_chars: true,
        }
    }
}

impl SubparserOptions {
    /// No automatic help and no option parsing: arguments are relayed untouched.
    pub fn passthrough() -> Self {
        Self {
            add_help: false,
            prefix_chars: false,
        }
    }
}

/// A named, invokable unit. Immutable once built.
#[derive(Clone)]
pub struct Command {
    name: String,
    help: Option<String>,
    description: Option<String>,
    function: Arc<CommandFn>,
    parser: clap::Command,
    arguments: Vec<String>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("help", &self.help)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Wrap a function directly, with no documentation and no arguments.
    pub fn new<F>(ident: &str, function: F) -> Result<Self, ConfigError>
    where
        F: Fn(&Namespace, &mut dyn Write) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self::builder(ident).build(function)
    }

    /// Start declaring a command for the function named `ident`.
    pub fn builder(ident: &str) -> CommandBuilder {
        Self::with_options(ident, SubparserOptions::default())
    }

    /// Start declaring a command whose subparser is configured with `options`.
    pub fn with_options(ident: &str, options: SubparserOptions) -> CommandBuilder {
        CommandBuilder {
            ident: ident.to_string(),
            options,
            name: None,
            help: None,
            description: None,
            doc: None,
            arguments: ArgumentSpecs::new(),
            order: ArgumentOrder::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// This command's subparser.
    pub fn parser(&self) -> &clap::Command {
        &self.parser
    }

    /// Argument destinations in the order they were added to the subparser.
    pub fn registered_arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Run the wrapped function. Its error is returned as-is, tagged with the command name.
    pub fn call(&self, args: &Namespace, out: &mut dyn Write) -> Result<(), CommandError> {
        (self.function)(args, out).map_err(|source| CommandError {
            command: self.name.clone(),
            source,
        })
    }
}

/// Collects a command's metadata and argument specs before it is built.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    ident: String,
    options: SubparserOptions,
    name: Option<String>,
    help: Option<String>,
    description: Option<String>,
    doc: Option<String>,
    arguments: ArgumentSpecs,
    order: ArgumentOrder,
}

impl CommandBuilder {
    /// Use `name` verbatim instead of deriving it from the function identifier.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Documentation text; its first line becomes the help, all of it the description.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn argument(mut self, spec: ArgumentSpec) -> Self {
        self.arguments.push(spec);
        self
    }

    pub fn order(mut self, order: ArgumentOrder) -> Self {
        self.order = order;
        self
    }

    /// Build the subparser and wrap `function`.
    pub fn build<F>(self, function: F) -> Result<Command, ConfigError>
    where
        F: Fn(&Namespace, &mut dyn Write) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| self.ident.replace('_', "-"));
        validate_name(&name)?;

        let doc = self
            .doc
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());
        let help = self
            .help
            .clone()
            .or_else(|| doc.and_then(|d| d.lines().next()).map(|l| l.trim().to_string()));
        let description = self
            .description
            .clone()
            .or_else(|| doc.map(str::to_string));

        let mut parser = clap::Command::new(name.clone()).disable_help_flag(!self.options.add_help);
        if let Some(help) = &help {
            parser = parser.about(help.clone());
        }
        if let Some(description) = &description {
            parser = parser.long_about(description.clone());
        }

        let passthrough = !self.options.prefix_chars;
        let mut seen = Registered::new(self.options.add_help);
        let mut arguments = Vec::with_capacity(self.arguments.len());
        for spec in self.arguments.into_registration_order(self.order) {
            let arg = spec.to_arg(&name, passthrough)?;
            seen.check(&name, &spec)?;
            debug!(command = %name, argument = %spec.destination(), "registering argument");
            arguments.push(spec.destination());
            parser = parser.arg(arg);
        }

        Ok(Command {
            name,
            help,
            description,
            function: Arc::new(function),
            parser,
            arguments,
        })
    }
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.starts_with('-') {
        "name must not start with '-'"
    } else if name.chars().any(char::is_whitespace) {
        "name must not contain whitespace"
    } else {
        return Ok(());
    };
    Err(ConfigError::InvalidCommandName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

/// Tracks what a subparser already holds so clashes become config errors.
struct Registered {
    dests: HashSet<String>,
    flags: HashSet<String>,
    open_positional: Option<String>,
}

impl Registered {
    fn new(add_help: bool) -> Self {
        let mut registered = Self {
            dests: HashSet::new(),
            flags: HashSet::new(),
            open_positional: None,
        };
        if add_help {
            registered.dests.insert("help".to_string());
            registered.flags.extend(["-h".to_string(), "--help".to_string()]);
        }
        registered
    }

    fn check(&mut self, command: &str, spec: &ArgumentSpec) -> Result<(), ConfigError> {
        let fail = |reason: String| ConfigError::argument(command, spec.label(), reason);

        let dest = spec.destination();
        if !self.dests.insert(dest.clone()) {
            return Err(fail(format!("destination '{dest}' is already used")));
        }
        if !spec.is_positional() {
            for flag in spec.names() {
                if !self.flags.insert(flag.clone()) {
                    return Err(fail(format!("option '{flag}' is already used")));
                }
            }
            return Ok(());
        }

        if let Some(open) = &self.open_positional {
            return Err(fail(format!(
                "positional follows {open}, which takes a variable number of values"
            )));
        }
        if !matches!(spec.effective_nargs(), Nargs::One | Nargs::Exactly(_)) {
            self.open_positional = Some(spec.label());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::Action;

    fn noop(_: &Namespace, _: &mut dyn Write) -> Result<(), BoxError> {
        Ok(())
    }

    #[test]
    fn given_duplicate_destination_when_build_then_config_error() {
        let err = Command::builder("dup")
            .argument(ArgumentSpec::new(["--name"]))
            .argument(ArgumentSpec::new(["-x"]).dest("name"))
            .build(noop)
            .unwrap_err();
        assert!(err.to_string().contains("destination 'name' is already used"));
    }

    #[test]
    fn given_help_flag_with_auto_help_when_build_then_config_error() {
        let err = Command::builder("h")
            .argument(ArgumentSpec::new(["-h"]).action(Action::StoreTrue).dest("human"))
            .build(noop)
            .unwrap_err();
        assert!(err.to_string().contains("option '-h' is already used"));
    }

    #[test]
    fn given_help_flag_without_auto_help_when_build_then_accepted() {
        let options = SubparserOptions {
            add_help: false,
            prefix_chars: true,
        };
        let cmd = Command::with_options("h", options)
            .argument(ArgumentSpec::new(["-h"]).action(Action::StoreTrue).dest("human"))
            .build(noop)
            .unwrap();
        assert_eq!(cmd.registered_arguments(), ["human"]);
    }

    #[test]
    fn given_positional_after_variadic_when_build_then_config_error() {
        let err = Command::builder("p")
            .order(ArgumentOrder::Declaration)
            .argument(ArgumentSpec::new(["words"]).nargs(Nargs::ZeroOrMore))
            .argument(ArgumentSpec::new(["last"]))
            .build(noop)
            .unwrap_err();
        assert!(err.to_string().contains("variable number of values"));
    }

    fn parse(command: &Command, argv: &[&str]) -> Result<Namespace, clap::Error> {
        let mut registry = crate::parser::ParserRegistry::new();
        registry.register(command);
        registry.build().debug_assert();
        registry.parse_from(["djboss"].iter().chain(argv).copied())
    }

    #[test]
    fn given_defaulted_positional_before_required_one_when_parse_then_both_stored() {
        let cmd = Command::builder("p")
            .order(ArgumentOrder::Declaration)
            .argument(ArgumentSpec::new(["a"]).default_value("x"))
            .argument(ArgumentSpec::new(["b"]))
            .build(noop)
            .unwrap();

        let ns = parse(&cmd, &["p", "1", "2"]).unwrap();
        assert_eq!(ns.value("a"), Some("1"));
        assert_eq!(ns.value("b"), Some("2"));
    }

    #[test]
    fn given_defaulted_last_declared_positional_when_reverse_order_then_parses() {
        let cmd = Command::builder("cp")
            .argument(ArgumentSpec::new(["src"]))
            .argument(ArgumentSpec::new(["dst"]).default_value("out"))
            .build(noop)
            .unwrap();

        let ns = parse(&cmd, &["cp", "first", "second"]).unwrap();
        assert_eq!(ns.value("dst"), Some("first"));
        assert_eq!(ns.value("src"), Some("second"));

        let err = parse(&cmd, &["cp", "only"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[rstest::rstest]
    #[case("")]
    #[case("-x")]
    #[case("two words")]
    fn given_bad_name_override_when_build_then_config_error(#[case] name: &str) {
        let err = Command::builder("ok").name(name).build(noop).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCommandName { .. }));
    }
}
