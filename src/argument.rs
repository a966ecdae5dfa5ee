//! Argument declarations for commands
//!
//! An [`ArgumentSpec`] describes one positional argument or option the way argparse
//! does: a list of names plus options (action, nargs, help, ...). Specs are collected
//! into [`ArgumentSpecs`] while a command is declared and are only validated when the
//! command's subparser is built.

use std::sync::OnceLock;

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction};
use regex::Regex;

use crate::error::ConfigError;

/// How many values an argument consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    /// Exactly one value (the default).
    One,
    /// Zero or one value (`?`).
    Optional,
    /// Any number of values (`*`).
    ZeroOrMore,
    /// At least one value (`+`).
    OneOrMore,
    /// A fixed number of values.
    Exactly(usize),
    /// Everything that is left, including values that look like options.
    Remainder,
}

impl Nargs {
    fn is_variadic(self) -> bool {
        matches!(self, Nargs::ZeroOrMore | Nargs::OneOrMore | Nargs::Remainder)
    }

    fn is_required(self) -> bool {
        !matches!(self, Nargs::Optional | Nargs::ZeroOrMore | Nargs::Remainder)
    }
}

/// What happens when an argument is encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Store the value(s).
    #[default]
    Store,
    /// Set the destination to `true`.
    StoreTrue,
    /// Set the destination to `false`.
    StoreFalse,
    /// Append each occurrence's value(s).
    Append,
    /// Count occurrences.
    Count,
}

impl Action {
    fn takes_values(self) -> bool {
        matches!(self, Action::Store | Action::Append)
    }
}

/// Order in which collected specs are registered on a subparser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentOrder {
    /// Last-declared spec is registered first (specs are popped off the collector).
    #[default]
    Reverse,
    /// Specs are registered in the order they were declared.
    Declaration,
}

/// One argument declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    names: Vec<String>,
    action: Action,
    nargs: Option<Nargs>,
    help: Option<String>,
    default: Option<String>,
    choices: Vec<String>,
    metavar: Option<String>,
    dest: Option<String>,
    required: Option<bool>,
}

impl ArgumentSpec {
    /// Declare an argument by name(s).
    ///
    /// `["words"]` is a positional, `["-n", "--no-newline"]` an option.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            action: Action::default(),
            nargs: None,
            help: None,
            default: None,
            choices: Vec::new(),
            metavar: None,
            dest: None,
            required: None,
        }
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn nargs(mut self, nargs: Nargs) -> Self {
        self.nargs = Some(nargs);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_positional(&self) -> bool {
        self.names.first().is_some_and(|n| !n.starts_with('-'))
    }

    /// Effective nargs: explicit, or one value for value-taking actions.
    pub fn effective_nargs(&self) -> Nargs {
        self.nargs.unwrap_or(Nargs::One)
    }

    /// Key the parsed value is stored under.
    ///
    /// Explicit `dest`, else the positional name, else the first long option
    /// (`--no-newline` -> `no_newline`), else the first short option (`-n` -> `n`).
    pub fn destination(&self) -> String {
        if let Some(dest) = &self.dest {
            return dest.clone();
        }
        if self.is_positional() {
            return self.names[0].clone();
        }
        let long = self.names.iter().find_map(|n| n.strip_prefix("--"));
        let name = long
            .or_else(|| self.names.first().map(|n| n.trim_start_matches('-')))
            .unwrap_or_default();
        name.replace('-', "_")
    }

    /// Human-readable label used in error messages.
    pub fn label(&self) -> String {
        if self.names.is_empty() {
            "<unnamed>".to_string()
        } else {
            format!("'{}'", self.names.join("/"))
        }
    }

    /// Turn the declaration into a clap argument for the parser of `command`.
    ///
    /// `passthrough` parsers have no prefix characters: every argument must be positional
    /// and accepts values that look like options.
    pub fn to_arg(&self, command: &str, passthrough: bool) -> Result<Arg, ConfigError> {
        self.validate(command, passthrough)?;
        if self.is_positional() {
            Ok(self.positional_arg(passthrough))
        } else {
            self.option_arg(command)
        }
    }

    fn validate(&self, command: &str, passthrough: bool) -> Result<(), ConfigError> {
        let fail = |reason: &str| -> Result<(), ConfigError> {
            Err(ConfigError::argument(command, self.label(), reason))
        };

        if self.names.is_empty() {
            return fail("no names given");
        }
        if self.names.iter().any(|n| n.is_empty()) {
            return fail("empty name");
        }
        let positional = self.is_positional();
        if self.names.iter().any(|n| n.starts_with('-') == positional) {
            return fail("mixes positional and option names");
        }
        if let Some(dest) = &self.dest {
            if dest.is_empty() {
                return fail("empty dest");
            }
        }

        if positional {
            if self.names.len() > 1 {
                return fail("a positional argument takes a single name");
            }
            if !self.action.takes_values() {
                return fail("this action needs an option name");
            }
            if self.required.is_some() {
                return fail("'required' does not apply to positional arguments");
            }
        } else {
            if passthrough {
                return fail("options are not accepted by a parser without prefix characters");
            }
            for name in &self.names {
                check_option_name(name).or_else(|reason| fail(reason))?;
            }
            if self.nargs == Some(Nargs::Remainder) {
                return fail("only positional arguments can take the remainder");
            }
        }

        if !self.action.takes_values() {
            if self.nargs.is_some() {
                return fail("this action takes no values, so nargs does not apply");
            }
            if !self.choices.is_empty() {
                return fail("this action takes no values, so choices do not apply");
            }
        }
        if let Some(default) = &self.default {
            let fits = match self.action {
                Action::Store | Action::Append => true,
                Action::StoreTrue | Action::StoreFalse => default.parse::<bool>().is_ok(),
                Action::Count => default.parse::<u8>().is_ok(),
            };
            if !fits {
                return fail("default does not fit the action (expected true/false or a count)");
            }
        }
        if self.nargs == Some(Nargs::Exactly(0)) {
            return fail("nargs must be greater than zero");
        }
        Ok(())
    }

    fn positional_arg(&self, passthrough: bool) -> Arg {
        let nargs = self.effective_nargs();
        let value_name = self.metavar.clone().unwrap_or_else(|| self.names[0].clone());
        let mut arg = Arg::new(self.destination())
            .value_name(value_name)
            .required(nargs.is_required());

        arg = match (nargs, self.action) {
            (Nargs::One | Nargs::Optional, Action::Store) => arg.num_args(1).action(ArgAction::Set),
            (Nargs::One | Nargs::Optional, _) => arg.num_args(1).action(ArgAction::Append),
            (Nargs::ZeroOrMore, _) => arg.num_args(0..).action(ArgAction::Append),
            (Nargs::OneOrMore, _) => arg.num_args(1..).action(ArgAction::Append),
            (Nargs::Exactly(n), _) => arg.num_args(n).action(ArgAction::Append),
            (Nargs::Remainder, _) => arg
                .num_args(0..)
                .action(ArgAction::Append)
                .trailing_var_arg(true)
                .allow_hyphen_values(true),
        };
        if passthrough {
            arg = arg.allow_hyphen_values(true);
            if nargs.is_variadic() {
                arg = arg.trailing_var_arg(true);
            }
        }
        self.common(arg)
    }

    fn option_arg(&self, command: &str) -> Result<Arg, ConfigError> {
        let dest = self.destination();
        let mut arg = Arg::new(dest.clone()).required(self.required.unwrap_or(false));

        let mut longs = self.names.iter().filter_map(|n| n.strip_prefix("--"));
        let mut shorts = self
            .names
            .iter()
            .filter(|n| !n.starts_with("--"))
            .filter_map(|n| n.chars().nth(1));
        if let Some(long) = longs.next() {
            arg = arg.long(long.to_string());
        }
        for alias in longs {
            arg = arg.visible_alias(alias.to_string());
        }
        if let Some(short) = shorts.next() {
            arg = arg.short(short);
        }
        for alias in shorts {
            arg = arg.visible_short_alias(alias);
        }

        arg = match self.action {
            Action::StoreTrue => arg.action(ArgAction::SetTrue),
            Action::StoreFalse => arg.action(ArgAction::SetFalse),
            Action::Count => arg.action(ArgAction::Count),
            Action::Store | Action::Append => {
                let action = if self.action == Action::Store {
                    ArgAction::Set
                } else {
                    ArgAction::Append
                };
                let value_name = self
                    .metavar
                    .clone()
                    .unwrap_or_else(|| dest.to_uppercase());
                let arg = arg.action(action).value_name(value_name);
                match self.effective_nargs() {
                    Nargs::One => arg.num_args(1),
                    Nargs::Optional => arg.num_args(0..=1),
                    Nargs::ZeroOrMore => arg.num_args(0..),
                    Nargs::OneOrMore => arg.num_args(1..),
                    Nargs::Exactly(n) => arg.num_args(n),
                    Nargs::Remainder => {
                        return Err(ConfigError::argument(
                            command,
                            self.label(),
                            "only positional arguments can take the remainder",
                        ))
                    }
                }
            }
        };
        Ok(self.common(arg))
    }

    fn common(&self, mut arg: Arg) -> Arg {
        if let Some(help) = &self.help {
            arg = arg.help(help.clone());
        }
        // A required argument never falls back to its default.
        if let Some(default) = self.default.as_ref().filter(|_| !arg.is_required_set()) {
            arg = arg.default_value(default.clone());
        }
        if !self.choices.is_empty() {
            arg = arg.value_parser(PossibleValuesParser::new(self.choices.clone()));
        }
        arg
    }
}

fn check_option_name(name: &str) -> Result<(), &'static str> {
    static SHORT: OnceLock<Regex> = OnceLock::new();
    static LONG: OnceLock<Regex> = OnceLock::new();
    let short = SHORT.get_or_init(|| Regex::new(r"^-[A-Za-z0-9?]$").expect("valid regex"));
    let long =
        LONG.get_or_init(|| Regex::new(r"^--[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid regex"));

    if short.is_match(name) || long.is_match(name) {
        Ok(())
    } else if !name.starts_with("--") && name.len() > 2 {
        Err("single-dash long options are not supported")
    } else {
        Err("malformed option name")
    }
}

/// Argument specs collected for one command, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentSpecs {
    specs: Vec<ArgumentSpec>,
}

impl ArgumentSpecs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, spec: ArgumentSpec) {
        self.specs.push(spec);
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.specs.iter()
    }

    /// Consume the collector, yielding specs in the order they must be registered.
    pub fn into_registration_order(mut self, order: ArgumentOrder) -> Vec<ArgumentSpec> {
        match order {
            ArgumentOrder::Declaration => self.specs,
            ArgumentOrder::Reverse => {
                let mut drained = Vec::with_capacity(self.specs.len());
                while let Some(spec) = self.specs.pop() {
                    drained.push(spec);
                }
                drained
            }
        }
    }
}

impl FromIterator<ArgumentSpec> for ArgumentSpecs {
    fn from_iter<T: IntoIterator<Item = ArgumentSpec>>(iter: T) -> Self {
        Self {
            specs: iter.into_iter().collect(),
        }
    }
}
