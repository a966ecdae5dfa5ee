//! End-to-end dispatch through `cli::run`

use std::fs;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use djboss::cli::{self, CliError};
use djboss::error::ManageError;
use djboss::manage::{ManagementUtility, MANAGE_PROG};
use djboss::util::testing;
use djboss::{AppRegistry, Settings, SettingsLocator};

#[derive(Default)]
struct RecordingUtility {
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl ManagementUtility for RecordingUtility {
    fn execute(&self, prog_name: &str, args: &[String], _: &Settings) -> Result<(), ManageError> {
        self.calls
            .lock()
            .unwrap()
            .push((prog_name.to_string(), args.to_vec()));
        Ok(())
    }
}

struct Fixture {
    _dir: TempDir,
    apps: AppRegistry,
    locator: SettingsLocator,
    utility: Arc<RecordingUtility>,
}

impl Fixture {
    fn new() -> Self {
        testing::init_test_setup();
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("settings.toml"),
            "installed_apps = [\"echoapp\"]\n",
        )
        .unwrap();
        let utility = Arc::new(RecordingUtility::default());
        let apps = djboss::apps::installed(utility.clone());
        let locator = SettingsLocator::new(None, dir.path());
        Self {
            _dir: dir,
            apps,
            locator,
            utility,
        }
    }

    fn run(&self, argv: &[&str]) -> Result<String, CliError> {
        let mut full = vec!["djboss"];
        full.extend_from_slice(argv);
        let mut out = Vec::new();
        cli::run(&self.apps, &self.locator, full, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }
}

#[test]
fn given_no_newline_flag_when_echo_then_words_without_newline() {
    let fx = Fixture::new();
    assert_eq!(fx.run(&["echo", "-n", "hello", "world"]).unwrap(), "hello world");
}

#[test]
fn given_words_when_echo_then_words_with_newline() {
    let fx = Fixture::new();
    assert_eq!(fx.run(&["echo", "hello", "world"]).unwrap(), "hello world\n");
}

#[test]
fn given_hello_when_run_then_greets() {
    let fx = Fixture::new();
    assert_eq!(fx.run(&["hello"]).unwrap(), "Hello, World!\n");
}

#[test]
fn given_manage_when_run_then_arguments_relayed_verbatim() {
    let fx = Fixture::new();

    fx.run(&["manage", "migrate", "--noinput"]).unwrap();

    let calls = fx.utility.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, MANAGE_PROG);
    assert_eq!(calls[0].1, ["migrate", "--noinput"]);
}

#[test]
fn given_manage_without_arguments_when_run_then_utility_called_with_none() {
    let fx = Fixture::new();

    fx.run(&["manage"]).unwrap();

    let calls = fx.utility.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.is_empty());
}

#[test]
fn given_unknown_command_when_run_then_usage_error() {
    let fx = Fixture::new();

    let err = fx.run(&["nope"]).unwrap_err();

    assert!(matches!(err, CliError::Parse(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn given_app_not_installed_when_run_then_its_commands_unavailable() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("settings.toml"), "installed_apps = []\n").unwrap();
    let apps = djboss::apps::installed(Arc::new(RecordingUtility::default()));
    let locator = SettingsLocator::new(None, dir.path());

    let err = cli::run(&apps, &locator, ["djboss", "hello"], &mut Vec::new()).unwrap_err();

    assert!(matches!(err, CliError::Parse(_)));
}

#[test]
fn given_unknown_installed_app_when_run_then_discovery_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("settings.toml"), "installed_apps = [\"ghost\"]\n").unwrap();
    let apps = djboss::apps::installed(Arc::new(RecordingUtility::default()));
    let locator = SettingsLocator::new(None, dir.path());

    let err = cli::run(&apps, &locator, ["djboss", "hello"], &mut Vec::new()).unwrap_err();

    assert!(matches!(err, CliError::Discovery(_)));
    assert_eq!(err.exit_code(), djboss::exitcode::CONFIG);
}

#[test]
fn given_failing_command_when_run_then_command_error_with_cause() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("settings.toml"), "installed_apps = [\"fails\"]\n").unwrap();
    let apps = djboss::apps::installed(Arc::new(RecordingUtility::default())).with(
        djboss::App::with_commands("fails", || {
            Ok(vec![djboss::Command::new("fail", |_, _| Err("disk full".into()))?])
        }),
    );
    let locator = SettingsLocator::new(None, dir.path());

    let err = cli::run(&apps, &locator, ["djboss", "fail"], &mut Vec::new()).unwrap_err();

    assert_eq!(err.exit_code(), djboss::exitcode::FAILURE);
    assert_eq!(
        djboss::cli::output::chain(&err),
        "command 'fail' failed: disk full"
    );
}
