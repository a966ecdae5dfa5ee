//! Settings module resolution
//!
//! A settings module is a TOML file named by a dotted module path: `mysite.settings`
//! is `<search dir>/mysite/settings.toml`. Lookup order:
//! 1. `DJANGO_SETTINGS_MODULE`, if set
//! 2. `settings` (`./settings.toml`)
//!
//! `DJBOSS_*` environment variables then replace individual values.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use config::{Config, Environment};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::discovery::CollisionPolicy;
use crate::error::{SettingsError, SettingsLoadError};

/// Environment variable naming the settings module.
pub const SETTINGS_MODULE_ENV: &str = "DJANGO_SETTINGS_MODULE";

/// Module looked up when [`SETTINGS_MODULE_ENV`] is unset.
pub const DEFAULT_SETTINGS_MODULE: &str = "settings";

/// How the `manage` passthrough reaches the framework's own command utility.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManageSettings {
    /// Program to run (default: `django-admin`)
    pub program: String,
    /// Arguments placed before the relayed ones (e.g. `["manage.py"]` with `program = "python"`)
    pub args: Vec<String>,
}

impl Default for ManageSettings {
    fn default() -> Self {
        Self {
            program: "django-admin".into(),
            args: Vec::new(),
        }
    }
}

/// Resolved project settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    /// App labels searched for commands, in order
    pub installed_apps: Vec<String>,
    /// What happens when two apps define the same command
    pub command_collisions: CollisionPolicy,
    pub manage: ManageSettings,
    /// Dotted name the settings were loaded from
    #[serde(skip)]
    pub module: String,
    #[serde(skip)]
    pub path: Option<PathBuf>,
    /// Every other key, as written
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Settings {
    /// Look up an unrecognised key; dots descend into tables (`database.name`).
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        let mut parts = key.split('.');
        let mut value = self.extra.get(parts.next()?)?;
        for part in parts {
            value = value.as_table()?.get(part)?;
        }
        Some(value)
    }

    /// Parse settings from TOML text, without environment overrides.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply `DJBOSS_*` environment variables. They replace file values.
    fn apply_env_overrides(mut self) -> Result<Self, SettingsLoadError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("DJBOSS")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("installed_apps")
                    .try_parsing(true),
            )
            .build()?;

        if let Some(apps) = unset_as_none(config.get::<Vec<String>>("installed_apps"))? {
            self.installed_apps = apps;
        }
        if let Some(policy) = unset_as_none(config.get_string("command_collisions"))? {
            self.command_collisions = policy
                .parse()
                .map_err(config::ConfigError::Message)?;
        }
        if let Some(program) = unset_as_none(config.get_string("manage.program"))? {
            self.manage.program = program;
        }
        Ok(self)
    }

    /// Expand `~` and `$VAR` in the manage program.
    fn expand_paths(&mut self) {
        if let Ok(expanded) = shellexpand::full(&self.manage.program) {
            self.manage.program = expanded.into_owned();
        }
    }
}

/// A missing key is not an error; anything else the config crate reports is.
fn unset_as_none<T>(
    value: Result<T, config::ConfigError>,
) -> Result<Option<T>, config::ConfigError> {
    match value {
        Ok(value) => Ok(Some(value)),
        Err(config::ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Where to look for the settings module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsLocator {
    module: Option<String>,
    search_dir: PathBuf,
}

impl SettingsLocator {
    /// `module` is the value of [`SETTINGS_MODULE_ENV`], if any.
    pub fn new(module: Option<String>, search_dir: impl Into<PathBuf>) -> Self {
        Self {
            module: module.filter(|m| !m.is_empty()),
            search_dir: search_dir.into(),
        }
    }

    /// Locator for this process: the environment variable and the current directory.
    pub fn from_env() -> Self {
        let search_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(std::env::var(SETTINGS_MODULE_ENV).ok(), search_dir)
    }

    pub fn module(&self) -> &str {
        self.module.as_deref().unwrap_or(DEFAULT_SETTINGS_MODULE)
    }

    pub fn search_dir(&self) -> &Path {
        &self.search_dir
    }

    /// Find, read and parse the settings module.
    pub fn resolve(&self) -> Result<Settings, SettingsError> {
        let module = self.module();
        debug!(module, dir = %self.search_dir.display(), "resolving settings");
        load_module(module, &self.search_dir).map_err(|cause| SettingsError {
            message: self.explain(),
            module: module.to_string(),
            cause,
        })
    }

    fn explain(&self) -> String {
        match &self.module {
            Some(module) => format!(
                "There was an error importing the module specified by the\n\
                 {SETTINGS_MODULE_ENV} environment variable ('{module}'). Make sure that it\n\
                 refers to a valid and readable settings module."
            ),
            None => format!(
                "Couldn't import a settings module. Make sure that a `settings.toml`\n\
                 file exists in the current directory, and that it can be read,\n\
                 or that the {SETTINGS_MODULE_ENV} environment variable points\n\
                 to a valid and readable settings module."
            ),
        }
    }
}

/// Path of `module` below `dir`.
pub fn module_path(module: &str, dir: &Path) -> Result<PathBuf, SettingsLoadError> {
    static SEGMENT: OnceLock<Regex> = OnceLock::new();
    let segment =
        SEGMENT.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

    if !module.split('.').all(|s| segment.is_match(s)) {
        return Err(SettingsLoadError::InvalidModuleName(module.to_string()));
    }
    let mut path: PathBuf = dir.to_path_buf();
    path.extend(module.split('.'));
    path.set_extension("toml");
    Ok(path)
}

fn load_module(module: &str, dir: &Path) -> Result<Settings, SettingsLoadError> {
    let path = module_path(module, dir)?;
    if !path.is_file() {
        return Err(SettingsLoadError::NotFound {
            module: module.to_string(),
            path,
        });
    }
    let content = std::fs::read_to_string(&path).map_err(|source| SettingsLoadError::Read {
        path: path.clone(),
        source,
    })?;
    let settings = Settings::from_toml(&content).map_err(|source| SettingsLoadError::Parse {
        path: path.clone(),
        source,
    })?;

    let mut settings = settings.apply_env_overrides()?;
    settings.expand_paths();
    settings.module = module.to_string();
    settings.path = Some(path);
    debug!(module, apps = ?settings.installed_apps, "settings loaded");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("settings", "settings.toml")]
    #[case("mysite.settings", "mysite/settings.toml")]
    #[case("a.b.c", "a/b/c.toml")]
    fn given_module_when_module_path_then_maps_segments(#[case] module: &str, #[case] rel: &str) {
        let path = module_path(module, Path::new("/base")).unwrap();
        assert_eq!(path, Path::new("/base").join(rel));
    }

    #[rstest]
    #[case("")]
    #[case("bad..module")]
    #[case("1st")]
    #[case("../etc/passwd")]
    fn given_invalid_module_when_module_path_then_error(#[case] module: &str) {
        let err = module_path(module, Path::new("/base")).unwrap_err();
        assert!(matches!(err, SettingsLoadError::InvalidModuleName(_)));
    }

    #[test]
    fn given_extra_keys_when_get_then_descends_tables() {
        let settings = Settings::from_toml(
            r#"
installed_apps = ["blog"]
debug = true

[database]
name = "site.db"
"#,
        )
        .unwrap();
        assert_eq!(settings.installed_apps, ["blog"]);
        assert_eq!(settings.get("debug").and_then(toml::Value::as_bool), Some(true));
        assert_eq!(
            settings.get("database.name").and_then(toml::Value::as_str),
            Some("site.db")
        );
        assert!(settings.get("database.missing").is_none());
        assert!(settings.get("installed_apps").is_none());
    }

    #[test]
    fn given_empty_env_module_when_new_then_falls_back_to_default() {
        let locator = SettingsLocator::new(Some(String::new()), "/tmp");
        assert_eq!(locator.module(), DEFAULT_SETTINGS_MODULE);
    }
}
