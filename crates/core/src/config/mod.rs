//! Build configuration.
//!
//! Values come from three layers, later layers overriding earlier ones:
//!
//! 1. `toolrun.toml` (`[paths] tools = "..."` becomes the key `paths_tools`)
//! 2. environment variables prefixed with `TOOLRUN_` (`TOOLRUN_PATHS_TOOLS`)
//! 3. explicit overrides set through [`BuildConfiguration::set`]
//!
//! Keys are case-insensitive.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Key of the tools-directory override.
pub const TOOLS_PATH_KEY: &str = "paths_tools";

/// Prefix of environment variables that feed the configuration.
pub const ENV_PREFIX: &str = "TOOLRUN_";

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "toolrun.toml";

/// Read-only string settings.
pub trait Configuration: Send + Sync {
    /// Value for `key`, if configured.
    fn get_value(&self, key: &str) -> Option<String>;
}

/// Layered key/value configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfiguration {
    values: BTreeMap<String, String>,
}

impl BuildConfiguration {
    /// Create an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `toolrun.toml` from `working_dir` (if present) and then the
    /// `TOOLRUN_` environment variables of the current process.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(working_dir: &Path) -> Result<Self> {
        let mut config = Self::new();
        let file = working_dir.join(CONFIG_FILE_NAME);
        if file.is_file() {
            config.merge_file(&file)?;
        }
        config.merge_env_vars(std::env::vars_os().filter_map(|(key, value)| {
            // A name that is not Unicode cannot carry the prefix.
            let key = key.into_string().ok()?;
            Some((key, value.to_string_lossy().into_owned()))
        }));
        Ok(config)
    }

    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid TOML or unsupported value types.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config = Self::new();
        config.merge_toml_str(content)?;
        Ok(config)
    }

    /// Merge values from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(e, Some(path.to_path_buf()), "read configuration file")
        })?;
        self.merge_toml_str(&content).map_err(|e| match e {
            Error::Configuration { message } => {
                Error::configuration(format!("{}: {message}", path.display()))
            }
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(())
    }

    /// Merge values from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid TOML or unsupported value types.
    pub fn merge_toml_str(&mut self, content: &str) -> Result<()> {
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("invalid TOML: {e}")))?;
        self.merge_table("", &table)
    }

    fn merge_table(&mut self, prefix: &str, table: &toml::Table) -> Result<()> {
        for (key, value) in table {
            let full_key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}_{key}")
            };
            match value {
                toml::Value::Table(nested) => self.merge_table(&full_key, nested)?,
                toml::Value::String(s) => self.set(&full_key, s.clone()),
                toml::Value::Integer(i) => self.set(&full_key, i.to_string()),
                toml::Value::Float(f) => self.set(&full_key, f.to_string()),
                toml::Value::Boolean(b) => self.set(&full_key, b.to_string()),
                toml::Value::Datetime(d) => self.set(&full_key, d.to_string()),
                toml::Value::Array(_) => {
                    return Err(Error::configuration(format!(
                        "unsupported array value for key '{full_key}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Merge `TOOLRUN_`-prefixed variables; other variables are ignored.
    pub fn merge_env_vars<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in vars {
            let name = name.as_ref();
            if name.len() > ENV_PREFIX.len()
                && name
                    .get(..ENV_PREFIX.len())
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ENV_PREFIX))
            {
                self.set(&name[ENV_PREFIX.len()..], value);
            }
        }
    }

    /// Set a value, replacing any previous value for the key.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    /// Number of configured keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Configuration for BuildConfiguration {
    fn get_value(&self, key: &str) -> Option<String> {
        self.get(key).map(String::from)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}
