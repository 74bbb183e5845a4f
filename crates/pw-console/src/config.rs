use eyre::{bail, Result, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::log_container::{
    is_valid_timestamp_format, DEFAULT_HISTORY_SIZE, DEFAULT_TIMESTAMP_FORMAT,
};

const CONFIG_FILE_NAME: &str = ".pw_console.toml";
const HISTORY_FILE_NAME: &str = ".pw_console_history";
const LOG_HISTORY_ENV: &str = "PW_CONSOLE_LOG_HISTORY";

/// User settings read from a TOML file. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Maximum number of lines kept by the log pane.
    pub log_history_size: usize,
    /// `chrono` format string for the timestamp column.
    pub timestamp_format: String,
    pub vertical_split: bool,
    pub wrap_lines: bool,
    /// REPL input history; `None` keeps history in memory only.
    pub history_file: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            log_history_size: DEFAULT_HISTORY_SIZE,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            vertical_split: false,
            wrap_lines: true,
            history_file: dirs::home_dir().map(|home| home.join(HISTORY_FILE_NAME)),
        }
    }
}

impl ConsoleConfig {
    /// Reads `path` if it exists, otherwise starts from the defaults. The
    /// `PW_CONSOLE_LOG_HISTORY` environment variable is applied last.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
            Self::from_toml(&contents)
                .wrap_err_with(|| format!("Invalid config file {}", path.display()))?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        if let Some(size) = log_history_from_env() {
            config.log_history_size = size;
        }
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        if !is_valid_timestamp_format(&config.timestamp_format) {
            bail!(
                "timestamp_format {:?} is not a valid strftime format",
                config.timestamp_format
            );
        }
        Ok(config)
    }

    /// `$PW_ROOT/.pw_console.toml` when `PW_ROOT` is set, else the file in
    /// the current directory.
    pub fn default_path() -> PathBuf {
        match std::env::var_os("PW_ROOT") {
            Some(root) => PathBuf::from(root).join(CONFIG_FILE_NAME),
            None => PathBuf::from(CONFIG_FILE_NAME),
        }
    }
}

fn log_history_from_env() -> Option<usize> {
    std::env::var(LOG_HISTORY_ENV)
        .ok()
        .and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConsoleConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
        assert!(config.wrap_lines);
        assert!(!config.vertical_split);
    }

    #[test]
    fn partial_file_overrides_given_keys() {
        let config = ConsoleConfig::from_toml(
            r#"
            log_history_size = 50
            vertical_split = true
            history_file = "/tmp/hist"
            "#,
        )
        .unwrap();
        assert_eq!(config.log_history_size, 50);
        assert!(config.vertical_split);
        assert!(config.wrap_lines);
        assert_eq!(config.history_file, Some(PathBuf::from("/tmp/hist")));
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "log_history_size = \"lots\"").unwrap();
        let err = ConsoleConfig::load(&path).unwrap_err();
        let message = format!("{:?}", err);
        assert!(message.contains("bad.toml"), "Got:\n{message}");

        std::fs::write(&path, "colour = true").unwrap();
        assert!(ConsoleConfig::load(&path).is_err());
    }

    #[test]
    fn bad_timestamp_format_is_rejected() {
        let err = ConsoleConfig::from_toml(r#"timestamp_format = "%H:%Q""#).unwrap_err();
        let message = format!("{:?}", err);
        assert!(message.contains("timestamp_format"), "Got:\n{message}");

        let config = ConsoleConfig::from_toml(r#"timestamp_format = "%H:%M""#).unwrap();
        assert_eq!(config.timestamp_format, "%H:%M");
    }
}
