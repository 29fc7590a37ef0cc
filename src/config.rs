use directories::ProjectDirs;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config directory not found")]
    NoConfigDir,
    #[error("config file not found at {0}")]
    NotFound(PathBuf),
    #[error("failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("validation failed: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub tmdb: Option<TmdbConfig>,
    #[serde(default)]
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbConfig {
    pub apikey: String,
}

/// How to hand embed URLs to the outside world. Playback happens in the
/// user's browser; the command just has to open a URL.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_browser_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            command: default_browser_command(),
            args: Vec::new(),
        }
    }
}

fn default_browser_command() -> String {
    if cfg!(target_os = "macos") {
        "open".to_string()
    } else if cfg!(target_os = "windows") {
        "explorer".to_string()
    } else {
        "xdg-open".to_string()
    }
}

impl Config {
    /// Load the config file, falling back to defaults when it doesn't exist.
    /// Nothing in the config is mandatory, so a missing file is not an
    /// error; a malformed one is.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        match Self::load_from(&path) {
            Err(ConfigError::NotFound(_)) => {
                info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.clone()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("", "", "flickstream")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tmdb) = &self.tmdb
            && tmdb.apikey.is_empty()
        {
            return Err(ConfigError::ValidationError(
                "tmdb.apikey cannot be empty".to_string(),
            ));
        }

        if self.browser.command.is_empty() {
            return Err(ConfigError::ValidationError(
                "browser.command cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn tmdb_apikey(&self) -> Option<&str> {
        self.tmdb.as_ref().map(|t| t.apikey.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_full_config() {
        let (_dir, path) = write_config(
            r#"
[tmdb]
apikey = "secret"

[browser]
command = "firefox"
args = ["--new-window"]
"#,
        );

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.tmdb_apikey(), Some("secret"));
        assert_eq!(config.browser.command, "firefox");
        assert_eq!(config.browser.args, vec!["--new-window"]);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let (_dir, path) = write_config("");
        let config = Config::load_from(&path).unwrap();
        assert!(config.tmdb.is_none());
        assert!(!config.browser.command.is_empty());
    }

    #[test]
    fn test_empty_apikey_fails_validation() {
        let (_dir, path) = write_config("[tmdb]\napikey = \"\"\n");
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::NotFound(_))
        ));
    }
}
