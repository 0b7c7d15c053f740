//! Bot configuration.
//!
//! This module defines the configuration object that is passed explicitly to
//! every operation (there is no process-wide client or settings singleton),
//! plus the optional TOML overrides file.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("Failed to parse '{path}': {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Validation error in the configuration.
    #[error("Invalid configuration: {message}")]
    ValidationError { message: String },

    /// No token available in the environment.
    #[error("No GitHub token found; set GITHUB_TOKEN (or GITHUB_PAT)")]
    MissingToken,
}

/// Optional overrides parsed from a `copier-update-bot.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct FileOverrides {
    search_marker: Option<String>,
    answers_file: Option<String>,
    template_url: Option<String>,
    git_user_name: Option<String>,
    git_user_email: Option<String>,
    clone_login: Option<String>,
    copier_program: Option<String>,
}

/// Configuration for a full bot run.
///
/// Constructed with [`BotConfig::new`] for the stock `copier-python` setup,
/// optionally overridden from a TOML file with [`BotConfig::from_toml`].
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Marker string recorded in every downstream answers file.
    pub search_marker: String,

    /// File name the marker must appear in (e.g., ".copier-answers.yml").
    pub answers_file: String,

    /// URL of the template repository, referenced in PR bodies.
    pub template_url: String,

    /// Author name used for update commits.
    pub git_user_name: String,

    /// Author email used for update commits.
    pub git_user_email: String,

    /// Login substituted into authenticated clone URLs.
    pub clone_login: String,

    /// Program name for the template tool (normally "copier").
    pub copier_program: String,

    /// GitHub token used for API calls and authenticated pushes.
    token: String,
}

impl BotConfig {
    /// Creates a configuration with the stock `copier-python` defaults.
    pub fn new(token: String) -> Self {
        Self {
            search_marker: "gh:dfm/copier-python".to_string(),
            answers_file: ".copier-answers.yml".to_string(),
            template_url: "https://github.com/dfm/copier-python".to_string(),
            git_user_name: "Dan F-M".to_string(),
            git_user_email: "dfm@dfm.io".to_string(),
            clone_login: "dfm".to_string(),
            copier_program: "copier".to_string(),
            token,
        }
    }

    /// Loads configuration overrides from a TOML file on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or if
    /// the resulting configuration fails validation.
    pub fn from_toml(path: &Path, token: String) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading configuration overrides");

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let overrides: FileOverrides =
            toml::from_str(&content).map_err(|e| ConfigError::TomlError {
                path: path.display().to_string(),
                source: e,
            })?;

        let mut config = Self::new(token);
        if let Some(v) = overrides.search_marker {
            config.search_marker = v;
        }
        if let Some(v) = overrides.answers_file {
            config.answers_file = v;
        }
        if let Some(v) = overrides.template_url {
            config.template_url = v;
        }
        if let Some(v) = overrides.git_user_name {
            config.git_user_name = v;
        }
        if let Some(v) = overrides.git_user_email {
            config.git_user_email = v;
        }
        if let Some(v) = overrides.clone_login {
            config.clone_login = v;
        }
        if let Some(v) = overrides.copier_program {
            config.copier_program = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Returns the configured GitHub token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_marker.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "search-marker must not be empty".to_string(),
            });
        }

        if self.answers_file.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "answers-file must not be empty".to_string(),
            });
        }

        if self.answers_file.contains('/') || self.answers_file.contains('\\') {
            return Err(ConfigError::ValidationError {
                message: "answers-file must not contain path separators".to_string(),
            });
        }

        if Url::parse(&self.template_url).is_err() {
            return Err(ConfigError::ValidationError {
                message: format!("template-url is not a valid URL: {}", self.template_url),
            });
        }

        Ok(())
    }
}

/// Reads the GitHub token from the environment.
///
/// Checks `GITHUB_TOKEN` first, then `GITHUB_PAT` for compatibility with the
/// original automation.
///
/// # Errors
///
/// Returns [`ConfigError::MissingToken`] if neither variable is set.
pub fn token_from_env() -> Result<String, ConfigError> {
    std::env::var("GITHUB_TOKEN")
        .or_else(|_| std::env::var("GITHUB_PAT"))
        .map_err(|_| ConfigError::MissingToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let config = BotConfig::new("token".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.search_marker, "gh:dfm/copier-python");
        assert_eq!(config.answers_file, ".copier-answers.yml");
    }

    #[test]
    fn loads_overrides_from_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("copier-update-bot.toml");
        fs::write(
            &path,
            r#"
search-marker = "gh:other/template"
git-user-name = "Robot"
"#,
        )
        .unwrap();

        let config = BotConfig::from_toml(&path, "token".to_string()).unwrap();

        assert_eq!(config.search_marker, "gh:other/template");
        assert_eq!(config.git_user_name, "Robot");
        // Untouched fields keep their defaults.
        assert_eq!(config.answers_file, ".copier-answers.yml");
    }

    #[test]
    fn rejects_answers_file_with_separator() {
        let mut config = BotConfig::new("token".to_string());
        config.answers_file = "sub/answers.yml".to_string();

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn rejects_invalid_template_url() {
        let mut config = BotConfig::new("token".to_string());
        config.template_url = "not-a-url".to_string();

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn token_falls_back_to_pat() {
        temp_env::with_vars(
            [
                ("GITHUB_TOKEN", None::<&str>),
                ("GITHUB_PAT", Some("legacy-token")),
            ],
            || {
                assert_eq!(token_from_env().unwrap(), "legacy-token");
            },
        );
    }

    #[test]
    fn missing_token_is_an_error() {
        temp_env::with_vars(
            [("GITHUB_TOKEN", None::<&str>), ("GITHUB_PAT", None::<&str>)],
            || {
                assert!(matches!(token_from_env(), Err(ConfigError::MissingToken)));
            },
        );
    }
}
