use serde::Deserialize;
use thiserror::Error;

use crate::oauth2::{GrantType, ServerConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,
    #[serde(default = "default_cookie_lifetime")]
    pub lifetime_seconds: i64,
    /// Adds the `Secure` attribute to the session cookie.
    #[serde(default)]
    pub secure_only: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            lifetime_seconds: default_cookie_lifetime(),
            secure_only: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_minimum_username_length")]
    pub minimum_username_length: usize,
    #[serde(default = "default_minimum_password_length")]
    pub minimum_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            minimum_username_length: default_minimum_username_length(),
            minimum_password_length: default_minimum_password_length(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct OAuth2Config {
    #[serde(default = "default_access_token_lifetime")]
    pub access_token_lifetime_seconds: i64,
    #[serde(default = "default_allowed_grant_types")]
    pub allowed_grant_types: Vec<GrantType>,
}

impl Default for OAuth2Config {
    fn default() -> Self {
        Self {
            access_token_lifetime_seconds: default_access_token_lifetime(),
            allowed_grant_types: default_allowed_grant_types(),
        }
    }
}

impl OAuth2Config {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            access_token_lifetime: time::Duration::seconds(self.access_token_lifetime_seconds),
            allowed_grant_types: self.allowed_grant_types.clone(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// Apply pending migrations before serving.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
    #[serde(default)]
    pub cookies: CookieConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub oauth2: OAuth2Config,
}

fn default_cookie_name() -> String {
    "todocookie".to_string()
}

fn default_cookie_lifetime() -> i64 {
    86_400
}

fn default_minimum_username_length() -> usize {
    4
}

fn default_minimum_password_length() -> usize {
    8
}

fn default_access_token_lifetime() -> i64 {
    3_600
}

fn default_allowed_grant_types() -> Vec<GrantType> {
    vec![GrantType::ClientCredentials]
}

fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// A config for `database_url` with every other value defaulted.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            listen_address: default_listen_address(),
            run_migrations: true,
            cookies: CookieConfig::default(),
            auth: AuthConfig::default(),
            oauth2: OAuth2Config::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Validation("database_url must be set".into()));
        }
        if self.cookies.name.trim().is_empty() {
            return Err(ConfigError::Validation("cookies.name must be set".into()));
        }
        if self.cookies.lifetime_seconds <= 0 {
            return Err(ConfigError::Validation(
                "cookies.lifetime_seconds must be > 0".into(),
            ));
        }
        if self.auth.minimum_username_length == 0 || self.auth.minimum_password_length == 0 {
            return Err(ConfigError::Validation(
                "auth minimum lengths must be > 0".into(),
            ));
        }
        if self.oauth2.access_token_lifetime_seconds <= 0 {
            return Err(ConfigError::Validation(
                "oauth2.access_token_lifetime_seconds must be > 0".into(),
            ));
        }
        if self
            .oauth2
            .allowed_grant_types
            .contains(&GrantType::PasswordCredentials)
        {
            return Err(ConfigError::Validation(
                "oauth2.allowed_grant_types may not include password".into(),
            ));
        }
        Ok(())
    }
}

/// Load application configuration from an optional `config.yaml` plus
/// environment overrides.
///
/// Any environment variable matching the key path separated by double
/// underscores (e.g. `COOKIES__SECURE_ONLY`) overrides the file value.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from("config.yaml")
}

pub fn load_config_from(path: &str) -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::with_database_url("sqlite::memory:");
        assert!(config.validate().is_ok());
        assert_eq!(config.cookies.name, "todocookie");
        assert_eq!(config.listen_address, "0.0.0.0:8080");
        assert_eq!(
            config.oauth2.allowed_grant_types,
            vec![GrantType::ClientCredentials]
        );
    }

    #[test]
    fn password_grant_is_refused() {
        let mut config = AppConfig::with_database_url("sqlite::memory:");
        config.oauth2.allowed_grant_types.push(GrantType::PasswordCredentials);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn lifetimes_must_be_positive() {
        let mut config = AppConfig::with_database_url("sqlite::memory:");
        config.cookies.lifetime_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::with_database_url("sqlite::memory:");
        config.oauth2.access_token_lifetime_seconds = -5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_database_url_is_refused() {
        assert!(AppConfig::with_database_url(" ").validate().is_err());
    }

    #[test]
    fn server_config_carries_lifetime() {
        let config = OAuth2Config::default();
        assert_eq!(
            config.server_config().access_token_lifetime,
            time::Duration::hours(1)
        );
    }
}
