use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, time};

use config::{Config, ConfigError, Environment, File};
use reqwest::cookie::Jar;
use url::{ParseError, Url};

use crate::logout::LogoutSettings;
use crate::logout_client::{BuildError, LogoutClient};

/// Settings
#[derive(Clone, serde::Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub logout: LogoutSection,
    pub storage: StorageSettings,
}

impl Settings {
    /// Get settings from the `configuration` directory under the current directory
    pub fn get_config() -> Result<Self, ConfigError> {
        let path = env::current_dir().expect("Failed to determine the current directory");
        Self::get_config_from(path.join("configuration"))
    }

    /// Get settings from configuration files in `config_dir` and environment variables
    pub fn get_config_from(config_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        // Detect the running environment (default: `dev`)
        let env: Env = env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "dev".into())
            .try_into()
            .map_err(ConfigError::Message)?;

        let env_file = config_dir.join(format!("{}.yaml", env.as_str()));

        // Read the configuration from files and environment variables
        Config::builder()
            // Base configuration file
            .add_source(File::from(config_dir.join("base.yaml")).required(true))
            // Environment-specific configuration file
            .add_source(File::from(env_file).required(true))
            // Environment variables (e.g., `SESSION_LOGOUT__LOGOUT__TIMEOUT_MILLIS=500`
            // would set Settings.logout.timeout_millis to 500)
            .add_source(Environment::with_prefix("SESSION_LOGOUT").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Build the logout client, sending the cookies in `cookie_jar` along with the request
    pub fn logout_client(&self, cookie_jar: Option<Arc<Jar>>) -> Result<LogoutClient, BuildError> {
        LogoutClient::new(
            &self.application.base_url()?,
            &self.logout.endpoint,
            &self.logout.csrf_header,
            self.logout.timeout(),
            cookie_jar,
        )
    }

    /// Settings for the logout handler
    pub fn logout_settings(&self) -> LogoutSettings {
        LogoutSettings {
            control_id: self.logout.control_id.clone(),
            csrf_cookie: self.logout.csrf_cookie.clone(),
            login_page: self.logout.login_page.clone(),
            token_keys: self.storage.token_keys.clone(),
            alert_prefix: self.logout.alert_prefix.clone(),
        }
    }
}

/// Application settings
#[derive(Clone, serde::Deserialize)]
pub struct ApplicationSettings {
    pub base_url: String,
}

impl ApplicationSettings {
    /// Parse base URL
    pub fn base_url(&self) -> Result<Url, ParseError> {
        Url::parse(&self.base_url)
    }
}

/// Logout control settings
#[derive(Clone, serde::Deserialize)]
pub struct LogoutSection {
    pub endpoint: String,
    pub login_page: String,
    pub csrf_cookie: String,
    pub csrf_header: String,
    pub control_id: String,
    pub alert_prefix: String,
    pub timeout_millis: u64,
}

impl LogoutSection {
    /// Get configured timeout
    pub const fn timeout(&self) -> time::Duration {
        time::Duration::from_millis(self.timeout_millis)
    }
}

/// Token storage settings
#[derive(Clone, serde::Deserialize)]
pub struct StorageSettings {
    pub token_file: PathBuf,
    pub token_keys: Vec<String>,
}

/// Available runtime environments
#[derive(Debug)]
pub enum Env {
    Development,
    Production,
}

impl Env {
    /// Represent environment as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "dev",
            Self::Production => "prd",
        }
    }
}

impl TryFrom<String> for Env {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "dev" => Ok(Self::Development),
            "prd" => Ok(Self::Production),
            other => Err(format!(
                "`{other}` is not a supported environment. Use either `dev` or `prd`"
            )),
        }
    }
}
