use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use shared_models::SniperError;

pub const DEFAULT_PORTAL_URL: &str = "https://portalpacjenta.luxmed.pl";
pub const DEFAULT_PUSHOVER_URL: &str = "https://api.pushover.net";
pub const DEFAULT_SLACK_URL: &str = "https://slack.com";
pub const DEFAULT_PUSHBULLET_URL: &str = "https://api.pushbullet.com";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub luxmed: LuxmedConfig,
    pub luxmedsniper: SniperConfig,
    #[serde(default)]
    pub pushover: Option<PushoverConfig>,
    #[serde(default)]
    pub slack: Option<SlackConfig>,
    #[serde(default)]
    pub pushbullet: Option<PushbulletConfig>,
    pub misc: MiscConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LuxmedConfig {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_portal_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SniperConfig {
    pub doctor_locator_id: String,
    #[serde(default)]
    pub excluded_facilities: Vec<String>,
    #[serde(default)]
    pub excluded_doctors: Vec<String>,
    pub lookup_time_days: u32,
    #[serde(default)]
    pub notification_provider: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushoverConfig {
    pub user_key: String,
    pub api_token: String,
    pub message_template: String,
    pub title: String,
    #[serde(default = "default_pushover_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    pub api_token: String,
    pub channel: String,
    pub message_template: String,
    #[serde(default = "default_slack_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushbulletConfig {
    pub access_token: String,
    pub message_template: String,
    pub title: String,
    #[serde(default = "default_pushbullet_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MiscConfig {
    pub notifydb: PathBuf,
    pub date_format: String,
}

fn default_portal_url() -> String {
    DEFAULT_PORTAL_URL.to_string()
}

fn default_pushover_url() -> String {
    DEFAULT_PUSHOVER_URL.to_string()
}

fn default_slack_url() -> String {
    DEFAULT_SLACK_URL.to_string()
}

fn default_pushbullet_url() -> String {
    DEFAULT_PUSHBULLET_URL.to_string()
}

impl AppConfig {
    /// Load, override from the environment and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SniperError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SniperError> {
        let path = expand_home(path.as_ref());
        debug!("Reading configuration from {}", path.display());

        let raw = fs::read_to_string(&path).map_err(|e| {
            SniperError::Configuration(format!(
                "Cannot open configuration file ({}): {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, SniperError> {
        let mut config: AppConfig = serde_yaml::from_str(raw)
            .map_err(|e| SniperError::Configuration(format!("Configuration problem: {}", e)))?;
        config.misc.notifydb = expand_home(&config.misc.notifydb);
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Credentials may come from the environment (or a `.env` file) instead
    /// of living in the YAML.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(email) = lookup("LUXMED_EMAIL").filter(|v| !v.is_empty()) {
            debug!("LUXMED_EMAIL set, overriding configured email");
            self.luxmed.email = email;
        }
        if let Some(password) = lookup("LUXMED_PASSWORD").filter(|v| !v.is_empty()) {
            debug!("LUXMED_PASSWORD set, overriding configured password");
            self.luxmed.password = password;
        }
    }

    pub fn validate(&self) -> Result<(), SniperError> {
        if !self.is_configured() {
            return Err(SniperError::Configuration(
                "luxmed.email and luxmed.password are required".to_string(),
            ));
        }

        if self.luxmedsniper.doctor_locator_id.trim().is_empty() {
            return Err(SniperError::Configuration(
                "luxmedsniper.doctor_locator_id is required".to_string(),
            ));
        }

        validate_date_format(&self.misc.date_format)?;

        if self.luxmedsniper.notification_provider.is_empty() {
            warn!("No notification providers configured, matches will only be logged");
        }

        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        !self.luxmed.email.is_empty() && !self.luxmed.password.is_empty()
    }
}

/// Rejects strftime strings chrono cannot render for a naive timestamp.
/// Offset fields like `%z` parse fine but fail at render time, so a fixed
/// timestamp is rendered once here instead of on every cycle.
pub fn validate_date_format(format: &str) -> Result<(), SniperError> {
    if format.is_empty() {
        return Err(SniperError::Configuration("misc.date_format is empty".to_string()));
    }

    let invalid = || {
        SniperError::Configuration(format!(
            "misc.date_format is not a valid strftime format: {}",
            format
        ))
    };

    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }

    let sample = NaiveDate::from_ymd_opt(2024, 1, 31)
        .and_then(|day| day.and_hms_opt(12, 30, 0))
        .ok_or_else(invalid)?;
    let mut rendered = String::new();
    write!(rendered, "{}", sample.format(format)).map_err(|_| invalid())?;

    Ok(())
}

pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => {
                warn!("Home directory unknown, leaving {} unexpanded", path.display());
                path.to_path_buf()
            }
        },
        Err(_) => path.to_path_buf(),
    }
}
