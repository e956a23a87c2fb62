// libs/notification-cell/src/services/registry.rs
use std::collections::BTreeMap;

use reqwest::Client;
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_models::SniperError;

use crate::services::channel::NotificationChannel;
use crate::services::pushbullet::{PushbulletChannel, PUSHBULLET};
use crate::services::pushover::{PushoverChannel, PUSHOVER};
use crate::services::slack::{SlackChannel, SLACK};

pub type ChannelConstructor =
    fn(&AppConfig, Client) -> Result<Box<dyn NotificationChannel>, SniperError>;

/// Maps channel identifiers to constructors. The active set is built once,
/// from `luxmedsniper.notification_provider`.
pub struct ChannelRegistry {
    constructors: BTreeMap<String, ChannelConstructor>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PUSHOVER, build_pushover);
        registry.register(SLACK, build_slack);
        registry.register(PUSHBULLET, build_pushbullet);
        registry
    }

    pub fn register(&mut self, name: &str, constructor: ChannelConstructor) {
        if self.constructors.insert(name.to_string(), constructor).is_some() {
            warn!("Channel constructor for '{}' replaced", name);
        }
    }

    pub fn known_channels(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Build every configured channel. Unknown identifiers and channels
    /// without their configuration section are configuration errors.
    pub fn build(&self, config: &AppConfig) -> Result<Vec<Box<dyn NotificationChannel>>, SniperError> {
        let client = Client::builder()
            .build()
            .map_err(|e| SniperError::Configuration(format!("Cannot build HTTP client: {}", e)))?;

        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();
        for requested in &config.luxmedsniper.notification_provider {
            let name = requested.trim().to_lowercase();

            if channels.iter().any(|c| c.name() == name) {
                warn!("Notification provider '{}' listed twice, ignoring duplicate", name);
                continue;
            }

            let constructor = self.constructors.get(&name).ok_or_else(|| {
                SniperError::Configuration(format!(
                    "Unknown notification provider '{}' (known: {})",
                    requested,
                    self.known_channels().join(", ")
                ))
            })?;

            channels.push(constructor(config, client.clone())?);
            info!("Notification provider '{}' enabled", name);
        }

        Ok(channels)
    }
}

fn build_pushover(config: &AppConfig, client: Client) -> Result<Box<dyn NotificationChannel>, SniperError> {
    Ok(Box::new(PushoverChannel::from_config(config, client)?))
}

fn build_slack(config: &AppConfig, client: Client) -> Result<Box<dyn NotificationChannel>, SniperError> {
    Ok(Box::new(SlackChannel::from_config(config, client)?))
}

fn build_pushbullet(config: &AppConfig, client: Client) -> Result<Box<dyn NotificationChannel>, SniperError> {
    Ok(Box::new(PushbulletChannel::from_config(config, client)?))
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
