// libs/notification-cell/src/services/pushover.rs
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use shared_config::{AppConfig, PushoverConfig};
use shared_models::SniperError;

use crate::models::{FormattedAppointment, MessageTemplate};
use crate::services::channel::{ensure_success, transport_error, NotificationChannel};

pub const PUSHOVER: &str = "pushover";

/// Pushover messages API.
/// Based on: https://pushover.net/api
pub struct PushoverChannel {
    client: Client,
    api_url: String,
    api_token: String,
    user_key: String,
    title: String,
    template: MessageTemplate,
}

impl PushoverChannel {
    pub fn new(client: Client, config: &PushoverConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            user_key: config.user_key.clone(),
            title: config.title.clone(),
            template: MessageTemplate::new(config.message_template.clone()),
        }
    }

    pub fn from_config(config: &AppConfig, client: Client) -> Result<Self, SniperError> {
        let pushover = config.pushover.as_ref().ok_or_else(|| {
            SniperError::Configuration("pushover selected but no pushover section configured".to_string())
        })?;
        Ok(Self::new(client, pushover))
    }
}

#[async_trait]
impl NotificationChannel for PushoverChannel {
    fn name(&self) -> &str {
        PUSHOVER
    }

    async fn send(&self, appointment: &FormattedAppointment) -> Result<(), SniperError> {
        let url = format!("{}/1/messages.json", self.api_url);
        let message = self.template.render(appointment, Some(&self.title));
        debug!("Sending Pushover message to {}", url);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("token", self.api_token.as_str()),
                ("user", self.user_key.as_str()),
                ("title", self.title.as_str()),
                ("message", message.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(PUSHOVER, e))?;

        ensure_success(PUSHOVER, response).await?;
        Ok(())
    }
}
