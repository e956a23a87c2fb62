// libs/notification-cell/src/services/slack.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use shared_config::{AppConfig, SlackConfig};
use shared_models::SniperError;

use crate::models::{FormattedAppointment, MessageTemplate};
use crate::services::channel::{ensure_success, transport_error, NotificationChannel};

pub const SLACK: &str = "slack";

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack `chat.postMessage` with a bot token.
pub struct SlackChannel {
    client: Client,
    api_url: String,
    api_token: String,
    channel: String,
    template: MessageTemplate,
}

impl SlackChannel {
    pub fn new(client: Client, config: &SlackConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            channel: config.channel.clone(),
            template: MessageTemplate::new(config.message_template.clone()),
        }
    }

    pub fn from_config(config: &AppConfig, client: Client) -> Result<Self, SniperError> {
        let slack = config.slack.as_ref().ok_or_else(|| {
            SniperError::Configuration("slack selected but no slack section configured".to_string())
        })?;
        Ok(Self::new(client, slack))
    }
}

#[async_trait]
impl NotificationChannel for SlackChannel {
    fn name(&self) -> &str {
        SLACK
    }

    async fn send(&self, appointment: &FormattedAppointment) -> Result<(), SniperError> {
        let url = format!("{}/api/chat.postMessage", self.api_url);
        let text = self.template.render(appointment, None);
        debug!(channel = %self.channel, "Posting Slack message");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&PostMessageRequest {
                channel: &self.channel,
                text: &text,
            })
            .send()
            .await
            .map_err(|e| transport_error(SLACK, e))?;

        // Slack reports most failures with a 200 and `"ok": false`.
        let body: PostMessageResponse = ensure_success(SLACK, response)
            .await?
            .json()
            .await
            .map_err(|e| SniperError::notification(SLACK, format!("Malformed response: {}", e)))?;

        if !body.ok {
            return Err(SniperError::notification(
                SLACK,
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(())
    }
}
