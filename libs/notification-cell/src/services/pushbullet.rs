// libs/notification-cell/src/services/pushbullet.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use shared_config::{AppConfig, PushbulletConfig};
use shared_models::SniperError;

use crate::models::{FormattedAppointment, MessageTemplate};
use crate::services::channel::{ensure_success, transport_error, NotificationChannel};

pub const PUSHBULLET: &str = "pushbullet";

#[derive(Debug, Serialize)]
struct NotePush<'a> {
    #[serde(rename = "type")]
    push_type: &'a str,
    title: &'a str,
    body: &'a str,
}

/// Pushbullet note pushes.
pub struct PushbulletChannel {
    client: Client,
    api_url: String,
    access_token: String,
    title: String,
    template: MessageTemplate,
}

impl PushbulletChannel {
    pub fn new(client: Client, config: &PushbulletConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            title: config.title.clone(),
            template: MessageTemplate::new(config.message_template.clone()),
        }
    }

    pub fn from_config(config: &AppConfig, client: Client) -> Result<Self, SniperError> {
        let pushbullet = config.pushbullet.as_ref().ok_or_else(|| {
            SniperError::Configuration("pushbullet selected but no pushbullet section configured".to_string())
        })?;
        Ok(Self::new(client, pushbullet))
    }
}

#[async_trait]
impl NotificationChannel for PushbulletChannel {
    fn name(&self) -> &str {
        PUSHBULLET
    }

    async fn send(&self, appointment: &FormattedAppointment) -> Result<(), SniperError> {
        let url = format!("{}/v2/pushes", self.api_url);
        let body = self.template.render(appointment, Some(&self.title));
        debug!("Pushing note to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Access-Token", &self.access_token)
            .json(&NotePush {
                push_type: "note",
                title: &self.title,
                body: &body,
            })
            .send()
            .await
            .map_err(|e| transport_error(PUSHBULLET, e))?;

        ensure_success(PUSHBULLET, response).await?;
        Ok(())
    }
}
