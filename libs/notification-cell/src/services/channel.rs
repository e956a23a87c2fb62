use async_trait::async_trait;
use reqwest::Response;

use shared_models::SniperError;

use crate::models::FormattedAppointment;

/// A delivery target for matched appointments.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Identifier used in configuration and logs.
    fn name(&self) -> &str;

    async fn send(&self, appointment: &FormattedAppointment) -> Result<(), SniperError>;
}

/// Turns a non-success HTTP status into a channel error carrying the body.
pub(crate) async fn ensure_success(channel: &str, response: Response) -> Result<Response, SniperError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SniperError::notification(
        channel,
        format!("API error ({}): {}", status, body),
    ))
}

pub(crate) fn transport_error(channel: &str, err: reqwest::Error) -> SniperError {
    SniperError::notification(channel, format!("Request failed: {}", err))
}
