use thiserror::Error;

#[derive(Error, Debug)]
pub enum SniperError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notification error ({channel}): {message}")]
    Notification { channel: String, message: String },
}

impl SniperError {
    pub fn notification(channel: impl Into<String>, message: impl Into<String>) -> Self {
        SniperError::Notification {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Configuration problems stop the process; everything else only ends
    /// the current cycle (or, for notifications, a single channel attempt).
    pub fn is_fatal(&self) -> bool {
        matches!(self, SniperError::Configuration(_))
    }

    /// Short label used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            SniperError::Configuration(_) => "configuration",
            SniperError::Authentication(_) => "authentication",
            SniperError::Fetch(_) => "fetch",
            SniperError::Storage(_) => "storage",
            SniperError::Notification { .. } => "notification",
        }
    }
}

impl From<std::io::Error> for SniperError {
    fn from(err: std::io::Error) -> Self {
        tracing::debug!("io error converted to storage error: {}", err);
        SniperError::Storage(err.to_string())
    }
}
