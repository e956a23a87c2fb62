use serde::{Deserialize, Serialize};

/// Body of the portal's password-grant token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordGrantRequest {
    pub username: String,
    pub password: String,
    pub grant_type: String,
    pub account_id: String,
    pub client_id: String,
}
