use rand::Rng;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, ORIGIN, USER_AGENT},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AccessTokenResponse, PasswordGrantRequest};
use shared_models::terms::{TermsForServiceResponse, TermsQuery};
use shared_models::SniperError;

pub const APP_VERSION: &str = "4.19.0";

const TOKEN_PATH: &str = "/PatientPortalMobileAPI/api/token";
const LOGIN_PATH: &str = "/PatientPortal/Account/LogInToApp";
const TERMS_PATH: &str = "/PatientPortal/NewPortal/terms/index";

/// HTTP session with the LuxMed patient portal.
///
/// Logs in lazily on the first request and reuses the access token until the
/// portal rejects it; a 401/403 drops the session so the next call logs in
/// again.
pub struct LuxmedClient {
    client: Client,
    base_url: String,
    email: String,
    password: String,
    access_token: Mutex<Option<String>>,
}

impl LuxmedClient {
    pub fn new(config: &AppConfig) -> Result<Self, SniperError> {
        let client = Client::builder()
            .default_headers(Self::default_headers(&config.luxmed.base_url)?)
            .build()
            .map_err(|e| SniperError::Configuration(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.luxmed.base_url.trim_end_matches('/').to_string(),
            email: config.luxmed.email.clone(),
            password: config.luxmed.password.clone(),
            access_token: Mutex::new(None),
        })
    }

    // The portal only answers clients that look like its mobile app.
    fn default_headers(base_url: &str) -> Result<HeaderMap, SniperError> {
        let mut headers = HeaderMap::new();

        headers.insert(ORIGIN, header_value(base_url.trim_end_matches('/'))?);
        headers.insert("x-api-client-identifier", HeaderValue::from_static("iPhone"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert("Custom-User-Agent", header_value(&custom_user_agent())?);
        headers.insert(USER_AGENT, HeaderValue::from_static("okhttp/3.11.0"));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en;q=1.0, en-PL;q=0.9, pl-PL;q=0.8, ru-PL;q=0.7, uk-PL;q=0.6"),
        );

        Ok(headers)
    }

    pub async fn has_session(&self) -> bool {
        self.access_token.lock().await.is_some()
    }

    pub async fn invalidate_session(&self) {
        let mut token = self.access_token.lock().await;
        if token.take().is_some() {
            debug!("Portal session invalidated");
        }
    }

    /// Query the availability endpoint once.
    pub async fn get_terms(&self, query: &TermsQuery) -> Result<TermsForServiceResponse, SniperError> {
        let token = self.ensure_session().await?;

        debug!(
            city_id = %query.city_id,
            service_variant_id = %query.service_variant_id,
            "Searching terms from {} to {}",
            query.search_date_from,
            query.search_date_to
        );

        self.request(Method::GET, TERMS_PATH, &token, &query.to_query_pairs())
            .await
    }

    async fn ensure_session(&self) -> Result<String, SniperError> {
        let mut slot = self.access_token.lock().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }

        let token = self.obtain_access_token().await?;
        self.log_in(&token).await?;
        *slot = Some(token.clone());

        Ok(token)
    }

    async fn obtain_access_token(&self) -> Result<String, SniperError> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        debug!("Requesting access token from {}", url);

        let mut account_id = Uuid::new_v4().to_string();
        account_id.truncate(35);
        let body = PasswordGrantRequest {
            username: self.email.clone(),
            password: self.password.clone(),
            grant_type: "password".to_string(),
            account_id,
            client_id: Uuid::new_v4().to_string(),
        };

        let response = self
            .client
            .post(&url)
            .form(&body)
            .send()
            .await
            .map_err(|e| SniperError::Authentication(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Token endpoint error ({}): {}", status, error_text);
            return Err(SniperError::Authentication(format!(
                "Cannot obtain access token ({})",
                status
            )));
        }

        let token: AccessTokenResponse = response.json().await.map_err(|e| {
            SniperError::Authentication(format!("Malformed token response: {}", e))
        })?;

        info!("Successfully received an access token!");
        Ok(token.access_token)
    }

    async fn log_in(&self, token: &str) -> Result<(), SniperError> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, header_value(token)?)
            .query(&[("app", "search"), ("client", "3"), ("paymentSupported", "true"), ("lang", "pl")])
            .send()
            .await
            .map_err(|e| SniperError::Authentication(format!("Login request failed: {}", e)))?;

        if response.status() != StatusCode::OK {
            error!("Login rejected with status {}", response.status());
            return Err(SniperError::Authentication(
                "Unexpected response code, cannot log in".to_string(),
            ));
        }

        info!("Successfully logged in!");
        Ok(())
    }

    async fn request<T>(
        &self,
        method: Method,
        path: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> Result<T, SniperError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let response = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, header_value(token)?)
            .query(query)
            .send()
            .await
            .map_err(|e| SniperError::Fetch(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Portal error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => {
                    warn!("Portal rejected the session, will log in again next time");
                    self.invalidate_session().await;
                    SniperError::Authentication(format!("Session rejected ({})", status))
                }
                _ => SniperError::Fetch(format!("Portal error ({}): {}", status, error_text)),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SniperError::Fetch(format!("Malformed payload from {}: {}", path, e)))
    }
}

fn header_value(value: &str) -> Result<HeaderValue, SniperError> {
    HeaderValue::from_str(value)
        .map_err(|e| SniperError::Configuration(format!("Invalid header value: {}", e)))
}

fn custom_user_agent() -> String {
    let api_level = rand::thread_rng().gen_range(23..=29);
    format!(
        "Patient Portal; {}; {}; Android; {}; {}",
        APP_VERSION,
        Uuid::new_v4(),
        api_level,
        Uuid::new_v4()
    )
}
