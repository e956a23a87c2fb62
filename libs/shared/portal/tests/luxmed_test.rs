use assert_matches::assert_matches;
use chrono::NaiveDate;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_models::terms::{TermsQuery, POLISH_LANGUAGE_ID};
use shared_models::SniperError;
use shared_portal::LuxmedClient;
use shared_utils::test_utils::{MockPortalResponses, TestConfig, TestTerm};

fn query() -> TermsQuery {
    TermsQuery {
        city_id: "1".to_string(),
        service_variant_id: "7409".to_string(),
        language_id: POLISH_LANGUAGE_ID,
        search_date_from: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        search_date_to: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
        facilities_ids: Some(vec!["10".to_string()]),
        doctors_ids: None,
    }
}

async fn mount_login(mock_server: &MockServer, expected_logins: u64) {
    Mock::given(method("POST"))
        .and(path("/PatientPortalMobileAPI/api/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=patient%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPortalResponses::token_response()))
        .expect(expected_logins)
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/PatientPortal/Account/LogInToApp"))
        .and(query_param("app", "search"))
        .and(header("Authorization", "test-access-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected_logins)
        .mount(mock_server)
        .await;
}

fn client_for(mock_server: &MockServer) -> LuxmedClient {
    let config = TestConfig::default()
        .with_portal_url(mock_server.uri())
        .to_app_config();
    LuxmedClient::new(&config).expect("client should build")
}

#[tokio::test]
async fn test_get_terms_logs_in_once_and_reuses_session() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, 1).await;

    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    Mock::given(method("GET"))
        .and(path("/PatientPortal/NewPortal/terms/index"))
        .and(query_param("cityId", "1"))
        .and(query_param("serviceVariantId", "7409"))
        .and(query_param("languageId", "10"))
        .and(query_param("searchDateFrom", "2024-03-01"))
        .and(query_param("searchDateTo", "2024-03-08"))
        .and(query_param("facilitiesIds", "10"))
        .and(header("Authorization", "test-access-token"))
        .and(header("x-api-client-identifier", "iPhone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockPortalResponses::terms_response(&[TestTerm::on(day, 8, 30)]),
        ))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    assert!(!client.has_session().await);

    let first = client.get_terms(&query()).await.expect("first search");
    let second = client.get_terms(&query()).await.expect("second search");

    assert_eq!(first.terms().count(), 1);
    assert_eq!(second.terms().next().unwrap().date_time_from, "2024-03-01T08:30:00");
    assert!(client.has_session().await);
}

#[tokio::test]
async fn test_rejected_session_is_an_authentication_error_and_is_dropped() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, 1).await;

    Mock::given(method("GET"))
        .and(path("/PatientPortal/NewPortal/terms/index"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.get_terms(&query()).await;

    assert_matches!(result, Err(SniperError::Authentication(_)));
    assert!(!client.has_session().await);
}

#[tokio::test]
async fn test_server_error_is_a_fetch_error() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, 1).await;

    Mock::given(method("GET"))
        .and(path("/PatientPortal/NewPortal/terms/index"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.get_terms(&query()).await;

    assert_matches!(result, Err(SniperError::Fetch(msg)) if msg.contains("503"));
    assert!(client.has_session().await);
}

#[tokio::test]
async fn test_malformed_payload_is_a_fetch_error() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, 1).await;

    Mock::given(method("GET"))
        .and(path("/PatientPortal/NewPortal/terms/index"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.get_terms(&query()).await;

    assert_matches!(result, Err(SniperError::Fetch(msg)) if msg.contains("Malformed"));
}

#[tokio::test]
async fn test_failed_token_request_never_reaches_terms_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/PatientPortalMobileAPI/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/PatientPortal/NewPortal/terms/index"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPortalResponses::empty_terms_response()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.get_terms(&query()).await;

    assert_matches!(result, Err(SniperError::Authentication(_)));
    assert!(!client.has_session().await);
}

#[tokio::test]
async fn test_login_rejection_is_an_authentication_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/PatientPortalMobileAPI/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPortalResponses::token_response()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/PatientPortal/Account/LogInToApp"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.get_terms(&query()).await;

    assert_matches!(result, Err(SniperError::Authentication(msg)) if msg.contains("cannot log in"));
}
