use assert_matches::assert_matches;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::AppointmentSlot;
use notification_cell::{
    FormattedAppointment, NotificationChannel, PushbulletChannel, PushoverChannel, SlackChannel,
};
use shared_models::SniperError;
use shared_utils::test_utils::{TestConfig, TEST_DATE_FORMAT};

const RENDERED: &str = "2024-03-01 08:30 | LX Krakow - Centrum | Dr. Smith";

fn appointment() -> FormattedAppointment {
    let slot = AppointmentSlot {
        appointment_at: NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap(),
        clinic_id: 10,
        clinic_public_name: "LX Krakow - Centrum".to_string(),
        doctor_id: 100,
        doctor_name: "Dr. Smith".to_string(),
        service_id: 2,
    };
    FormattedAppointment::from_slot(&slot, TEST_DATE_FORMAT).unwrap()
}

#[tokio::test]
async fn test_pushover_posts_form_message() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_channel_url(mock_server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/1/messages.json"))
        .and(body_string_contains("token=test-pushover-token"))
        .and(body_string_contains("user=test-user-key"))
        .and(body_string_contains("title=New+appointment"))
        .and(body_string_contains("message=2024-03-01+08%3A30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 1, "request": "abc" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let channel = PushoverChannel::from_config(&config, Client::new()).unwrap();
    assert_eq!(channel.name(), "pushover");
    channel.send(&appointment()).await.expect("pushover send");
}

#[tokio::test]
async fn test_pushover_rejection_is_a_notification_error() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_channel_url(mock_server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/1/messages.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "status": 0, "errors": ["application token is invalid"] })))
        .mount(&mock_server)
        .await;

    let channel = PushoverChannel::from_config(&config, Client::new()).unwrap();
    let result = channel.send(&appointment()).await;

    assert_matches!(result, Err(SniperError::Notification { channel, message })
        if channel == "pushover" && message.contains("400"));
}

#[tokio::test]
async fn test_slack_posts_json_with_bearer_token() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_channel_url(mock_server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/api/chat.postMessage"))
        .and(header("Authorization", "Bearer xoxb-test"))
        .and(body_json(json!({ "channel": "#visits", "text": RENDERED })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "ts": "1.2" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let channel = SlackChannel::from_config(&config, Client::new()).unwrap();
    channel.send(&appointment()).await.expect("slack send");
}

#[tokio::test]
async fn test_slack_ok_false_is_a_notification_error() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_channel_url(mock_server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/api/chat.postMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": false, "error": "channel_not_found" })))
        .mount(&mock_server)
        .await;

    let channel = SlackChannel::from_config(&config, Client::new()).unwrap();
    let result = channel.send(&appointment()).await;

    assert_matches!(result, Err(SniperError::Notification { message, .. }) if message == "channel_not_found");
}

#[tokio::test]
async fn test_pushbullet_pushes_note() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_channel_url(mock_server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/v2/pushes"))
        .and(header("Access-Token", "test-pushbullet-token"))
        .and(body_json(json!({ "type": "note", "title": "New appointment", "body": RENDERED })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "active": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let channel = PushbulletChannel::from_config(&config, Client::new()).unwrap();
    channel.send(&appointment()).await.expect("pushbullet send");
}

#[tokio::test]
async fn test_unreachable_channel_is_a_notification_error() {
    let config = TestConfig::default()
        .with_channel_url("http://127.0.0.1:9")
        .to_app_config();

    let channel = PushbulletChannel::from_config(&config, Client::new()).unwrap();
    let result = channel.send(&appointment()).await;

    assert_matches!(result, Err(SniperError::Notification { channel, .. }) if channel == "pushbullet");
}
