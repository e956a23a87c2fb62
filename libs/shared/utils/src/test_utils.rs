use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{json, Value};

use shared_config::{
    AppConfig, LuxmedConfig, MiscConfig, PushbulletConfig, PushoverConfig, SlackConfig,
    SniperConfig,
};

pub const TEST_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const TEST_TEMPLATE: &str = "{AppointmentDate} | {ClinicPublicName} | {DoctorName}";

pub struct TestConfig {
    pub portal_url: String,
    pub doctor_locator_id: String,
    pub excluded_facilities: Vec<String>,
    pub lookup_time_days: u32,
    pub notification_provider: Vec<String>,
    pub notifydb: PathBuf,
    pub channel_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            portal_url: "http://localhost:54321".to_string(),
            doctor_locator_id: "1*2*-1*-1".to_string(),
            excluded_facilities: Vec::new(),
            lookup_time_days: 7,
            notification_provider: Vec::new(),
            notifydb: std::env::temp_dir().join("luxmed-sniper-test.json"),
            channel_url: "http://localhost:54322".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_portal_url(mut self, url: impl Into<String>) -> Self {
        self.portal_url = url.into();
        self
    }

    pub fn with_channel_url(mut self, url: impl Into<String>) -> Self {
        self.channel_url = url.into();
        self
    }

    pub fn with_locator(mut self, locator: &str) -> Self {
        self.doctor_locator_id = locator.to_string();
        self
    }

    pub fn with_providers(mut self, providers: &[&str]) -> Self {
        self.notification_provider = providers.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_notifydb(mut self, path: impl Into<PathBuf>) -> Self {
        self.notifydb = path.into();
        self
    }

    /// Every channel block is filled in and points at `channel_url`.
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            luxmed: LuxmedConfig {
                email: "patient@example.com".to_string(),
                password: "test-password".to_string(),
                base_url: self.portal_url.clone(),
            },
            luxmedsniper: SniperConfig {
                doctor_locator_id: self.doctor_locator_id.clone(),
                excluded_facilities: self.excluded_facilities.clone(),
                excluded_doctors: Vec::new(),
                lookup_time_days: self.lookup_time_days,
                notification_provider: self.notification_provider.clone(),
            },
            pushover: Some(PushoverConfig {
                user_key: "test-user-key".to_string(),
                api_token: "test-pushover-token".to_string(),
                message_template: TEST_TEMPLATE.to_string(),
                title: "New appointment".to_string(),
                api_url: self.channel_url.clone(),
            }),
            slack: Some(SlackConfig {
                api_token: "xoxb-test".to_string(),
                channel: "#visits".to_string(),
                message_template: TEST_TEMPLATE.to_string(),
                api_url: self.channel_url.clone(),
            }),
            pushbullet: Some(PushbulletConfig {
                access_token: "test-pushbullet-token".to_string(),
                message_template: TEST_TEMPLATE.to_string(),
                title: "New appointment".to_string(),
                api_url: self.channel_url.clone(),
            }),
            misc: MiscConfig {
                notifydb: self.notifydb.clone(),
                date_format: TEST_DATE_FORMAT.to_string(),
            },
        }
    }
}

/// Builder for a single portal term as it appears in the JSON payload.
#[derive(Debug, Clone)]
pub struct TestTerm {
    pub date_time_from: String,
    pub clinic_id: i64,
    pub clinic: String,
    pub service_id: i64,
    pub doctor_id: i64,
    pub academic_title: String,
    pub first_name: String,
    pub last_name: String,
}

impl TestTerm {
    pub fn at(when: NaiveDateTime) -> Self {
        Self {
            date_time_from: when.format("%Y-%m-%dT%H:%M:%S").to_string(),
            clinic_id: 10,
            clinic: "LX Krakow - Centrum".to_string(),
            service_id: 2,
            doctor_id: 100,
            academic_title: "Dr.".to_string(),
            first_name: String::new(),
            last_name: "Smith".to_string(),
        }
    }

    pub fn on(date: NaiveDate, hour: u32, minute: u32) -> Self {
        let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
        Self::at(date.and_time(time))
    }

    pub fn raw_date(mut self, raw: &str) -> Self {
        self.date_time_from = raw.to_string();
        self
    }

    pub fn clinic(mut self, id: i64, name: &str) -> Self {
        self.clinic_id = id;
        self.clinic = name.to_string();
        self
    }

    pub fn doctor(mut self, id: i64, title: &str, first: &str, last: &str) -> Self {
        self.doctor_id = id;
        self.academic_title = title.to_string();
        self.first_name = first.to_string();
        self.last_name = last.to_string();
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "dateTimeFrom": self.date_time_from,
            "dateTimeTo": self.date_time_from,
            "clinicId": self.clinic_id,
            "clinic": self.clinic,
            "serviceId": self.service_id,
            "isTelemedicine": false,
            "doctor": {
                "id": self.doctor_id,
                "academicTitle": self.academic_title,
                "firstName": self.first_name,
                "lastName": self.last_name,
                "genderId": 1
            }
        })
    }
}

pub struct MockPortalResponses;

impl MockPortalResponses {
    pub fn token_response() -> Value {
        json!({
            "access_token": "test-access-token",
            "refresh_token": "test-refresh-token",
            "token_type": "bearer",
            "expires_in": 3600
        })
    }

    /// Groups terms into day buckets keyed by the date prefix, keeping order.
    pub fn terms_response(terms: &[TestTerm]) -> Value {
        let mut days: Vec<(String, Vec<Value>)> = Vec::new();
        for term in terms {
            let day = term.date_time_from.chars().take(10).collect::<String>();
            match days.last_mut() {
                Some((current, bucket)) if *current == day => bucket.push(term.to_json()),
                _ => days.push((day, vec![term.to_json()])),
            }
        }

        json!({
            "termsForService": {
                "termsForDays": days
                    .into_iter()
                    .map(|(day, terms)| json!({ "day": format!("{}T00:00:00", day), "terms": terms }))
                    .collect::<Vec<_>>()
            }
        })
    }

    pub fn empty_terms_response() -> Value {
        json!({ "termsForService": { "termsForDays": [] } })
    }
}

pub fn payload(terms: &[TestTerm]) -> shared_models::terms::TermsForServiceResponse {
    serde_json::from_value(MockPortalResponses::terms_response(terms))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_are_bucketed_per_day_in_order() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let next = day.succ_opt().unwrap();
        let terms = vec![
            TestTerm::on(day, 8, 0),
            TestTerm::on(day, 9, 0),
            TestTerm::on(next, 8, 0),
        ];

        let parsed = payload(&terms);
        let days = &parsed.terms_for_service.terms_for_days;
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].terms.len(), 2);
        assert_eq!(days[1].terms[0].date_time_from, "2024-03-02T08:00:00");
    }

    #[test]
    fn default_config_is_valid() {
        let config = TestConfig::default().with_providers(&["slack"]).to_app_config();
        assert!(config.validate().is_ok());
    }
}
