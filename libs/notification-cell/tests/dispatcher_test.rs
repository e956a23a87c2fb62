use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use appointment_cell::AppointmentSlot;
use notification_cell::{FormattedAppointment, NotificationChannel, NotificationDispatcher};
use shared_models::SniperError;

struct FakeChannel {
    name: &'static str,
    fail: bool,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl NotificationChannel for FakeChannel {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(&self, appointment: &FormattedAppointment) -> Result<(), SniperError> {
        self.sent
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, appointment.appointment_date));
        if self.fail {
            return Err(SniperError::notification(self.name, "boom"));
        }
        Ok(())
    }
}

fn slot() -> AppointmentSlot {
    AppointmentSlot {
        appointment_at: NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap(),
        clinic_id: 10,
        clinic_public_name: "LX Krakow - Centrum".to_string(),
        doctor_id: 100,
        doctor_name: "Dr. Smith".to_string(),
        service_id: 2,
    }
}

fn channel(name: &'static str, fail: bool, sent: &Arc<Mutex<Vec<String>>>) -> Box<dyn NotificationChannel> {
    Box::new(FakeChannel {
        name,
        fail,
        sent: Arc::clone(sent),
    })
}

#[tokio::test]
async fn test_failing_channel_does_not_stop_the_others() {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = NotificationDispatcher::new(
        vec![
            channel("first", false, &sent),
            channel("broken", true, &sent),
            channel("last", false, &sent),
        ],
        "%d.%m %H:%M",
    )
    .unwrap();

    let report = dispatcher.notify(&slot()).await.unwrap();

    assert_eq!(
        *sent.lock().unwrap(),
        vec!["first:01.03 08:30", "broken:01.03 08:30", "last:01.03 08:30"]
    );
    assert_eq!(report.delivered, vec!["first", "last"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "broken");
    assert!(!report.all_delivered());
    assert_eq!(report.attempted(), 3);
}

#[tokio::test]
async fn test_dispatch_without_channels_is_a_no_op() {
    let dispatcher = NotificationDispatcher::new(Vec::new(), "%Y").unwrap();

    let report = dispatcher.notify(&slot()).await.unwrap();

    assert!(report.all_delivered());
    assert_eq!(report.attempted(), 0);
    assert!(dispatcher.channel_names().is_empty());
}

#[test]
fn test_invalid_date_format_is_rejected_up_front() {
    let result = NotificationDispatcher::new(Vec::new(), "%Y-%Q");
    assert!(matches!(result, Err(SniperError::Configuration(_))));
}

#[test]
fn test_offset_date_format_is_rejected_up_front() {
    let result = NotificationDispatcher::new(Vec::new(), "%Y-%m-%d %H:%M %z");
    assert!(matches!(result, Err(SniperError::Configuration(_))));
}
