// libs/notification-cell/src/services/dispatcher.rs
use tracing::{error, info, instrument};

use appointment_cell::AppointmentSlot;
use shared_config::validate_date_format;
use shared_models::SniperError;

use crate::models::{DispatchReport, FormattedAppointment};
use crate::services::channel::NotificationChannel;

/// Formats matched slots and hands them to every active channel.
pub struct NotificationDispatcher {
    channels: Vec<Box<dyn NotificationChannel>>,
    date_format: String,
}

impl NotificationDispatcher {
    pub fn new(
        channels: Vec<Box<dyn NotificationChannel>>,
        date_format: impl Into<String>,
    ) -> Result<Self, SniperError> {
        let date_format = date_format.into();
        validate_date_format(&date_format)?;

        Ok(Self {
            channels,
            date_format,
        })
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    pub fn format(&self, slot: &AppointmentSlot) -> Result<FormattedAppointment, SniperError> {
        FormattedAppointment::from_slot(slot, &self.date_format)
    }

    /// Every channel is attempted; a failing one is logged and the rest still run.
    #[instrument(skip_all, fields(doctor = %appointment.doctor_name, date = %appointment.appointment_date))]
    pub async fn dispatch(&self, appointment: &FormattedAppointment) -> DispatchReport {
        let mut report = DispatchReport::default();

        for channel in &self.channels {
            match channel.send(appointment).await {
                Ok(()) => {
                    info!(channel = channel.name(), "Notification delivered");
                    report.delivered.push(channel.name().to_string());
                }
                Err(e) => {
                    error!(channel = channel.name(), error = %e, "Notification failed");
                    report.failed.push((channel.name().to_string(), e.to_string()));
                }
            }
        }

        report
    }

    pub async fn notify(&self, slot: &AppointmentSlot) -> Result<DispatchReport, SniperError> {
        let appointment = self.format(slot)?;
        Ok(self.dispatch(&appointment).await)
    }
}
