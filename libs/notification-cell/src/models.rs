// libs/notification-cell/src/models.rs
use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::Chars;

use serde::Serialize;

use appointment_cell::AppointmentSlot;
use shared_models::SniperError;

/// A matched slot with its date rendered for humans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FormattedAppointment {
    pub appointment_date: String,
    pub clinic_id: i64,
    pub clinic_public_name: String,
    pub doctor_name: String,
    pub service_id: i64,
}

impl FormattedAppointment {
    pub fn from_slot(slot: &AppointmentSlot, date_format: &str) -> Result<Self, SniperError> {
        let mut appointment_date = String::new();
        // `write!` reports a bad format as an error where `to_string` would panic.
        write!(appointment_date, "{}", slot.appointment_at.format(date_format)).map_err(|_| {
            SniperError::Configuration(format!("Invalid date format: {}", date_format))
        })?;

        Ok(Self {
            appointment_date,
            clinic_id: slot.clinic_id,
            clinic_public_name: slot.clinic_public_name.clone(),
            doctor_name: slot.doctor_name.clone(),
            service_id: slot.service_id,
        })
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "AppointmentDate" => Some(self.appointment_date.clone()),
            "ClinicPublicName" => Some(self.clinic_public_name.clone()),
            "DoctorName" => Some(self.doctor_name.clone()),
            "ClinicId" => Some(self.clinic_id.to_string()),
            "ServiceId" => Some(self.service_id.to_string()),
            _ => None,
        }
    }

    /// One-line summary used in log messages.
    pub fn summary(&self) -> String {
        format!(
            "{}, {}, {}",
            self.appointment_date, self.clinic_public_name, self.doctor_name
        )
    }
}

/// User supplied message template with `{Placeholder}` fields.
///
/// Known placeholders are `{AppointmentDate}`, `{ClinicPublicName}`,
/// `{DoctorName}`, `{ClinicId}`, `{ServiceId}` and, for channels that have
/// one, `{title}`. `{{` and `}}` produce literal braces. Anything else is
/// left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate(String);

impl MessageTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn render(&self, appointment: &FormattedAppointment, title: Option<&str>) -> String {
        let lookup = |name: &str| match name {
            "title" => title.map(str::to_string),
            other => appointment.field(other),
        };

        let mut out = String::with_capacity(self.0.len() + 64);
        let mut chars = self.0.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let (name, closed) = read_placeholder(&mut chars);
                    match lookup(&name).filter(|_| closed) {
                        Some(value) => out.push_str(&value),
                        None => {
                            out.push('{');
                            out.push_str(&name);
                            if closed {
                                out.push('}');
                            }
                        }
                    }
                }
                other => out.push(other),
            }
        }

        out
    }
}

fn read_placeholder(chars: &mut Peekable<Chars<'_>>) -> (String, bool) {
    let mut name = String::new();
    while let Some(&next) = chars.peek() {
        match next {
            '}' => {
                chars.next();
                return (name, true);
            }
            '{' => break,
            _ => {
                name.push(next);
                chars.next();
            }
        }
    }
    (name, false)
}

/// Outcome of sending one appointment to every active channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}
