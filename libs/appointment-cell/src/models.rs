// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use shared_models::terms::Term;
use shared_models::SniperError;

/// Portal sentinel meaning "no filter" for facility and doctor lists.
pub const MATCH_ALL: &str = "-1";

/// Format used for timestamps in the notification database.
pub const TIMESTAMP_KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ==============================================================================
// LOCATOR
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdFilter {
    Any,
    OneOf(Vec<String>),
}

impl IdFilter {
    fn parse(component: &str, label: &str) -> Result<Self, SniperError> {
        if component == MATCH_ALL {
            return Ok(IdFilter::Any);
        }

        let ids: Vec<String> = component.split(',').map(|id| id.trim().to_string()).collect();
        if ids.iter().any(|id| id.is_empty()) {
            return Err(SniperError::Configuration(format!(
                "DoctorLocatorID has an empty {} id in '{}'",
                label, component
            )));
        }

        Ok(IdFilter::OneOf(ids))
    }

    pub fn matches(&self, id: i64) -> bool {
        match self {
            IdFilter::Any => true,
            IdFilter::OneOf(ids) => {
                let id = id.to_string();
                ids.iter().any(|candidate| *candidate == id)
            }
        }
    }

    pub fn ids(&self) -> Option<&[String]> {
        match self {
            IdFilter::Any => None,
            IdFilter::OneOf(ids) => Some(ids),
        }
    }
}

impl fmt::Display for IdFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdFilter::Any => write!(f, "{}", MATCH_ALL),
            IdFilter::OneOf(ids) => write!(f, "{}", ids.join(",")),
        }
    }
}

/// Parsed `region*service*facilities*doctors` descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorDescriptor {
    pub region_id: String,
    pub service_id: String,
    pub facilities: IdFilter,
    pub doctors: IdFilter,
}

impl FromStr for LocatorDescriptor {
    type Err = SniperError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.trim().split('*').map(str::trim).collect();

        let [region, service, facilities, doctors] = parts.as_slice() else {
            return Err(SniperError::Configuration(format!(
                "DoctorLocatorID seems to be in invalid format: expected 4 '*'-separated parts, got {} in '{}'",
                parts.len(),
                raw
            )));
        };

        if region.is_empty() || service.is_empty() {
            return Err(SniperError::Configuration(format!(
                "DoctorLocatorID needs a region and a service id: '{}'",
                raw
            )));
        }

        Ok(Self {
            region_id: region.to_string(),
            service_id: service.to_string(),
            facilities: IdFilter::parse(facilities, "facility")?,
            doctors: IdFilter::parse(doctors, "doctor")?,
        })
    }
}

impl fmt::Display for LocatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}*{}*{}*{}",
            self.region_id, self.service_id, self.facilities, self.doctors
        )
    }
}

// ==============================================================================
// SLOTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSlot {
    pub appointment_at: NaiveDateTime,
    pub clinic_id: i64,
    pub clinic_public_name: String,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub service_id: i64,
}

impl AppointmentSlot {
    /// Returns `None` when the term's timestamp cannot be read.
    pub fn from_term(term: &Term) -> Option<Self> {
        Some(Self {
            appointment_at: parse_portal_datetime(&term.date_time_from)?,
            clinic_id: term.clinic_id,
            clinic_public_name: term.clinic.clone(),
            doctor_id: term.doctor.id,
            doctor_name: term.doctor.display_name(),
            service_id: term.service_id,
        })
    }

    /// Deduplication key. Facility and doctor id are deliberately not part of it.
    pub fn notification_key(&self) -> &str {
        &self.doctor_name
    }

    pub fn timestamp_key(&self) -> String {
        self.appointment_at.format(TIMESTAMP_KEY_FORMAT).to_string()
    }

    pub fn date(&self) -> NaiveDate {
        self.appointment_at.date()
    }
}

/// Reads the portal's ISO-8601 timestamps. An explicit offset is dropped and
/// the wall-clock time kept, since the portal always speaks local time.
pub fn parse_portal_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_local());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Last day included in a search that starts `today`.
pub fn horizon_end(today: NaiveDate, lookup_days: u32) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(lookup_days)))
        .unwrap_or(NaiveDate::MAX)
}
