// libs/appointment-cell/src/services/locator.rs
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::{debug, warn};

use shared_config::SniperConfig;
use shared_models::terms::TermsForServiceResponse;
use shared_models::SniperError;

use crate::models::{horizon_end, AppointmentSlot, LocatorDescriptor};

/// Narrows raw portal terms down to the slots the user asked for.
#[derive(Debug, Clone)]
pub struct LocatorFilter {
    locator: LocatorDescriptor,
    excluded_facilities: Vec<String>,
    excluded_doctors: Vec<String>,
    lookup_days: u32,
}

impl LocatorFilter {
    pub fn new(
        locator: LocatorDescriptor,
        excluded_facilities: Vec<String>,
        excluded_doctors: Vec<String>,
        lookup_days: u32,
    ) -> Self {
        Self {
            locator,
            excluded_facilities,
            excluded_doctors,
            lookup_days,
        }
    }

    /// Parses the locator; a malformed one fails here, before any request.
    pub fn from_config(config: &SniperConfig) -> Result<Self, SniperError> {
        let locator = LocatorDescriptor::from_str(&config.doctor_locator_id)?;
        Ok(Self::new(
            locator,
            config.excluded_facilities.clone(),
            config.excluded_doctors.clone(),
            config.lookup_time_days,
        ))
    }

    pub fn locator(&self) -> &LocatorDescriptor {
        &self.locator
    }

    pub fn lookup_days(&self) -> u32 {
        self.lookup_days
    }

    /// Builds slots from the payload and keeps the matching ones, in
    /// day-then-term order.
    pub fn apply(&self, payload: &TermsForServiceResponse, today: NaiveDate) -> Vec<AppointmentSlot> {
        let slots = payload
            .terms()
            .filter_map(|term| {
                let slot = AppointmentSlot::from_term(term);
                if slot.is_none() {
                    warn!(
                        date_time_from = %term.date_time_from,
                        clinic_id = term.clinic_id,
                        "Skipping term with unreadable date"
                    );
                }
                slot
            })
            .collect();

        self.retain(slots, today)
    }

    pub fn retain(&self, slots: Vec<AppointmentSlot>, today: NaiveDate) -> Vec<AppointmentSlot> {
        let last_day = horizon_end(today, self.lookup_days);
        let total = slots.len();

        let kept: Vec<AppointmentSlot> = slots
            .into_iter()
            .filter(|slot| self.matches(slot, last_day))
            .collect();

        debug!(total, kept = kept.len(), %last_day, "Filtered appointment slots");
        kept
    }

    fn matches(&self, slot: &AppointmentSlot, last_day: NaiveDate) -> bool {
        // The portal treats searchDateTo as a hint, so the window is re-checked.
        self.locator.doctors.matches(slot.doctor_id)
            && self.locator.facilities.matches(slot.clinic_id)
            && !contains_any(&slot.clinic_public_name, &self.excluded_facilities)
            && !contains_any(&slot.doctor_name, &self.excluded_doctors)
            && slot.date() <= last_day
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|needle| !needle.is_empty() && haystack.contains(needle.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_exclusion_entries_exclude_nothing() {
        assert!(!contains_any("LX Warszawa", &[String::new()]));
        assert!(contains_any("LX Warszawa", &["Warsz".to_string()]));
        assert!(!contains_any("LX Warszawa", &[]));
    }
}
