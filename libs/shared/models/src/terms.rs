use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const POLISH_LANGUAGE_ID: u32 = 10;

/// Parameters of one availability search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsQuery {
    pub city_id: String,
    pub service_variant_id: String,
    pub language_id: u32,
    pub search_date_from: NaiveDate,
    pub search_date_to: NaiveDate,
    pub facilities_ids: Option<Vec<String>>,
    pub doctors_ids: Option<Vec<String>>,
}

impl TermsQuery {
    /// Query string pairs; id lists become repeated parameters.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("cityId", self.city_id.clone()),
            ("serviceVariantId", self.service_variant_id.clone()),
            ("languageId", self.language_id.to_string()),
            ("searchDateFrom", self.search_date_from.format("%Y-%m-%d").to_string()),
            ("searchDateTo", self.search_date_to.format("%Y-%m-%d").to_string()),
        ];
        if let Some(ids) = &self.facilities_ids {
            pairs.extend(ids.iter().map(|id| ("facilitiesIds", id.clone())));
        }
        if let Some(ids) = &self.doctors_ids {
            pairs.extend(ids.iter().map(|id| ("doctorsIds", id.clone())));
        }
        pairs
    }
}

// Raw availability payload returned by `/PatientPortal/NewPortal/terms/index`.
// Only the fields the sniper reads are modelled; everything else is ignored.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsForServiceResponse {
    pub terms_for_service: TermsForService,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsForService {
    #[serde(default)]
    pub terms_for_days: Vec<TermsForDay>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsForDay {
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub terms: Vec<Term>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    /// ISO-8601 local time of the visit, e.g. `2024-03-01T08:30:00`.
    pub date_time_from: String,
    pub clinic_id: i64,
    pub clinic: String,
    pub service_id: i64,
    pub doctor: TermDoctor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermDoctor {
    pub id: i64,
    #[serde(default)]
    pub academic_title: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl TermDoctor {
    pub fn display_name(&self) -> String {
        [
            self.academic_title.as_deref().unwrap_or(""),
            self.first_name.as_str(),
            self.last_name.as_str(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

impl TermsForServiceResponse {
    /// Iterates all terms in day-then-term order.
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.terms_for_service
            .terms_for_days
            .iter()
            .flat_map(|day| day.terms.iter())
    }
}
