// libs/appointment-cell/src/services/search.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use shared_models::terms::{TermsForServiceResponse, TermsQuery, POLISH_LANGUAGE_ID};
use shared_models::SniperError;
use shared_portal::LuxmedClient;

use crate::models::{horizon_end, LocatorDescriptor};

/// Authenticated access to the portal's availability search.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn fetch_terms(&self, query: &TermsQuery) -> Result<TermsForServiceResponse, SniperError>;
}

#[async_trait]
impl AvailabilitySource for LuxmedClient {
    async fn fetch_terms(&self, query: &TermsQuery) -> Result<TermsForServiceResponse, SniperError> {
        self.get_terms(query).await
    }
}

/// Issues exactly one search per check cycle. No retries, no caching.
pub struct SlotFetcher {
    source: Arc<dyn AvailabilitySource>,
    locator: LocatorDescriptor,
    lookup_days: u32,
}

impl SlotFetcher {
    pub fn new(source: Arc<dyn AvailabilitySource>, locator: LocatorDescriptor, lookup_days: u32) -> Self {
        Self {
            source,
            locator,
            lookup_days,
        }
    }

    pub fn query_for(&self, today: NaiveDate) -> TermsQuery {
        TermsQuery {
            city_id: self.locator.region_id.clone(),
            service_variant_id: self.locator.service_id.clone(),
            language_id: POLISH_LANGUAGE_ID,
            search_date_from: today,
            search_date_to: horizon_end(today, self.lookup_days),
            facilities_ids: self.locator.facilities.ids().map(<[String]>::to_vec),
            doctors_ids: self.locator.doctors.ids().map(<[String]>::to_vec),
        }
    }

    #[instrument(skip(self), fields(locator = %self.locator))]
    pub async fn fetch(&self, today: NaiveDate) -> Result<TermsForServiceResponse, SniperError> {
        let query = self.query_for(today);
        debug!("Fetching terms up to {}", query.search_date_to);

        let payload = self.source.fetch_terms(&query).await?;

        info!(terms = payload.terms().count(), "Fetched availability");
        Ok(payload)
    }
}
