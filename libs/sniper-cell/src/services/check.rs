// libs/sniper-cell/src/services/check.rs
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, instrument, warn};

use appointment_cell::{AvailabilitySource, LocatorFilter, SlotFetcher};
use notification_cell::{ChannelRegistry, NotificationDispatcher};
use shared_config::AppConfig;
use shared_database::NotifyDb;
use shared_models::SniperError;

use crate::models::CycleReport;

/// Runs one fetch, filter, dedup and notify pass per call.
///
/// Owns the notification database, so `&mut self` on a cycle is what keeps
/// cycles from overlapping.
pub struct CheckOrchestrator {
    fetcher: SlotFetcher,
    filter: LocatorFilter,
    store: NotifyDb,
    dispatcher: NotificationDispatcher,
}

impl CheckOrchestrator {
    pub fn new(
        fetcher: SlotFetcher,
        filter: LocatorFilter,
        store: NotifyDb,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            fetcher,
            filter,
            store,
            dispatcher,
        }
    }

    /// Wires everything from configuration. All failures here are fatal:
    /// the locator is parsed, channels are built and the store is opened
    /// before the first request is made.
    pub fn from_config(
        config: &AppConfig,
        source: Arc<dyn AvailabilitySource>,
        registry: &ChannelRegistry,
    ) -> Result<Self, SniperError> {
        let filter = LocatorFilter::from_config(&config.luxmedsniper)?;
        let fetcher = SlotFetcher::new(source, filter.locator().clone(), filter.lookup_days());

        let channels = registry.build(config)?;
        let dispatcher = NotificationDispatcher::new(channels, config.misc.date_format.clone())?;
        let store = NotifyDb::open(&config.misc.notifydb)?;

        info!(
            locator = %filter.locator(),
            lookup_days = filter.lookup_days(),
            channels = ?dispatcher.channel_names(),
            known = store.len(),
            "Sniper configured"
        );

        Ok(Self::new(fetcher, filter, store, dispatcher))
    }

    pub fn store(&self) -> &NotifyDb {
        &self.store
    }

    pub async fn check(&mut self) -> Result<CycleReport, SniperError> {
        self.check_at(Local::now().date_naive()).await
    }

    /// One cycle. A fetch failure aborts before any record or notification.
    /// Dates are only rendered for slots that are about to be announced.
    /// A notification failure after a successful record is not retried:
    /// the slot is already known on the next cycle.
    #[instrument(skip(self))]
    pub async fn check_at(&mut self, today: NaiveDate) -> Result<CycleReport, SniperError> {
        let payload = self.fetcher.fetch(today).await?;
        let slots = self.filter.apply(&payload, today);

        let mut report = CycleReport {
            matched: slots.len(),
            ..CycleReport::default()
        };

        if slots.is_empty() {
            info!("No appointments found.");
            return Ok(report);
        }

        for slot in &slots {
            let key = slot.notification_key();
            let timestamp = slot.timestamp_key();
            info!("Appointment: {}, {}, {}", timestamp, slot.clinic_public_name, key);

            if self.store.is_known(key, &timestamp) {
                debug!("Notification was already sent.");
                report.already_known += 1;
                continue;
            }

            self.store.record(key, &timestamp)?;

            let dispatch = self.dispatcher.notify(slot).await?;
            report.notified += 1;
            report.notification_failures += dispatch.failed.len();

            if dispatch.all_delivered() {
                info!("Notification sent: {}, {}", timestamp, key);
            } else {
                warn!(
                    failed = dispatch.failed.len(),
                    attempted = dispatch.attempted(),
                    "Notification partially failed: {}, {}",
                    timestamp,
                    key
                );
            }
        }

        Ok(report)
    }

    /// Cycle boundary. Cycle-scoped errors are logged and swallowed
    /// (`Ok(None)`) so the schedule keeps going; fatal ones are returned.
    pub async fn run_cycle(&mut self) -> Result<Option<CycleReport>, SniperError> {
        match self.check().await {
            Ok(report) => {
                debug!(?report, "Cycle finished");
                Ok(Some(report))
            }
            Err(e) if e.is_fatal() => {
                error!(kind = e.kind(), "Check cycle hit a fatal error: {}", e);
                Err(e)
            }
            Err(e) => {
                error!(kind = e.kind(), "Check cycle aborted: {}", e);
                Ok(None)
            }
        }
    }
}
