#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use appointment_cell::{AvailabilitySource, LocatorDescriptor, LocatorFilter, SlotFetcher};
use notification_cell::{FormattedAppointment, NotificationChannel, NotificationDispatcher};
use shared_database::NotifyDb;
use shared_models::terms::{TermsForServiceResponse, TermsQuery};
use shared_models::SniperError;
use shared_utils::test_utils::TEST_DATE_FORMAT;
use sniper_cell::CheckOrchestrator;

/// Portal stand-in answering from a script, then repeating the last payload.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<TermsForServiceResponse, SniperError>>>,
    fallback: TermsForServiceResponse,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn always(payload: TermsForServiceResponse) -> Arc<Self> {
        Self::scripted(Vec::new(), payload)
    }

    pub fn scripted(
        script: Vec<Result<TermsForServiceResponse, SniperError>>,
        fallback: TermsForServiceResponse,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvailabilitySource for ScriptedSource {
    async fn fetch_terms(&self, _query: &TermsQuery) -> Result<TermsForServiceResponse, SniperError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

pub struct FakeChannel {
    pub name: &'static str,
    pub fail: bool,
    pub sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl NotificationChannel for FakeChannel {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(&self, appointment: &FormattedAppointment) -> Result<(), SniperError> {
        self.sent.lock().unwrap().push(appointment.summary());
        if self.fail {
            return Err(SniperError::notification(self.name, "provider unavailable"));
        }
        Ok(())
    }
}

pub fn channel(name: &'static str, fail: bool, sent: &Arc<Mutex<Vec<String>>>) -> Box<dyn NotificationChannel> {
    Box::new(FakeChannel {
        name,
        fail,
        sent: Arc::clone(sent),
    })
}

pub fn orchestrator(
    source: Arc<ScriptedSource>,
    channels: Vec<Box<dyn NotificationChannel>>,
    db_path: &Path,
) -> CheckOrchestrator {
    let locator: LocatorDescriptor = "1*2*-1*-1".parse().unwrap();
    let fetcher = SlotFetcher::new(source, locator.clone(), 7);
    let filter = LocatorFilter::new(locator, Vec::new(), Vec::new(), 7);
    let store = NotifyDb::open(db_path).unwrap();
    let dispatcher = NotificationDispatcher::new(channels, TEST_DATE_FORMAT).unwrap();

    CheckOrchestrator::new(fetcher, filter, store, dispatcher)
}
