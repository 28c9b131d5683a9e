use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use traveldash_exchange::RateSource;
use traveldash_page::{reader, Page};
use traveldash_weather::WeatherSource;

const EVENT_CAPACITY: usize = 64;

/// Progress reported by the dashboard as passes complete.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// A weather result was written; `rendered` is false when the page has no
    /// container for the city.
    WeatherUpdated { city: String, rendered: bool },
    /// Fetching weather for a city failed; the page is unchanged for it.
    WeatherFailed { city: String, error: String },
    /// A tick fired while the previous fetch for the city was still running.
    WeatherSkipped { city: String },
    /// Rate lines were written for `codes`.
    RatesUpdated { base: String, codes: Vec<String> },
    /// Fetching rates failed; no rate lines were written.
    RatesFailed { base: String, error: String },
}

/// Shared state for every pass the dashboard runs.
pub struct DashboardContext {
    page: Mutex<Box<dyn Page>>,
    pub(crate) weather: Arc<dyn WeatherSource>,
    pub(crate) rates: Arc<dyn RateSource>,
    cities: Vec<String>,
    in_flight: Mutex<HashSet<String>>,
    events: broadcast::Sender<DashboardEvent>,
}

impl DashboardContext {
    /// Build a context over `page`. The city list is read from the page here,
    /// with repeated names kept once in page order, and stays fixed for the
    /// life of the context.
    pub fn new(
        page: impl Page + 'static,
        weather: Arc<dyn WeatherSource>,
        rates: Arc<dyn RateSource>,
    ) -> Self {
        let mut seen = HashSet::new();
        let cities: Vec<String> = reader::city_names(&page)
            .into_iter()
            .filter(|name| {
                let first = seen.insert(name.clone());
                if !first {
                    tracing::debug!("City {} listed more than once, fetching it once", name);
                }
                first
            })
            .collect();
        tracing::info!("Found {} cities on page: {:?}", cities.len(), cities);

        let page: Box<dyn Page> = Box::new(page);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            page: Mutex::new(page),
            weather,
            rates,
            cities,
            in_flight: Mutex::new(HashSet::new()),
            events,
        }
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Current page markup.
    pub fn render(&self) -> String {
        self.page.lock().render()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    /// Run a synchronous operation against the page under its lock.
    pub(crate) fn with_page<R>(&self, f: impl FnOnce(&mut dyn Page) -> R) -> R {
        let mut page = self.page.lock();
        f(&mut **page)
    }

    pub(crate) fn emit(&self, event: DashboardEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Mark a fetch for `city` as running. `None` if one already is.
    ///
    /// The claim lasts until the returned guard is dropped, including when the
    /// fetch task panics or is aborted.
    pub(crate) fn try_claim(self: &Arc<Self>, city: &str) -> Option<InFlight> {
        if !self.in_flight.lock().insert(city.to_string()) {
            return None;
        }
        Some(InFlight {
            context: Arc::clone(self),
            city: city.to_string(),
        })
    }
}

/// A running fetch for one city.
pub(crate) struct InFlight {
    context: Arc<DashboardContext>,
    city: String,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.context.in_flight.lock().remove(&self.city);
    }
}
