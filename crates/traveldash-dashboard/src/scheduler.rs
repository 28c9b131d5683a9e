use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use traveldash_page::{reader, view};

use crate::context::{DashboardContext, DashboardEvent};

/// Owns the background refresh task.
///
/// `start` runs one full pass (rates and weather together) and then repeats
/// the weather pass every `refresh_interval` until `shutdown`.
pub struct Dashboard {
    context: Arc<DashboardContext>,
    refresh_interval: Duration,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Dashboard {
    pub fn new(context: DashboardContext, refresh_interval: Duration) -> Self {
        let refresh_interval = if refresh_interval.is_zero() {
            tracing::warn!("Refresh interval of zero replaced with one second");
            Duration::from_secs(1)
        } else {
            refresh_interval
        };

        Self {
            context: Arc::new(context),
            refresh_interval,
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    pub fn context(&self) -> &Arc<DashboardContext> {
        &self.context
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.context.subscribe()
    }

    pub fn render(&self) -> String {
        self.context.render()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Spawn the refresh task on the current Tokio runtime.
    ///
    /// Calling `start` again while the task exists does nothing. A dashboard
    /// that has been shut down stays stopped.
    pub fn start(&mut self) {
        if self.task.is_some() {
            tracing::warn!("Dashboard already started");
            return;
        }
        if self.cancel.is_cancelled() {
            tracing::warn!("Dashboard was shut down, not restarting");
            return;
        }

        tracing::info!(
            "Starting dashboard: {} cities, weather every {:?}",
            self.context.cities().len(),
            self.refresh_interval
        );

        let context = Arc::clone(&self.context);
        let cancel = self.cancel.clone();
        let period = self.refresh_interval;
        self.task = Some(tokio::spawn(run(context, period, cancel)));
    }

    /// Stop the timer and abort any fetches still in flight.
    pub async fn shutdown(&mut self) {
        tracing::info!("Dashboard shutdown initiated");
        self.cancel.cancel();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Dashboard task ended abnormally: {}", e);
            }
        }

        tracing::info!("Dashboard shutdown complete");
    }
}

async fn run(context: Arc<DashboardContext>, period: Duration, cancel: CancellationToken) {
    let mut passes = JoinSet::new();
    {
        let context = Arc::clone(&context);
        passes.spawn(async move {
            tokio::join!(
                refresh_rates(Arc::clone(&context)),
                refresh_weather(Arc::clone(&context))
            );
        });
    }

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                tracing::debug!("Weather refresh tick");
                passes.spawn(refresh_weather(Arc::clone(&context)));
            }
            Some(result) = passes.join_next(), if !passes.is_empty() => {
                if let Err(e) = result {
                    tracing::warn!("Refresh pass failed: {}", e);
                }
            }
        }
    }

    // Aborts passes still running
    passes.shutdown().await;
}

/// Fetch weather for every city and write each result as it arrives.
///
/// Cities whose previous fetch has not finished are skipped.
async fn refresh_weather(context: Arc<DashboardContext>) {
    let mut fetches = JoinSet::new();

    for name in context.cities() {
        let Some(claim) = context.try_claim(name) else {
            tracing::warn!("Previous weather fetch for {} still running, skipping", name);
            context.emit(DashboardEvent::WeatherSkipped { city: name.clone() });
            continue;
        };

        let context = Arc::clone(&context);
        let name = name.clone();
        fetches.spawn(async move {
            let result = context.weather.fetch_weather(&name).await;

            let event = match result {
                Ok(city) => {
                    let rendered = context.with_page(|page| view::update_city_weather(page, &city));
                    DashboardEvent::WeatherUpdated { city: name.clone(), rendered }
                }
                Err(e) => {
                    tracing::warn!("Weather fetch for {} failed: {}", name, e);
                    DashboardEvent::WeatherFailed {
                        city: name.clone(),
                        error: e.to_string(),
                    }
                }
            };

            drop(claim);
            context.emit(event);
        });
    }

    while let Some(result) = fetches.join_next().await {
        if let Err(e) = result {
            tracing::warn!("Weather task failed: {}", e);
        }
    }
}

/// Fetch rates for the page's base currency and write every currency display.
async fn refresh_rates(context: Arc<DashboardContext>) {
    let Some(base) = context.with_page(|page| reader::base_currency(page)) else {
        tracing::warn!("No home currency on page, skipping exchange rates");
        return;
    };

    let rates = match context.rates.fetch_rates(&base).await {
        Ok(rates) => rates,
        Err(e) => {
            tracing::warn!("Exchange rate fetch for {} failed: {}", base, e);
            context.emit(DashboardEvent::RatesFailed {
                base,
                error: e.to_string(),
            });
            return;
        }
    };

    let codes = context.with_page(|page| {
        let found = reader::currency_codes(page, context.cities());
        let mut written = Vec::new();

        for code in found.codes {
            match rates.get(&code) {
                Some(&rate) => {
                    view::update_currency_display(page, &code, &base, rate);
                    written.push(code);
                }
                None => tracing::warn!("No {} rate for {}, leaving display unchanged", base, code),
            }
        }
        written
    });

    tracing::info!("Updated {} currency displays against {}", codes.len(), base);
    context.emit(DashboardEvent::RatesUpdated { base, codes });
}
