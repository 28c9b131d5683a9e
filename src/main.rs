use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;

use traveldash_core::{AppError, Config, ConfigError};
use traveldash_dashboard::{Dashboard, DashboardContext, DashboardEvent};
use traveldash_exchange::ExchangeClient;
use traveldash_page::HtmlPage;
use traveldash_weather::WeatherClient;

#[tokio::main]
async fn main() -> Result<()> {
    traveldash_core::init()?;

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        eprintln!("{}", e.user_message());
        return Err(e.into());
    }

    Ok(())
}

async fn run() -> Result<(), AppError> {
    let (config, _) = Config::load_validated().map_err(|e| match e.downcast::<ConfigError>() {
        Ok(config_error) => AppError::Config(config_error),
        Err(other) => AppError::Other(other),
    })?;

    let template_path = &config.page.template_path;
    let markup = std::fs::read_to_string(template_path).map_err(|source| AppError::Template {
        path: template_path.clone(),
        source,
    })?;

    let weather = WeatherClient::new(&config.weather).context("Failed to build weather client")?;
    let rates = ExchangeClient::new(&config.exchange).context("Failed to build exchange client")?;

    let context = DashboardContext::new(HtmlPage::parse(markup), Arc::new(weather), Arc::new(rates));
    if context.cities().is_empty() {
        tracing::warn!("No cities found in {}", template_path.display());
    }

    let output_path = config.page.output_path.as_deref();
    match output_path {
        Some(path) => tracing::info!("Rendered page will be written to {}", path.display()),
        None => tracing::info!("No page.output_path configured, rendered page is not saved"),
    }

    let mut dashboard = Dashboard::new(context, config.weather.refresh_interval());
    let mut events = dashboard.subscribe();
    dashboard.start();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                }
                tracing::info!("Shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    tracing::debug!("Dashboard event: {:?}", event);
                    if changes_page(&event) {
                        save_page(&dashboard, output_path);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Missed {} dashboard events", missed);
                    save_page(&dashboard, output_path);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    dashboard.shutdown().await;
    Ok(())
}

fn changes_page(event: &DashboardEvent) -> bool {
    matches!(
        event,
        DashboardEvent::WeatherUpdated { rendered: true, .. } | DashboardEvent::RatesUpdated { .. }
    )
}

fn save_page(dashboard: &Dashboard, output_path: Option<&Path>) {
    let Some(path) = output_path else {
        return;
    };

    match std::fs::write(path, dashboard.render()) {
        Ok(()) => tracing::debug!("Wrote page to {}", path.display()),
        Err(source) => {
            let e = AppError::Output {
                path: path.to_path_buf(),
                source,
            };
            tracing::warn!("{} ({})", e, e.user_message());
        }
    }
}
