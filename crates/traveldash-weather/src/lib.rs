//! Weather service for Traveldash
//!
//! Fetches current conditions per city from weatherapi.com and turns them
//! into [`City`] snapshots for the page.

pub mod provider;
pub mod types;

pub use provider::{WeatherClient, WeatherSource};
pub use types::*;
