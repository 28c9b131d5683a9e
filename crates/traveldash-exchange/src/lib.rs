//! Exchange-rate integration for Traveldash.
//!
//! Fetches every conversion rate for one base currency from
//! exchangerate-api.com.

pub mod client;
pub mod error;

pub use client::{ExchangeClient, RateSource, Rates};
pub use error::ExchangeError;
