//! Refresh scheduling for Traveldash.
//!
//! A [`DashboardContext`] holds the page, the data sources and the event
//! channel. [`Dashboard`] owns the background task that fills the page at
//! startup and refreshes city weather on a fixed interval.

pub mod context;
pub mod scheduler;

pub use context::{DashboardContext, DashboardEvent};
pub use scheduler::Dashboard;
