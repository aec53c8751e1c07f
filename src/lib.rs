//! Risk Console Core
//!
//! Data backbone for an operator-facing fraud-monitoring console: a live
//! risk-event ingestion pipeline over an unreliable feed, a bounded
//! deduplicated in-memory view for the UI, a durable cache of completed
//! case reviews, and the forensic investigation workflow that walks one
//! transaction through a five-stage analysis toward a disposition.
//!
//! Rendering is someone else's job: the presentation layer consumes
//! [`buffer::BufferSnapshot`]s and drives the [`session::Desk`] actions.

pub mod buffer;
pub mod cache;
pub mod config;
pub mod feed;
pub mod metrics;
pub mod services;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testkit;

pub use buffer::{BufferSnapshot, EventBuffer, SharedBuffer};
pub use cache::{CacheError, CaseCache, ReviewStore};
pub use config::AppConfig;
pub use feed::{FeedClient, FeedTransport, NatsTransport};
pub use metrics::{ConsoleMetrics, MetricsReporter};
pub use services::{ActionClient, ActionSink, CaseSource, InvestigationClient};
pub use session::{Desk, InvestigationSession, OpenOutcome, Stage};
pub use types::{CaseBundle, CaseRecord, Disposition, RiskEvent};
