//! Type definitions for the monitoring console

pub mod case;
pub mod event;

pub use case::{CaseBundle, CaseRecord, Disposition};
pub use event::{EntropySample, FeedFrame, RiskEvent, SystemState, SystemStatus};
