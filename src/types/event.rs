//! Risk event data structures for the live monitoring feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Discrete system-health label carried by every feed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemStatus {
    Stable,
    Critical,
}

/// Scalar instability reading plus its status label, valid at the moment
/// the accompanying transaction was observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    pub instability: f64,
    pub status: SystemStatus,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            instability: 0.0,
            status: SystemStatus::Stable,
        }
    }
}

/// Core transaction fields, passed through from the upstream analyzer
/// untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCore {
    /// Unique transaction identifier, stable across redelivery
    #[serde(alias = "ID")]
    pub id: String,

    pub amount: f64,

    /// Source account identifier
    pub account: String,

    /// Beneficiary account, when the analyzer reports one
    #[serde(default, alias = "destination")]
    pub target: Option<String>,

    /// Transaction type (e.g. "Transfer", "Payment")
    #[serde(rename = "type")]
    pub kind: String,

    /// Whether the upstream analyzer flagged this transaction
    #[serde(default, alias = "is_fraud")]
    pub flagged: bool,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Per-transaction verdict summary attached by the upstream analyzer.
///
/// The fields are carried verbatim for the presentation layer; the console
/// itself only reads `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Feature perturbation vector used by the analyzer
    #[serde(default)]
    pub perturbation_vector: Vec<f64>,

    /// Screening-stage classifier probability
    #[serde(alias = "qsvc_prob")]
    pub screening_probability: f64,

    /// Converged optimizer energy
    #[serde(alias = "vqe_energy")]
    pub optimizer_energy: f64,

    /// Aggregate risk score (0.0 - 1.0)
    pub risk_score: f64,

    /// Status label valid for this observation
    pub status: SystemStatus,

    /// Measured state distribution, basis-state label to probability
    #[serde(default, alias = "quantum_probabilities")]
    pub state_distribution: BTreeMap<String, f64>,
}

/// Structured comparison data from the classical baseline model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkAnnotations {
    /// Baseline model probability for the same transaction
    #[serde(alias = "xgboost_probability")]
    pub baseline_probability: f64,

    /// True when the analyzer flagged the transaction but the baseline
    /// scored it below its decision threshold
    #[serde(default)]
    pub blindspot_detected: bool,
}

/// One decoded message from the risk-event feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedFrame {
    pub transaction: TransactionCore,
    pub analysis: AnalysisSummary,
    /// Scalar system instability at send time, 0.0 - 1.0
    pub system_entropy: f64,
    #[serde(default)]
    pub benchmark: Option<BenchmarkAnnotations>,
}

impl FeedFrame {
    /// Merge the frame into the buffer-facing event, stamping the system
    /// state that was observed alongside it.
    pub fn into_event(self) -> RiskEvent {
        let system = SystemState {
            instability: self.system_entropy,
            status: self.analysis.status,
        };
        RiskEvent {
            core: self.transaction,
            analysis: self.analysis,
            benchmark: self.benchmark,
            system,
        }
    }
}

/// One observed transaction with its analysis annotations. Immutable once
/// admitted to the event buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskEvent {
    #[serde(flatten)]
    pub core: TransactionCore,
    pub analysis: AnalysisSummary,
    #[serde(default)]
    pub benchmark: Option<BenchmarkAnnotations>,
    pub system: SystemState,
}

impl RiskEvent {
    pub fn id(&self) -> &str {
        &self.core.id
    }
}

/// One point of the instability time series, ordered by arrival.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropySample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_frame_round_trip() {
        let json = r#"{
            "transaction": {
                "id": "TX-10042",
                "amount": 9839.64,
                "account": "C123...9010",
                "type": "Transfer",
                "is_fraud": true
            },
            "analysis": {
                "qsvc_prob": 0.87,
                "vqe_energy": -1.92,
                "risk_score": 0.91,
                "status": "CRITICAL",
                "quantum_probabilities": {"|00>": 0.04, "|10>": 0.9}
            },
            "system_entropy": 0.91,
            "benchmark": {"xgboost_probability": 0.28, "blindspot_detected": true}
        }"#;

        let frame: FeedFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.transaction.id, "TX-10042");
        assert_eq!(frame.analysis.status, SystemStatus::Critical);
        assert!(frame.benchmark.as_ref().unwrap().blindspot_detected);

        let event = frame.into_event();
        assert_eq!(event.id(), "TX-10042");
        assert_eq!(event.system.instability, 0.91);
        assert_eq!(event.system.status, SystemStatus::Critical);
    }

    #[test]
    fn test_status_label_serialization() {
        assert_eq!(
            serde_json::to_string(&SystemStatus::Critical).unwrap(),
            "\"CRITICAL\""
        );
        assert_eq!(
            serde_json::from_str::<SystemStatus>("\"STABLE\"").unwrap(),
            SystemStatus::Stable
        );
    }

    #[test]
    fn test_frame_without_benchmark_is_valid() {
        let json = r#"{
            "transaction": {"id": "TX-1", "amount": 10.0, "account": "A", "type": "Payment"},
            "analysis": {"qsvc_prob": 0.1, "vqe_energy": 0.5, "risk_score": 0.1, "status": "STABLE"},
            "system_entropy": 0.1
        }"#;

        let frame: FeedFrame = serde_json::from_str(json).unwrap();
        assert!(frame.benchmark.is_none());
        assert!(!frame.transaction.flagged);
    }
}
