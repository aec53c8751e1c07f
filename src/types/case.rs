//! Forensic case bundle and durable review record structures

use crate::types::event::{BenchmarkAnnotations, TransactionCore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Operator's terminal decision on a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    Approve,
    Block,
}

/// One neighbor in the counterparty graph around the transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyNode {
    pub id: String,
    /// Relationship classification, e.g. "Mule" or "Normal"
    pub relationship: String,
}

/// Graph-analysis findings for the transaction's 1-hop neighborhood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyFindings {
    /// Detected structural pattern, e.g. "Star-Hub (Mule)"
    pub pattern: String,
    #[serde(default)]
    pub pattern_type: String,
    pub neighbor_count: u32,
    pub nodes: Vec<TopologyNode>,
}

/// Screening-stage classifier output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningResult {
    /// Classifier probability, 0.0 - 1.0
    pub probability: f64,
    pub vector_magnitude: f64,
    /// "Suspicious" or "Safe"
    pub decision: String,
}

/// One term of the optimizer's cost function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HamiltonianTerm {
    pub term: String,
    pub coeff: f64,
    #[serde(default)]
    pub desc: String,
}

/// Optimization-stage solver output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub energy: f64,
    pub risk_score: f64,
    pub status: String,
    /// Measured state distribution, basis-state label to probability
    pub probabilities: BTreeMap<String, f64>,
    pub hamiltonian: Vec<HamiltonianTerm>,
    pub frustration_energy: f64,
    #[serde(default)]
    pub circuit_depth: u32,
}

/// The full forensic payload for one transaction, exactly as returned by
/// the investigation service.
///
/// All four stage sections are required: a payload missing any of them
/// cannot be rendered and is rejected at the service boundary as a
/// data-contract violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseBundle {
    pub transaction: TransactionCore,
    pub topology: TopologyFindings,
    #[serde(alias = "qsvc")]
    pub screening: ScreeningResult,
    #[serde(alias = "vqe")]
    pub optimization: OptimizationResult,
    #[serde(default)]
    pub benchmark: Option<BenchmarkAnnotations>,
}

/// Durable record of a completed case review. Written once per
/// disposition; overwritten in full if the case is ever re-investigated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub bundle: CaseBundle,
    pub reviewed: bool,
    pub disposition: Disposition,
    pub decided_at: DateTime<Utc>,
    /// Audit trail identifier for the compliance log
    pub audit_id: Uuid,
}

impl CaseRecord {
    /// Seal a bundle with the operator's decision.
    pub fn decided(bundle: CaseBundle, disposition: Disposition) -> Self {
        Self {
            bundle,
            reviewed: true,
            disposition,
            decided_at: Utc::now(),
            audit_id: Uuid::new_v4(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::sample_bundle;

    #[test]
    fn test_bundle_rejects_missing_stage_section() {
        // A payload without the optimization section violates the contract.
        let json = r#"{
            "transaction": {"id": "TX-1", "amount": 10.0, "account": "A", "type": "Payment"},
            "topology": {"pattern": "Linear (P2P)", "neighbor_count": 1,
                         "nodes": [{"id": "ACC-1", "relationship": "Normal"}]},
            "qsvc": {"probability": 0.1, "vector_magnitude": 1.2, "decision": "Safe"}
        }"#;
        assert!(serde_json::from_str::<CaseBundle>(json).is_err());
    }

    #[test]
    fn test_bundle_accepts_service_field_names() {
        let json = r#"{
            "transaction": {"id": "TX-2", "amount": 50.0, "account": "B", "type": "Transfer"},
            "topology": {"pattern": "Small Network", "neighbor_count": 2,
                         "nodes": [{"id": "ACC-7", "relationship": "Mule"}]},
            "qsvc": {"probability": 0.82, "vector_magnitude": 2.4, "decision": "Suspicious"},
            "vqe": {"energy": -1.4, "risk_score": 0.9, "status": "CRITICAL",
                    "probabilities": {"|10>": 0.88},
                    "hamiltonian": [{"term": "ZI", "coeff": 3.1, "desc": "Qubit 1 Bias"}],
                    "frustration_energy": -1.4, "circuit_depth": 15}
        }"#;

        let bundle: CaseBundle = serde_json::from_str(json).unwrap();
        assert_eq!(bundle.screening.decision, "Suspicious");
        assert_eq!(bundle.optimization.hamiltonian.len(), 1);
    }

    #[test]
    fn test_record_round_trip() {
        let record = CaseRecord::decided(sample_bundle("TX-3"), Disposition::Block);
        assert!(record.reviewed);

        let bytes = serde_json::to_vec(&record).unwrap();
        let restored: CaseRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(restored.bundle.transaction.id, "TX-3");
        assert_eq!(restored.disposition, Disposition::Block);
        assert_eq!(restored.audit_id, record.audit_id);
    }
}
