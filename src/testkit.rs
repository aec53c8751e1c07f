//! Shared fixtures for unit tests.

use crate::types::case::{
    CaseBundle, HamiltonianTerm, OptimizationResult, ScreeningResult, TopologyFindings,
    TopologyNode,
};
use crate::types::event::{
    AnalysisSummary, BenchmarkAnnotations, FeedFrame, RiskEvent, SystemState, SystemStatus,
    TransactionCore,
};
use std::collections::BTreeMap;

pub(crate) fn sample_core(id: &str) -> TransactionCore {
    TransactionCore {
        id: id.to_string(),
        amount: 9839.64,
        account: "C1231006815".to_string(),
        target: Some("M1979787155".to_string()),
        kind: "Transfer".to_string(),
        flagged: true,
        timestamp: None,
    }
}

pub(crate) fn sample_analysis(instability: f64) -> AnalysisSummary {
    AnalysisSummary {
        perturbation_vector: vec![0.12, -0.4, 0.88],
        screening_probability: 0.87,
        optimizer_energy: -1.92,
        risk_score: instability,
        status: if instability > 0.8 {
            SystemStatus::Critical
        } else {
            SystemStatus::Stable
        },
        state_distribution: BTreeMap::from([("|00>".to_string(), 0.1), ("|10>".to_string(), 0.9)]),
    }
}

pub(crate) fn sample_frame(id: &str, instability: f64) -> FeedFrame {
    FeedFrame {
        transaction: sample_core(id),
        analysis: sample_analysis(instability),
        system_entropy: instability,
        benchmark: Some(BenchmarkAnnotations {
            baseline_probability: 0.28,
            blindspot_detected: true,
        }),
    }
}

pub(crate) fn sample_event(id: &str, instability: f64) -> RiskEvent {
    let analysis = sample_analysis(instability);
    RiskEvent {
        core: sample_core(id),
        system: SystemState {
            instability,
            status: analysis.status,
        },
        analysis,
        benchmark: None,
    }
}

pub(crate) fn sample_bundle(id: &str) -> CaseBundle {
    CaseBundle {
        transaction: sample_core(id),
        topology: TopologyFindings {
            pattern: "Star-Hub (Mule)".to_string(),
            pattern_type: "high_connectivity".to_string(),
            neighbor_count: 8,
            nodes: vec![
                TopologyNode {
                    id: "ACC-4821".to_string(),
                    relationship: "Mule".to_string(),
                },
                TopologyNode {
                    id: "ACC-1137".to_string(),
                    relationship: "Normal".to_string(),
                },
            ],
        },
        screening: ScreeningResult {
            probability: 0.87,
            vector_magnitude: 2.4831,
            decision: "Suspicious".to_string(),
        },
        optimization: OptimizationResult {
            energy: -1.92,
            risk_score: 0.91,
            status: "CRITICAL".to_string(),
            probabilities: BTreeMap::from([
                ("|00>".to_string(), 0.04),
                ("|10>".to_string(), 0.9),
            ]),
            hamiltonian: vec![
                HamiltonianTerm {
                    term: "ZI".to_string(),
                    coeff: 3.48,
                    desc: "Qubit 1 Bias".to_string(),
                },
                HamiltonianTerm {
                    term: "ZZ".to_string(),
                    coeff: 0.77,
                    desc: "Entanglement Cost".to_string(),
                },
            ],
            frustration_energy: -1.92,
            circuit_depth: 15,
        },
        benchmark: Some(BenchmarkAnnotations {
            baseline_probability: 0.28,
            blindspot_detected: true,
        }),
    }
}
