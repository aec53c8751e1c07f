//! Risk-Event Feed Simulator
//!
//! Generates and publishes synthetic risk-event frames to NATS so the
//! console can be exercised without the upstream analyzer.

use chrono::Utc;
use rand::Rng;
use risk_console::types::event::{
    AnalysisSummary, BenchmarkAnnotations, FeedFrame, SystemStatus, TransactionCore,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

/// Frame generator mirroring the analyzer's output shape
struct FrameGenerator {
    rng: rand::rngs::ThreadRng,
    counter: u64,
}

impl FrameGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            counter: 0,
        }
    }

    /// Generate a routine, low-risk frame
    fn generate_routine(&mut self) -> FeedFrame {
        self.counter += 1;
        let instability = self.rng.gen_range(0.05..0.35);

        FeedFrame {
            transaction: TransactionCore {
                id: format!("TX-{}", 10000 + self.counter),
                amount: self.rng.gen_range(10.0..5_000.0),
                account: self.random_account(),
                target: Some(self.random_account()),
                kind: "Payment".to_string(),
                flagged: false,
                timestamp: Some(Utc::now()),
            },
            analysis: AnalysisSummary {
                perturbation_vector: self.random_vector(),
                screening_probability: self.rng.gen_range(0.02..0.35),
                optimizer_energy: self.rng.gen_range(0.5..1.0),
                risk_score: instability,
                status: SystemStatus::Stable,
                state_distribution: self.state_distribution(0.9),
            },
            system_entropy: instability,
            benchmark: Some(BenchmarkAnnotations {
                baseline_probability: self.rng.gen_range(0.01..0.05),
                blindspot_detected: false,
            }),
        }
    }

    /// Generate a flagged, high-risk frame; roughly four in five mimic
    /// the sophisticated pattern the baseline model misses
    fn generate_flagged(&mut self) -> FeedFrame {
        self.counter += 1;
        let instability = self.rng.gen_range(0.75..0.98);
        let sophisticated = self.rng.gen_bool(0.8);
        let baseline_probability = if sophisticated {
            self.rng.gen_range(0.2..0.35)
        } else {
            self.rng.gen_range(0.92..0.99)
        };

        FeedFrame {
            transaction: TransactionCore {
                id: format!("TX-{}", 10000 + self.counter),
                amount: self.rng.gen_range(50_000.0..900_000.0),
                account: self.random_account(),
                target: Some(self.random_account()),
                kind: "Transfer".to_string(),
                flagged: true,
                timestamp: Some(Utc::now()),
            },
            analysis: AnalysisSummary {
                perturbation_vector: self.random_vector(),
                screening_probability: self.rng.gen_range(0.70..0.98),
                optimizer_energy: self.rng.gen_range(-2.5..-1.0),
                risk_score: instability,
                status: SystemStatus::Critical,
                state_distribution: self.state_distribution(0.1),
            },
            system_entropy: instability,
            benchmark: Some(BenchmarkAnnotations {
                baseline_probability,
                blindspot_detected: sophisticated,
            }),
        }
    }

    fn random_account(&mut self) -> String {
        format!("C{:010}", self.rng.gen_range(1_000_000_000u64..9_999_999_999))
    }

    fn random_vector(&mut self) -> Vec<f64> {
        (0..3).map(|_| self.rng.gen_range(-1.0..1.0)).collect()
    }

    fn state_distribution(&mut self, ground_weight: f64) -> BTreeMap<String, f64> {
        let spread = self.rng.gen_range(0.0..0.05);
        BTreeMap::from([
            ("|00>".to_string(), ground_weight - spread),
            ("|01>".to_string(), spread),
            ("|10>".to_string(), 1.0 - ground_weight),
        ])
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("feed_simulator=info".parse()?),
        )
        .init();

    info!("Starting Risk-Event Feed Simulator");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("risk.events");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let flagged_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.15);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(2000);
    let redeliver_rate: f64 = args.get(6).and_then(|s| s.parse().ok()).unwrap_or(0.05);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        flagged_rate = flagged_rate,
        delay_ms = delay_ms,
        redeliver_rate = redeliver_rate,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS, exiting");
            return Ok(());
        }
    };

    let mut generator = FrameGenerator::new();
    let mut rng = rand::thread_rng();
    let mut last_frame: Option<FeedFrame> = None;

    let mut routine_count = 0u64;
    let mut flagged_count = 0u64;

    info!("Publishing {} frames...", count);

    for i in 0..count {
        // Occasionally redeliver the previous frame to exercise dedup
        let frame = if last_frame.is_some() && rng.gen_bool(redeliver_rate) {
            last_frame.clone().unwrap()
        } else if rng.gen_bool(flagged_rate) {
            flagged_count += 1;
            generator.generate_flagged()
        } else {
            routine_count += 1;
            generator.generate_routine()
        };

        let payload = serde_json::to_vec(&frame)?;
        client.publish(subject.to_string(), payload.into()).await?;
        last_frame = Some(frame);

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} frames ({} routine, {} flagged)",
                i + 1,
                count,
                routine_count,
                flagged_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} frames ({} routine, {} flagged)",
        count, routine_count, flagged_count
    );

    Ok(())
}
