//! Operational counters and statistics for the console.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector shared across the feed task and the desk
pub struct ConsoleMetrics {
    /// Events admitted into the buffer
    pub events_admitted: AtomicU64,
    /// Redelivered events dropped by the dedup check
    pub duplicates_dropped: AtomicU64,
    /// Frames that failed to decode
    pub decode_failures: AtomicU64,
    /// Reconnect attempts scheduled after transport loss
    pub reconnects: AtomicU64,
    /// Cases reopened from the review cache
    pub cache_hits: AtomicU64,
    /// Case fetches issued to the investigation service
    pub fetches: AtomicU64,
    /// Case fetches that failed
    pub fetch_failures: AtomicU64,
    /// Late responses discarded by the stale guard
    pub stale_discards: AtomicU64,
    /// Dispositions by action name
    dispositions: RwLock<HashMap<String, u64>>,
    /// Instability distribution buckets
    instability_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ConsoleMetrics {
    pub fn new() -> Self {
        Self {
            events_admitted: AtomicU64::new(0),
            duplicates_dropped: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            stale_discards: AtomicU64::new(0),
            dispositions: RwLock::new(HashMap::new()),
            instability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    pub fn record_admitted(&self, instability: f64) {
        self.events_admitted.fetch_add(1, Ordering::Relaxed);

        let bucket = (instability.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.instability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    pub fn record_duplicate(&self) {
        self.duplicates_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_discard(&self) {
        self.stale_discards.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disposition(&self, action: &str) {
        if let Ok(mut by_action) = self.dispositions.write() {
            *by_action.entry(action.to_string()).or_insert(0) += 1;
        }
    }

    /// Events admitted per second since start
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.events_admitted.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_dispositions(&self) -> HashMap<String, u64> {
        self.dispositions.read().unwrap().clone()
    }

    pub fn get_instability_distribution(&self) -> [u64; 10] {
        *self.instability_buckets.read().unwrap()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let admitted = self.events_admitted.load(Ordering::Relaxed);
        let duplicates = self.duplicates_dropped.load(Ordering::Relaxed);
        let reconnects = self.reconnects.load(Ordering::Relaxed);
        let fetches = self.fetches.load(Ordering::Relaxed);
        let fetch_failures = self.fetch_failures.load(Ordering::Relaxed);
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let stale = self.stale_discards.load(Ordering::Relaxed);
        let dispositions = self.get_dispositions();
        let distribution = self.get_instability_distribution();

        info!("╔══════════════════════════════════════════════════════════╗");
        info!("║            RISK CONSOLE - METRICS SUMMARY                ║");
        info!("╠══════════════════════════════════════════════════════════╣");
        info!(
            "║ Events Admitted: {:>8}  │  Throughput: {:>6.1} ev/s    ║",
            admitted,
            self.get_throughput()
        );
        info!(
            "║ Duplicates Dropped: {:>5}  │  Reconnects: {:>6}        ║",
            duplicates, reconnects
        );
        info!(
            "║ Case Fetches: {:>6} ({} failed)  │  Cache Hits: {:>5}  ║",
            fetches, fetch_failures, cache_hits
        );
        info!("║ Stale Responses Discarded: {:>5}                         ║", stale);
        info!("╠══════════════════════════════════════════════════════════╣");
        info!("║ Dispositions:                                            ║");
        for (action, count) in &dispositions {
            info!("║   {:10}: {:>6}                                       ║", action, count);
        }
        info!("╠══════════════════════════════════════════════════════════╣");
        info!("║ Instability Distribution:                                ║");
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════╝");
    }
}

impl Default for ConsoleMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodic summary reporter
pub struct MetricsReporter {
    metrics: std::sync::Arc<ConsoleMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<ConsoleMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
