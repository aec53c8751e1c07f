//! Risk Console - Main Entry Point
//!
//! Wires the live feed, the event buffer, the review cache and the
//! investigation desk together, then runs until interrupted. The desk is
//! the surface a presentation layer drives; headless, this binary keeps
//! the live model warm and reports the queue.

use anyhow::Result;
use risk_console::{
    buffer::EventBuffer,
    cache::CaseCache,
    config::AppConfig,
    feed::{FeedClient, NatsTransport},
    metrics::{ConsoleMetrics, MetricsReporter},
    services::{ActionClient, InvestigationClient},
    session::Desk,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("risk_console=info".parse()?),
        )
        .init();

    info!("Starting Risk Console");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");
    info!(
        "Feed: {} subject '{}', reconnect delay {} ms",
        config.feed.url, config.feed.subject, config.feed.reconnect_delay_ms
    );

    // Initialize metrics
    let metrics = Arc::new(ConsoleMetrics::new());

    // Open the durable review cache; membership filters the live queue.
    let cache = Arc::new(CaseCache::open(&config.cache.path)?);
    info!("Review cache ready ({} cases on record)", cache.len());

    // Live buffer shared between the feed task and snapshot readers
    let buffer = EventBuffer::with_limits(config.buffer.max_events, config.buffer.max_history)
        .shared();

    // External service clients share one HTTP client
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.services.request_timeout_ms))
        .build()?;
    let investigation = InvestigationClient::new(http.clone(), &config.services.investigation_url);
    let actions = ActionClient::new(http, &config.services.action_url);

    let desk = Arc::new(Desk::new(
        buffer.clone(),
        cache.clone(),
        investigation,
        actions,
        metrics.clone(),
    ));

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Periodic queue status for headless operation
    {
        let desk = desk.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(15));
            loop {
                interval.tick().await;
                let view = desk.live_view();
                info!(
                    pending = desk.pending_cases().len(),
                    buffered = view.events.len(),
                    instability = view.system.instability,
                    status = ?view.system.status,
                    "Live queue status"
                );
            }
        });
    }

    // Run the feed until interrupted
    let transport = NatsTransport::new(&config.feed.url, &config.feed.subject);
    let client = Arc::new(FeedClient::new(
        transport,
        buffer,
        metrics.clone(),
        Duration::from_millis(config.feed.reconnect_delay_ms),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let feed_task = {
        let client = client.clone();
        tokio::spawn(async move { client.run(shutdown_rx).await })
    };

    tokio::signal::ctrl_c().await?;
    info!("Console shutting down...");
    let _ = shutdown_tx.send(true);
    feed_task.await?;

    metrics.print_summary();
    Ok(())
}
