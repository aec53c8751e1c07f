//! Event channel client for the live risk-event feed.
//!
//! Maintains a logical "always eventually connected" subscription over an
//! unreliable transport: any closure or connect failure schedules a
//! reconnect after a fixed delay, forever. Nothing is replayed after an
//! outage; events lost while disconnected are an accepted gap, not an
//! error. Transport errors never escape this module.

use crate::buffer::SharedBuffer;
use crate::metrics::ConsoleMetrics;
use crate::types::event::FeedFrame;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed transport unavailable: {0}")]
    Transport(String),
}

/// Transport behind the subscription, injectable so reconnection timing
/// and message handling are testable without a network.
///
/// A connect yields the raw payload stream; the stream ending means the
/// transport closed (cleanly or not — the client treats both the same).
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn connect(&self) -> Result<BoxStream<'static, Vec<u8>>, FeedError>;
}

/// NATS-backed transport subscribing to the configured subject.
pub struct NatsTransport {
    url: String,
    subject: String,
}

impl NatsTransport {
    pub fn new(url: &str, subject: &str) -> Self {
        Self {
            url: url.to_string(),
            subject: subject.to_string(),
        }
    }
}

#[async_trait]
impl FeedTransport for NatsTransport {
    async fn connect(&self) -> Result<BoxStream<'static, Vec<u8>>, FeedError> {
        let client = async_nats::connect(&self.url)
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        let subscriber = client
            .subscribe(self.subject.clone())
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        info!(subject = %self.subject, "Subscribed to risk-event feed");

        // The subscription is only live while the client is; move the
        // client into the stream so both drop together.
        let stream = subscriber.map(move |message| {
            let _keep_alive = &client;
            message.payload.to_vec()
        });
        Ok(stream.boxed())
    }
}

/// Client pumping feed frames into the event buffer.
pub struct FeedClient<T> {
    transport: T,
    buffer: SharedBuffer,
    metrics: Arc<ConsoleMetrics>,
    reconnect_delay: Duration,
}

impl<T: FeedTransport> FeedClient<T> {
    pub fn new(
        transport: T,
        buffer: SharedBuffer,
        metrics: Arc<ConsoleMetrics>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            transport,
            buffer,
            metrics,
            reconnect_delay,
        }
    }

    /// Run the subscription until shutdown is signalled.
    ///
    /// Returning drops the open transport stream and any pending
    /// reconnect timer; neither outlives the client.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            let connected = tokio::select! {
                result = self.transport.connect() => match result {
                    Ok(stream) => Some(stream),
                    Err(e) => {
                        warn!(error = %e, "Feed connect failed");
                        None
                    }
                },
                _ = shutdown.changed() => return,
            };

            if let Some(mut stream) = connected {
                loop {
                    tokio::select! {
                        frame = stream.next() => match frame {
                            Some(payload) => self.ingest(&payload),
                            None => {
                                warn!("Risk-event feed closed, reconnecting");
                                break;
                            }
                        },
                        _ = shutdown.changed() => return,
                    }
                }
            }

            self.metrics.record_reconnect();
            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = shutdown.changed() => return,
            }
        }
    }

    /// Decode and admit one raw frame. A frame that fails to decode is
    /// dropped without disturbing the stream.
    fn ingest(&self, payload: &[u8]) {
        match serde_json::from_slice::<FeedFrame>(payload) {
            Ok(frame) => {
                let event = frame.into_event();
                let instability = event.system.instability;
                let admitted = self.buffer.write().unwrap().admit(event);
                if admitted {
                    self.metrics.record_admitted(instability);
                } else {
                    self.metrics.record_duplicate();
                }
                debug!(instability, admitted, "Feed frame processed");
            }
            Err(e) => {
                warn!(error = %e, "Failed to decode feed frame");
                self.metrics.record_decode_failure();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::EventBuffer;
    use crate::testkit::sample_frame;
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted payload batches, one batch per connect. A `None`
    /// batch yields a stream that stays open forever.
    struct ScriptedTransport {
        connects: Arc<AtomicUsize>,
        batches: Mutex<Vec<Option<Vec<Vec<u8>>>>>,
    }

    impl ScriptedTransport {
        fn new(batches: Vec<Option<Vec<Vec<u8>>>>) -> (Self, Arc<AtomicUsize>) {
            let connects = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    connects: connects.clone(),
                    batches: Mutex::new(batches),
                },
                connects,
            )
        }
    }

    #[async_trait]
    impl FeedTransport for ScriptedTransport {
        async fn connect(&self) -> Result<BoxStream<'static, Vec<u8>>, FeedError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let mut batches = self.batches.lock().unwrap();
            match batches.remove(0) {
                Some(payloads) => Ok(stream::iter(payloads).boxed()),
                None => Ok(stream::pending().boxed()),
            }
        }
    }

    fn frame_bytes(id: &str, instability: f64) -> Vec<u8> {
        serde_json::to_vec(&sample_frame(id, instability)).unwrap()
    }

    fn spawn_client(
        transport: ScriptedTransport,
        buffer: SharedBuffer,
    ) -> (watch::Sender<bool>, tokio::task::JoinHandle<()>) {
        let client = Arc::new(FeedClient::new(
            transport,
            buffer,
            Arc::new(ConsoleMetrics::new()),
            Duration::from_millis(3000),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { client.run(shutdown_rx).await });
        (shutdown_tx, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_are_admitted_in_arrival_order() {
        let (transport, _connects) = ScriptedTransport::new(vec![Some(vec![
            frame_bytes("TX-1", 0.2),
            frame_bytes("TX-2", 0.4),
            frame_bytes("TX-1", 0.6),
        ])]);
        let buffer = EventBuffer::new().shared();
        let (shutdown, handle) = spawn_client(transport, buffer.clone());

        tokio::task::yield_now().await;

        let snapshot = buffer.read().unwrap().snapshot();
        assert_eq!(snapshot.events.len(), 2);
        assert_eq!(snapshot.events[0].id(), "TX-2");
        assert_eq!(snapshot.events[1].id(), "TX-1");
        // The redelivery still moved the scalar state.
        assert_eq!(snapshot.system.instability, 0.6);
        assert_eq!(snapshot.history.len(), 3);

        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_frame_does_not_kill_the_stream() {
        let (transport, connects) = ScriptedTransport::new(vec![Some(vec![
            b"not json".to_vec(),
            frame_bytes("TX-1", 0.3),
        ])]);
        let buffer = EventBuffer::new().shared();
        let (shutdown, handle) = spawn_client(transport, buffer.clone());

        tokio::task::yield_now().await;

        assert_eq!(buffer.read().unwrap().len(), 1);
        assert_eq!(connects.load(Ordering::SeqCst), 1);

        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_close_reconnects_after_fixed_delay() {
        // First connect closes immediately; second stays open.
        let (transport, connects) =
            ScriptedTransport::new(vec![Some(vec![frame_bytes("TX-1", 0.1)]), None]);
        let buffer = EventBuffer::new().shared();
        let (shutdown, handle) = spawn_client(transport, buffer.clone());

        tokio::task::yield_now().await;
        assert_eq!(connects.load(Ordering::SeqCst), 1);

        // Just short of the reconnect delay: still waiting.
        tokio::time::advance(Duration::from_millis(2999)).await;
        tokio::task::yield_now().await;
        assert_eq!(connects.load(Ordering::SeqCst), 1);

        // Crossing the delay triggers exactly one reconnect.
        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(connects.load(Ordering::SeqCst), 2);

        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_delay_cancels_reconnect() {
        let (transport, connects) =
            ScriptedTransport::new(vec![Some(vec![frame_bytes("TX-1", 0.1)]), None]);
        let buffer = EventBuffer::new().shared();
        let (shutdown, handle) = spawn_client(transport, buffer);

        tokio::task::yield_now().await;
        assert_eq!(connects.load(Ordering::SeqCst), 1);

        // Shut down while the reconnect timer is pending.
        tokio::time::advance(Duration::from_millis(1000)).await;
        shutdown.send(true).unwrap();
        handle.await.unwrap();

        tokio::time::advance(Duration::from_millis(5000)).await;
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }
}
