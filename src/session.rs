//! Investigation session state machine and the operator desk.
//!
//! One transaction at a time moves through a fixed five-stage forensic
//! pipeline. The stage order is strict and bidirectional with no
//! skipping: each stage's evidence is a narrative link toward the
//! verdict, and a disposition must not be reachable without the operator
//! having seen the prior evidence.

use crate::buffer::{BufferSnapshot, SharedBuffer};
use crate::cache::{CacheError, ReviewStore};
use crate::metrics::ConsoleMetrics;
use crate::services::{ActionError, ActionSink, CaseSource, FetchError};
use crate::types::case::{CaseBundle, CaseRecord, Disposition};
use crate::types::event::RiskEvent;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Analysis stages, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Ingest,
    Topology,
    Screening,
    Optimization,
    Verdict,
}

impl Stage {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// The following stage; terminal at [`Stage::Verdict`].
    pub fn advance(self) -> Self {
        match self {
            Stage::Ingest => Stage::Topology,
            Stage::Topology => Stage::Screening,
            Stage::Screening => Stage::Optimization,
            Stage::Optimization => Stage::Verdict,
            Stage::Verdict => Stage::Verdict,
        }
    }

    /// The preceding stage; terminal at [`Stage::Ingest`].
    pub fn retreat(self) -> Self {
        match self {
            Stage::Ingest => Stage::Ingest,
            Stage::Topology => Stage::Ingest,
            Stage::Screening => Stage::Topology,
            Stage::Optimization => Stage::Screening,
            Stage::Verdict => Stage::Optimization,
        }
    }
}

/// Ephemeral state of one open investigation.
#[derive(Debug, Clone, Serialize)]
pub struct InvestigationSession {
    pub transaction_id: String,
    pub bundle: CaseBundle,
    pub stage: Stage,
}

/// How an `open_case` call concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Session entered at INGEST with a freshly fetched bundle
    Opened,
    /// Session entered from the review cache; the service was not called
    Reopened,
    /// A fetch for the same id is already outstanding; nothing was done
    AlreadyInFlight,
    /// The fetch landed after the desk had moved on; result discarded
    Superseded,
}

#[derive(Debug, Error)]
pub enum OpenCaseError {
    #[error("failed to open case: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to read the review cache: {0}")]
    Cache(#[from] CacheError),
}

#[derive(Debug, Error)]
pub enum DispositionError {
    #[error("no investigation is open")]
    NoSession,
    #[error("the case is not at the verdict stage")]
    NotAtVerdict,
    /// The decision did not durably record; the session stays open so the
    /// operator can retry.
    #[error("disposition was not durably recorded: {0}")]
    Record(#[from] CacheError),
}

/// Result of a recorded disposition.
#[derive(Debug)]
pub struct DispositionOutcome {
    pub audit_id: Uuid,
    /// Set when the block command failed. The disposition still recorded;
    /// the failure is surfaced as a notification only, never retried.
    pub block_failure: Option<ActionError>,
}

struct DeskState {
    session: Option<InvestigationSession>,
    fetch_in_flight: Option<String>,
}

/// Operator facade over the live buffer, the review cache and the
/// investigation workflow.
///
/// All mutation funnels through operator actions; the lock is never held
/// across a service call. An epoch counter, bumped on every view
/// transition, arbitrates fetches that resolve late: a response whose
/// epoch no longer matches is discarded rather than applied.
pub struct Desk<S, A, C> {
    buffer: SharedBuffer,
    store: Arc<C>,
    source: S,
    actions: A,
    metrics: Arc<ConsoleMetrics>,
    state: Mutex<DeskState>,
    epoch: AtomicU64,
}

impl<S: CaseSource, A: ActionSink, C: ReviewStore> Desk<S, A, C> {
    pub fn new(
        buffer: SharedBuffer,
        store: Arc<C>,
        source: S,
        actions: A,
        metrics: Arc<ConsoleMetrics>,
    ) -> Self {
        Self {
            buffer,
            store,
            source,
            actions,
            metrics,
            state: Mutex::new(DeskState {
                session: None,
                fetch_in_flight: None,
            }),
            epoch: AtomicU64::new(0),
        }
    }

    /// Open an investigation for the given transaction.
    ///
    /// An already-reviewed case is reopened from the cache without
    /// touching the investigation service. On fetch failure no session is
    /// entered and the operator stays on the picker.
    pub async fn open_case(&self, id: &str) -> Result<OpenOutcome, OpenCaseError> {
        if self.store.has(id) {
            if let Some(record) = self.store.get(id)? {
                self.metrics.record_cache_hit();
                self.epoch.fetch_add(1, Ordering::SeqCst);
                let mut state = self.state.lock().unwrap();
                state.session = Some(InvestigationSession {
                    transaction_id: id.to_string(),
                    bundle: record.bundle,
                    stage: Stage::Ingest,
                });
                info!(case_id = %id, "Reopened case from review cache");
                return Ok(OpenOutcome::Reopened);
            }
        }

        {
            let mut state = self.state.lock().unwrap();
            if state.fetch_in_flight.as_deref() == Some(id) {
                debug!(case_id = %id, "Case fetch already in flight");
                return Ok(OpenOutcome::AlreadyInFlight);
            }
            state.fetch_in_flight = Some(id.to_string());
        }
        let ticket = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        self.metrics.record_fetch();
        let fetched = self.source.fetch_case(id).await;

        let mut state = self.state.lock().unwrap();
        if state.fetch_in_flight.as_deref() == Some(id) {
            state.fetch_in_flight = None;
        }

        let bundle = match fetched {
            Ok(bundle) => bundle,
            Err(e) => {
                self.metrics.record_fetch_failure();
                warn!(case_id = %id, error = %e, "Failed to open case");
                return Err(e.into());
            }
        };

        if self.epoch.load(Ordering::SeqCst) != ticket {
            // The operator moved on while this fetch was outstanding.
            self.metrics.record_stale_discard();
            debug!(case_id = %id, "Discarding stale case fetch");
            return Ok(OpenOutcome::Superseded);
        }

        state.session = Some(InvestigationSession {
            transaction_id: id.to_string(),
            bundle,
            stage: Stage::Ingest,
        });
        info!(case_id = %id, "Investigation opened");
        Ok(OpenOutcome::Opened)
    }

    /// Step forward one stage. No-op at VERDICT. Returns the stage now
    /// showing, or `None` when no investigation is open.
    pub fn advance_stage(&self) -> Option<Stage> {
        let mut state = self.state.lock().unwrap();
        let session = state.session.as_mut()?;
        session.stage = session.stage.advance();
        Some(session.stage)
    }

    /// Step back one stage. No-op at INGEST.
    pub fn retreat_stage(&self) -> Option<Stage> {
        let mut state = self.state.lock().unwrap();
        let session = state.session.as_mut()?;
        session.stage = session.stage.retreat();
        Some(session.stage)
    }

    /// Record the operator's decision and close the session.
    ///
    /// Only valid at VERDICT. BLOCK additionally issues the block command
    /// first; its failure does not hold up the record. A cache write
    /// failure keeps the session open, since without the record the case
    /// would resurface for review.
    pub async fn dispose(
        &self,
        action: Disposition,
    ) -> Result<DispositionOutcome, DispositionError> {
        let (id, bundle) = {
            let state = self.state.lock().unwrap();
            let session = state.session.as_ref().ok_or(DispositionError::NoSession)?;
            if session.stage != Stage::Verdict {
                return Err(DispositionError::NotAtVerdict);
            }
            (session.transaction_id.clone(), session.bundle.clone())
        };

        let block_failure = match action {
            Disposition::Block => match self.actions.block_account(&id).await {
                Ok(_) => None,
                Err(e) => {
                    warn!(case_id = %id, error = %e, "Block command failed");
                    Some(e)
                }
            },
            Disposition::Approve => None,
        };

        let record = CaseRecord::decided(bundle, action);
        if let Err(e) = self.store.put(&id, &record) {
            error!(case_id = %id, error = %e, "Disposition failed to record");
            return Err(e.into());
        }

        {
            let mut state = self.state.lock().unwrap();
            if state.session.as_ref().map(|s| s.transaction_id.as_str()) == Some(id.as_str()) {
                state.session = None;
            }
        }
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.metrics.record_disposition(match action {
            Disposition::Approve => "approve",
            Disposition::Block => "block",
        });
        info!(
            case_id = %id,
            disposition = ?action,
            audit_id = %record.audit_id,
            "Case closed with disposition"
        );

        Ok(DispositionOutcome {
            audit_id: record.audit_id,
            block_failure,
        })
    }

    /// Discard the open session, if any, and return to the picker.
    /// Recorded dispositions are unaffected. An in-flight fetch is not
    /// cancelled; its late response will be discarded.
    pub fn close_case(&self) {
        let mut state = self.state.lock().unwrap();
        if state.session.take().is_some() {
            debug!("Investigation closed without disposition");
        }
        drop(state);
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Snapshot of the open session for rendering.
    pub fn session(&self) -> Option<InvestigationSession> {
        self.state.lock().unwrap().session.clone()
    }

    /// The picker queue: live-buffer events not yet reviewed.
    ///
    /// Derived on every call from (buffer, cache) rather than stored;
    /// cache membership wins over anything the feed still redelivers.
    pub fn pending_cases(&self) -> Vec<RiskEvent> {
        let snapshot = self.buffer.read().unwrap().snapshot();
        snapshot
            .events
            .into_iter()
            .filter(|event| !self.store.has(event.id()))
            .collect()
    }

    /// Read-only copy of the live buffer.
    pub fn live_view(&self) -> BufferSnapshot {
        self.buffer.read().unwrap().snapshot()
    }
}
