//! Bounded in-memory model of the live risk-event stream.
//!
//! Converts a raw, possibly-redelivered event stream into a clean view:
//! a deduplicated recent-history window of events (most-recent-first), a
//! time series of the scalar instability metric (oldest-first), and the
//! latest system state.

use crate::types::event::{EntropySample, RiskEvent, SystemState};
use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, RwLock};

/// Recent-history window for risk events
pub const DEFAULT_MAX_EVENTS: usize = 50;
/// Window for the instability time series
pub const DEFAULT_MAX_HISTORY: usize = 60;

/// Buffer handle shared between the feed task (writer) and snapshot
/// readers.
pub type SharedBuffer = Arc<RwLock<EventBuffer>>;

/// Bounded, deduplicated view over the event stream.
///
/// Mutated only by the event channel client on message arrival; everyone
/// else reads through [`EventBuffer::snapshot`].
pub struct EventBuffer {
    /// Front = most recently admitted
    events: VecDeque<RiskEvent>,
    /// Ids currently present in `events`
    seen: HashSet<String>,
    /// Front = oldest sample
    history: VecDeque<EntropySample>,
    system: SystemState,
    max_events: usize,
    max_history: usize,
}

/// Cheap copy of the buffer contents for the presentation layer.
#[derive(Debug, Clone)]
pub struct BufferSnapshot {
    /// Most-recent-first
    pub events: Vec<RiskEvent>,
    /// Oldest-first
    pub history: Vec<EntropySample>,
    pub system: SystemState,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_EVENTS, DEFAULT_MAX_HISTORY)
    }

    pub fn with_limits(max_events: usize, max_history: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events + 1),
            seen: HashSet::with_capacity(max_events + 1),
            history: VecDeque::with_capacity(max_history + 1),
            system: SystemState::default(),
            max_events,
            max_history,
        }
    }

    /// Wrap the buffer for sharing with the feed task.
    pub fn shared(self) -> SharedBuffer {
        Arc::new(RwLock::new(self))
    }

    /// Admit one event from the stream.
    ///
    /// The system state and the instability series always reflect the
    /// stream's latest reading, even when the transaction itself is a
    /// redelivery. The event sequence keeps the first-seen payload for a
    /// given id; a duplicate never updates or reorders it. Returns whether
    /// the event entered the sequence.
    pub fn admit(&mut self, event: RiskEvent) -> bool {
        self.system = event.system;
        self.history.push_back(EntropySample {
            timestamp: Utc::now(),
            value: event.system.instability,
        });
        if self.history.len() > self.max_history {
            self.history.pop_front();
        }

        if self.seen.contains(event.id()) {
            return false;
        }

        self.seen.insert(event.id().to_string());
        self.events.push_front(event);
        if self.events.len() > self.max_events {
            // An evicted id is eligible for re-admission if redelivered.
            if let Some(evicted) = self.events.pop_back() {
                self.seen.remove(evicted.id());
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn system(&self) -> SystemState {
        self.system
    }

    /// Copy out the current contents.
    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            events: self.events.iter().cloned().collect(),
            history: self.history.iter().cloned().collect(),
            system: self.system,
        }
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new()
    }
}
