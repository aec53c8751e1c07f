//! Durable cache of completed case reviews.
//!
//! Membership is monotonic: records are only ever written or overwritten,
//! never removed. The id set is reloaded from disk at open so the
//! "already reviewed" filter survives process restarts.

use crate::types::case::CaseRecord;
use std::collections::HashSet;
use std::sync::RwLock;
use thiserror::Error;
use tracing::{debug, info};

/// Cache failure. A write error is fatal to the disposition that caused
/// it, since cache membership is what prevents duplicate review.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("case store unavailable: {0}")]
    Storage(#[from] sled::Error),
    #[error("case record encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Keyed store of completed case reviews.
///
/// The desk writes through this trait at disposition time; the live queue
/// filter reads membership through it.
pub trait ReviewStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<CaseRecord>, CacheError>;

    /// Overwrites unconditionally. The record must be durable before this
    /// returns.
    fn put(&self, id: &str, record: &CaseRecord) -> Result<(), CacheError>;

    fn has(&self, id: &str) -> bool;
}

/// Review cache backed by a sled tree, one JSON-encoded record per
/// transaction id.
pub struct CaseCache {
    db: sled::Db,
    records: sled::Tree,
    /// Mirror of the tree's key set, kept for infallible membership checks
    reviewed: RwLock<HashSet<String>>,
}

impl CaseCache {
    /// Open or create the cache at the given path and reconstruct the
    /// reviewed-id set from disk.
    pub fn open(path: &str) -> Result<Self, CacheError> {
        let db = sled::open(path)?;
        let records = db.open_tree("cases")?;

        let mut reviewed = HashSet::new();
        for entry in records.iter() {
            let (key, _) = entry?;
            reviewed.insert(String::from_utf8_lossy(&key).into_owned());
        }
        info!(count = reviewed.len(), "Loaded reviewed cases from case store");

        Ok(Self {
            db,
            records,
            reviewed: RwLock::new(reviewed),
        })
    }

    pub fn len(&self) -> usize {
        self.reviewed.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviewed.read().unwrap().is_empty()
    }
}

impl ReviewStore for CaseCache {
    fn get(&self, id: &str) -> Result<Option<CaseRecord>, CacheError> {
        match self.records.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, id: &str, record: &CaseRecord) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(record)?;
        self.records.insert(id.as_bytes(), bytes)?;
        // A crash after this call returns must not lose the record.
        self.db.flush()?;

        self.reviewed.write().unwrap().insert(id.to_string());
        debug!(case_id = %id, "Case record persisted");
        Ok(())
    }

    fn has(&self, id: &str) -> bool {
        self.reviewed.read().unwrap().contains(id)
    }
}
