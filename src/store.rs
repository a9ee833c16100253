//! Durable store seam
//!
//! The remote store is an external collaborator with at-least-once insert
//! semantics from the caller's perspective. The engine only needs two
//! operations: a timestamp-free insert (the server assigns `created_at`)
//! and an ascending range query from a lower-bound timestamp.
//!
//! [`MemoryStore`] is the in-tree implementation used by tests and the
//! demo binary; an adapter for a real HTTP store implements the same
//! trait outside the engine.

use crate::error::{EngineError, Result};
use crate::types::truncate_to_millis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A persisted reading as returned by the store's range query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Server-assigned insertion timestamp
    pub created_at: DateTime<Utc>,
}

/// Interface to the durable store
///
/// Implementations must be `Send + Sync`: the writer thread and backfill
/// threads share one instance behind an `Arc`.
#[cfg_attr(test, mockall::automock)]
pub trait DurableStore: Send + Sync {
    /// Insert a reading; the store assigns the timestamp
    ///
    /// Errors are non-fatal to the engine: the caller logs and drops.
    fn insert(&self, temperature: f64, humidity: f64) -> Result<()>;

    /// Query readings with `created_at >= since`, ascending by timestamp
    fn query_since(&self, since: DateTime<Utc>) -> Result<Vec<StoredReading>>;
}

/// In-memory durable store for tests and the demo binary
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<StoredReading>>,
    fail_inserts: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with rows (assumed ascending)
    pub fn with_rows(rows: Vec<StoredReading>) -> Self {
        Self {
            rows: Mutex::new(rows),
            fail_inserts: AtomicBool::new(false),
        }
    }

    /// Make subsequent inserts fail, for error-path tests
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Number of rows currently stored
    pub fn len(&self) -> usize {
        self.rows.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Check whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DurableStore for MemoryStore {
    fn insert(&self, temperature: f64, humidity: f64) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(EngineError::Store("insert rejected".to_string()));
        }

        let mut rows = self
            .rows
            .lock()
            .map_err(|_| EngineError::Store("store lock poisoned".to_string()))?;
        rows.push(StoredReading {
            temperature,
            humidity,
            created_at: truncate_to_millis(Utc::now()),
        });
        Ok(())
    }

    fn query_since(&self, since: DateTime<Utc>) -> Result<Vec<StoredReading>> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| EngineError::Store("store lock poisoned".to_string()))?;
        Ok(rows
            .iter()
            .filter(|r| r.created_at >= since)
            .copied()
            .collect())
    }
}
