//! Persistence throttling and the store writer thread
//!
//! Forwards a bounded-rate subset of genuine samples to the durable
//! store so write volume tracks the save interval rather than the
//! ingestion rate. Persistence is best-effort: insert failures are
//! logged and discarded, never retried, and never affect the in-memory
//! pipeline.
//!
//! Writes go through a bounded channel to a dedicated writer thread so a
//! slow or failed store call can never stall ingestion. A full queue
//! drops the write and counts it.

use crate::store::DurableStore;
use crate::types::SAVE_INTERVAL_MS;
use chrono::{DateTime, Utc};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Capacity of the queue feeding the store writer thread
pub const PERSIST_QUEUE_DEPTH: usize = 64;

/// A reading queued for insertion (the store assigns the timestamp)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersistRequest {
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
}

/// Enforces the minimum spacing between durable-store writes
///
/// The elapsed-time variant: a sample persists when at least the save
/// interval has passed since the last persisted sample, regardless of
/// wall-clock alignment.
#[derive(Debug, Clone)]
pub struct PersistenceThrottler {
    save_interval_ms: i64,
    last_persisted_at: Option<DateTime<Utc>>,
}

impl Default for PersistenceThrottler {
    fn default() -> Self {
        Self::new(SAVE_INTERVAL_MS)
    }
}

impl PersistenceThrottler {
    /// Create a throttler with a custom save interval (milliseconds)
    pub fn new(save_interval_ms: i64) -> Self {
        Self {
            save_interval_ms: save_interval_ms.max(1),
            last_persisted_at: None,
        }
    }

    /// Instant of the last forwarded write, if any
    pub fn last_persisted_at(&self) -> Option<DateTime<Utc>> {
        self.last_persisted_at
    }

    /// Decide whether a genuine sample arriving at `now` should be
    /// forwarded, advancing the cursor when it should
    ///
    /// The very first sample always persists.
    pub fn should_persist(&mut self, now: DateTime<Utc>) -> bool {
        let due = match self.last_persisted_at {
            None => true,
            Some(last) => now.timestamp_millis() - last.timestamp_millis() >= self.save_interval_ms,
        };

        if due {
            self.last_persisted_at = Some(now);
        }
        due
    }
}

/// Spawn the dedicated store writer thread
///
/// Drains the queue until every sender is dropped. Insert failures are
/// logged at warn level and discarded.
pub fn spawn_store_writer(
    store: Arc<dyn DurableStore>,
    requests: Receiver<PersistRequest>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        tracing::debug!("Store writer started");
        let mut failed: u64 = 0;

        while let Ok(req) = requests.recv() {
            if let Err(e) = store.insert(req.temperature, req.humidity) {
                failed += 1;
                tracing::warn!("Store insert failed (dropped, {} total): {}", failed, e);
            }
        }

        tracing::debug!("Store writer stopped ({} failed inserts)", failed);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::store::MockDurableStore;
    use chrono::{Duration, TimeZone};
    use crossbeam_channel::bounded;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_first_sample_persists() {
        let mut throttler = PersistenceThrottler::default();
        assert!(throttler.should_persist(base()));
        assert_eq!(throttler.last_persisted_at(), Some(base()));
    }

    #[test]
    fn test_one_hz_for_sixty_seconds_yields_four_writes() {
        let mut throttler = PersistenceThrottler::default();
        let mut persisted = Vec::new();

        for i in 0..60 {
            let now = base() + Duration::seconds(i);
            if throttler.should_persist(now) {
                persisted.push(now);
            }
        }

        assert_eq!(persisted.len(), 4);
        assert!(persisted
            .windows(2)
            .all(|w| (w[1] - w[0]).num_milliseconds() >= SAVE_INTERVAL_MS));
    }

    #[test]
    fn test_irregular_arrivals_respect_spacing() {
        let mut throttler = PersistenceThrottler::default();
        assert!(throttler.should_persist(base()));
        assert!(!throttler.should_persist(base() + Duration::seconds(14)));
        assert!(throttler.should_persist(base() + Duration::seconds(16)));
        // Spacing measured from the last persisted write, not the skipped one
        assert!(!throttler.should_persist(base() + Duration::seconds(30)));
        assert!(throttler.should_persist(base() + Duration::seconds(31)));
    }

    #[test]
    fn test_writer_forwards_requests() {
        let mut store = MockDurableStore::new();
        store
            .expect_insert()
            .times(2)
            .returning(|_, _| Ok(()));

        let (tx, rx) = bounded(PERSIST_QUEUE_DEPTH);
        let handle = spawn_store_writer(Arc::new(store), rx);

        tx.send(PersistRequest {
            temperature: 20.0,
            humidity: 50.0,
        })
        .unwrap();
        tx.send(PersistRequest {
            temperature: 21.0,
            humidity: 51.0,
        })
        .unwrap();
        drop(tx);

        handle.join().unwrap();
    }

    #[test]
    fn test_writer_survives_insert_failures() {
        let mut store = MockDurableStore::new();
        store
            .expect_insert()
            .times(3)
            .returning(|_, _| Err(EngineError::Store("down".to_string())));

        let (tx, rx) = bounded(PERSIST_QUEUE_DEPTH);
        let handle = spawn_store_writer(Arc::new(store), rx);

        for _ in 0..3 {
            tx.send(PersistRequest {
                temperature: 1.0,
                humidity: 2.0,
            })
            .unwrap();
        }
        drop(tx);

        // The thread exits cleanly despite every insert failing
        handle.join().unwrap();
    }
}
