//! Engine worker loop
//!
//! Runs on its own thread and owns every mutation of the shared window:
//! ingestion of genuine samples, gap filling, health reclassification and
//! eviction on the 1-second tick, throttled persistence, and window
//! swaps on duration changes.
//!
//! # Non-blocking collaborators
//!
//! Store writes are handed to the dedicated writer thread through a
//! bounded queue; store backfill queries run on one-shot threads that
//! post an [`EngineCommand::ApplyBackfill`] back to this loop. Neither
//! can stall ingestion.
//!
//! # Window swaps
//!
//! A duration change immediately re-evicts the live window at the new
//! horizon, then keeps it live until the backfill result arrives, at
//! which point the freshly built window is swapped in within one
//! critical section. Genuine samples ingested while the backfill was in
//! flight are merged into the new window. Readers see either the fully
//! old or the fully new window. A stale backfill (duration changed again
//! while the query ran) is discarded.

use crate::config::EngineConfig;
use crate::engine::{lock_shared, EngineCommand, EngineEvent, EngineShared};
use crate::gapfill::GapFiller;
use crate::health::HealthMonitor;
use crate::persist::{spawn_store_writer, PersistRequest, PersistenceThrottler, PERSIST_QUEUE_DEPTH};
use crate::store::{DurableStore, StoredReading};
use crate::transport::{decode_payload, SensorTransport};
use crate::types::{Sample, SensorReading, WindowDuration};
use crate::window::SlidingWindow;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Poll interval of the worker loop
const LOOP_INTERVAL: Duration = Duration::from_millis(25);

/// Spacing of the health/eviction tick
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// The engine worker that runs the ingestion and tick loop
pub struct EngineWorker {
    /// Engine configuration
    config: EngineConfig,
    /// Transport delivering raw payloads
    transport: Box<dyn SensorTransport>,
    /// Durable store client, shared with writer and backfill threads
    store: Arc<dyn DurableStore>,
    /// Window state shared with the read API
    shared: Arc<Mutex<EngineShared>>,
    /// Command sender, cloned into backfill threads
    command_tx: Sender<EngineCommand>,
    /// Command receiver
    command_rx: Receiver<EngineCommand>,
    /// Event sender to the presentation layer
    event_tx: Sender<EngineEvent>,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Gap filler for the arrival and tick paths
    gap_filler: GapFiller,
    /// Link health state machine
    health: HealthMonitor,
    /// Durable-store write throttle
    throttler: PersistenceThrottler,
    /// Queue into the store writer thread (None once shut down)
    persist_tx: Option<Sender<PersistRequest>>,
    /// Store writer thread handle
    writer_handle: Option<JoinHandle<()>>,
    /// Duration of the backfill currently in flight
    pending_reload: Option<WindowDuration>,
    /// Anchor for gap filling: the last live (genuine or tick-synthesized)
    /// sample. Cleared on window resets so no gaps are synthesized across
    /// the reset boundary.
    last_live: Option<Sample>,
    /// Last tick instant
    last_tick: Instant,
    /// Number of writes dropped because the persistence queue was full
    dropped_writes: u64,
}

impl EngineWorker {
    /// Create a worker and spawn its store writer thread
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        transport: Box<dyn SensorTransport>,
        store: Arc<dyn DurableStore>,
        shared: Arc<Mutex<EngineShared>>,
        command_tx: Sender<EngineCommand>,
        command_rx: Receiver<EngineCommand>,
        event_tx: Sender<EngineEvent>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let (persist_tx, persist_rx) = bounded(PERSIST_QUEUE_DEPTH);
        let writer_handle = spawn_store_writer(store.clone(), persist_rx);

        Self {
            config,
            transport,
            store,
            shared,
            command_tx,
            command_rx,
            event_tx,
            running,
            gap_filler: GapFiller::default(),
            health: HealthMonitor::new(Utc::now()),
            throttler: PersistenceThrottler::default(),
            persist_tx: Some(persist_tx),
            writer_handle: Some(writer_handle),
            pending_reload: None,
            last_live: None,
            last_tick: Instant::now(),
            dropped_writes: 0,
        }
    }

    /// Run the main worker loop
    pub fn run(&mut self) {
        tracing::info!(
            "Engine worker started (topic: {})",
            self.config.transport.topic
        );

        // Initial history load for the configured horizon
        let initial = self.config.display.window_duration;
        self.request_backfill(initial);

        while self.running.load(Ordering::SeqCst) {
            self.process_commands();
            self.poll_transport();

            if self.last_tick.elapsed() >= TICK_INTERVAL {
                self.on_tick(Utc::now());
                self.last_tick = Instant::now();
            }

            std::thread::sleep(LOOP_INTERVAL);
        }

        // Dropping the queue sender lets the writer drain and exit
        self.persist_tx = None;
        if let Some(handle) = self.writer_handle.take() {
            let _ = handle.join();
        }

        let _ = self.event_tx.try_send(EngineEvent::Shutdown);
        tracing::info!(
            "Engine worker stopped ({} persistence writes dropped)",
            self.dropped_writes
        );
    }

    /// Process pending commands
    fn process_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    /// Handle a single command
    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::SetWindowDuration(duration) => {
                let current = lock_shared(&self.shared).window.duration();
                if duration != current || self.pending_reload.is_some() {
                    tracing::info!("Window duration change requested: {}", duration);
                    // Re-filter the live window at the new horizon right
                    // away; the backfill swap follows asynchronously.
                    let horizon =
                        Utc::now() - chrono::Duration::milliseconds(duration.as_millis());
                    lock_shared(&self.shared).window.evict_before(horizon);
                    self.request_backfill(duration);
                }
            }
            EngineCommand::ClearData => {
                let mut shared = lock_shared(&self.shared);
                shared.window.clear();
                shared.last_genuine = None;
                drop(shared);
                self.last_live = None;
            }
            EngineCommand::Shutdown => {
                self.running.store(false, Ordering::SeqCst);
            }
            EngineCommand::ApplyBackfill { duration, result } => {
                self.apply_backfill(duration, result);
            }
        }
    }

    /// Drain pending transport payloads
    fn poll_transport(&mut self) {
        while let Some(payload) = self.transport.try_recv() {
            match decode_payload(&payload) {
                Ok(reading) => self.handle_reading(Utc::now(), reading),
                Err(e) => tracing::warn!("Dropping malformed payload: {}", e),
            }
        }
    }

    /// Ingest a genuine reading
    ///
    /// Gap-fills behind it if needed, appends, evicts, resets health, and
    /// forwards to persistence when the throttle allows.
    pub(crate) fn handle_reading(&mut self, now: DateTime<Utc>, reading: SensorReading) {
        // Offline marking for the backfilled gap uses the pre-arrival
        // silence; the arrival itself resets health afterwards.
        let offline = self.health.offline_flag(now);
        let previous = self.health.state();
        let state = self.health.on_message(now);

        let sample = Sample::genuine(now, reading.temperature, reading.humidity);

        {
            let mut shared = lock_shared(&self.shared);
            if let Some(anchor) = &self.last_live {
                for synth in self.gap_filler.fill_between(anchor, sample.timestamp, offline) {
                    shared.window.append(synth);
                }
            }
            shared.window.append(sample.clone());
            let horizon = shared.window.horizon(now);
            shared.window.evict_before(horizon);
            shared.health = state;
            shared.last_genuine = Some(sample.clone());
        }

        self.last_live = Some(sample);

        if previous != state {
            let _ = self.event_tx.try_send(EngineEvent::Health(state));
        }

        if self.throttler.should_persist(now) {
            self.enqueue_persist(reading);
        }
    }

    /// Periodic health/eviction tick
    pub(crate) fn on_tick(&mut self, now: DateTime<Utc>) {
        let offline = self.health.offline_flag(now);
        let previous = self.health.state();
        let state = self.health.on_tick(now);

        {
            let mut shared = lock_shared(&self.shared);

            if let Some(anchor) = self.last_live.clone() {
                if let Some(synth) = self.gap_filler.fill_on_tick(&anchor, now, offline) {
                    shared.window.append(synth.clone());
                    self.last_live = Some(synth);
                }
            }

            let horizon = shared.window.horizon(now);
            shared.window.evict_before(horizon);
            shared.health = state;
        }

        if previous != state {
            tracing::info!(
                "Link health: {} -> {} ({}s silent)",
                previous,
                state,
                self.health.silence_ms(now) / 1_000
            );
            let _ = self.event_tx.try_send(EngineEvent::Health(state));
        }
    }

    /// Queue a reading for the store writer, dropping on backpressure
    fn enqueue_persist(&mut self, reading: SensorReading) {
        let Some(tx) = &self.persist_tx else {
            return;
        };

        let req = PersistRequest {
            temperature: reading.temperature,
            humidity: reading.humidity,
        };
        if tx.try_send(req).is_err() {
            self.dropped_writes += 1;
            tracing::warn!(
                "Persistence queue full, write dropped ({} total)",
                self.dropped_writes
            );
        }
    }

    /// Kick off an asynchronous store backfill for `[now - duration, now]`
    fn request_backfill(&mut self, duration: WindowDuration) {
        self.pending_reload = Some(duration);

        let store = self.store.clone();
        let tx = self.command_tx.clone();
        let since = Utc::now() - chrono::Duration::milliseconds(duration.as_millis());

        std::thread::spawn(move || {
            let result = store.query_since(since).map_err(|e| e.to_string());
            let _ = tx.send(EngineCommand::ApplyBackfill { duration, result });
        });
    }

    /// Apply a backfill result, swapping the window atomically
    ///
    /// Genuine samples that arrived while the backfill was in flight are
    /// carried into the new window so a reload never loses live data.
    /// Synthetic fill is not carried over, and the fill anchor follows
    /// the newest surviving genuine sample; backfilled store rows never
    /// seed synthesis.
    pub(crate) fn apply_backfill(
        &mut self,
        duration: WindowDuration,
        result: std::result::Result<Vec<StoredReading>, String>,
    ) {
        if self.pending_reload != Some(duration) {
            tracing::debug!("Discarding stale backfill for {}", duration);
            return;
        }
        self.pending_reload = None;

        let now = Utc::now();

        match result {
            Ok(rows) => {
                let count = rows.len();
                let mut window = SlidingWindow::new(duration);
                for row in rows {
                    window.append(Sample::genuine(row.created_at, row.temperature, row.humidity));
                }
                let horizon = window.horizon(now);

                let mut shared = lock_shared(&self.shared);
                for sample in shared.window.snapshot() {
                    if !sample.synthetic && sample.timestamp >= horizon {
                        window.append(sample);
                    }
                }
                window.evict_before(horizon);

                let last_genuine = shared
                    .last_genuine
                    .take()
                    .filter(|s| s.timestamp >= horizon);
                self.last_live = last_genuine.clone();
                shared.last_genuine = last_genuine;
                shared.window = window;
                drop(shared);

                tracing::info!("Window reloaded: {} rows for {}", count, duration);
                let _ = self
                    .event_tx
                    .try_send(EngineEvent::WindowReloaded { duration, rows: count });
            }
            Err(e) => {
                tracing::error!("Store backfill failed, window reset empty: {}", e);
                let mut shared = lock_shared(&self.shared);
                shared.window = SlidingWindow::new(duration);
                shared.last_genuine = None;
                drop(shared);
                self.last_live = None;
                let _ = self.event_tx.try_send(EngineEvent::StoreError(e));
            }
        }
    }

    /// Current health state as seen by the worker
    #[cfg(test)]
    pub(crate) fn health_state(&self) -> crate::types::HealthState {
        self.health.state()
    }
}
