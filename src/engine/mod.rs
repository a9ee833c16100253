//! Engine module: lifecycle, channels and the derived read API
//!
//! The engine runs in a separate thread from the presentation layer and
//! communicates via channels:
//!
//! - [`EngineCommand`] - Messages sent into the engine (duration change, shutdown)
//! - [`EngineEvent`] - Messages sent out of the engine (health changes, store errors)
//! - [`EngineHandle`] - Presentation-side handle: commands in, events out, and
//!   the side-effect-free derived read API over the shared window state
//! - [`SensorEngine`] - Engine entry point constructed with injected
//!   collaborators (transport, store client), no ambient singletons
//!
//! # Example
//!
//! ```ignore
//! use sensorvis_rs::config::EngineConfig;
//! use sensorvis_rs::engine::SensorEngine;
//! use sensorvis_rs::store::MemoryStore;
//! use sensorvis_rs::transport::ChannelTransport;
//! use std::sync::Arc;
//!
//! let config = EngineConfig::default();
//! let (publisher, transport) = ChannelTransport::pair();
//! let store = Arc::new(MemoryStore::new());
//!
//! let (engine, handle) = SensorEngine::new(config, Box::new(transport), store);
//! std::thread::spawn(move || engine.run());
//!
//! publisher.publish(br#"{"temperature": 21.5, "humidity": 48.0}"#.to_vec());
//!
//! let snapshot = handle.window_snapshot();
//! let health = handle.health_state();
//! handle.shutdown();
//! ```

pub mod worker;

pub use worker::EngineWorker;

use crate::config::EngineConfig;
use crate::export::{self, ExportRow};
use crate::store::{DurableStore, StoredReading};
use crate::transport::SensorTransport;
use crate::trend::{self, TrendPoint, WindowSummary};
use crate::types::{HealthState, Sample, WindowDuration};
use crate::window::SlidingWindow;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Message sent into the engine
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Select a new window duration; clears the window and reloads
    /// history from the durable store for the new horizon
    SetWindowDuration(WindowDuration),
    /// Clear the in-memory window without touching the store
    ClearData,
    /// Shut the engine down
    Shutdown,
    /// Result of an asynchronous store backfill (sent by the engine's
    /// own backfill threads, not by the presentation layer)
    ApplyBackfill {
        /// Duration the backfill was requested for
        duration: WindowDuration,
        /// Rows for `[now - duration, now]`, or the store error text
        result: std::result::Result<Vec<StoredReading>, String>,
    },
}

/// Message sent out of the engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Link health classification changed
    Health(HealthState),
    /// The window was swapped after a duration change or initial load
    WindowReloaded {
        /// The now-active duration
        duration: WindowDuration,
        /// Number of rows loaded from the store
        rows: usize,
    },
    /// A store read failed; the window was reset empty
    StoreError(String),
    /// The engine has shut down
    Shutdown,
}

/// Window state shared between the worker and the read API
///
/// A single mutual-exclusion domain: the worker mutates under the lock,
/// readers snapshot under the same lock, so a half-evicted or
/// half-filled window is never observed.
#[derive(Debug)]
pub struct EngineShared {
    pub(crate) window: SlidingWindow,
    pub(crate) health: HealthState,
    pub(crate) last_genuine: Option<Sample>,
}

impl EngineShared {
    fn new(duration: WindowDuration) -> Self {
        Self {
            window: SlidingWindow::new(duration),
            health: HealthState::Connected,
            last_genuine: None,
        }
    }
}

fn lock_shared(shared: &Mutex<EngineShared>) -> MutexGuard<'_, EngineShared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Presentation-side handle to a running engine
///
/// All read methods are side-effect-free and take a consistent snapshot
/// under the engine's exclusion domain.
pub struct EngineHandle {
    shared: Arc<Mutex<EngineShared>>,
    command_tx: Sender<EngineCommand>,
    event_rx: Receiver<EngineEvent>,
    trend_lookback: usize,
}

impl EngineHandle {
    /// The most recent genuine sample, if any
    pub fn current_sample(&self) -> Option<Sample> {
        lock_shared(&self.shared).last_genuine.clone()
    }

    /// Ordered snapshot of the current window
    pub fn window_snapshot(&self) -> Vec<Sample> {
        lock_shared(&self.shared).window.snapshot()
    }

    /// Current link health classification
    pub fn health_state(&self) -> HealthState {
        lock_shared(&self.shared).health
    }

    /// The currently active window duration
    pub fn window_duration(&self) -> WindowDuration {
        lock_shared(&self.shared).window.duration()
    }

    /// Trailing moving-average series over the current window
    pub fn trend(&self) -> Vec<TrendPoint> {
        trend::moving_average(&self.window_snapshot(), self.trend_lookback)
    }

    /// Summary statistics over the current window
    pub fn summary_stats(&self) -> WindowSummary {
        trend::summarize(&self.window_snapshot())
    }

    /// Export rows for the current window, gap-annotated
    pub fn export_rows(&self) -> Vec<ExportRow> {
        export::rows_from_snapshot(&self.window_snapshot())
    }

    /// Request a window duration change (clears and reloads from the store)
    pub fn set_window_duration(&self, duration: WindowDuration) {
        let _ = self
            .command_tx
            .send(EngineCommand::SetWindowDuration(duration));
    }

    /// Request the in-memory window be cleared
    pub fn clear_data(&self) {
        let _ = self.command_tx.send(EngineCommand::ClearData);
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(EngineCommand::Shutdown);
    }

    /// Try to receive an event without blocking
    pub fn try_recv_event(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Receive all pending events
    pub fn drain_events(&self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// The engine entry point, constructed with injected collaborators
pub struct SensorEngine {
    config: EngineConfig,
    transport: Box<dyn SensorTransport>,
    store: Arc<dyn DurableStore>,
    shared: Arc<Mutex<EngineShared>>,
    command_tx: Sender<EngineCommand>,
    command_rx: Receiver<EngineCommand>,
    event_tx: Sender<EngineEvent>,
    running: Arc<AtomicBool>,
}

impl SensorEngine {
    /// Create an engine and its presentation-side handle
    pub fn new(
        config: EngineConfig,
        transport: Box<dyn SensorTransport>,
        store: Arc<dyn DurableStore>,
    ) -> (Self, EngineHandle) {
        let (command_tx, command_rx) = bounded(256);
        // The worker emits events with try_send and drops them when this
        // fills, so a presentation layer that stops draining can never
        // stall the mutation path.
        let (event_tx, event_rx) = bounded(1_024);

        let shared = Arc::new(Mutex::new(EngineShared::new(
            config.display.window_duration,
        )));

        let handle = EngineHandle {
            shared: shared.clone(),
            command_tx: command_tx.clone(),
            event_rx,
            trend_lookback: config.display.trend_lookback,
        };

        let engine = Self {
            config,
            transport,
            store,
            shared,
            command_tx,
            command_rx,
            event_tx,
            running: Arc::new(AtomicBool::new(true)),
        };

        (engine, handle)
    }

    /// Run the engine loop on the current thread until shutdown
    pub fn run(self) {
        let mut worker = EngineWorker::new(
            self.config,
            self.transport,
            self.store,
            self.shared,
            self.command_tx,
            self.command_rx,
            self.event_tx,
            self.running,
        );
        worker.run();
    }

    /// Get a handle to stop the engine loop
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::transport::ChannelTransport;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_engine_creation() {
        let (_publisher, transport) = ChannelTransport::pair();
        let (engine, handle) = SensorEngine::new(
            EngineConfig::default(),
            Box::new(transport),
            Arc::new(MemoryStore::new()),
        );

        assert!(engine.running.load(Ordering::SeqCst));
        assert_eq!(handle.window_duration(), WindowDuration::Min5);
        assert!(handle.window_snapshot().is_empty());
        assert!(handle.current_sample().is_none());
        assert_eq!(handle.health_state(), HealthState::Connected);
    }

    #[test]
    fn test_handle_reads_on_empty_window() {
        let (_publisher, transport) = ChannelTransport::pair();
        let (_engine, handle) = SensorEngine::new(
            EngineConfig::default(),
            Box::new(transport),
            Arc::new(MemoryStore::new()),
        );

        assert!(handle.trend().is_empty());
        assert_eq!(handle.summary_stats().count, 0);
        assert!(handle.export_rows().is_empty());
    }
}
