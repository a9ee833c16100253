//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

use sensorvis_rs::config::EngineConfig;
use sensorvis_rs::engine::{EngineHandle, SensorEngine};
use sensorvis_rs::store::MemoryStore;
use sensorvis_rs::transport::{ChannelTransport, SensorPublisher};
use sensorvis_rs::types::SensorReading;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Timeout for waiting on engine events
pub fn event_timeout() -> Duration {
    Duration::from_secs(2)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// A running engine wired to an in-process transport and store
pub struct TestEngine {
    pub publisher: SensorPublisher,
    pub handle: EngineHandle,
    pub store: Arc<MemoryStore>,
    pub thread: Option<JoinHandle<()>>,
}

impl TestEngine {
    /// Spawn an engine with default config on a fresh in-memory store
    pub fn spawn() -> Self {
        Self::spawn_with_store(Arc::new(MemoryStore::new()))
    }

    /// Spawn an engine backed by a pre-seeded store
    pub fn spawn_with_store(store: Arc<MemoryStore>) -> Self {
        let (publisher, transport) = ChannelTransport::pair();
        let (engine, handle) =
            SensorEngine::new(EngineConfig::default(), Box::new(transport), store.clone());
        let thread = std::thread::spawn(move || engine.run());

        Self {
            publisher,
            handle,
            store,
            thread: Some(thread),
        }
    }

    /// Publish a reading, panicking if the transport queue is full
    pub fn publish(&self, temperature: f64, humidity: f64) {
        let reading = SensorReading {
            temperature,
            humidity,
        };
        assert!(
            self.publisher.publish_reading(&reading),
            "transport queue full"
        );
    }

    /// Wait until the window holds at least `count` samples
    pub fn wait_for_samples(&self, count: usize) {
        for _ in 0..250 {
            if self.handle.window_snapshot().len() >= count {
                return;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        panic!(
            "timed out waiting for {} samples (have {})",
            count,
            self.handle.window_snapshot().len()
        );
    }

    /// Shut the engine down and join its thread
    pub fn shutdown(mut self) {
        self.handle.shutdown();
        if let Some(thread) = self.thread.take() {
            assert!(thread.join().is_ok(), "engine thread should exit cleanly");
        }
    }
}
