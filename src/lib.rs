//! # SensorVis-RS: Real-Time Sensor Telemetry Engine
//!
//! A real-time telemetry engine for temperature/humidity sensors. Readings
//! arrive as JSON payloads over a pub/sub transport, are held in a sliding
//! time window at a 1-second cadence, and are persisted to a durable store
//! at a throttled rate. The architecture separates the ingestion worker
//! from the presentation layer.
//!
//! ## Architecture
//!
//! - **Engine**: Ingests, gap-fills and classifies readings in a separate thread
//! - **Transport**: Pluggable [`transport::SensorTransport`] delivering raw payloads
//! - **Store**: Pluggable [`store::DurableStore`] for throttled persistence and backfill
//! - **Communication**: Crossbeam channels for thread-safe command/event transfer
//!
//! ## Configuration
//!
//! Engine configuration (broker, store, display preferences) is stored in the
//! platform-appropriate config directory under `dev.hxyulin.sensorvis-rs`:
//!
//! - **Linux**: `~/.config/dev.hxyulin.sensorvis-rs/`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.sensorvis-rs/`
//! - **Windows**: `%APPDATA%\dev.hxyulin.sensorvis-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use sensorvis_rs::{
//!     config::EngineConfig,
//!     engine::SensorEngine,
//!     store::MemoryStore,
//!     transport::ChannelTransport,
//! };
//! use std::sync::Arc;
//!
//! fn main() {
//!     let config = EngineConfig::load_or_default();
//!     let (publisher, transport) = ChannelTransport::pair();
//!     let store = Arc::new(MemoryStore::new());
//!
//!     let (engine, handle) = SensorEngine::new(config, Box::new(transport), store);
//!
//!     std::thread::spawn(move || engine.run());
//!
//!     publisher.publish(br#"{"temperature":21.5,"humidity":48.0}"#.to_vec());
//!     println!("current: {:?}", handle.current_sample());
//!
//!     handle.shutdown();
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod gapfill;
pub mod health;
pub mod persist;
pub mod store;
pub mod transport;
pub mod trend;
pub mod types;
pub mod window;

pub use engine::{EngineEvent, EngineHandle, SensorEngine};
pub use error::{EngineError, Result};
pub use types::{HealthState, Sample, SensorReading, WindowDuration};
