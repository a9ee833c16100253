//! Sensor Telemetry Engine - Demo Entry Point
//!
//! Runs the engine against an in-process transport and store with a
//! simulated sensor, logging the current reading, trend and link health
//! once per second.

use sensorvis_rs::{
    config::EngineConfig,
    engine::{EngineEvent, SensorEngine},
    export::render_delimited,
    store::MemoryStore,
    transport::ChannelTransport,
    types::SensorReading,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sensorvis_rs=trace")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sensor Telemetry Engine");

    let config = EngineConfig::load_or_default();
    tracing::info!(
        "Broker: {} (topic: {})",
        config.transport.broker_url,
        config.transport.topic
    );

    let (publisher, transport) = ChannelTransport::pair();
    let store = Arc::new(MemoryStore::new());

    let (engine, handle) = SensorEngine::new(config, Box::new(transport), store);
    let engine_handle = std::thread::spawn(move || engine.run());

    // Simulated sensor at a 1-second cadence, with a stall partway in
    // to exercise gap filling and health reclassification.
    let publisher_handle = std::thread::spawn(move || {
        for i in 0..90u32 {
            if (30..55).contains(&i) {
                std::thread::sleep(Duration::from_secs(1));
                continue;
            }
            let phase = f64::from(i) * 0.1;
            let reading = SensorReading {
                temperature: 21.0 + 2.0 * phase.sin(),
                humidity: 48.0 + 5.0 * phase.cos(),
            };
            if !publisher.publish_reading(&reading) {
                tracing::warn!("Publish queue full, reading dropped");
            }
            std::thread::sleep(Duration::from_secs(1));
        }
    });

    for _ in 0..95 {
        std::thread::sleep(Duration::from_secs(1));

        for event in handle.drain_events() {
            match event {
                EngineEvent::Health(state) => tracing::info!("Link health now {}", state),
                EngineEvent::WindowReloaded { duration, rows } => {
                    tracing::info!("Window reloaded: {} rows for {}", rows, duration)
                }
                EngineEvent::StoreError(e) => tracing::error!("Store error: {}", e),
                EngineEvent::Shutdown => {}
            }
        }

        if let Some(sample) = handle.current_sample() {
            let summary = handle.summary_stats();
            tracing::info!(
                "{} / {} ({}, window mean {:.1} °C over {} samples)",
                sample.temperature_display(),
                sample.humidity_display(),
                handle.health_state(),
                summary.temperature.mean,
                summary.count
            );
        }
    }

    publisher_handle
        .join()
        .map_err(|_| anyhow::anyhow!("publisher thread panicked"))?;

    tracing::info!("Final export:\n{}", render_delimited(&handle.export_rows(), ','));

    handle.shutdown();
    engine_handle
        .join()
        .map_err(|_| anyhow::anyhow!("engine thread panicked"))?;

    tracing::info!("Engine stopped");
    Ok(())
}
