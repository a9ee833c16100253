//! Core data types for SensorVis-RS
//!
//! This module contains the fundamental data structures used throughout
//! the engine for representing sensor readings, buffered samples, link
//! health and the window-duration menu.
//!
//! # Main Types
//!
//! - [`SensorReading`] - A decoded ingestion payload (temperature + humidity)
//! - [`Sample`] - A single timestamped entry in the sliding window
//! - [`HealthState`] - Link health classification (connected/unstable/lost)
//! - [`WindowDuration`] - The fixed menu of selectable trailing horizons
//!
//! # Timestamps
//!
//! All timestamps are wall-clock [`DateTime<Utc>`] values truncated to
//! millisecond resolution on creation. Internal arithmetic is done on
//! `timestamp_millis()` so that duplicate detection and gap math are exact
//! at the resolution the engine guarantees.
//!
//! # Synthetic Samples
//!
//! Samples manufactured by the gap filler carry `synthetic = true` and the
//! last known temperature/humidity values. The `offline` flag additionally
//! marks samples produced while link health was degraded.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Expected cadence between consecutive genuine samples (milliseconds)
pub const STEP_INTERVAL_MS: i64 = 1_000;

/// Minimum spacing enforced between consecutive durable-store writes (milliseconds)
pub const SAVE_INTERVAL_MS: i64 = 15_000;

/// Silence after which the link is classified Unstable (milliseconds)
pub const UNSTABLE_AFTER_MS: i64 = 20_000;

/// Silence after which the link is classified Lost (milliseconds)
pub const LOST_AFTER_MS: i64 = 40_000;

/// Default trailing look-back count for the moving average
pub const TREND_LOOKBACK: usize = 10;

/// Truncate a timestamp to millisecond resolution
///
/// Sub-millisecond precision is dropped so sample timestamps compare
/// exactly at the resolution the window guarantees.
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ts.timestamp_millis())
        .single()
        .unwrap_or(ts)
}

/// A decoded ingestion payload from the pub/sub transport
///
/// The wire format is a JSON object `{"temperature": n, "humidity": n}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
}

/// A single observed or synthesized reading in the sliding window
///
/// Samples are immutable once created; the window owns them exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Wall-clock instant of the sample, millisecond resolution
    pub timestamp: DateTime<Utc>,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// True if manufactured by the gap filler rather than observed
    pub synthetic: bool,
    /// True if produced while link health was degraded
    pub offline: bool,
}

impl Sample {
    /// Create a genuine sample from a decoded reading
    pub fn genuine(timestamp: DateTime<Utc>, temperature: f64, humidity: f64) -> Self {
        Self {
            timestamp: truncate_to_millis(timestamp),
            temperature,
            humidity,
            synthetic: false,
            offline: false,
        }
    }

    /// Create a synthetic sample carrying forward this sample's values
    pub fn carried_forward(&self, timestamp: DateTime<Utc>, offline: bool) -> Self {
        Self {
            timestamp: truncate_to_millis(timestamp),
            temperature: self.temperature,
            humidity: self.humidity,
            synthetic: true,
            offline,
        }
    }

    /// Timestamp as milliseconds since the Unix epoch
    #[inline]
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Format the temperature for display (one decimal place)
    pub fn temperature_display(&self) -> String {
        format!("{:.1} °C", self.temperature)
    }

    /// Format the humidity for display (one decimal place)
    pub fn humidity_display(&self) -> String {
        format!("{:.1} %", self.humidity)
    }
}

/// Link health classification derived from elapsed silence
///
/// Recomputed continuously from `now - last_genuine_message_time`;
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthState {
    /// Messages are arriving within the expected cadence
    #[default]
    Connected,
    /// Silence has exceeded the unstable threshold
    Unstable,
    /// Silence has exceeded the lost threshold
    Lost,
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthState::Connected => write!(f, "Connected"),
            HealthState::Unstable => write!(f, "Unstable"),
            HealthState::Lost => write!(f, "Lost"),
        }
    }
}

/// Selectable trailing horizon for the sliding window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WindowDuration {
    /// One minute
    Min1,
    /// Five minutes (default)
    #[default]
    Min5,
    /// Thirty minutes
    Min30,
    /// One hour
    Hour1,
    /// Six hours
    Hour6,
    /// One day
    Day1,
}

impl WindowDuration {
    /// Get all selectable durations, in menu order
    pub fn all() -> &'static [WindowDuration] {
        &[
            WindowDuration::Min1,
            WindowDuration::Min5,
            WindowDuration::Min30,
            WindowDuration::Hour1,
            WindowDuration::Hour6,
            WindowDuration::Day1,
        ]
    }

    /// Get the display name for this duration
    pub fn display_name(&self) -> &'static str {
        match self {
            WindowDuration::Min1 => "1 min",
            WindowDuration::Min5 => "5 min",
            WindowDuration::Min30 => "30 min",
            WindowDuration::Hour1 => "1 h",
            WindowDuration::Hour6 => "6 h",
            WindowDuration::Day1 => "1 day",
        }
    }

    /// Length of this duration in milliseconds
    pub fn as_millis(&self) -> i64 {
        match self {
            WindowDuration::Min1 => 60 * 1_000,
            WindowDuration::Min5 => 5 * 60 * 1_000,
            WindowDuration::Min30 => 30 * 60 * 1_000,
            WindowDuration::Hour1 => 60 * 60 * 1_000,
            WindowDuration::Hour6 => 6 * 60 * 60 * 1_000,
            WindowDuration::Day1 => 24 * 60 * 60 * 1_000,
        }
    }

    /// Length of this duration as a standard [`std::time::Duration`]
    pub fn as_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.as_millis() as u64)
    }
}

impl std::fmt::Display for WindowDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_truncates_to_millis() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(1_234_567);
        let sample = Sample::genuine(ts, 21.5, 55.0);
        assert_eq!(sample.timestamp.timestamp_subsec_millis(), 1);
        assert_eq!(sample.timestamp_millis() % 1_000, 1);
    }

    #[test]
    fn test_carried_forward_keeps_values() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
        let genuine = Sample::genuine(ts, 22.0, 48.0);
        let synth = genuine.carried_forward(ts + chrono::Duration::seconds(1), true);

        assert_eq!(synth.temperature, 22.0);
        assert_eq!(synth.humidity, 48.0);
        assert!(synth.synthetic);
        assert!(synth.offline);
        assert!(!genuine.synthetic);
    }

    #[test]
    fn test_window_duration_menu() {
        assert_eq!(WindowDuration::all().len(), 6);
        assert_eq!(WindowDuration::Min1.as_millis(), 60_000);
        assert_eq!(WindowDuration::Day1.as_millis(), 86_400_000);
        assert_eq!(WindowDuration::default(), WindowDuration::Min5);
        assert_eq!(WindowDuration::Hour1.to_string(), "1 h");
    }

    #[test]
    fn test_reading_decode() {
        let reading: SensorReading =
            serde_json::from_str(r#"{"temperature": 23.4, "humidity": 51.2}"#).unwrap();
        assert_eq!(reading.temperature, 23.4);
        assert_eq!(reading.humidity, 51.2);
    }

    #[test]
    fn test_display_helpers() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
        let sample = Sample::genuine(ts, 23.456, 51.04);
        assert_eq!(sample.temperature_display(), "23.5 °C");
        assert_eq!(sample.humidity_display(), "51.0 %");
    }
}
