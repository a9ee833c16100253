//! Gap filler
//!
//! Keeps the visual cadence uniform at the fixed step interval even when
//! genuine messages arrive irregularly or stop arriving. Two paths feed
//! it:
//!
//! - **Arrival path**: when a genuine sample lands after a gap longer
//!   than one step, the missing steps are synthesized first, each
//!   carrying forward the last known values.
//! - **Tick path**: on the 1-second engine tick, a single carried-forward
//!   sample is synthesized per elapsed step while the stream is silent.
//!
//! The first sample in an empty window is never gap-filled. Across a
//! window reload the fill anchor follows the newest surviving live
//! genuine sample (and is cleared when none survives), so backfilled
//! store history never seeds synthesis. The engine worker owns that
//! anchor.

use crate::types::{Sample, STEP_INTERVAL_MS};
use chrono::{DateTime, Duration, Utc};

/// Synthesizes carried-forward samples to cover missing steps
#[derive(Debug, Clone, Copy)]
pub struct GapFiller {
    step_ms: i64,
}

impl Default for GapFiller {
    fn default() -> Self {
        Self::new(STEP_INTERVAL_MS)
    }
}

impl GapFiller {
    /// Create a gap filler with a custom step interval (milliseconds)
    pub fn new(step_ms: i64) -> Self {
        Self {
            step_ms: step_ms.max(1),
        }
    }

    /// The configured step interval in milliseconds
    pub fn step_ms(&self) -> i64 {
        self.step_ms
    }

    /// Synthesize the samples missing between `last` and an incoming
    /// genuine timestamp
    ///
    /// Returns `floor(gap / step) - 1` samples at step increments after
    /// `last`, each carrying forward its values. Empty when the gap is
    /// within one step.
    pub fn fill_between(
        &self,
        last: &Sample,
        incoming: DateTime<Utc>,
        offline: bool,
    ) -> Vec<Sample> {
        let gap_ms = incoming.timestamp_millis() - last.timestamp_millis();
        if gap_ms <= self.step_ms {
            return Vec::new();
        }

        let missing = (gap_ms / self.step_ms - 1) as usize;
        (1..=missing as i64)
            .map(|k| {
                last.carried_forward(
                    last.timestamp + Duration::milliseconds(k * self.step_ms),
                    offline,
                )
            })
            .collect()
    }

    /// Synthesize one sample for the elapsed step on the periodic tick
    ///
    /// Returns `None` while the last sample is still within one step of
    /// `now`. Successive ticks advance the cadence one step at a time, so
    /// the anchor should be updated to the returned sample.
    pub fn fill_on_tick(&self, last: &Sample, now: DateTime<Utc>, offline: bool) -> Option<Sample> {
        let silence_ms = now.timestamp_millis() - last.timestamp_millis();
        if silence_ms < self.step_ms {
            return None;
        }

        Some(last.carried_forward(
            last.timestamp + Duration::milliseconds(self.step_ms),
            offline,
        ))
    }
}
