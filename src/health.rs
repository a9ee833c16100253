//! Connection health monitor
//!
//! Classifies link state from elapsed time since the last genuine
//! message. The machine has three states and runs for the lifetime of
//! the engine:
//!
//! - Connected → Unstable at 20 s of silence
//! - Unstable → Lost at 40 s of silence
//! - Any state → Connected immediately on a genuine arrival
//!
//! The classification drives the user-visible status and the gap
//! filler's `offline` flag. The offline condition is intentionally
//! conservative: silence past the lost threshold always flags offline,
//! and silence past the unstable threshold keeps flagging it while the
//! state is already Lost, so borderline recovery periods do not flap
//! the flag.

use crate::types::{HealthState, LOST_AFTER_MS, UNSTABLE_AFTER_MS};
use chrono::{DateTime, Utc};

/// Three-state link health machine driven by elapsed silence
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    state: HealthState,
    last_genuine: DateTime<Utc>,
}

impl HealthMonitor {
    /// Create a monitor; silence counts from `now` until the first message
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: HealthState::Connected,
            last_genuine: now,
        }
    }

    /// Pure classification of a silence duration
    pub fn classify(silence_ms: i64) -> HealthState {
        if silence_ms >= LOST_AFTER_MS {
            HealthState::Lost
        } else if silence_ms >= UNSTABLE_AFTER_MS {
            HealthState::Unstable
        } else {
            HealthState::Connected
        }
    }

    /// Current state
    pub fn state(&self) -> HealthState {
        self.state
    }

    /// Instant of the last genuine message (or monitor start)
    pub fn last_genuine(&self) -> DateTime<Utc> {
        self.last_genuine
    }

    /// Elapsed silence in milliseconds
    pub fn silence_ms(&self, now: DateTime<Utc>) -> i64 {
        (now.timestamp_millis() - self.last_genuine.timestamp_millis()).max(0)
    }

    /// A genuine message arrived: reset silence, return to Connected
    pub fn on_message(&mut self, now: DateTime<Utc>) -> HealthState {
        self.last_genuine = now;
        self.state = HealthState::Connected;
        self.state
    }

    /// Periodic tick: reclassify from current silence
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> HealthState {
        self.state = Self::classify(self.silence_ms(now));
        self.state
    }

    /// Whether samples synthesized now should carry the offline flag
    ///
    /// True past the lost threshold, or past the unstable threshold while
    /// the state is already Lost.
    pub fn offline_flag(&self, now: DateTime<Utc>) -> bool {
        let silence = self.silence_ms(now);
        silence >= LOST_AFTER_MS
            || (self.state == HealthState::Lost && silence >= UNSTABLE_AFTER_MS)
    }
}
