//! Sliding window buffer
//!
//! Holds the ordered sequence of recent samples within a configurable
//! trailing duration. The window is the source of truth for the live
//! view; rendering, aggregation and export all read consistent snapshots
//! of it.
//!
//! # Invariants
//!
//! - Samples are strictly increasing by timestamp (duplicates overwrite)
//! - No sample older than `now - duration` survives eviction
//!
//! Eviction runs after every append and additionally on the engine's
//! 1-second tick, so a long silence still ages out old data.

use crate::types::{Sample, WindowDuration};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Ordered, duration-bounded buffer of samples
#[derive(Debug)]
pub struct SlidingWindow {
    samples: VecDeque<Sample>,
    duration: WindowDuration,
}

impl SlidingWindow {
    /// Create an empty window with the given trailing duration
    pub fn new(duration: WindowDuration) -> Self {
        Self {
            samples: VecDeque::new(),
            duration,
        }
    }

    /// The configured trailing duration
    pub fn duration(&self) -> WindowDuration {
        self.duration
    }

    /// The eviction horizon for a given instant: `now - duration`
    pub fn horizon(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::milliseconds(self.duration.as_millis())
    }

    /// Insert a sample in timestamp order
    ///
    /// The ingestion path delivers non-decreasing timestamps, so the common
    /// case is a push at the back. An equal timestamp overwrites the
    /// existing sample; an out-of-order sample is inserted at its sorted
    /// position.
    pub fn append(&mut self, sample: Sample) {
        match self.samples.back() {
            None => self.samples.push_back(sample),
            Some(last) if sample.timestamp > last.timestamp => self.samples.push_back(sample),
            Some(last) if sample.timestamp == last.timestamp => {
                if let Some(back) = self.samples.back_mut() {
                    *back = sample;
                }
            }
            Some(_) => {
                let ts = sample.timestamp;
                let idx = self.samples.partition_point(|s| s.timestamp < ts);
                if idx < self.samples.len() && self.samples[idx].timestamp == ts {
                    self.samples[idx] = sample;
                } else {
                    self.samples.insert(idx, sample);
                }
            }
        }
    }

    /// Remove all samples with `timestamp < horizon`
    pub fn evict_before(&mut self, horizon: DateTime<Utc>) {
        while let Some(front) = self.samples.front() {
            if front.timestamp < horizon {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Ordered clone of the current contents for read-only consumption
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }

    /// The most recent sample, if any
    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check whether the window is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Remove all samples
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
    }

    fn sample_at(offset_secs: i64, value: f64) -> Sample {
        Sample::genuine(base() + Duration::seconds(offset_secs), value, value)
    }

    #[test]
    fn test_append_in_order() {
        let mut window = SlidingWindow::new(WindowDuration::Min5);
        for i in 0..5 {
            window.append(sample_at(i, i as f64));
        }

        let snap = window.snapshot();
        assert_eq!(snap.len(), 5);
        assert!(snap.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_duplicate_timestamp_overwrites() {
        let mut window = SlidingWindow::new(WindowDuration::Min5);
        window.append(sample_at(0, 1.0));
        window.append(sample_at(1, 2.0));
        window.append(sample_at(1, 9.0));

        assert_eq!(window.len(), 2);
        assert_eq!(window.last().unwrap().temperature, 9.0);
    }

    #[test]
    fn test_out_of_order_insert_and_overwrite() {
        let mut window = SlidingWindow::new(WindowDuration::Min5);
        window.append(sample_at(0, 0.0));
        window.append(sample_at(10, 10.0));
        window.append(sample_at(5, 5.0));
        window.append(sample_at(5, 6.0));

        let snap = window.snapshot();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap[1].temperature, 6.0);
        assert!(snap.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_evict_before() {
        let mut window = SlidingWindow::new(WindowDuration::Min1);
        for i in 0..120 {
            window.append(sample_at(i, i as f64));
        }

        let now = base() + Duration::seconds(119);
        window.evict_before(window.horizon(now));

        let snap = window.snapshot();
        assert!(snap.iter().all(|s| s.timestamp >= now - Duration::seconds(60)));
        // Eviction is strict: offset 59 sits exactly on the horizon and
        // survives, so 59..=119 remain.
        assert_eq!(snap.len(), 61);
    }

    #[test]
    fn test_evict_empty_window() {
        let mut window = SlidingWindow::new(WindowDuration::Min1);
        window.evict_before(base());
        assert!(window.is_empty());
    }

    proptest! {
        /// Arbitrary append order still yields a strictly increasing,
        /// deduplicated sequence bounded by the horizon.
        #[test]
        fn prop_snapshot_sorted_and_deduped(offsets in prop::collection::vec(0i64..300, 0..64)) {
            let mut window = SlidingWindow::new(WindowDuration::Min5);
            for (i, off) in offsets.iter().enumerate() {
                window.append(sample_at(*off, i as f64));
            }

            let now = base() + Duration::seconds(300);
            window.evict_before(window.horizon(now));

            let snap = window.snapshot();
            prop_assert!(snap.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            let horizon = now - Duration::milliseconds(WindowDuration::Min5.as_millis());
            prop_assert!(snap.iter().all(|s| s.timestamp >= horizon));
        }
    }
}
