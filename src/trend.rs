//! Trend aggregation over window snapshots
//!
//! Computes, on demand from a snapshot: a trailing moving average per
//! metric with a fixed look-back count (clipped at the start of the
//! series), and summary statistics (mean, min, max) over the whole
//! snapshot. All values default to zero on an empty snapshot; this is
//! an explicit zero-value policy, not an error.

use crate::types::Sample;
use chrono::{DateTime, Utc};

/// Scalar summary of one metric over a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummaryStats {
    /// Minimum value (0 on an empty snapshot)
    pub min: f64,
    /// Maximum value (0 on an empty snapshot)
    pub max: f64,
    /// Arithmetic mean (0 on an empty snapshot)
    pub mean: f64,
}

impl SummaryStats {
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let mut count: u64 = 0;
        let mut sum = 0.0;
        let mut min = f64::MAX;
        let mut max = f64::MIN;

        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        if count == 0 {
            Self::default()
        } else {
            Self {
                min,
                max,
                mean: sum / count as f64,
            }
        }
    }
}

/// Summary statistics for both metrics over a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowSummary {
    /// Temperature statistics
    pub temperature: SummaryStats,
    /// Humidity statistics
    pub humidity: SummaryStats,
    /// Number of samples summarized
    pub count: usize,
}

/// One point of the smoothed display series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    /// Timestamp of the underlying sample
    pub timestamp: DateTime<Utc>,
    /// Trailing average temperature
    pub temperature: f64,
    /// Trailing average humidity
    pub humidity: f64,
}

/// Compute summary statistics over a snapshot
pub fn summarize(snapshot: &[Sample]) -> WindowSummary {
    WindowSummary {
        temperature: SummaryStats::from_values(snapshot.iter().map(|s| s.temperature)),
        humidity: SummaryStats::from_values(snapshot.iter().map(|s| s.humidity)),
        count: snapshot.len(),
    }
}

/// Compute the trailing moving average series
///
/// Each output point averages up to `lookback` trailing samples ending at
/// that point; the start of the series is clipped to however many samples
/// exist. A look-back of 0 is treated as 1.
pub fn moving_average(snapshot: &[Sample], lookback: usize) -> Vec<TrendPoint> {
    let lookback = lookback.max(1);

    snapshot
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let start = (i + 1).saturating_sub(lookback);
            let tail = &snapshot[start..=i];
            let n = tail.len() as f64;
            TrendPoint {
                timestamp: sample.timestamp,
                temperature: tail.iter().map(|s| s.temperature).sum::<f64>() / n,
                humidity: tail.iter().map(|s| s.humidity).sum::<f64>() / n,
            }
        })
        .collect()
}
