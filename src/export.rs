//! Export serializer
//!
//! Renders a buffered series into a row-oriented delimited text table
//! with columns: time, temperature, humidity, status. Genuine rows are
//! labeled `REAL`; synthesized rows carry the filled-from-last-value
//! marker.
//!
//! Two sources feed the serializer:
//!
//! - a live window snapshot, where the status comes from each sample's
//!   `synthetic` flag, and
//! - rows re-fetched from the durable store, where gaps are detected by
//!   comparing consecutive `created_at` timestamps against the expected
//!   store step with a 1.5x tolerance (store-side timestamps jitter more
//!   than the live path's).

use crate::error::Result;
use crate::store::StoredReading;
use crate::types::{Sample, SAVE_INTERVAL_MS};
use chrono::{DateTime, Duration, Utc};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Status label for genuine rows
pub const REAL_LABEL: &str = "REAL";

/// Status label for synthesized rows
pub const MISSING_LABEL: &str = "MISSING → filled from last value";

/// Tolerance factor applied to the expected store step before a gap is
/// declared, absorbing store-side timestamp jitter
const STORE_GAP_TOLERANCE: f64 = 1.5;

/// Whether an export row was observed or synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Decoded from an actual inbound message (or stored as such)
    Real,
    /// Synthesized to cover a missing interval
    Missing,
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowStatus::Real => write!(f, "{}", REAL_LABEL),
            RowStatus::Missing => write!(f, "{}", MISSING_LABEL),
        }
    }
}

/// One row of the export table
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    /// Row timestamp
    pub timestamp: DateTime<Utc>,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Genuine or synthesized
    pub status: RowStatus,
}

/// Build export rows from a live window snapshot
pub fn rows_from_snapshot(snapshot: &[Sample]) -> Vec<ExportRow> {
    snapshot
        .iter()
        .map(|s| ExportRow {
            timestamp: s.timestamp,
            temperature: s.temperature,
            humidity: s.humidity,
            status: if s.synthetic {
                RowStatus::Missing
            } else {
                RowStatus::Real
            },
        })
        .collect()
}

/// Build export rows from store rows, synthesizing gap fillers
///
/// `step_ms` is the expected spacing between stored rows (the save
/// interval by default). A gap is declared when consecutive rows are
/// more than 1.5 steps apart; the missing count rounds the gap to whole
/// steps, so jitter up to half a step per row cannot add phantom rows.
pub fn rows_from_store(rows: &[StoredReading], step_ms: i64) -> Vec<ExportRow> {
    let step_ms = step_ms.max(1);
    let tolerance_ms = (step_ms as f64 * STORE_GAP_TOLERANCE) as i64;
    let mut out = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            let prev = &rows[i - 1];
            let gap_ms = row.created_at.timestamp_millis() - prev.created_at.timestamp_millis();
            if gap_ms > tolerance_ms {
                let missing = ((gap_ms + step_ms / 2) / step_ms - 1).max(0);
                for k in 1..=missing {
                    out.push(ExportRow {
                        timestamp: prev.created_at + Duration::milliseconds(k * step_ms),
                        temperature: prev.temperature,
                        humidity: prev.humidity,
                        status: RowStatus::Missing,
                    });
                }
            }
        }

        out.push(ExportRow {
            timestamp: row.created_at,
            temperature: row.temperature,
            humidity: row.humidity,
            status: RowStatus::Real,
        });
    }

    out
}

/// Build export rows from store rows using the default save interval
pub fn rows_from_store_default(rows: &[StoredReading]) -> Vec<ExportRow> {
    rows_from_store(rows, SAVE_INTERVAL_MS)
}

/// Render rows as delimited text with a header line
pub fn render_delimited(rows: &[ExportRow], delimiter: char) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "time{d}temperature{d}humidity{d}status\n",
        d = delimiter
    ));

    for row in rows {
        out.push_str(&format!(
            "{}{d}{:.2}{d}{:.2}{d}{}\n",
            row.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            row.temperature,
            row.humidity,
            row.status,
            d = delimiter
        ));
    }

    out
}

/// Write rows to a delimited text file
pub fn write_delimited(rows: &[ExportRow], delimiter: char, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    writer.write_all(render_delimited(rows, delimiter).as_bytes())?;
    writer.flush()?;
    Ok(())
}
