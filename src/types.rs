//! Core types for the pulsealign pipeline
//!
//! This module defines the data structures that flow through each stage:
//! raw device streams, deduplicated streams, the aligned comparison table,
//! and the summary report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One reading exported by a device.
///
/// A sample with an absent heart rate marks a sensor gap: the device emitted
/// the timestamp but failed to report a value. Such samples carry no
/// information and are dropped before deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Reading time (UTC, shared clock across both devices)
    pub timestamp: DateTime<Utc>,
    /// Heart rate in bpm, absent on a gap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, heart_rate: f64) -> Self {
        Self {
            timestamp,
            heart_rate: Some(heart_rate),
        }
    }

    /// A gap sample: timestamp emitted, value missing
    pub fn gap(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            heart_rate: None,
        }
    }
}

/// One device's exported track, ordered by arrival.
///
/// Timestamps may repeat (duplicate-timestamp records) and need not be
/// sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStream {
    /// Device label used in reports
    pub device: String,
    pub samples: Vec<Sample>,
}

impl RawStream {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            samples: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Unique-timestamp mapping derived from a [`RawStream`].
///
/// Each value is the arithmetic mean of all heart-rate values sharing that
/// timestamp, after gap samples were dropped. `BTreeMap` keeps keys sorted,
/// so iteration is already in ascending timestamp order.
pub type DeduplicatedStream = BTreeMap<DateTime<Utc>, f64>;

/// One matched timestamp across both devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub timestamp: DateTime<Utc>,
    pub hr_a: f64,
    pub hr_b: f64,
    /// Signed difference `hr_a - hr_b`
    pub difference: f64,
}

/// Inner join of two deduplicated streams on exact timestamp equality.
///
/// Rows ascend by timestamp and every row carries both values. Swapping the
/// operands of [`align`](crate::reconcile::Reconciler::align) negates every
/// difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedTable {
    pub device_a: String,
    pub device_b: String,
    pub rows: Vec<AlignedRow>,
}

impl AlignedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Time-ordered (timestamp, difference) series for external plotting
    pub fn difference_series(&self) -> Vec<(DateTime<Utc>, f64)> {
        self.rows.iter().map(|r| (r.timestamp, r.difference)).collect()
    }
}

/// Min/avg/max summary over one device's deduplicated readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStats {
    pub min_hr: f64,
    pub avg_hr: f64,
    pub max_hr: f64,
    pub count: usize,
}

/// Summary over the signed differences of an aligned table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceStats {
    pub min_diff: f64,
    pub avg_diff: f64,
    pub max_diff: f64,
    /// Mean of |difference|, the headline agreement number
    pub abs_avg_diff: f64,
    pub count: usize,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Complete comparison report for a device pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub device_a: String,
    pub device_b: String,
    /// Absent when the device stream was empty after deduplication
    pub stats_a: Option<DeviceStats>,
    pub stats_b: Option<DeviceStats>,
    /// Absent when no timestamps matched between the devices
    pub difference: Option<DifferenceStats>,
    pub matched_rows: usize,
}

impl ComparisonReport {
    /// True when the two streams shared no timestamps
    pub fn no_matching_timestamps(&self) -> bool {
        self.matched_rows == 0
    }
}
