//! Stream reconciliation
//!
//! This module turns two duplicate-laden device streams into one comparable
//! table:
//! - Gap samples (absent heart rate) are dropped
//! - Same-timestamp readings within one stream are averaged
//! - The two streams are inner-joined on exact timestamp equality
//!
//! Both operations are pure and deterministic; input order never affects the
//! result.

use crate::error::CompareError;
use crate::types::{AlignedRow, AlignedTable, DeduplicatedStream, RawStream};

/// Reconciler for collapsing and aligning device streams
pub struct Reconciler;

impl Reconciler {
    /// Collapse a raw stream into a unique-timestamp mapping.
    ///
    /// Gap samples are discarded first. Remaining readings are grouped by
    /// exact timestamp (no tolerance window) and each group is replaced by
    /// its arithmetic mean. An empty stream yields an empty mapping.
    ///
    /// Non-finite heart-rate values are malformed input: they would poison
    /// every average downstream, so they fail the whole run.
    pub fn deduplicate(stream: &RawStream) -> Result<DeduplicatedStream, CompareError> {
        let mut sums: DeduplicatedStream = DeduplicatedStream::new();
        let mut counts: std::collections::BTreeMap<_, usize> = std::collections::BTreeMap::new();

        for sample in &stream.samples {
            let Some(hr) = sample.heart_rate else {
                continue;
            };
            if !hr.is_finite() {
                return Err(CompareError::InvalidSample(format!(
                    "non-finite heart rate {} at {} on device {}",
                    hr, sample.timestamp, stream.device
                )));
            }
            *sums.entry(sample.timestamp).or_insert(0.0) += hr;
            *counts.entry(sample.timestamp).or_insert(0) += 1;
        }

        for (timestamp, sum) in sums.iter_mut() {
            *sum /= counts[timestamp] as f64;
        }

        Ok(sums)
    }

    /// Inner-join two deduplicated streams on exact timestamp equality.
    ///
    /// Emits one row per shared timestamp, in ascending timestamp order,
    /// with the signed difference `a - b`. Operand order is preserved, so
    /// swapping the arguments negates every difference. An empty
    /// intersection yields an empty table, not an error; the stats stage
    /// renders that as an explicit no-matching-timestamps outcome.
    pub fn align(
        a: &DeduplicatedStream,
        b: &DeduplicatedStream,
        device_a: &str,
        device_b: &str,
    ) -> AlignedTable {
        let rows = a
            .iter()
            .filter_map(|(timestamp, hr_a)| {
                b.get(timestamp).map(|hr_b| AlignedRow {
                    timestamp: *timestamp,
                    hr_a: *hr_a,
                    hr_b: *hr_b,
                    difference: hr_a - hr_b,
                })
            })
            .collect();

        AlignedTable {
            device_a: device_a.to_string(),
            device_b: device_b.to_string(),
            rows,
        }
    }
}
