//! Summary statistics and reporting
//!
//! Computes min/avg/max summaries per device and over the signed differences
//! of an aligned table, and renders them as a text block or JSON. An empty
//! intersection is a legitimate outcome: the report states
//! "no matching timestamps" instead of failing.

use crate::error::CompareError;
use crate::types::{
    AlignedTable, ComparisonReport, DeduplicatedStream, DeviceStats, DifferenceStats,
    ReportProducer,
};
use crate::{PRODUCER_NAME, PULSEALIGN_VERSION};
use chrono::Utc;
use std::fmt::Write;
use uuid::Uuid;

/// Stats reporter over reconciled streams
pub struct StatsReporter;

impl StatsReporter {
    /// Min/avg/max over one deduplicated stream; `None` when empty
    pub fn summarize(stream: &DeduplicatedStream) -> Option<DeviceStats> {
        if stream.is_empty() {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for hr in stream.values() {
            min = min.min(*hr);
            max = max.max(*hr);
            sum += hr;
        }
        Some(DeviceStats {
            min_hr: min,
            avg_hr: sum / stream.len() as f64,
            max_hr: max,
            count: stream.len(),
        })
    }

    /// Difference summary over an aligned table; `None` when no rows matched
    pub fn summarize_differences(table: &AlignedTable) -> Option<DifferenceStats> {
        if table.is_empty() {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut abs_sum = 0.0;
        for row in &table.rows {
            min = min.min(row.difference);
            max = max.max(row.difference);
            sum += row.difference;
            abs_sum += row.difference.abs();
        }
        let n = table.len() as f64;
        Some(DifferenceStats {
            min_diff: min,
            avg_diff: sum / n,
            max_diff: max,
            abs_avg_diff: abs_sum / n,
            count: table.len(),
        })
    }

    /// Build the full comparison report for a device pair
    pub fn report(
        table: &AlignedTable,
        stream_a: &DeduplicatedStream,
        stream_b: &DeduplicatedStream,
    ) -> ComparisonReport {
        ComparisonReport {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: PULSEALIGN_VERSION.to_string(),
                instance_id: Uuid::new_v4().to_string(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            device_a: table.device_a.clone(),
            device_b: table.device_b.clone(),
            stats_a: Self::summarize(stream_a),
            stats_b: Self::summarize(stream_b),
            difference: Self::summarize_differences(table),
            matched_rows: table.len(),
        }
    }

    /// Render a report as the human-readable summary block
    pub fn render_text(report: &ComparisonReport) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", "=".repeat(50));
        let _ = writeln!(out, "SUMMARY STATISTICS");
        let _ = writeln!(out, "{}", "=".repeat(50));

        for (name, stats) in [
            (&report.device_a, &report.stats_a),
            (&report.device_b, &report.stats_b),
        ] {
            let _ = writeln!(out, "\n{}:", name);
            match stats {
                Some(s) => {
                    let _ = writeln!(out, "  Min HR: {:.1} bpm", s.min_hr);
                    let _ = writeln!(out, "  Avg HR: {:.1} bpm", s.avg_hr);
                    let _ = writeln!(out, "  Max HR: {:.1} bpm", s.max_hr);
                    let _ = writeln!(out, "  Records: {}", s.count);
                }
                None => {
                    let _ = writeln!(out, "  No heart rate records");
                }
            }
        }

        let _ = writeln!(out, "\nDifference ({} - {}):", report.device_a, report.device_b);
        match &report.difference {
            Some(d) => {
                let _ = writeln!(out, "  Min Difference: {:.1} bpm", d.min_diff);
                let _ = writeln!(out, "  Avg Difference: {:.1} bpm", d.avg_diff);
                let _ = writeln!(out, "  Max Difference: {:.1} bpm", d.max_diff);
                let _ = writeln!(out, "  Avg Absolute Difference: {:.1} bpm", d.abs_avg_diff);
                let _ = writeln!(out, "  Matching timestamps: {}", d.count);
            }
            None => {
                let _ = writeln!(out, "  No matching timestamps found between devices");
            }
        }

        out
    }

    /// Render a report as pretty JSON
    pub fn render_json(report: &ComparisonReport) -> Result<String, CompareError> {
        serde_json::to_string_pretty(report)
            .map_err(|e| CompareError::EncodingError(e.to_string()))
    }
}
