//! Pipeline orchestration
//!
//! This module provides the public API for pulsealign: generate a synthetic
//! device pair, and compare two raw streams end to end (deduplicate → align
//! → report). Each stage remains individually callable; this is composition
//! only.

use crate::error::CompareError;
use crate::reconcile::Reconciler;
use crate::simulate::{self, SimulationConfig};
use crate::stats::StatsReporter;
use crate::types::{AlignedTable, ComparisonReport, RawStream};

/// Aligned table plus its summary report
#[derive(Debug, Clone)]
pub struct Comparison {
    pub table: AlignedTable,
    pub report: ComparisonReport,
}

/// Generate the synthetic track pair for one simulated workout.
///
/// With a fixed seed in the config, output is byte-identical across runs.
pub fn generate_pair(config: &SimulationConfig) -> Result<(RawStream, RawStream), CompareError> {
    simulate::generate_pair(config)
}

/// Compare two device streams recorded over the same workout.
///
/// Deduplicates each stream, inner-joins them on exact timestamp, and
/// summarizes agreement. An empty intersection yields an empty table and a
/// report whose difference block states no matching timestamps.
pub fn compare_streams(a: &RawStream, b: &RawStream) -> Result<Comparison, CompareError> {
    let dedup_a = Reconciler::deduplicate(a)?;
    let dedup_b = Reconciler::deduplicate(b)?;

    let table = Reconciler::align(&dedup_a, &dedup_b, &a.device, &b.device);
    let report = StatsReporter::report(&table, &dedup_a, &dedup_b);

    Ok(Comparison { table, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileConfig;
    use crate::simulate::DeviceConfig;
    use crate::track::TrackCodec;

    fn quiet_device() -> DeviceConfig {
        DeviceConfig {
            bias_range: (0.0, 0.0),
            noise_volatility: 0.0,
            gap_probability: 0.0,
            duplicate_probability: 0.0,
            ..DeviceConfig::default()
        }
    }

    fn scenario_config() -> SimulationConfig {
        SimulationConfig {
            profile: ProfileConfig {
                warmup_secs: 5.0,
                exercise_secs: 5.0,
                cooldown_secs: 5.0,
                resting_hr: 60.0,
                exercise_hr: 120.0,
                sample_interval_secs: 1.0,
            },
            device_a: quiet_device(),
            device_b: quiet_device(),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_quiet_scenario_yields_zero_difference_everywhere() {
        // 5 warmup + 5 exercise + 5 cooldown ticks, no noise, no bias,
        // no gaps, no duplicates: every row must match exactly
        let (a, b) = generate_pair(&scenario_config()).unwrap();
        let comparison = compare_streams(&a, &b).unwrap();

        assert_eq!(comparison.table.len(), 15);
        for row in &comparison.table.rows {
            assert_eq!(row.difference, 0.0);
        }

        let diff = comparison.report.difference.as_ref().unwrap();
        assert_eq!(diff.count, 15);
        assert_eq!(diff.abs_avg_diff, 0.0);
    }

    #[test]
    fn test_full_pipeline_through_track_files() {
        let config = SimulationConfig::default();
        let (a, b) = generate_pair(&config).unwrap();

        // Streams survive the export format and still reconcile
        let a = TrackCodec::parse_ndjson(&TrackCodec::to_ndjson(&a).unwrap(), &a.device).unwrap();
        let b = TrackCodec::parse_ndjson(&TrackCodec::to_ndjson(&b).unwrap(), &b.device).unwrap();

        let comparison = compare_streams(&a, &b).unwrap();
        assert!(!comparison.table.is_empty());
        assert_eq!(comparison.report.matched_rows, comparison.table.len());

        // The plotting series stays in row order
        let series = comparison.table.difference_series();
        assert_eq!(series.len(), comparison.table.len());
        assert!(series.windows(2).all(|w| w[0].0 < w[1].0));

        // With default bias up to ±10 bpm on each device, differences stay
        // within a sane envelope
        let diff = comparison.report.difference.unwrap();
        assert!(diff.abs_avg_diff < 40.0);
    }

    #[test]
    fn test_reproducible_pipeline_output() {
        let config = SimulationConfig::default();

        let (a1, b1) = generate_pair(&config).unwrap();
        let (a2, b2) = generate_pair(&config).unwrap();

        assert_eq!(
            TrackCodec::to_ndjson(&a1).unwrap(),
            TrackCodec::to_ndjson(&a2).unwrap()
        );
        assert_eq!(
            TrackCodec::to_ndjson(&b1).unwrap(),
            TrackCodec::to_ndjson(&b2).unwrap()
        );
    }

    #[test]
    fn test_compare_disjoint_streams_reports_no_match() {
        let mut config = scenario_config();
        let (a, _) = generate_pair(&config).unwrap();
        config.start_time = config.start_time + chrono::Duration::hours(1);
        let (_, b) = generate_pair(&config).unwrap();

        let comparison = compare_streams(&a, &b).unwrap();
        assert!(comparison.table.is_empty());
        assert!(comparison.report.no_matching_timestamps());
    }
}
