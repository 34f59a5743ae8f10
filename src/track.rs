//! Track file I/O
//!
//! Device streams round-trip through an NDJSON track format: one record per
//! line with a timestamp and an optional heart rate. The format is lossless
//! with respect to the stream — duplicate timestamps and gap records survive
//! a write/read cycle unchanged, which the reconciler depends on.

use crate::error::CompareError;
use crate::types::{RawStream, Sample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current track schema version
pub const TRACK_SCHEMA_VERSION: &str = "hr.track.v1";

/// One NDJSON line of a track file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrackRecord {
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    heart_rate: Option<f64>,
}

/// Reader/writer for NDJSON track files
pub struct TrackCodec;

impl TrackCodec {
    /// Parse NDJSON track data into a raw stream.
    ///
    /// Blank lines are skipped; a malformed line fails the whole parse with
    /// its line number, since a silently dropped record would skew the
    /// comparison.
    pub fn parse_ndjson(data: &str, device: &str) -> Result<RawStream, CompareError> {
        let mut stream = RawStream::new(device);

        for (index, line) in data.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: TrackRecord = serde_json::from_str(trimmed).map_err(|e| {
                CompareError::ParseError(format!("line {}: {}", index + 1, e))
            })?;
            stream.samples.push(Sample {
                timestamp: record.timestamp,
                heart_rate: record.heart_rate,
            });
        }

        Ok(stream)
    }

    /// Read a track file; the device label defaults to the file stem
    pub fn read_file(path: &Path) -> Result<RawStream, CompareError> {
        let device = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());
        let data = fs::read_to_string(path)?;
        Self::parse_ndjson(&data, &device)
    }

    /// Serialize a stream to NDJSON, one record per line
    pub fn to_ndjson(stream: &RawStream) -> Result<String, CompareError> {
        let mut out = String::new();
        for sample in &stream.samples {
            let record = TrackRecord {
                timestamp: sample.timestamp,
                heart_rate: sample.heart_rate,
            };
            out.push_str(&serde_json::to_string(&record)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn write_file(stream: &RawStream, path: &Path) -> Result<(), CompareError> {
        fs::write(path, Self::to_ndjson(stream)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn sample_stream() -> RawStream {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 1).unwrap();
        RawStream {
            device: "chest".to_string(),
            samples: vec![
                Sample::new(t0, 72.5),
                // Duplicate timestamp must survive the round trip
                Sample::new(t0, 74.0),
                Sample::gap(t1),
            ],
        }
    }

    #[test]
    fn test_round_trip_preserves_duplicates_and_gaps() {
        let stream = sample_stream();
        let ndjson = TrackCodec::to_ndjson(&stream).unwrap();
        let parsed = TrackCodec::parse_ndjson(&ndjson, "chest").unwrap();
        assert_eq!(stream, parsed);
    }

    #[test]
    fn test_gap_record_omits_heart_rate_field() {
        let stream = sample_stream();
        let ndjson = TrackCodec::to_ndjson(&stream).unwrap();
        let gap_line = ndjson.lines().nth(2).unwrap();
        assert!(!gap_line.contains("heart_rate"));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap();
        let data = format!(
            "\n{}\n\n",
            serde_json::json!({"timestamp": t0, "heart_rate": 80.0})
        );
        let stream = TrackCodec::parse_ndjson(&data, "chest").unwrap();
        assert_eq!(stream.len(), 1);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let data = "{\"timestamp\":\"2024-01-15T06:00:00Z\",\"heart_rate\":80.0}\nnot json\n";
        let err = TrackCodec::parse_ndjson(data, "chest").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_malformed_timestamp_rejected() {
        let data = "{\"timestamp\":\"yesterday-ish\",\"heart_rate\":80.0}\n";
        assert!(TrackCodec::parse_ndjson(data, "chest").is_err());
    }
}
