//! pulsealign - Heart-rate track reconciliation and synthetic pair simulation
//!
//! pulsealign compares two heart-rate tracks recorded concurrently by
//! independent devices: same-timestamp readings are averaged, the two streams
//! are inner-joined on exact timestamp, and agreement is summarized per
//! device and over the signed differences.
//!
//! A deterministic simulation engine produces realistic synthetic pairs for
//! validating the reconciler: an exercise-phase ground-truth profile, plus a
//! per-device observer with persistent bias, mean-reverting autocorrelated
//! noise, sensor gaps, and duplicate-timestamp records.
//!
//! ## Modules
//!
//! - **reconcile**: deduplication and exact-timestamp alignment
//! - **profile** / **simulate**: synthetic ground truth and device noise
//! - **track**: lossless NDJSON track I/O
//! - **stats**: summary statistics and report rendering
//! - **pipeline**: end-to-end composition

pub mod error;
pub mod pipeline;
pub mod profile;
pub mod reconcile;
pub mod simulate;
pub mod stats;
pub mod track;
pub mod types;

pub use error::CompareError;
pub use pipeline::{compare_streams, generate_pair, Comparison};
pub use profile::{HrProfile, ProfileConfig};
pub use reconcile::Reconciler;
pub use simulate::{DeviceConfig, SimulationConfig, DEFAULT_SEED};
pub use stats::StatsReporter;
pub use track::{TrackCodec, TRACK_SCHEMA_VERSION};
pub use types::{AlignedTable, ComparisonReport, RawStream, Sample};

/// pulsealign version embedded in all reports
pub const PULSEALIGN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "pulsealign";
