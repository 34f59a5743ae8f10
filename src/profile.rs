//! Ground-truth heart-rate profile
//!
//! This module produces the noise-free heart-rate curve a simulated workout
//! follows: a warmup ramp, an exercise plateau with small deterministic
//! variation, and a cooldown decay. No randomness lives here, so the ground
//! truth is reproducible by construction; all stochastic behavior belongs to
//! the device simulator.

use crate::error::CompareError;
use serde::{Deserialize, Serialize};

/// Workout phase configuration, in seconds and bpm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub warmup_secs: f64,
    pub exercise_secs: f64,
    pub cooldown_secs: f64,
    pub resting_hr: f64,
    pub exercise_hr: f64,
    pub sample_interval_secs: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            warmup_secs: 300.0,
            exercise_secs: 1200.0,
            cooldown_secs: 300.0,
            resting_hr: 60.0,
            exercise_hr: 150.0,
            sample_interval_secs: 1.0,
        }
    }
}

impl ProfileConfig {
    /// Validate the configuration before any tick is produced.
    ///
    /// Non-positive durations or interval fail fast; no partial profile is
    /// ever generated.
    pub fn validate(&self) -> Result<(), CompareError> {
        for (name, value) in [
            ("warmup_secs", self.warmup_secs),
            ("exercise_secs", self.exercise_secs),
            ("cooldown_secs", self.cooldown_secs),
            ("sample_interval_secs", self.sample_interval_secs),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(CompareError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !self.resting_hr.is_finite() || !self.exercise_hr.is_finite() {
            return Err(CompareError::InvalidConfig(
                "resting_hr and exercise_hr must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn total_secs(&self) -> f64 {
        self.warmup_secs + self.exercise_secs + self.cooldown_secs
    }

    /// Number of ticks: total duration over interval, rounded down.
    /// A trailing partial tick is dropped, not padded.
    pub fn tick_count(&self) -> usize {
        (self.total_secs() / self.sample_interval_secs).floor() as usize
    }
}

/// One ground-truth point: elapsed seconds since workout start and bpm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub elapsed_secs: f64,
    pub hr: f64,
}

/// Deterministic ground-truth profile generator
pub struct HrProfile;

impl HrProfile {
    /// Build a lazy, finite, restartable iterator over the profile.
    ///
    /// The curve covers three contiguous phases:
    /// 1. Warmup: linear ramp resting → exercise, monotone non-decreasing
    /// 2. Exercise: plateau at `exercise_hr` with a small sinusoidal
    ///    variation (≤ 3 bpm) so the curve is not an artificial flat line
    /// 3. Cooldown: linear decay exercise → resting, monotone non-increasing
    pub fn generate(config: &ProfileConfig) -> Result<ProfileIter, CompareError> {
        config.validate()?;
        Ok(ProfileIter {
            config: config.clone(),
            tick: 0,
            ticks: config.tick_count(),
        })
    }

    /// Ground-truth heart rate at a given elapsed time
    pub fn hr_at(config: &ProfileConfig, elapsed_secs: f64) -> f64 {
        let warmup_end = config.warmup_secs;
        let exercise_end = warmup_end + config.exercise_secs;
        let span = config.exercise_hr - config.resting_hr;

        if elapsed_secs < warmup_end {
            config.resting_hr + span * (elapsed_secs / config.warmup_secs)
        } else if elapsed_secs < exercise_end {
            let t = elapsed_secs - warmup_end;
            config.exercise_hr + (t * 0.1).sin() * 2.0 + (t * 0.05).sin() * 1.0
        } else {
            let t = elapsed_secs - exercise_end;
            config.exercise_hr - span * (t / config.cooldown_secs).min(1.0)
        }
    }
}

/// Finite iterator over ground-truth profile points
#[derive(Debug, Clone)]
pub struct ProfileIter {
    config: ProfileConfig,
    tick: usize,
    ticks: usize,
}

impl Iterator for ProfileIter {
    type Item = ProfilePoint;

    fn next(&mut self) -> Option<ProfilePoint> {
        if self.tick >= self.ticks {
            return None;
        }
        let elapsed_secs = self.tick as f64 * self.config.sample_interval_secs;
        self.tick += 1;
        Some(ProfilePoint {
            elapsed_secs,
            hr: HrProfile::hr_at(&self.config, elapsed_secs),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ticks - self.tick;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ProfileIter {}
