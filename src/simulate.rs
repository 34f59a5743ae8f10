//! Device noise simulator
//!
//! Given the ground-truth profile, this module produces one device's observed
//! stream: a persistent per-device bias, mean-reverting autocorrelated noise,
//! random sensor gaps, and duplicate-timestamp records. All randomness flows
//! through an explicit seeded [`ChaCha8Rng`] owned by the run, so a fixed
//! seed reproduces byte-identical streams regardless of call order.

use crate::error::CompareError;
use crate::profile::{HrProfile, ProfileConfig, ProfilePoint};
use crate::types::{RawStream, Sample};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

/// Per-device simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Persistent calibration bias is drawn uniformly from this range (bpm)
    pub bias_range: (f64, f64),
    /// Mean-reversion rate of the noise process (1/s)
    pub noise_reversion_rate: f64,
    /// Noise volatility (bpm/√s)
    pub noise_volatility: f64,
    /// Per-tick probability of a dropped reading
    pub gap_probability: f64,
    /// Per-tick probability of a duplicate-timestamp record
    pub duplicate_probability: f64,
    /// Physiological clamp bounds (bpm)
    pub hr_floor: f64,
    pub hr_ceiling: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            bias_range: (-10.0, 10.0),
            noise_reversion_rate: 0.3,
            noise_volatility: 2.0,
            gap_probability: 0.03,
            duplicate_probability: 0.1,
            hr_floor: 40.0,
            hr_ceiling: 220.0,
        }
    }
}

impl DeviceConfig {
    pub fn validate(&self) -> Result<(), CompareError> {
        for (name, p) in [
            ("gap_probability", self.gap_probability),
            ("duplicate_probability", self.duplicate_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(CompareError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, p
                )));
            }
        }
        if self.bias_range.0 > self.bias_range.1 {
            return Err(CompareError::InvalidConfig(format!(
                "bias_range low {} exceeds high {}",
                self.bias_range.0, self.bias_range.1
            )));
        }
        if self.hr_floor >= self.hr_ceiling {
            return Err(CompareError::InvalidConfig(format!(
                "hr_floor {} must be below hr_ceiling {}",
                self.hr_floor, self.hr_ceiling
            )));
        }
        if self.noise_reversion_rate < 0.0 || self.noise_volatility < 0.0 {
            return Err(CompareError::InvalidConfig(
                "noise_reversion_rate and noise_volatility must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mean-reverting noise state, stepped once per tick.
///
/// `state ← state + reversion·(0 − state)·dt + volatility·√dt·z`, z ~ N(0,1).
/// Tick-to-tick correlation is the point: independent white noise understates
/// how real sensors drift within a local window.
#[derive(Debug, Clone)]
struct NoiseProcess {
    state: f64,
    reversion_rate: f64,
    volatility: f64,
    sqrt_dt: f64,
    dt: f64,
}

impl NoiseProcess {
    fn new(reversion_rate: f64, volatility: f64, dt: f64) -> Self {
        Self {
            state: 0.0,
            reversion_rate,
            volatility,
            sqrt_dt: dt.sqrt(),
            dt,
        }
    }

    fn step(&mut self, rng: &mut ChaCha8Rng, normal: &Normal<f64>) -> f64 {
        let z = normal.sample(rng);
        self.state += self.reversion_rate * (0.0 - self.state) * self.dt
            + self.volatility * self.sqrt_dt * z;
        self.state
    }
}

/// Simulate one device observing the ground-truth profile.
///
/// The RNG stream and the noise state are exclusively owned by this run;
/// two devices are simulated with independent seeds.
pub fn simulate_device(
    profile: &[ProfilePoint],
    device: &str,
    start_time: DateTime<Utc>,
    sample_interval_secs: f64,
    config: &DeviceConfig,
    seed: u64,
) -> Result<RawStream, CompareError> {
    config.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| CompareError::InvalidConfig(format!("normal distribution: {}", e)))?;
    let bias = if config.bias_range.0 == config.bias_range.1 {
        config.bias_range.0
    } else {
        Uniform::new(config.bias_range.0, config.bias_range.1).sample(&mut rng)
    };
    let mut noise = NoiseProcess::new(
        config.noise_reversion_rate,
        config.noise_volatility,
        sample_interval_secs,
    );

    let mut stream = RawStream::new(device);
    for point in profile {
        let timestamp = start_time
            + Duration::microseconds((point.elapsed_secs * 1_000_000.0).round() as i64);

        if rng.gen::<f64>() < config.gap_probability {
            stream.samples.push(Sample::gap(timestamp));
            continue;
        }

        let observed = (point.hr + bias + noise.step(&mut rng, &normal))
            .clamp(config.hr_floor, config.hr_ceiling);
        stream.samples.push(Sample::new(timestamp, observed));

        if rng.gen::<f64>() < config.duplicate_probability {
            // Same exact timestamp: the reconciler joins on exact equality,
            // so the rounding collision must share the key
            let perturbed =
                (observed + normal.sample(&mut rng)).clamp(config.hr_floor, config.hr_ceiling);
            stream.samples.push(Sample::new(timestamp, perturbed));
        }
    }

    Ok(stream)
}

/// Full configuration for one synthetic run producing a device pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub profile: ProfileConfig,
    pub device_a: DeviceConfig,
    pub device_b: DeviceConfig,
    pub device_a_name: String,
    pub device_b_name: String,
    /// Workout start; fixed by default so a fixed seed reproduces the run
    pub start_time: DateTime<Utc>,
    /// Run seed; `None` draws fresh entropy at generation time
    pub seed: Option<u64>,
}

/// Default seed used when reproducibility is requested without a seed
pub const DEFAULT_SEED: u64 = 42;

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            profile: ProfileConfig::default(),
            device_a: DeviceConfig::default(),
            device_b: DeviceConfig::default(),
            device_a_name: "device1".to_string(),
            device_b_name: "device2".to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap(),
            seed: Some(DEFAULT_SEED),
        }
    }
}

impl SimulationConfig {
    /// Resolve the run seed: explicit seed, or fresh entropy
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::rngs::OsRng.gen())
    }
}

/// Derive a per-device seed from the run seed.
///
/// Splitmix-style mixing so the two device streams are statistically
/// independent while one run seed reproduces both.
pub fn device_seed(run_seed: u64, device_index: u64) -> u64 {
    let mut z = run_seed
        .wrapping_add(device_index.wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Generate the synthetic device pair for one run.
///
/// Both devices observe the same ground-truth profile but carry independent
/// biases, noise states, and RNG streams.
pub fn generate_pair(config: &SimulationConfig) -> Result<(RawStream, RawStream), CompareError> {
    let profile: Vec<ProfilePoint> = HrProfile::generate(&config.profile)?.collect();
    let run_seed = config.resolve_seed();
    let interval = config.profile.sample_interval_secs;

    let a = simulate_device(
        &profile,
        &config.device_a_name,
        config.start_time,
        interval,
        &config.device_a,
        device_seed(run_seed, 0),
    )?;
    let b = simulate_device(
        &profile,
        &config.device_b_name,
        config.start_time,
        interval,
        &config.device_b,
        device_seed(run_seed, 1),
    )?;

    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::Reconciler;

    fn quiet_device() -> DeviceConfig {
        DeviceConfig {
            bias_range: (0.0, 0.0),
            noise_volatility: 0.0,
            gap_probability: 0.0,
            duplicate_probability: 0.0,
            ..DeviceConfig::default()
        }
    }

    fn short_profile() -> ProfileConfig {
        ProfileConfig {
            warmup_secs: 30.0,
            exercise_secs: 60.0,
            cooldown_secs: 30.0,
            resting_hr: 60.0,
            exercise_hr: 150.0,
            sample_interval_secs: 1.0,
        }
    }

    #[test]
    fn test_same_seed_reproduces_streams() {
        let config = SimulationConfig {
            profile: short_profile(),
            seed: Some(7),
            ..SimulationConfig::default()
        };

        let (a1, b1) = generate_pair(&config).unwrap();
        let (a2, b2) = generate_pair(&config).unwrap();

        assert_eq!(a1, a2);
        assert_eq!(b1, b2);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let base = SimulationConfig {
            profile: short_profile(),
            ..SimulationConfig::default()
        };
        let other = SimulationConfig {
            seed: Some(DEFAULT_SEED + 1),
            ..base.clone()
        };

        let (a1, _) = generate_pair(&base).unwrap();
        let (a2, _) = generate_pair(&other).unwrap();
        assert_ne!(a1, a2);
    }

    #[test]
    fn test_devices_have_independent_streams() {
        let config = SimulationConfig {
            profile: short_profile(),
            ..SimulationConfig::default()
        };
        let (a, b) = generate_pair(&config).unwrap();
        assert_ne!(a.samples, b.samples);
    }

    #[test]
    fn test_gap_samples_have_absent_heart_rate() {
        let config = DeviceConfig {
            gap_probability: 1.0,
            duplicate_probability: 0.0,
            ..DeviceConfig::default()
        };
        let profile: Vec<_> = HrProfile::generate(&short_profile()).unwrap().collect();
        let stream = simulate_device(
            &profile,
            "gappy",
            Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap(),
            1.0,
            &config,
            3,
        )
        .unwrap();

        assert_eq!(stream.len(), profile.len());
        assert!(stream.samples.iter().all(|s| s.heart_rate.is_none()));
        // All gaps: nothing survives deduplication
        assert!(Reconciler::deduplicate(&stream).unwrap().is_empty());
    }

    #[test]
    fn test_duplicates_share_exact_timestamp() {
        let config = DeviceConfig {
            gap_probability: 0.0,
            duplicate_probability: 1.0,
            ..DeviceConfig::default()
        };
        let profile: Vec<_> = HrProfile::generate(&short_profile()).unwrap().collect();
        let stream = simulate_device(
            &profile,
            "dupey",
            Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap(),
            1.0,
            &config,
            3,
        )
        .unwrap();

        assert_eq!(stream.len(), profile.len() * 2);
        for pair in stream.samples.chunks(2) {
            assert_eq!(pair[0].timestamp, pair[1].timestamp);
            assert!(pair[0].heart_rate.is_some() && pair[1].heart_rate.is_some());
        }
        // Dedup collapses each pair back to one entry
        let dedup = Reconciler::deduplicate(&stream).unwrap();
        assert_eq!(dedup.len(), profile.len());
    }

    #[test]
    fn test_emitted_values_clamped() {
        let config = DeviceConfig {
            bias_range: (500.0, 500.0),
            gap_probability: 0.0,
            duplicate_probability: 0.5,
            ..DeviceConfig::default()
        };
        let profile: Vec<_> = HrProfile::generate(&short_profile()).unwrap().collect();
        let stream = simulate_device(
            &profile,
            "hot",
            Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap(),
            1.0,
            &config,
            9,
        )
        .unwrap();

        for sample in &stream.samples {
            let hr = sample.heart_rate.unwrap();
            assert!(hr >= config.hr_floor && hr <= config.hr_ceiling);
        }
    }

    #[test]
    fn test_quiet_devices_match_ground_truth_with_bias_zero() {
        let config = SimulationConfig {
            profile: short_profile(),
            device_a: quiet_device(),
            device_b: quiet_device(),
            ..SimulationConfig::default()
        };

        let (a, b) = generate_pair(&config).unwrap();
        assert_eq!(a.samples.len(), b.samples.len());
        for (sa, sb) in a.samples.iter().zip(&b.samples) {
            assert_eq!(sa.timestamp, sb.timestamp);
            assert_eq!(sa.heart_rate, sb.heart_rate);
        }
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let config = DeviceConfig {
            gap_probability: 1.5,
            ..DeviceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_bias_range_rejected() {
        let config = DeviceConfig {
            bias_range: (5.0, -5.0),
            ..DeviceConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
