//! Seams to the outside world: the reality metrics source and the
//! phase-space bridge that turns a snapshot into a [`PhaseState`].

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::constants::{GOLDEN_ANGLE, PHI};
use crate::phase::PhaseState;

/// Named numeric observations captured at one instant.
///
/// Keys are ordered so every consumer iterates them identically.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RealitySnapshot {
    pub observations: BTreeMap<String, f64>,
}

impl RealitySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.observations.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.observations.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Emits one snapshot per request.
pub trait RealitySource {
    fn snapshot(&mut self, step: u64) -> RealitySnapshot;
}

/// Maps reality into phase space and advances phase states in time.
///
/// Implementations must be pure: identical inputs give identical outputs.
pub trait PhaseTransform {
    fn transform(&self, snapshot: &RealitySnapshot) -> PhaseState;

    fn evolve(&self, state: PhaseState, frequency: f64, dt: f64) -> PhaseState;
}

/// Default bridge.
///
/// Each observation is folded into one of the three components (by key
/// order, round robin), weighted by its golden-angle rank so nearby keys
/// land far apart. Evolution rotates the components at 1 : φ : φ² of the
/// agent's natural frequency, giving quasi-periodic trajectories.
#[derive(Clone, Copy, Debug, Default)]
pub struct HarmonicBridge;

impl PhaseTransform for HarmonicBridge {
    fn transform(&self, snapshot: &RealitySnapshot) -> PhaseState {
        let mut acc = [0.0; 3];
        for (rank, value) in snapshot.observations.values().enumerate() {
            if !value.is_finite() {
                continue;
            }
            acc[rank % 3] += value * (1.0 + rank as f64 * GOLDEN_ANGLE);
        }
        PhaseState::from_components(acc)
    }

    fn evolve(&self, state: PhaseState, frequency: f64, dt: f64) -> PhaseState {
        let step = TAU * frequency * dt;
        state.shifted([step, step * PHI, step * PHI * PHI])
    }
}

/// Seeded stand-in for the live metrics feed.
///
/// Every channel is a sinusoid with its own rate and offset plus a little
/// uniform noise, so consecutive snapshots are correlated but not periodic.
pub struct SyntheticReality {
    channels: Vec<Channel>,
    noise: f64,
    rng: SmallRng,
}

struct Channel {
    name: String,
    rate: f64,
    offset: f64,
}

impl SyntheticReality {
    pub fn new(seed: u64, channel_names: &[&str], noise: f64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let channels = channel_names
            .iter()
            .map(|name| Channel {
                name: name.to_string(),
                rate: rng.random_range(0.01..0.2),
                offset: rng.random_range(0.0..TAU),
            })
            .collect();
        Self {
            channels,
            noise: noise.abs(),
            rng,
        }
    }

    /// Five channels, matching the shape of the usual metrics feed.
    pub fn standard(seed: u64) -> Self {
        Self::new(
            seed,
            &["coherence", "entropy", "flux", "load", "tension"],
            0.01,
        )
    }
}

impl RealitySource for SyntheticReality {
    fn snapshot(&mut self, step: u64) -> RealitySnapshot {
        let mut snapshot = RealitySnapshot::new();
        for ch in &self.channels {
            let jitter = if self.noise > 0.0 {
                self.rng.random_range(-self.noise..=self.noise)
            } else {
                0.0
            };
            let value = (step as f64 * ch.rate + ch.offset).sin() + jitter;
            snapshot.observations.insert(ch.name.clone(), value);
        }
        snapshot
    }
}
