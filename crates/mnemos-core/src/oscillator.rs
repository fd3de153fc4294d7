//! Kuramoto oscillator network used by sleep-style consolidation.
//!
//! Oscillator `i` obeys `dθ_i/dt = ω + Σ_j W_ij sin(θ_j − θ_i)` with a
//! shared natural frequency `ω = 2π f`, integrated by forward Euler.
//! The common rotation does not change phase differences, so whether a
//! subset synchronizes depends only on the coupling weights and the
//! initial phases.

use std::f64::consts::TAU;

use crate::error::{CoreError, Result};
use crate::phase::{wrap_angle, wrap_signed};
use crate::union_find::DisjointSet;

/// Chooses the Euler time step for a given oscillator frequency.
pub trait StepPolicy {
    fn dt(&self, frequency_hz: f64) -> f64;
}

/// `dt = 1 / (f · steps_per_cycle)`: a fixed number of sub-steps per cycle.
#[derive(Clone, Copy, Debug)]
pub struct FixedSubdivision {
    pub steps_per_cycle: u32,
}

impl StepPolicy for FixedSubdivision {
    fn dt(&self, frequency_hz: f64) -> f64 {
        1.0 / (frequency_hz * f64::from(self.steps_per_cycle.max(1)))
    }
}

/// Deterministic initial phase in [0, 2π) for `key` under `seed`.
pub fn seeded_phase(seed: u64, key: &str) -> f64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    let unit = (u64::from_le_bytes(head) >> 11) as f64 / (1u64 << 53) as f64;
    wrap_angle(unit * TAU)
}

/// `W + η (1 − W)`: approaches 1 from below.
pub fn hebbian_strengthen(weight: f64, rate: f64) -> f64 {
    (weight + rate * (1.0 - weight)).clamp(0.0, 1.0)
}

/// `W − η W`: approaches 0 from above.
pub fn hebbian_decay(weight: f64, rate: f64) -> f64 {
    (weight - rate * weight).clamp(0.0, 1.0)
}

pub struct OscillatorNetwork {
    phases: Vec<f64>,
    /// Row-major n × n coupling matrix.
    coupling: Vec<f64>,
    omega: f64,
}

impl OscillatorNetwork {
    /// Build from initial phases and weighted pairs `(i, j, W_ij)`.
    /// Pairs are applied symmetrically; unlisted pairs are uncoupled.
    pub fn new(phases: Vec<f64>, pairs: &[(usize, usize, f64)], frequency_hz: f64) -> Result<Self> {
        let n = phases.len();
        let mut coupling = vec![0.0; n * n];
        for &(i, j, w) in pairs {
            if i >= n || j >= n {
                return Err(CoreError::InvalidParameter(format!(
                    "coupling pair ({i}, {j}) outside {n} oscillators"
                )));
            }
            if i == j || !w.is_finite() {
                continue;
            }
            coupling[i * n + j] = w;
            coupling[j * n + i] = w;
        }
        Ok(Self {
            phases: phases.into_iter().map(wrap_angle).collect(),
            coupling,
            omega: TAU * frequency_hz,
        })
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn phases(&self) -> &[f64] {
        &self.phases
    }

    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.coupling[i * self.len() + j]
    }

    /// One Euler step; all derivatives use the pre-step phases.
    pub fn step(&mut self, dt: f64) {
        let n = self.len();
        let derivatives: Vec<f64> = (0..n)
            .map(|i| {
                let row = &self.coupling[i * n..(i + 1) * n];
                let pull: f64 = row
                    .iter()
                    .zip(&self.phases)
                    .filter(|(w, _)| **w != 0.0)
                    .map(|(w, theta_j)| w * (theta_j - self.phases[i]).sin())
                    .sum();
                self.omega + pull
            })
            .collect();
        for (theta, d) in self.phases.iter_mut().zip(derivatives) {
            *theta = wrap_angle(*theta + d * dt);
        }
    }

    pub fn run(&mut self, steps: u32, dt: f64) {
        for _ in 0..steps {
            self.step(dt);
        }
    }

    /// Absolute shortest-arc difference between two oscillators, in [0, π].
    pub fn phase_gap(&self, i: usize, j: usize) -> f64 {
        wrap_signed(self.phases[j] - self.phases[i]).abs()
    }

    /// Kuramoto order parameter r ∈ [0, 1]; 1 means perfect synchrony.
    pub fn order_parameter(&self) -> f64 {
        if self.phases.is_empty() {
            return 0.0;
        }
        let (s, c) = self
            .phases
            .iter()
            .fold((0.0, 0.0), |(s, c), t| (s + t.sin(), c + t.cos()));
        (s.hypot(c) / self.phases.len() as f64).clamp(0.0, 1.0)
    }

    /// Groups of two or more oscillators joined by pairwise gaps below
    /// `tolerance` (transitively), ordered by smallest member.
    pub fn coalitions(&self, tolerance: f64) -> Vec<Vec<usize>> {
        let n = self.len();
        let mut forest = DisjointSet::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                if self.phase_gap(i, j) < tolerance {
                    forest.union(i, j);
                }
            }
        }
        forest.groups().into_iter().filter(|g| g.len() >= 2).collect()
    }
}
