use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;

/// Normalize an angle to [0, 2π).
pub fn wrap_angle(theta: f64) -> f64 {
    let wrapped = theta.rem_euclid(TAU);
    // rem_euclid can return TAU itself for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Signed shortest-arc difference, in [-π, π].
pub fn wrap_signed(delta: f64) -> f64 {
    let mut d = delta.rem_euclid(TAU);
    if d > PI {
        d -= TAU;
    }
    d
}

/// A point on the 3-torus: the abstract phase state an agent remembers.
///
/// Each component is an angle normalized to [0, 2π). Distances use the
/// shortest arc per component, so states near 0 and near 2π are close.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PhaseState {
    pub theta: f64,
    pub phi: f64,
    pub psi: f64,
}

impl PhaseState {
    pub fn new(theta: f64, phi: f64, psi: f64) -> Self {
        Self {
            theta: wrap_angle(theta),
            phi: wrap_angle(phi),
            psi: wrap_angle(psi),
        }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn from_components(c: [f64; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }

    pub fn components(self) -> [f64; 3] {
        [self.theta, self.phi, self.psi]
    }

    /// Toroidal distance. Range: [0, π√3].
    pub fn distance(self, other: Self) -> f64 {
        self.components()
            .iter()
            .zip(other.components())
            .map(|(a, b)| wrap_signed(b - a).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Rotate each component by the given offsets.
    pub fn shifted(self, offsets: [f64; 3]) -> Self {
        Self::new(
            self.theta + offsets[0],
            self.phi + offsets[1],
            self.psi + offsets[2],
        )
    }

    /// Component-wise circular mean. `None` for an empty slice.
    ///
    /// A component whose vectors cancel out (resultant near zero) falls back
    /// to the first state's value so the result stays deterministic.
    pub fn circular_mean(states: &[PhaseState]) -> Option<Self> {
        let first = states.first()?;
        let mut out = first.components();
        for (k, slot) in out.iter_mut().enumerate() {
            let (mut sin_sum, mut cos_sum) = (0.0, 0.0);
            for s in states {
                let c = s.components()[k];
                sin_sum += c.sin();
                cos_sum += c.cos();
            }
            if sin_sum.hypot(cos_sum) > EPSILON {
                *slot = sin_sum.atan2(cos_sum);
            }
        }
        Some(Self::from_components(out))
    }
}

impl PartialEq for PhaseState {
    fn eq(&self, other: &Self) -> bool {
        self.distance(*other) < EPSILON
    }
}
