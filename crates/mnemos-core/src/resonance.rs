//! Distance-to-similarity kernels used to score agent resonance.
//!
//! Contract for every kernel: symmetric (it only sees the distance),
//! bounded in [0, 1], and non-increasing as the distance grows.

use crate::phase::PhaseState;

pub trait ResonanceKernel {
    fn similarity(&self, distance: f64) -> f64;
}

/// `exp(-d / scale)`
#[derive(Clone, Copy, Debug)]
pub struct ExponentialKernel {
    pub scale: f64,
}

impl ExponentialKernel {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }
}

impl Default for ExponentialKernel {
    fn default() -> Self {
        Self { scale: 0.5 }
    }
}

impl ResonanceKernel for ExponentialKernel {
    fn similarity(&self, distance: f64) -> f64 {
        if self.scale <= 0.0 {
            return if distance <= 0.0 { 1.0 } else { 0.0 };
        }
        (-distance.max(0.0) / self.scale).exp()
    }
}

/// `1 / (1 + d / scale)`, heavier tail than the exponential.
#[derive(Clone, Copy, Debug)]
pub struct RationalKernel {
    pub scale: f64,
}

impl ResonanceKernel for RationalKernel {
    fn similarity(&self, distance: f64) -> f64 {
        if self.scale <= 0.0 {
            return if distance <= 0.0 { 1.0 } else { 0.0 };
        }
        1.0 / (1.0 + distance.max(0.0) / self.scale)
    }
}

/// Resonance between two phase states under `kernel`, clamped to [0, 1].
pub fn resonance(kernel: &dyn ResonanceKernel, a: PhaseState, b: PhaseState) -> f64 {
    let r = kernel.similarity(a.distance(b));
    if r.is_finite() { r.clamp(0.0, 1.0) } else { 0.0 }
}
