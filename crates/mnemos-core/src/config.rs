//! Tunable parameters for each engine. All sections deserialize with
//! defaults for missing fields, so partial config files are fine.

use serde::{Deserialize, Serialize};

use crate::constants::{COHERENCE_TOLERANCE, FAR_PHASE_THRESHOLD, SPAWN_SPREAD, STEPS_PER_CYCLE};
use crate::error::{CoreError, Result, ensure_in_range};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Spawning stops once the live population reaches this size.
    pub population_cap: usize,
    /// At most this many agents are spawned in one step.
    pub spawn_per_step: usize,
    /// Mean natural frequency of spawned agents (cycles per unit time).
    pub base_frequency: f64,
    /// Natural frequencies are drawn uniformly from `base ± spread`.
    pub frequency_spread: f64,
    /// Each newborn's anchor is the reality phase jittered uniformly by
    /// `± spawn_spread` per component, so agents spawned together differ.
    pub spawn_spread: f64,
    /// Energy spent per unit `dt` while evolving.
    pub metabolism: f64,
    /// Seed for ids, frequencies, spawn and burst jitter.
    pub seed: u64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            population_cap: 15,
            spawn_per_step: 15,
            base_frequency: 1.0,
            frequency_spread: 0.1,
            spawn_spread: SPAWN_SPREAD,
            metabolism: 0.01,
            seed: 42,
        }
    }
}

impl SwarmConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_cap == 0 {
            return Err(CoreError::InvalidParameter(
                "population_cap must be at least 1".into(),
            ));
        }
        ensure_in_range("base_frequency", self.base_frequency, 0.0, f64::MAX)?;
        ensure_in_range("frequency_spread", self.frequency_spread, 0.0, f64::MAX)?;
        ensure_in_range("spawn_spread", self.spawn_spread, 0.0, std::f64::consts::PI)?;
        ensure_in_range("metabolism", self.metabolism, 0.0, f64::MAX)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    /// Pairs at or above this resonance are joined.
    pub resonance_threshold: f64,
    /// Smaller groups are not reported as clusters.
    pub min_cluster_size: usize,
    /// Length scale of the default exponential kernel.
    pub resonance_scale: f64,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            resonance_threshold: 0.8,
            min_cluster_size: 2,
            resonance_scale: 0.5,
        }
    }
}

impl CompositionConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_in_range("resonance_threshold", self.resonance_threshold, 0.0, 1.0)?;
        if self.min_cluster_size < 2 {
            return Err(CoreError::InvalidParameter(format!(
                "min_cluster_size must be at least 2, got {}",
                self.min_cluster_size
            )));
        }
        if !(self.resonance_scale.is_finite() && self.resonance_scale > 0.0) {
            return Err(CoreError::InvalidParameter(format!(
                "resonance_scale must be positive, got {}",
                self.resonance_scale
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionConfig {
    /// An agent bursts once its memory load exceeds this value.
    pub burst_threshold: f64,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            burst_threshold: 12.0,
        }
    }
}

impl DecompositionConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_in_range("burst_threshold", self.burst_threshold, 0.0, f64::MAX)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Final phase difference below which oscillators join a coalition.
    pub coherence_tolerance: f64,
    /// Weaken existing edges between oscillators that ended this far apart.
    pub decay_far_pairs: bool,
    pub far_threshold: f64,
    /// Euler sub-steps per oscillator cycle.
    pub steps_per_cycle: u32,
    /// Mixed into every initial phase, so runs are reproducible per seed.
    pub phase_seed: u64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            coherence_tolerance: COHERENCE_TOLERANCE,
            decay_far_pairs: true,
            far_threshold: FAR_PHASE_THRESHOLD,
            steps_per_cycle: STEPS_PER_CYCLE,
            phase_seed: 0,
        }
    }
}

impl ConsolidationConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_in_range(
            "coherence_tolerance",
            self.coherence_tolerance,
            0.0,
            std::f64::consts::PI,
        )?;
        ensure_in_range("far_threshold", self.far_threshold, 0.0, std::f64::consts::PI)?;
        if self.steps_per_cycle == 0 {
            return Err(CoreError::InvalidParameter(
                "steps_per_cycle must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        SwarmConfig::default().validate().unwrap();
        CompositionConfig::default().validate().unwrap();
        DecompositionConfig::default().validate().unwrap();
        ConsolidationConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_out_of_range() {
        let comp = CompositionConfig {
            resonance_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(comp.validate(), Err(CoreError::InvalidParameter(_))));

        let comp = CompositionConfig {
            min_cluster_size: 1,
            ..Default::default()
        };
        assert!(comp.validate().is_err());

        let decomp = DecompositionConfig {
            burst_threshold: f64::NAN,
        };
        assert!(decomp.validate().is_err());

        let swarm = SwarmConfig {
            population_cap: 0,
            ..Default::default()
        };
        assert!(swarm.validate().is_err());

        let swarm = SwarmConfig {
            spawn_spread: 4.0,
            ..Default::default()
        };
        assert!(swarm.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: CompositionConfig = serde_json::from_str(r#"{"min_cluster_size": 4}"#).unwrap();
        assert_eq!(cfg.min_cluster_size, 4);
        assert_eq!(cfg.resonance_threshold, 0.8);
    }
}
