//! Composition: find groups of mutually resonant agents.
//!
//! Every unordered pair of agents with at least one memory is scored on
//! their latest memories. Pairs at or above the resonance threshold are
//! joined in a disjoint-set forest, so transitively resonant agents end up
//! in one cluster in a single pass. Cost is O(n²) in the population size;
//! callers bound the population through `SwarmConfig::population_cap`.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId};
use crate::config::CompositionConfig;
use crate::error::Result;
use crate::resonance::{ExponentialKernel, ResonanceKernel, resonance};
use crate::union_find::DisjointSet;

/// A set of agents merged in one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterEvent {
    pub step: u64,
    pub members: Vec<AgentId>,
    /// Mean resonance of the qualifying pairs inside the cluster.
    pub strength: f64,
}

pub struct CompositionEngine {
    config: CompositionConfig,
    kernel: Box<dyn ResonanceKernel>,
}

impl CompositionEngine {
    /// Engine with the default exponential kernel at `config.resonance_scale`.
    pub fn new(config: CompositionConfig) -> Result<Self> {
        let kernel = ExponentialKernel::new(config.resonance_scale);
        Self::with_kernel(config, Box::new(kernel))
    }

    pub fn with_kernel(config: CompositionConfig, kernel: Box<dyn ResonanceKernel>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, kernel })
    }

    pub fn config(&self) -> &CompositionConfig {
        &self.config
    }

    /// Clusters in order of their earliest member; members in population order.
    /// Member sets are pairwise disjoint and never smaller than `min_cluster_size`.
    pub fn detect_clusters(&self, agents: &[Agent], step: u64) -> Vec<ClusterEvent> {
        let candidates: Vec<(usize, crate::phase::PhaseState)> = agents
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.latest_memory().map(|m| (i, m)))
            .collect();

        if candidates.len() < self.config.min_cluster_size {
            return Vec::new();
        }

        let mut forest = DisjointSet::new(candidates.len());
        let mut resonant_pairs: Vec<(usize, f64)> = Vec::new();

        for a in 0..candidates.len() {
            for b in (a + 1)..candidates.len() {
                let r = resonance(self.kernel.as_ref(), candidates[a].1, candidates[b].1);
                if r >= self.config.resonance_threshold {
                    forest.union(a, b);
                    resonant_pairs.push((a, r));
                }
            }
        }

        if resonant_pairs.is_empty() {
            return Vec::new();
        }

        // Sum pair resonance per root; a pair's endpoints share a root by now.
        let mut sums = vec![(0.0_f64, 0_usize); candidates.len()];
        for &(a, r) in &resonant_pairs {
            let root = forest.find(a);
            sums[root].0 += r;
            sums[root].1 += 1;
        }

        forest
            .groups()
            .into_iter()
            .filter(|g| g.len() >= self.config.min_cluster_size)
            .map(|group| {
                let (sum, count) = sums[forest.find(group[0])];
                ClusterEvent {
                    step,
                    members: group.iter().map(|&k| agents[candidates[k].0].id).collect(),
                    strength: if count > 0 { sum / count as f64 } else { 0.0 },
                }
            })
            .collect()
    }
}
