//! The swarm orchestrator: owns the live population and the shared
//! memory pool, and drives one discrete step at a time.
//!
//! Step order is fixed: spawn → evolve → composition → decomposition.

use std::collections::HashSet;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId};
use crate::compose::{ClusterEvent, CompositionEngine};
use crate::config::{CompositionConfig, DecompositionConfig, SwarmConfig};
use crate::decompose::{BurstEvent, DecompositionEngine};
use crate::error::{CoreError, Result};
use crate::phase::PhaseState;
use crate::reality::{HarmonicBridge, PhaseTransform, RealitySource, SyntheticReality};

/// Where a pooled memory came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryOrigin {
    Burst { parent: AgentId },
    Composite { members: Vec<AgentId>, strength: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PooledMemory {
    pub state: PhaseState,
    pub step: u64,
    pub origin: MemoryOrigin,
}

/// What happened during one call to [`Swarm::step`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StepReport {
    pub step: u64,
    pub spawned: usize,
    pub expired: usize,
    pub clusters: Vec<ClusterEvent>,
    pub bursts: Vec<BurstEvent>,
    /// Pool entries added this step (burst memories + composites).
    pub deposited: usize,
    pub population: usize,
}

/// Running totals since the swarm was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwarmTotals {
    pub spawned: usize,
    pub expired: usize,
    pub clusters: usize,
    pub bursts: usize,
    pub burst_memories: usize,
    pub composites: usize,
}

pub struct Swarm {
    config: SwarmConfig,
    composition: CompositionEngine,
    decomposition: DecompositionEngine,
    reality: Box<dyn RealitySource>,
    transform: Box<dyn PhaseTransform>,
    agents: Vec<Agent>,
    pool: Vec<PooledMemory>,
    rng: SmallRng,
    step: u64,
    totals: SwarmTotals,
}

impl Swarm {
    /// Swarm fed by [`SyntheticReality`] through the [`HarmonicBridge`].
    pub fn new(
        config: SwarmConfig,
        composition: CompositionConfig,
        decomposition: DecompositionConfig,
    ) -> Result<Self> {
        let reality = Box::new(SyntheticReality::standard(config.seed));
        Self::with_collaborators(
            config,
            CompositionEngine::new(composition)?,
            DecompositionEngine::new(decomposition)?,
            reality,
            Box::new(HarmonicBridge),
        )
    }

    pub fn with_collaborators(
        config: SwarmConfig,
        composition: CompositionEngine,
        decomposition: DecompositionEngine,
        reality: Box<dyn RealitySource>,
        transform: Box<dyn PhaseTransform>,
    ) -> Result<Self> {
        config.validate()?;
        let rng = SmallRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            composition,
            decomposition,
            reality,
            transform,
            agents: Vec::new(),
            pool: Vec::new(),
            rng,
            step: 0,
            totals: SwarmTotals::default(),
        })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn pool(&self) -> &[PooledMemory] {
        &self.pool
    }

    /// Hand the pool to the caller, leaving it empty. Totals are unaffected.
    pub fn take_pool(&mut self) -> Vec<PooledMemory> {
        std::mem::take(&mut self.pool)
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn totals(&self) -> SwarmTotals {
        self.totals
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Advance the simulation by one step of length `dt`.
    pub fn step(&mut self, dt: f64) -> Result<StepReport> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(CoreError::InvalidParameter(format!(
                "dt must be positive and finite, got {dt}"
            )));
        }

        self.step += 1;
        let mut report = StepReport {
            step: self.step,
            ..Default::default()
        };

        report.spawned = self.spawn();
        report.expired = self.evolve(dt);
        report.clusters = self.compose();
        report.bursts = self.decompose();

        report.deposited = report.clusters.len()
            + report
                .bursts
                .iter()
                .map(|b| b.memories_deposited)
                .sum::<usize>();
        report.population = self.agents.len();

        tracing::debug!(
            step = report.step,
            spawned = report.spawned,
            expired = report.expired,
            clusters = report.clusters.len(),
            bursts = report.bursts.len(),
            population = report.population,
            pool = self.pool.len(),
            "swarm step"
        );

        Ok(report)
    }

    /// Run `steps` steps, returning every report.
    pub fn run(&mut self, steps: u64, dt: f64) -> Result<Vec<StepReport>> {
        (0..steps).map(|_| self.step(dt)).collect()
    }

    fn spawn(&mut self) -> usize {
        let snapshot = self.reality.snapshot(self.step);
        let room = self
            .config
            .population_cap
            .saturating_sub(self.agents.len())
            .min(self.config.spawn_per_step);
        if room == 0 {
            return 0;
        }

        let reality_phase = self.transform.transform(&snapshot);
        let spread = self.config.frequency_spread;
        let spawn_spread = self.config.spawn_spread;
        for _ in 0..room {
            let id = AgentId::random(&mut self.rng);
            let jitter = if spread > 0.0 {
                self.rng.random_range(-spread..=spread)
            } else {
                0.0
            };
            let frequency = self.config.base_frequency + jitter;
            let anchor = if spawn_spread > 0.0 {
                let offsets: [f64; 3] = std::array::from_fn(|_| {
                    self.rng.random_range(-spawn_spread..=spawn_spread)
                });
                reality_phase.shifted(offsets)
            } else {
                reality_phase
            };
            self.agents
                .push(Agent::seeded(id, anchor, frequency, self.config.metabolism));
        }
        self.totals.spawned += room;
        room
    }

    fn evolve(&mut self, dt: f64) -> usize {
        for agent in &mut self.agents {
            agent.evolve(dt, self.transform.as_ref());
        }
        let before = self.agents.len();
        self.agents.retain(|a| !a.is_exhausted());
        let expired = before - self.agents.len();
        self.totals.expired += expired;
        expired
    }

    fn compose(&mut self) -> Vec<ClusterEvent> {
        let clusters = self.composition.detect_clusters(&self.agents, self.step);
        if clusters.is_empty() {
            return clusters;
        }

        let mut merged: HashSet<AgentId> = HashSet::new();
        for cluster in &clusters {
            let members: HashSet<AgentId> = cluster.members.iter().copied().collect();
            let latest: Vec<PhaseState> = self
                .agents
                .iter()
                .filter(|a| members.contains(&a.id))
                .filter_map(|a| a.latest_memory())
                .collect();
            if let Some(state) = PhaseState::circular_mean(&latest) {
                self.pool.push(PooledMemory {
                    state,
                    step: self.step,
                    origin: MemoryOrigin::Composite {
                        members: cluster.members.clone(),
                        strength: cluster.strength,
                    },
                });
                self.totals.composites += 1;
            }
            tracing::debug!(
                members = cluster.members.len(),
                strength = cluster.strength,
                "cluster formed"
            );
            merged.extend(members);
        }

        self.agents.retain(|a| !merged.contains(&a.id));
        self.totals.clusters += clusters.len();
        clusters
    }

    fn decompose(&mut self) -> Vec<BurstEvent> {
        let mut events = Vec::new();
        let mut survivors = Vec::with_capacity(self.agents.len());
        let mut newborn = Vec::new();

        for mut agent in std::mem::take(&mut self.agents) {
            match self
                .decomposition
                .check_and_burst(&mut agent, self.step, &mut self.rng)
            {
                Some(burst) => {
                    let parent = burst.event.parent;
                    for state in burst.memories {
                        self.pool.push(PooledMemory {
                            state,
                            step: self.step,
                            origin: MemoryOrigin::Burst { parent },
                        });
                    }
                    self.totals.burst_memories += burst.event.memories_deposited;
                    newborn.extend(burst.children);
                    events.push(burst.event);
                }
                None => survivors.push(agent),
            }
        }

        // Children join after the scan so they are not checked in their birth step.
        survivors.extend(newborn);
        self.agents = survivors;
        self.totals.bursts += events.len();
        events
    }
}
