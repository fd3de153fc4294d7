//! Decomposition: overloaded agents burst into children.
//!
//! `burst_threshold` is the only dial. Raising it never makes bursts more
//! frequent; it says nothing about population cap or memory diversity,
//! which are configured elsewhere.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId};
use crate::config::DecompositionConfig;
use crate::constants::{BURST_ENERGY_FRACTION, BURST_FANOUT, BURST_PERTURBATION, MAX_BURST_DEPTH};
use crate::error::Result;
use crate::phase::PhaseState;

/// A parent that split into children in one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BurstEvent {
    pub step: u64,
    pub parent: AgentId,
    pub children: Vec<AgentId>,
    pub memories_deposited: usize,
}

/// Everything a burst produces. The caller deposits `memories` into the
/// shared pool, admits `children`, and removes the parent.
#[derive(Debug)]
pub struct Burst {
    pub event: BurstEvent,
    pub children: Vec<Agent>,
    pub memories: Vec<PhaseState>,
}

pub struct DecompositionEngine {
    config: DecompositionConfig,
}

impl DecompositionEngine {
    pub fn new(config: DecompositionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn burst_threshold(&self) -> f64 {
        self.config.burst_threshold
    }

    pub fn should_burst(&self, agent: &Agent) -> bool {
        agent.load() as f64 > self.config.burst_threshold
    }

    /// Burst `agent` if its load exceeds the threshold.
    ///
    /// The agent's memories are drained. Up to `BURST_FANOUT` children are
    /// split off while the parent stays viable, each seeded with a jittered
    /// copy of the parent's anchor. Agents at `MAX_BURST_DEPTH` still burst
    /// but leave no children.
    pub fn check_and_burst(&self, agent: &mut Agent, step: u64, rng: &mut impl Rng) -> Option<Burst> {
        if !self.should_burst(agent) {
            return None;
        }

        let memories = agent.drain_memories();
        let mut children = Vec::with_capacity(BURST_FANOUT);

        if agent.depth < MAX_BURST_DEPTH {
            for _ in 0..BURST_FANOUT {
                let id = AgentId::random(rng);
                let Some(mut child) = agent.spawn_child(id, BURST_ENERGY_FRACTION) else {
                    break;
                };
                let jitter: [f64; 3] =
                    std::array::from_fn(|_| rng.random_range(-BURST_PERTURBATION..=BURST_PERTURBATION));
                child.reseed(agent.anchor.shifted(jitter));
                children.push(child);
            }
        }

        let event = BurstEvent {
            step,
            parent: agent.id,
            children: children.iter().map(|c| c.id).collect(),
            memories_deposited: memories.len(),
        };

        tracing::debug!(
            parent = %event.parent,
            children = event.children.len(),
            memories = event.memories_deposited,
            depth = agent.depth,
            "agent burst"
        );

        Some(Burst {
            event,
            children,
            memories,
        })
    }
}
