use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{FULL_ENERGY, MIN_VIABLE_ENERGY};
use crate::phase::PhaseState;
use crate::reality::PhaseTransform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// Draw a v4 id from `rng`, so seeded swarms get reproducible ids.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self(uuid::Builder::from_random_bytes(rng.random()).into_uuid())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A bounded-energy oscillator that accumulates phase-state memories.
///
/// `anchor` is the last reality-derived phase the agent was seeded from;
/// burst children are seeded from perturbations of it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub energy: f64,
    pub memories: Vec<PhaseState>,
    pub phase: PhaseState,
    pub anchor: PhaseState,
    pub frequency: f64,
    pub metabolism: f64,
    pub parent: Option<AgentId>,
    pub depth: u32,
}

impl Agent {
    /// Root agent with full energy, remembering its reality-derived anchor.
    pub fn seeded(id: AgentId, anchor: PhaseState, frequency: f64, metabolism: f64) -> Self {
        Self {
            id,
            energy: FULL_ENERGY,
            memories: vec![anchor],
            phase: anchor,
            anchor,
            frequency,
            metabolism: metabolism.max(0.0),
            parent: None,
            depth: 0,
        }
    }

    /// Hand `energy_fraction` of this agent's energy to a new child.
    ///
    /// Returns `None` when the fraction is not in (0, 1) or this agent is
    /// below the minimum viable energy. The child starts with an empty memory.
    pub fn spawn_child(&mut self, id: AgentId, energy_fraction: f64) -> Option<Agent> {
        if !(energy_fraction > 0.0 && energy_fraction < 1.0) {
            return None;
        }
        if self.energy < MIN_VIABLE_ENERGY {
            return None;
        }
        let granted = self.energy * energy_fraction;
        self.energy -= granted;
        Some(Agent {
            id,
            energy: granted,
            memories: Vec::new(),
            phase: self.phase,
            anchor: self.anchor,
            frequency: self.frequency,
            metabolism: self.metabolism,
            parent: Some(self.id),
            depth: self.depth + 1,
        })
    }

    /// Replace the phase and anchor, recording the seed as a memory.
    pub fn reseed(&mut self, seed: PhaseState) {
        self.phase = seed;
        self.anchor = seed;
        self.memories.push(seed);
    }

    /// One oscillator step: advance the phase, remember it, pay for it.
    pub fn evolve(&mut self, dt: f64, transform: &dyn PhaseTransform) {
        self.phase = transform.evolve(self.phase, self.frequency, dt);
        self.memories.push(self.phase);
        self.energy = (self.energy - self.metabolism * dt).max(0.0);
    }

    pub fn latest_memory(&self) -> Option<PhaseState> {
        self.memories.last().copied()
    }

    /// Accumulated memory load compared against the burst threshold.
    pub fn load(&self) -> usize {
        self.memories.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.energy <= 0.0
    }

    pub fn drain_memories(&mut self) -> Vec<PhaseState> {
        std::mem::take(&mut self.memories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reality::HarmonicBridge;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn make_agent(rng: &mut SmallRng) -> Agent {
        Agent::seeded(AgentId::random(rng), PhaseState::new(0.5, 1.0, 1.5), 1.0, 0.1)
    }

    #[test]
    fn test_seeded_ids_reproducible() {
        let a = AgentId::random(&mut rng());
        let b = AgentId::random(&mut rng());
        assert_eq!(a, b);
        assert_eq!(a.0.get_version_num(), 4);
    }

    #[test]
    fn test_seeded_agent_remembers_anchor() {
        let agent = make_agent(&mut rng());
        assert_eq!(agent.load(), 1);
        assert_eq!(agent.latest_memory(), Some(agent.anchor));
        assert_relative_eq!(agent.energy, FULL_ENERGY);
    }

    #[test]
    fn test_spawn_child_deducts_energy() {
        let mut rng = rng();
        let mut parent = make_agent(&mut rng);
        let child = parent.spawn_child(AgentId::random(&mut rng), 0.25).unwrap();
        assert_relative_eq!(child.energy, 0.25);
        assert_relative_eq!(parent.energy, 0.75);
        assert!(child.memories.is_empty());
        assert_eq!(child.parent, Some(parent.id));
        assert_eq!(child.depth, 1);
    }

    #[test]
    fn test_spawn_child_fails_softly_below_viable() {
        let mut rng = rng();
        let mut parent = make_agent(&mut rng);
        parent.energy = MIN_VIABLE_ENERGY / 2.0;
        assert!(parent.spawn_child(AgentId::random(&mut rng), 0.5).is_none());
        assert_relative_eq!(parent.energy, MIN_VIABLE_ENERGY / 2.0);
    }

    #[test]
    fn test_spawn_child_rejects_bad_fraction() {
        let mut rng = rng();
        let mut parent = make_agent(&mut rng);
        assert!(parent.spawn_child(AgentId::random(&mut rng), 0.0).is_none());
        assert!(parent.spawn_child(AgentId::random(&mut rng), 1.0).is_none());
        assert!(parent.spawn_child(AgentId::random(&mut rng), f64::NAN).is_none());
    }

    #[test]
    fn test_evolve_appends_and_spends() {
        let mut agent = make_agent(&mut rng());
        agent.evolve(0.5, &HarmonicBridge);
        assert_eq!(agent.load(), 2);
        assert_eq!(agent.latest_memory(), Some(agent.phase));
        assert_relative_eq!(agent.energy, 0.95);
    }

    #[test]
    fn test_evolve_clamps_energy_at_zero() {
        let mut agent = make_agent(&mut rng());
        agent.metabolism = 10.0;
        agent.evolve(1.0, &HarmonicBridge);
        assert_eq!(agent.energy, 0.0);
        assert!(agent.is_exhausted());
    }

    #[test]
    fn test_evolve_is_deterministic() {
        let mut a = make_agent(&mut rng());
        let mut b = a.clone();
        for _ in 0..10 {
            a.evolve(0.1, &HarmonicBridge);
            b.evolve(0.1, &HarmonicBridge);
        }
        assert_eq!(a.phase, b.phase);
    }

    #[test]
    fn test_drain_memories_empties() {
        let mut agent = make_agent(&mut rng());
        agent.evolve(0.1, &HarmonicBridge);
        let drained = agent.drain_memories();
        assert_eq!(drained.len(), 2);
        assert_eq!(agent.load(), 0);
        assert!(agent.latest_memory().is_none());
    }
}
