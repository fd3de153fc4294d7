//! mnemos core: emergent memory dynamics in a population of agents.
//!
//! Agents live on the 3-torus, accumulate phase memories from a reality
//! source, merge with resonant peers (composition) and split when
//! overloaded (decomposition). The oscillator module supplies the
//! Kuramoto dynamics used by sleep-style consolidation, and the pattern
//! module the content-addressed value types the store persists.
//!
//! Zero I/O: persistence lives in `mnemos-store`.

pub mod agent;
pub mod compose;
pub mod config;
pub mod constants;
pub mod decompose;
pub mod error;
pub mod oscillator;
pub mod pattern;
pub mod phase;
pub mod reality;
pub mod resonance;
pub mod swarm;
pub mod time;
pub mod union_find;

pub use agent::{Agent, AgentId};
pub use compose::{ClusterEvent, CompositionEngine};
pub use config::{CompositionConfig, ConsolidationConfig, DecompositionConfig, SwarmConfig};
pub use constants::{
    BURST_ENERGY_FRACTION, BURST_FANOUT, COHERENCE_TOLERANCE, EPSILON, MAX_BURST_DEPTH,
    MIN_VIABLE_ENERGY,
};
pub use decompose::{Burst, BurstEvent, DecompositionEngine};
pub use error::{CoreError, Result};
pub use oscillator::{
    FixedSubdivision, OscillatorNetwork, StepPolicy, hebbian_decay, hebbian_strengthen,
    seeded_phase,
};
pub use pattern::{
    BurstPayload, ClusterPayload, PhasePayload, Pattern, PatternId, PatternType,
    RelationshipKind, WeightKind, canonical_json,
};
pub use phase::{PhaseState, wrap_angle, wrap_signed};
pub use reality::{
    HarmonicBridge, PhaseTransform, RealitySnapshot, RealitySource, SyntheticReality,
};
pub use resonance::{ExponentialKernel, RationalKernel, ResonanceKernel, resonance};
pub use swarm::{MemoryOrigin, PooledMemory, StepReport, Swarm, SwarmTotals};
pub use time::Timestamp;
pub use union_find::DisjointSet;
