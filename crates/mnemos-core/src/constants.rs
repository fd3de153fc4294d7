/// Golden ratio: (1 + √5) / 2
pub const PHI: f64 = 1.618_033_988_749_895;

/// Golden angle in radians: 2π / φ²
pub const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653_3;

/// Numerical epsilon for near-zero comparisons
pub const EPSILON: f64 = 1e-10;

/// Energy of a freshly spawned root agent.
pub const FULL_ENERGY: f64 = 1.0;

/// Below this energy an agent can no longer spawn children.
pub const MIN_VIABLE_ENERGY: f64 = 0.05 * FULL_ENERGY;

/// Maximum children produced by one burst.
pub const BURST_FANOUT: usize = 3;

/// Share of the parent's remaining energy handed to each burst child.
pub const BURST_ENERGY_FRACTION: f64 = 0.3;

/// Half-width of the uniform per-component jitter applied to burst seeds (radians).
/// Wider than the default resonance radius so siblings do not re-merge at once.
pub const BURST_PERTURBATION: f64 = 0.5;

/// Default half-width of the per-component jitter on newborn anchors (radians).
pub const SPAWN_SPREAD: f64 = 0.5;

/// Agents at this depth burst without producing children.
pub const MAX_BURST_DEPTH: u32 = 8;

/// Final phase difference below which two oscillators share a coalition (radians).
pub const COHERENCE_TOLERANCE: f64 = 0.1;

/// Final phase difference above which a coupled pair counts as desynchronized.
pub const FAR_PHASE_THRESHOLD: f64 = std::f64::consts::FRAC_PI_2;

/// Euler sub-steps per oscillator cycle.
pub const STEPS_PER_CYCLE: u32 = 20;

/// Hex characters kept from the content hash of a pattern.
pub const PATTERN_ID_HEX_LEN: usize = 16;

/// Deepest JSON nesting accepted by canonicalization.
pub const MAX_CANONICAL_DEPTH: usize = 64;
