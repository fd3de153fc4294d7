//! Sleep-style consolidation over the semantic graph.
//!
//! One call couples the requested patterns as Kuramoto oscillators
//! through their current edge weights, finds the groups that ended up
//! phase-locked, and writes a Hebbian update back to the store. The
//! engine keeps no state between calls.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use mnemos_core::{
    ConsolidationConfig, FixedSubdivision, OscillatorNetwork, PatternId, StepPolicy, WeightKind,
    hebbian_decay, hebbian_strengthen, seeded_phase,
};

use crate::error::{Result, StoreError};
use crate::store::PatternStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsolidationPhase {
    Idle,
    Coupling,
    CoalitionDetection,
    HebbianUpdate,
}

/// Patterns whose final phases lie within the coherence tolerance of one
/// another, transitively. Always at least two members.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coalition {
    pub members: Vec<PatternId>,
    /// Circular mean of the members' final phases.
    pub phase: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationMetrics {
    pub oscillators: usize,
    pub coalitions: usize,
    pub hebbian_updates: usize,
    pub strengthened: usize,
    pub decayed: usize,
    pub cycles_run: u32,
    pub simulated_seconds: f64,
    pub order_parameter: f64,
}

pub struct ConsolidationEngine {
    config: ConsolidationConfig,
    policy: Box<dyn StepPolicy>,
}

impl ConsolidationEngine {
    pub fn new(config: ConsolidationConfig) -> Result<Self> {
        let policy = FixedSubdivision {
            steps_per_cycle: config.steps_per_cycle,
        };
        Self::with_policy(config, Box::new(policy))
    }

    pub fn with_policy(config: ConsolidationConfig, policy: Box<dyn StepPolicy>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, policy })
    }

    pub fn config(&self) -> &ConsolidationConfig {
        &self.config
    }

    fn enter(&self, phase: ConsolidationPhase) {
        tracing::debug!(?phase, "consolidation phase");
    }

    /// Run `duration_cycles` Euler steps over `ids` at `frequency_hz`,
    /// then strengthen edges inside each coalition at `learning_rate`.
    /// The Hebbian writes of one call commit together or not at all.
    ///
    /// An empty `ids` returns immediately with zeroed metrics. Duplicate
    /// ids are collapsed, keeping the first occurrence.
    pub fn nrem_consolidation(
        &self,
        store: &PatternStore,
        ids: &[PatternId],
        duration_cycles: u32,
        frequency_hz: f64,
        learning_rate: f64,
    ) -> Result<(Vec<Coalition>, ConsolidationMetrics)> {
        if ids.is_empty() {
            return Ok((Vec::new(), ConsolidationMetrics::default()));
        }
        if duration_cycles == 0 {
            return Err(StoreError::InvalidParameter(
                "duration_cycles must be at least 1".into(),
            ));
        }
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Err(StoreError::InvalidParameter(format!(
                "frequency_hz must be positive and finite, got {frequency_hz}"
            )));
        }
        if !(learning_rate.is_finite() && learning_rate > 0.0 && learning_rate <= 1.0) {
            return Err(StoreError::InvalidParameter(format!(
                "hebbian learning rate must be within (0, 1], got {learning_rate}"
            )));
        }

        let mut seen = HashSet::new();
        let ids: Vec<PatternId> = ids.iter().filter(|id| seen.insert(*id)).cloned().collect();
        for id in &ids {
            if !store.contains(id)? {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }

        let index: HashMap<&PatternId, usize> =
            ids.iter().enumerate().map(|(i, id)| (id, i)).collect();
        let weights = store.edge_weights_among(&ids)?;
        let pairs: Vec<(usize, usize, f64)> = weights
            .iter()
            .filter_map(|((a, b), w)| {
                let (i, j) = (index[a], index[b]);
                (i < j).then_some((i, j, *w))
            })
            .collect();
        if pairs.is_empty() && ids.len() > 1 {
            tracing::warn!(oscillators = ids.len(), "no semantic edges among ids, running uncoupled");
        }

        self.enter(ConsolidationPhase::Coupling);
        let phases = ids
            .iter()
            .map(|id| seeded_phase(self.config.phase_seed, id.as_str()))
            .collect();
        let mut network = OscillatorNetwork::new(phases, &pairs, frequency_hz)?;
        let dt = self.policy.dt(frequency_hz);
        network.run(duration_cycles, dt);

        self.enter(ConsolidationPhase::CoalitionDetection);
        let groups = network.coalitions(self.config.coherence_tolerance);
        let mut group_of = vec![None; ids.len()];
        for (g, members) in groups.iter().enumerate() {
            for &m in members {
                group_of[m] = Some(g);
            }
        }
        let coalitions: Vec<Coalition> = groups
            .iter()
            .map(|members| Coalition {
                members: members.iter().map(|&m| ids[m].clone()).collect(),
                phase: mean_phase(members.iter().map(|&m| network.phases()[m])),
            })
            .collect();

        self.enter(ConsolidationPhase::HebbianUpdate);
        let mut writes = Vec::new();
        let mut strengthened = 0;
        for members in &groups {
            for (k, &i) in members.iter().enumerate() {
                for &j in &members[k + 1..] {
                    let (a, b) = (&ids[i], &ids[j]);
                    let current = weights.get(&(a.clone(), b.clone())).copied().unwrap_or(0.0);
                    let kind = match store.get_edge(a, b)? {
                        Some(edge) => edge.kind,
                        None => WeightKind::CoOccurrence,
                    };
                    writes.push((a.clone(), b.clone(), hebbian_strengthen(current, learning_rate), kind));
                    strengthened += 1;
                }
            }
        }

        let mut decayed = 0;
        if self.config.decay_far_pairs {
            for &(i, j, w) in &pairs {
                let together = group_of[i].is_some() && group_of[i] == group_of[j];
                if w > 0.0 && !together && network.phase_gap(i, j) > self.config.far_threshold {
                    let (a, b) = (&ids[i], &ids[j]);
                    let kind = match store.get_edge(a, b)? {
                        Some(edge) => edge.kind,
                        None => WeightKind::Semantic,
                    };
                    writes.push((a.clone(), b.clone(), hebbian_decay(w, learning_rate), kind));
                    decayed += 1;
                }
            }
        }
        // all-or-nothing: a failed write leaves the graph as it was
        store.set_edges(&writes)?;
        self.enter(ConsolidationPhase::Idle);

        let metrics = ConsolidationMetrics {
            oscillators: ids.len(),
            coalitions: coalitions.len(),
            hebbian_updates: strengthened + decayed,
            strengthened,
            decayed,
            cycles_run: duration_cycles,
            simulated_seconds: f64::from(duration_cycles) * dt,
            order_parameter: network.order_parameter(),
        };
        tracing::info!(
            oscillators = metrics.oscillators,
            coalitions = metrics.coalitions,
            strengthened,
            decayed,
            order = metrics.order_parameter,
            "consolidation complete"
        );
        Ok((coalitions, metrics))
    }

    /// Give every causal edge a semantic edge of at least `initial_weight`.
    /// Heavier existing edges are left alone, so repeated calls write
    /// nothing new. Returns the number of undirected edges written.
    pub fn prime_semantic_graph(&self, store: &PatternStore, initial_weight: f64) -> Result<usize> {
        if !(initial_weight.is_finite() && (0.0..=1.0).contains(&initial_weight)) {
            return Err(StoreError::InvalidParameter(format!(
                "initial_weight must be within [0, 1], got {initial_weight}"
            )));
        }

        let mut done: HashSet<(PatternId, PatternId)> = HashSet::new();
        let mut written = 0;
        for edge in store.causal_edges()? {
            if edge.parent == edge.child {
                continue;
            }
            let key = if edge.parent < edge.child {
                (edge.parent.clone(), edge.child.clone())
            } else {
                (edge.child.clone(), edge.parent.clone())
            };
            if !done.insert(key) {
                continue;
            }
            let (kind, current) = match store.get_edge(&edge.parent, &edge.child)? {
                Some(e) => (e.kind, Some(e.weight)),
                None => (WeightKind::Semantic, None),
            };
            if current.is_some_and(|w| w >= initial_weight) {
                continue;
            }
            store.set_edge(&edge.parent, &edge.child, initial_weight, kind)?;
            written += 1;
        }

        tracing::info!(written, initial_weight, "semantic graph primed");
        Ok(written)
    }
}

fn mean_phase(phases: impl Iterator<Item = f64>) -> f64 {
    let (s, c) = phases.fold((0.0, 0.0), |(s, c), t: f64| (s + t.sin(), c + t.cos()));
    mnemos_core::wrap_angle(s.atan2(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_core::{Pattern, PatternType, RelationshipKind, wrap_signed};
    use serde_json::json;
    use std::f64::consts::FRAC_PI_2;

    fn put(store: &PatternStore, v: i64) -> PatternId {
        store
            .put(&Pattern::new(PatternType::Emergent, "p", json!({ "v": v })).unwrap())
            .unwrap()
    }

    fn engine_with_seed(seed: u64) -> ConsolidationEngine {
        ConsolidationEngine::new(ConsolidationConfig {
            phase_seed: seed,
            ..Default::default()
        })
        .unwrap()
    }

    fn initial_gap(seed: u64, a: &PatternId, b: &PatternId) -> f64 {
        wrap_signed(seeded_phase(seed, b.as_str()) - seeded_phase(seed, a.as_str())).abs()
    }

    #[test]
    fn test_empty_input_is_noop() {
        let store = PatternStore::open_in_memory().unwrap();
        let engine = engine_with_seed(0);
        // parameters are not checked when there is nothing to do
        let (coalitions, metrics) = engine.nrem_consolidation(&store, &[], 0, -1.0, 5.0).unwrap();
        assert!(coalitions.is_empty());
        assert_eq!(metrics, ConsolidationMetrics::default());
    }

    #[test]
    fn test_invalid_parameters() {
        let store = PatternStore::open_in_memory().unwrap();
        let a = put(&store, 1);
        let engine = engine_with_seed(0);
        let ids = [a];
        for (cycles, freq, rate) in [(0, 1.0, 0.1), (10, 0.0, 0.1), (10, f64::NAN, 0.1), (10, 1.0, 0.0), (10, 1.0, 1.5)] {
            assert!(matches!(
                engine.nrem_consolidation(&store, &ids, cycles, freq, rate),
                Err(StoreError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_unknown_id_not_found() {
        let store = PatternStore::open_in_memory().unwrap();
        let a = put(&store, 1);
        let err = engine_with_seed(0)
            .nrem_consolidation(&store, &[a, PatternId::from_raw("ghost")], 10, 1.0, 0.1)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_duplicates_collapsed() {
        let store = PatternStore::open_in_memory().unwrap();
        let a = put(&store, 1);
        let b = put(&store, 2);
        let (_, metrics) = engine_with_seed(0)
            .nrem_consolidation(&store, &[a.clone(), b, a], 10, 1.0, 0.1)
            .unwrap();
        assert_eq!(metrics.oscillators, 2);
        assert_eq!(metrics.cycles_run, 10);
        assert!((metrics.simulated_seconds - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_strong_pair_locks_and_strengthens() {
        let store = PatternStore::open_in_memory().unwrap();
        let a = put(&store, 1);
        let b = put(&store, 2);
        store.set_edge(&a, &b, 0.9, WeightKind::Semantic).unwrap();

        let seed = (0..500).find(|&s| initial_gap(s, &a, &b) < 2.5).unwrap();
        let (coalitions, metrics) = engine_with_seed(seed)
            .nrem_consolidation(&store, &[a.clone(), b.clone()], 200, 1.0, 0.1)
            .unwrap();

        assert_eq!(coalitions.len(), 1);
        assert_eq!(coalitions[0].members.len(), 2);
        assert_eq!(metrics.strengthened, 1);
        assert!(metrics.order_parameter > 0.99);

        let edge = store.get_edge(&a, &b).unwrap().unwrap();
        assert!((edge.weight - 0.91).abs() < 1e-12);
        assert_eq!(edge.kind, WeightKind::Semantic);
        assert_eq!(store.get_edge(&b, &a).unwrap().unwrap().weight, edge.weight);
    }

    #[test]
    fn test_far_weak_pair_decays() {
        let store = PatternStore::open_in_memory().unwrap();
        let a = put(&store, 1);
        let b = put(&store, 2);
        store.set_edge(&a, &b, 0.001, WeightKind::Semantic).unwrap();

        let seed = (0..500)
            .find(|&s| initial_gap(s, &a, &b) > FRAC_PI_2 + 0.3)
            .unwrap();
        let (coalitions, metrics) = engine_with_seed(seed)
            .nrem_consolidation(&store, &[a.clone(), b.clone()], 200, 1.0, 0.5)
            .unwrap();

        assert!(coalitions.is_empty());
        assert_eq!(metrics.decayed, 1);
        assert_eq!(metrics.hebbian_updates, 1);
        let w = store.get_edge(&a, &b).unwrap().unwrap().weight;
        assert!((w - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_decay_can_be_disabled() {
        let store = PatternStore::open_in_memory().unwrap();
        let a = put(&store, 1);
        let b = put(&store, 2);
        store.set_edge(&a, &b, 0.001, WeightKind::Semantic).unwrap();

        let seed = (0..500)
            .find(|&s| initial_gap(s, &a, &b) > FRAC_PI_2 + 0.3)
            .unwrap();
        let engine = ConsolidationEngine::new(ConsolidationConfig {
            phase_seed: seed,
            decay_far_pairs: false,
            ..Default::default()
        })
        .unwrap();
        let (_, metrics) = engine
            .nrem_consolidation(&store, &[a.clone(), b.clone()], 200, 1.0, 0.5)
            .unwrap();
        assert_eq!(metrics.hebbian_updates, 0);
        assert_eq!(store.get_edge(&a, &b).unwrap().unwrap().weight, 0.001);
    }

    #[test]
    fn test_prime_never_lowers_and_is_idempotent() {
        let store = PatternStore::open_in_memory().unwrap();
        let a = put(&store, 1);
        let b = put(&store, 2);
        let c = put(&store, 3);
        store.link(&a, &b, RelationshipKind::Derivation, 1.0).unwrap();
        store.link(&b, &a, RelationshipKind::Derivation, 1.0).unwrap();
        store.link(&b, &c, RelationshipKind::Composition, 1.0).unwrap();
        store.link(&c, &c, RelationshipKind::Amplification, 1.0).unwrap();
        store.set_edge(&b, &c, 0.8, WeightKind::Composite).unwrap();

        let engine = engine_with_seed(0);
        assert_eq!(engine.prime_semantic_graph(&store, 0.5).unwrap(), 1);
        assert_eq!(store.get_edge(&a, &b).unwrap().unwrap().weight, 0.5);
        assert_eq!(store.get_edge(&b, &c).unwrap().unwrap().weight, 0.8);
        assert!(store.get_edge(&c, &c).unwrap().is_none());

        assert_eq!(engine.prime_semantic_graph(&store, 0.5).unwrap(), 0);
        assert_eq!(engine.prime_semantic_graph(&store, 0.9).unwrap(), 2);
        assert_eq!(store.get_edge(&b, &c).unwrap().unwrap().kind, WeightKind::Composite);
    }

    #[test]
    fn test_prime_rejects_bad_weight() {
        let store = PatternStore::open_in_memory().unwrap();
        assert!(matches!(
            engine_with_seed(0).prime_semantic_graph(&store, 1.2),
            Err(StoreError::InvalidParameter(_))
        ));
    }
}
