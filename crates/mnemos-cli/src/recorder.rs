//! Turns swarm step reports into stored patterns.
//!
//! Every burst becomes a `burst` pattern and every cluster a `cluster`
//! pattern. Lineage is kept through the agents: when a burst child later
//! bursts itself, the two bursts are joined by a `decomposition` edge,
//! and when burst children merge into a cluster, each contributing burst
//! gets a `composition` edge to the cluster.

use std::collections::{HashMap, HashSet};

use mnemos_core::{AgentId, BurstPayload, ClusterPayload, Pattern, PatternId, RelationshipKind, StepReport};
use mnemos_store::{PatternStore, Result};

pub struct Recorder<'a> {
    store: &'a PatternStore,
    born_of: HashMap<AgentId, PatternId>,
    pub patterns: usize,
    pub links: usize,
}

impl<'a> Recorder<'a> {
    pub fn new(store: &'a PatternStore) -> Self {
        Self {
            store,
            born_of: HashMap::new(),
            patterns: 0,
            links: 0,
        }
    }

    pub fn record(&mut self, report: &StepReport) -> Result<()> {
        // Clusters run before bursts within a step, so record them first.
        for cluster in &report.clusters {
            let payload = ClusterPayload {
                step: cluster.step,
                members: cluster.members.iter().map(|m| m.to_string()).collect(),
                strength: cluster.strength,
            };
            let pattern = Pattern::cluster(&format!("cluster@{}", cluster.step), &payload)?
                .with_confidence(cluster.strength.clamp(0.0, 1.0));
            let id = self.store.put(&pattern)?;
            self.patterns += 1;

            let sources: HashSet<&PatternId> = cluster
                .members
                .iter()
                .filter_map(|m| self.born_of.get(m))
                .collect();
            for source in sources {
                self.store
                    .link(source, &id, RelationshipKind::Composition, cluster.strength.clamp(0.0, 1.0))?;
                self.links += 1;
            }
            for member in &cluster.members {
                self.born_of.remove(member);
            }
        }

        for burst in &report.bursts {
            let payload = BurstPayload {
                step: burst.step,
                parent: burst.parent.to_string(),
                children: burst.children.iter().map(|c| c.to_string()).collect(),
                memories: burst.memories_deposited,
            };
            let pattern = Pattern::burst(&format!("burst@{}", burst.step), &payload)?;
            let id = self.store.put(&pattern)?;
            self.patterns += 1;

            if let Some(origin) = self.born_of.remove(&burst.parent) {
                self.store
                    .link(&origin, &id, RelationshipKind::Decomposition, 1.0)?;
                self.links += 1;
            }
            for child in &burst.children {
                self.born_of.insert(*child, id.clone());
            }
        }
        Ok(())
    }

    /// Forget lineage of agents that are no longer alive, so ids of
    /// burst children that expired or vanished do not pile up.
    pub fn retain_live(&mut self, live: impl IntoIterator<Item = AgentId>) {
        let live: HashSet<AgentId> = live.into_iter().collect();
        self.born_of.retain(|id, _| live.contains(id));
    }

    pub fn tracked(&self) -> usize {
        self.born_of.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_core::{BurstEvent, ClusterEvent, PatternType};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn ids(rng: &mut SmallRng, n: usize) -> Vec<AgentId> {
        (0..n).map(|_| AgentId::random(rng)).collect()
    }

    #[test]
    fn test_burst_lineage_linked() {
        let mut rng = SmallRng::seed_from_u64(42);
        let store = PatternStore::open_in_memory().unwrap();
        let mut recorder = Recorder::new(&store);

        let root = AgentId::random(&mut rng);
        let children = ids(&mut rng, 3);
        let grandchildren = ids(&mut rng, 2);
        let first = StepReport {
            step: 2,
            bursts: vec![BurstEvent {
                step: 2,
                parent: root,
                children: children.clone(),
                memories_deposited: 3,
            }],
            ..Default::default()
        };
        let second = StepReport {
            step: 5,
            clusters: vec![ClusterEvent {
                step: 5,
                members: vec![children[1], children[2]],
                strength: 0.9,
            }],
            bursts: vec![BurstEvent {
                step: 5,
                parent: children[0],
                children: grandchildren,
                memories_deposited: 4,
            }],
            ..Default::default()
        };
        recorder.record(&first).unwrap();
        recorder.record(&second).unwrap();

        assert_eq!(recorder.patterns, 3);
        assert_eq!(recorder.links, 2);

        let edges = store.causal_edges().unwrap();
        let kinds: Vec<RelationshipKind> = edges.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![RelationshipKind::Composition, RelationshipKind::Decomposition]);
        assert_eq!(edges[0].parent, edges[1].parent);
        assert_eq!(store.get(&edges[0].child).unwrap().pattern_type, PatternType::Cluster);
    }

    #[test]
    fn test_dead_children_forgotten() {
        let mut rng = SmallRng::seed_from_u64(42);
        let store = PatternStore::open_in_memory().unwrap();
        let mut recorder = Recorder::new(&store);

        let children = ids(&mut rng, 3);
        let report = StepReport {
            step: 1,
            bursts: vec![BurstEvent {
                step: 1,
                parent: AgentId::random(&mut rng),
                children: children.clone(),
                memories_deposited: 2,
            }],
            ..Default::default()
        };
        recorder.record(&report).unwrap();
        assert_eq!(recorder.tracked(), 3);

        recorder.retain_live([children[0]]);
        assert_eq!(recorder.tracked(), 1);

        // a pruned id no longer links back to its burst
        let later = StepReport {
            step: 4,
            bursts: vec![BurstEvent {
                step: 4,
                parent: children[1],
                children: Vec::new(),
                memories_deposited: 4,
            }],
            ..Default::default()
        };
        recorder.record(&later).unwrap();
        assert_eq!(recorder.links, 0);

        recorder.retain_live(std::iter::empty());
        assert_eq!(recorder.tracked(), 0);
    }
}
