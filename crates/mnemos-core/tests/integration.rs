//! Integration tests exercising the swarm end to end:
//! spawn → evolve → composition → decomposition, across modules.

use std::collections::HashSet;

use mnemos_core::{
    CompositionConfig, DecompositionConfig, MemoryOrigin, OscillatorNetwork, Swarm, SwarmConfig,
    seeded_phase,
};

fn quiet_composition() -> CompositionConfig {
    CompositionConfig {
        min_cluster_size: 10_000,
        ..Default::default()
    }
}

fn burst_count(threshold: f64, steps: u64) -> usize {
    burst_count_with(quiet_composition(), threshold, steps)
}

fn burst_count_with(composition: CompositionConfig, threshold: f64, steps: u64) -> usize {
    let mut swarm = Swarm::new(
        SwarmConfig {
            metabolism: 0.0,
            ..Default::default()
        },
        composition,
        DecompositionConfig {
            burst_threshold: threshold,
        },
    )
    .unwrap();
    swarm.run(steps, 0.1).unwrap();
    swarm.totals().bursts
}

/// Test 1: fifteen agents over many steps; every pool entry is accounted for.
#[test]
fn test_pool_accounting_matches_totals() {
    let mut swarm = Swarm::new(
        SwarmConfig::default(),
        CompositionConfig::default(),
        DecompositionConfig {
            burst_threshold: 4.0,
        },
    )
    .unwrap();

    let reports = swarm.run(60, 0.1).unwrap();
    let totals = swarm.totals();

    assert_eq!(totals.spawned, reports.iter().map(|r| r.spawned).sum::<usize>());
    assert_eq!(swarm.pool().len(), totals.burst_memories + totals.composites);
    assert_eq!(
        swarm.pool().len(),
        reports.iter().map(|r| r.deposited).sum::<usize>()
    );
    assert!(totals.bursts > 0, "no bursts in sixty steps");
    assert!(totals.composites > 0, "no clusters in sixty steps");

    let burst_deposits: usize = reports
        .iter()
        .flat_map(|r| &r.bursts)
        .map(|b| b.memories_deposited)
        .sum();
    let cluster_events: usize = reports.iter().map(|r| r.clusters.len()).sum();
    assert_eq!(swarm.pool().len(), burst_deposits + cluster_events);
    assert_eq!(totals.burst_memories, burst_deposits);

    let composites = swarm
        .pool()
        .iter()
        .filter(|m| matches!(m.origin, MemoryOrigin::Composite { .. }))
        .count();
    assert_eq!(composites, totals.composites);
    assert_eq!(totals.clusters, totals.composites);
}

/// Test 2: a higher threshold never produces more bursts.
#[test]
fn test_burst_rate_monotone_in_threshold() {
    let counts: Vec<usize> = [2.0, 4.0, 8.0, 16.0, 64.0]
        .iter()
        .map(|&t| burst_count(t, 40))
        .collect();
    for pair in counts.windows(2) {
        assert!(pair[0] >= pair[1], "burst counts not monotone: {counts:?}");
    }
    assert!(counts[0] > 0);
    assert_eq!(*counts.last().unwrap(), 0, "load never exceeds 64 in 40 steps");
}

/// Test 2b: the same holds while composition is removing agents.
#[test]
fn test_burst_rate_monotone_with_composition() {
    let counts: Vec<usize> = [2.0, 4.0, 8.0, 16.0, 64.0]
        .iter()
        .map(|&t| burst_count_with(CompositionConfig::default(), t, 40))
        .collect();
    for pair in counts.windows(2) {
        assert!(pair[0] >= pair[1], "burst counts not monotone: {counts:?}");
    }
    assert!(counts[0] > counts[2]);
    assert_eq!(*counts.last().unwrap(), 0);
}

/// Test 3: clusters in every step are disjoint and at least min size.
#[test]
fn test_clusters_disjoint_across_run() {
    let composition = CompositionConfig {
        resonance_threshold: 0.6,
        min_cluster_size: 3,
        ..Default::default()
    };
    let mut swarm = Swarm::new(
        SwarmConfig::default(),
        composition,
        DecompositionConfig::default(),
    )
    .unwrap();

    let mut merged: HashSet<String> = HashSet::new();
    for report in swarm.run(30, 0.1).unwrap() {
        for cluster in &report.clusters {
            assert!(cluster.members.len() >= 3);
            assert!((0.0..=1.0).contains(&cluster.strength));
            for member in &cluster.members {
                // merged agents leave the population, so no id recurs
                assert!(merged.insert(member.to_string()), "agent {member} merged twice");
            }
        }
    }
}

/// Test 4: identical seeds give identical runs.
#[test]
fn test_swarm_runs_are_reproducible() {
    let run = || {
        let mut swarm = Swarm::new(
            SwarmConfig {
                seed: 7,
                ..Default::default()
            },
            CompositionConfig::default(),
            DecompositionConfig {
                burst_threshold: 3.0,
            },
        )
        .unwrap();
        swarm.run(20, 0.1).unwrap();
        (swarm.totals(), swarm.pool().to_vec())
    };
    assert_eq!(run(), run());
}

/// Test 5: seeded phases feed the oscillator network deterministically.
#[test]
fn test_oscillator_coalitions_reproducible_per_seed() {
    let keys = ["a", "b", "c", "d"];
    let build = |seed| {
        let phases = keys.iter().map(|k| seeded_phase(seed, k)).collect();
        let mut net =
            OscillatorNetwork::new(phases, &[(0, 1, 0.8), (1, 2, 0.8), (2, 3, 0.0)], 1.0).unwrap();
        net.run(400, 0.05);
        net.coalitions(0.1)
    };
    let first = build(3);
    assert_eq!(first, build(3));
    // 0-1-2 are strongly coupled and always lock
    assert!(first.iter().any(|c| c.starts_with(&[0, 1, 2])));
}
