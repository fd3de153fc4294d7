mod recorder;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use mnemos_core::{PatternId, PatternType, Swarm};
use mnemos_store::{
    ConsolidationEngine, MnemosConfig, PatternQuery, PatternStore, SortKey, SortOrder,
};

use recorder::Recorder;

const DEFAULT_DB: &str = "mnemos.db";

#[derive(Parser)]
#[command(name = "mnemos", about = "Agent swarm simulation and pattern-graph consolidation")]
struct Cli {
    /// Pattern store file (falls back to MNEMOS_DB, then the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the swarm and record its clusters and bursts as patterns
    Simulate {
        /// Number of steps to run
        #[arg(long, default_value_t = 100)]
        steps: u64,

        /// Step length in seconds
        #[arg(long, default_value_t = 0.1)]
        dt: f64,

        /// Override the swarm seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the burst threshold
        #[arg(long)]
        burst_threshold: Option<f64>,

        /// Run without writing to the store
        #[arg(long)]
        dry_run: bool,
    },
    /// Turn causal links into semantic edges
    Prime {
        /// Initial weight for new edges
        #[arg(long, default_value_t = 0.5)]
        weight: f64,
    },
    /// Run Kuramoto consolidation over stored patterns
    Consolidate {
        /// Pattern ids to consolidate (default: top patterns by confidence)
        ids: Vec<String>,

        /// Cap on patterns when no ids are given
        #[arg(long, default_value_t = 256)]
        limit: usize,

        /// Integration steps
        #[arg(long, default_value_t = 200)]
        cycles: u32,

        /// Oscillator frequency in Hz
        #[arg(long, default_value_t = 1.0)]
        frequency: f64,

        /// Hebbian learning rate
        #[arg(long, default_value_t = 0.1)]
        rate: f64,
    },
    /// Show store statistics
    Stats,
    /// Search stored patterns
    Search {
        /// Pattern type (cluster, burst, phase_transition, ...)
        #[arg(long = "type")]
        pattern_type: Option<String>,

        /// Minimum confidence
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Case-insensitive name substring
        #[arg(long)]
        name: Option<String>,

        /// Sort key: confidence, last_seen, first_seen, occurrences, name
        #[arg(long, default_value = "confidence")]
        sort: String,

        /// Sort order: asc or desc
        #[arg(long, default_value = "desc")]
        order: String,

        /// Maximum results
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Walk the causal graph from a pattern
    Lineage {
        id: String,

        /// Maximum depth
        #[arg(long, default_value_t = 8)]
        depth: usize,

        /// Walk towards ancestors instead of descendants
        #[arg(long)]
        up: bool,
    },
    /// Export the pattern graph to JSON
    Export {
        /// Output file path
        path: PathBuf,
    },
    /// Import a pattern graph from JSON
    Import {
        /// Input file path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let store = open_store(&cli, &config)?;

    match &cli.command {
        Commands::Simulate {
            steps,
            dt,
            seed,
            burst_threshold,
            dry_run,
        } => cmd_simulate(&store, config, *steps, *dt, *seed, *burst_threshold, *dry_run)?,
        Commands::Prime { weight } => cmd_prime(&store, config, *weight)?,
        Commands::Consolidate {
            ids,
            limit,
            cycles,
            frequency,
            rate,
        } => cmd_consolidate(&store, config, ids, *limit, *cycles, *frequency, *rate)?,
        Commands::Stats => cmd_stats(&store)?,
        Commands::Search {
            pattern_type,
            min_confidence,
            name,
            sort,
            order,
            limit,
        } => cmd_search(
            &store,
            pattern_type.as_deref(),
            *min_confidence,
            name.as_deref(),
            sort,
            order,
            *limit,
        )?,
        Commands::Lineage { id, depth, up } => cmd_lineage(&store, id, *depth, *up)?,
        Commands::Export { path } => cmd_export(&store, path)?,
        Commands::Import { path } => cmd_import(&store, path)?,
    }

    store.close().context("failed to close store")?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<MnemosConfig> {
    match &cli.config {
        Some(path) => MnemosConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(MnemosConfig::default()),
    }
}

fn resolve_db_path(cli: &Cli, config: &MnemosConfig) -> PathBuf {
    if let Some(path) = &cli.db {
        return path.clone();
    }
    if let Ok(path) = std::env::var("MNEMOS_DB") {
        return PathBuf::from(path);
    }
    config
        .store
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB))
}

fn open_store(cli: &Cli, config: &MnemosConfig) -> Result<PatternStore> {
    let path = resolve_db_path(cli, config);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    PatternStore::open(&path).with_context(|| format!("failed to open store {}", path.display()))
}

fn cmd_simulate(
    store: &PatternStore,
    mut config: MnemosConfig,
    steps: u64,
    dt: f64,
    seed: Option<u64>,
    burst_threshold: Option<f64>,
    dry_run: bool,
) -> Result<()> {
    if let Some(seed) = seed {
        config.swarm.seed = seed;
    }
    if let Some(threshold) = burst_threshold {
        config.decomposition.burst_threshold = threshold;
    }

    let mut swarm = Swarm::new(config.swarm, config.composition, config.decomposition)
        .context("invalid swarm configuration")?;
    let mut recorder = Recorder::new(store);
    for _ in 0..steps {
        let report = swarm.step(dt).context("swarm step failed")?;
        if !dry_run {
            recorder
                .record(&report)
                .with_context(|| format!("failed to record step {}", report.step))?;
            recorder.retain_live(swarm.agents().iter().map(|a| a.id));
        }
    }

    tracing::debug!(tracked = recorder.tracked(), "live lineage at end of run");

    let totals = swarm.totals();
    println!("Steps:        {}", swarm.step_count());
    println!("Population:   {}", swarm.agents().len());
    println!("Spawned:      {}", totals.spawned);
    println!("Expired:      {}", totals.expired);
    println!("Clusters:     {}", totals.clusters);
    println!("Bursts:       {}", totals.bursts);
    println!("Pool:         {}", swarm.pool().len());
    println!("Recorded:     {}", recorder.patterns);
    println!("Links:        {}", recorder.links);
    Ok(())
}

fn cmd_prime(store: &PatternStore, config: MnemosConfig, weight: f64) -> Result<()> {
    let engine = ConsolidationEngine::new(config.consolidation)
        .context("invalid consolidation configuration")?;
    let primed = engine
        .prime_semantic_graph(store, weight)
        .context("failed to prime semantic graph")?;
    println!("Primed {primed} semantic edges");
    Ok(())
}

fn cmd_consolidate(
    store: &PatternStore,
    config: MnemosConfig,
    ids: &[String],
    limit: usize,
    cycles: u32,
    frequency: f64,
    rate: f64,
) -> Result<()> {
    let ids: Vec<PatternId> = if ids.is_empty() {
        store
            .search(&PatternQuery::new().limit(limit))
            .context("failed to list patterns")?
            .into_iter()
            .map(|p| p.id)
            .collect()
    } else {
        ids.iter().map(|id| PatternId::from_raw(id.as_str())).collect()
    };

    if ids.is_empty() {
        tracing::warn!("store holds no patterns to consolidate");
    }

    let engine = ConsolidationEngine::new(config.consolidation)
        .context("invalid consolidation configuration")?;
    let (coalitions, metrics) = engine
        .nrem_consolidation(store, &ids, cycles, frequency, rate)
        .context("consolidation failed")?;

    println!("Oscillators:  {}", metrics.oscillators);
    println!("Coalitions:   {}", metrics.coalitions);
    println!("Strengthened: {}", metrics.strengthened);
    println!("Decayed:      {}", metrics.decayed);
    println!("Order:        {:.4}", metrics.order_parameter);
    for (i, coalition) in coalitions.iter().enumerate() {
        let members: Vec<&str> = coalition.members.iter().map(|m| m.as_str()).collect();
        println!("  #{i} ({:.3} rad): {}", coalition.phase, members.join(", "));
    }
    Ok(())
}

fn cmd_stats(store: &PatternStore) -> Result<()> {
    let stats = store.stats().context("failed to read stats")?;
    println!("Patterns:     {}", stats.patterns);
    println!("Causal:       {}", stats.relationships);
    println!("Semantic:     {}", stats.semantic_edges);
    println!("Embeddings:   {}", stats.embeddings);
    Ok(())
}

fn cmd_search(
    store: &PatternStore,
    pattern_type: Option<&str>,
    min_confidence: Option<f64>,
    name: Option<&str>,
    sort: &str,
    order: &str,
    limit: usize,
) -> Result<()> {
    let mut query = PatternQuery::new()
        .sort_by(sort.parse::<SortKey>()?, order.parse::<SortOrder>()?)
        .limit(limit);
    if let Some(t) = pattern_type {
        query = query.of_type(t.parse::<PatternType>()?);
    }
    if let Some(c) = min_confidence {
        if !(0.0..=1.0).contains(&c) {
            bail!("--min-confidence must be within [0, 1], got {c}");
        }
        query = query.min_confidence(c);
    }
    if let Some(n) = name {
        query = query.name_contains(n);
    }

    let patterns = store.search(&query).context("search failed")?;
    for p in &patterns {
        println!(
            "{}  {:<16} {:.3}  x{:<4} {}",
            p.id,
            p.pattern_type.as_str(),
            p.confidence,
            p.occurrences,
            p.name
        );
    }
    println!("{} pattern(s)", patterns.len());
    Ok(())
}

fn cmd_lineage(store: &PatternStore, id: &str, depth: usize, up: bool) -> Result<()> {
    let start = PatternId::from_raw(id);
    let root = store
        .get(&start)
        .with_context(|| format!("unknown pattern {id}"))?;
    println!("{}  {}", root.id, root.name);

    let walk = if up {
        store.ancestors(&start, depth)
    } else {
        store.descendants(&start, depth)
    }
    .context("failed to walk causal graph")?;
    for (other, level) in walk {
        let pattern = store.get(&other)?;
        println!("{}{}  {}", "  ".repeat(level), pattern.id, pattern.name);
    }
    Ok(())
}

fn cmd_export(store: &PatternStore, path: &Path) -> Result<()> {
    store
        .export_json_file(path)
        .with_context(|| format!("failed to export to {}", path.display()))?;
    println!("Exported to {}", path.display());
    Ok(())
}

fn cmd_import(store: &PatternStore, path: &Path) -> Result<()> {
    let summary = store
        .import_json_file(path)
        .with_context(|| format!("failed to import {}", path.display()))?;
    println!(
        "Imported {} patterns, {} causal edges, {} semantic edges, {} embeddings",
        summary.patterns, summary.relationships, summary.semantic_edges, summary.embeddings
    );
    Ok(())
}
