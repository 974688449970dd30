//! Repair Bench - headless workshop run
//!
//! Loads the demo workshop, lets its agents take repair work until nothing
//! is left (or the tick limit hits) and reports what happened. The repair
//! state can be saved at the end and resumed by a later run.

use std::path::PathBuf;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use repair_bench::core::config::{Difficulty, RepairSettings};
use repair_bench::core::error::{RepairError, Result};
use repair_bench::persistence::SaveState;
use repair_bench::repair::{run_workshop, RepairSession};
use repair_bench::world::demo_workshop;

/// Headless repair workshop run
#[derive(Parser, Debug)]
#[command(name = "repair-bench")]
#[command(about = "Run the demo repair workshop and report the outcomes")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Difficulty preset: easy, normal or challenging
    #[arg(long)]
    difficulty: Option<String>,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum ticks to simulate
    #[arg(long, default_value_t = 20_000)]
    max_ticks: u64,

    /// Write the repair state here when the run ends
    #[arg(long)]
    save: Option<PathBuf>,

    /// Resume from a repair state written by --save
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize)]
struct ItemReport {
    id: String,
    hit_points: i32,
    max_hit_points: i32,
    quality: Option<String>,
    degradation: f32,
}

#[derive(Serialize)]
struct RunReport {
    seed: u64,
    ticks: u64,
    repairs: Vec<String>,
    items: Vec<ItemReport>,
    open_trackers: usize,
}

fn load_settings(args: &Args) -> Result<RepairSettings> {
    let mut settings = match &args.config {
        Some(path) => RepairSettings::load_from_toml(path)?,
        None => RepairSettings::default(),
    };
    if let Some(name) = &args.difficulty {
        let difficulty = Difficulty::parse(name)
            .ok_or_else(|| RepairError::InvalidConfig(format!("unknown difficulty '{}'", name)))?;
        settings.apply_difficulty(difficulty);
    }
    settings.validate()?;
    Ok(settings)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repair_bench=info".into()),
        )
        .init();

    let args = Args::parse();
    let settings = load_settings(&args)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut session = match &args.resume {
        Some(path) => RepairSession::restore(SaveState::load_from_file(path)?, settings),
        None => RepairSession::new(settings),
    };

    let mut shop = demo_workshop();
    tracing::info!("repair bench starting, seed {}", seed);
    let summary = run_workshop(&mut shop, &mut session, &mut rng, args.max_ticks);

    if let Some(path) = &args.save {
        session.snapshot().save_to_file(path)?;
        tracing::info!("repair state written to {}", path.display());
    }

    let mut items: Vec<ItemReport> = shop
        .map
        .items
        .values()
        .map(|item| ItemReport {
            id: item.id.to_string(),
            hit_points: item.hit_points,
            max_hit_points: item.max_hit_points,
            quality: item.quality().map(|q| q.label().to_string()),
            degradation: session.ledger.get(&item.id),
        })
        .collect();
    items.sort_by(|a, b| a.id.cmp(&b.id));

    let report = RunReport {
        seed,
        ticks: summary.ticks,
        repairs: summary
            .repairs
            .iter()
            .map(|r| format!("{}: {} by {}", r.item, r.label, r.agent))
            .collect(),
        items,
        open_trackers: session.trackers.len(),
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n=== REPAIR BENCH ===");
    println!("Seed: {}  Ticks: {}", report.seed, report.ticks);
    println!("\nRepairs:");
    for line in &report.repairs {
        println!("  {}", line);
    }
    println!("\nItems:");
    for item in &report.items {
        println!(
            "  {:<22} {:>4}/{:<4} {:<12} degradation {:.2}",
            item.id,
            item.hit_points,
            item.max_hit_points,
            item.quality.as_deref().unwrap_or("-"),
            item.degradation
        );
    }
    if report.open_trackers > 0 {
        println!("\nUnfinished repairs: {}", report.open_trackers);
    }
    Ok(())
}
