//! Hamlet Headless Simulation Harness
//!
//! Drives the settlement engine through scripted scenarios and checks the
//! settlement-wide invariants after each one. Runs entirely in-process with
//! no rendering or input.
//!
//! Usage:
//!   cargo run -p hamlet-simtest
//!   cargo run -p hamlet-simtest -- --verbose
//!   cargo run -p hamlet-simtest -- --config settlement.json
//!
//! Log output honors `RUST_LOG` (default: warn, or debug with --verbose).

use anyhow::{bail, Context};
use hamlet_core::generation::BuildingCatalog;
use hamlet_core::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

struct Args {
    verbose: bool,
    config: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        verbose: false,
        config: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--verbose" | "-v" => args.verbose = true,
            "--config" => {
                let Some(path) = iter.next() else {
                    bail!("--config needs a path");
                };
                args.config = Some(path);
            }
            other => bail!("unknown argument: {}", other),
        }
    }
    Ok(args)
}

#[derive(Serialize)]
struct Summary {
    sim_seconds: f64,
    day: u32,
    season: Season,
    population: PopulationStats,
    resources: Vec<(ResourceKind, f32)>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    let default_filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = match &args.config {
        Some(path) => SimConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path))?,
        None => SimConfig {
            seed: Some(2024),
            ..Default::default()
        },
    };
    config.validate().context("validating config")?;
    log::info!(
        "Running scenarios with seed {:?}, tick {}s",
        config.seed,
        config.tick.interval_seconds
    );

    println!("=== Hamlet Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Building catalog
    results.extend(validate_catalog(args.verbose));

    // 2. Founding
    results.extend(validate_founding(&config, args.verbose)?);

    // 3. Economy loop
    results.extend(validate_economy(&config, args.verbose)?);

    // 4. Meal shortage
    results.extend(validate_meals(&config)?);

    // 5. Generations
    let (generation_results, engine) = validate_generations(&config, args.verbose)?;
    results.extend(generation_results);

    // 6. Raid
    results.extend(validate_raid(&config, args.verbose)?);

    // 7. Save/load
    results.extend(validate_persistence(&engine)?);

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    let summary = Summary {
        sim_seconds: engine.sim_time(),
        day: engine.clock().day,
        season: engine.clock().season,
        population: engine.population_stats(),
        resources: engine.ledger().iter().collect(),
    };
    println!("\n--- Final settlement ---");
    println!("{}", serde_json::to_string_pretty(&summary)?);

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Run `seconds` of sim time in fixed frames
fn run_for(engine: &mut SettlementEngine, seconds: f32, frame: f32) {
    let frames = (seconds / frame).round() as u32;
    for _ in 0..frames {
        engine.update(frame);
    }
}

/// Invariant violations across every registered villager and building
fn invariant_violations(engine: &SettlementEngine) -> Vec<String> {
    let mut problems = Vec::new();
    let young = engine.config.lifecycle.young_threshold;

    for &v in engine.villagers() {
        let Ok(life) = engine.world.get::<&Lifecycle>(v) else {
            problems.push(format!("{:?} registered without a lifecycle", v));
            continue;
        };
        if life.stage != LifeStage::from_age(life.age, young, life.life_expectancy) {
            problems.push(format!("{:?} is {:?} at age {:.2}", v, life.stage, life.age));
        }
        let employed = engine
            .world
            .get::<&Employment>(v)
            .map(|e| e.building.is_some())
            .unwrap_or(false);
        if employed && !life.is_mature() {
            problems.push(format!("{:?} holds a job while {:?}", v, life.stage));
        }
    }

    for &b in engine.buildings() {
        if let (Ok(data), Ok(building)) = (
            engine.world.get::<&BuildingData>(b),
            engine.world.get::<&Building>(b),
        ) {
            if building.workers.len() > data.max_workers as usize {
                problems.push(format!(
                    "{} has {} workers, max {}",
                    data.name,
                    building.workers.len(),
                    data.max_workers
                ));
            }
        }
    }

    for (resource, amount) in engine.ledger().iter() {
        if amount < 0.0 {
            problems.push(format!("{:?} is negative: {}", resource, amount));
        }
    }
    problems
}

fn invariants_result(name: &str, engine: &SettlementEngine) -> TestResult {
    let problems = invariant_violations(engine);
    TestResult::new(
        name,
        problems.is_empty(),
        if problems.is_empty() {
            format!("{} villagers consistent", engine.villagers().len())
        } else {
            problems.join("; ")
        },
    )
}

// ── 1. Building Catalog ─────────────────────────────────────────────────

fn validate_catalog(verbose: bool) -> Vec<TestResult> {
    println!("--- Building Catalog ---");
    let mut results = Vec::new();

    let catalog = match BuildingCatalog::builtin() {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult::new("catalog_parse", false, e.to_string()));
            return results;
        }
    };
    results.push(TestResult::new(
        "catalog_not_empty",
        catalog.len() >= 5,
        format!("{} building types loaded", catalog.len()),
    ));

    let town_hall = catalog.get(BuildingType::TownHall);
    results.push(TestResult::new(
        "catalog_town_hall_free",
        town_hall
            .map(|d| d.construction_cost.is_empty())
            .unwrap_or(false),
        "town hall exists and costs nothing",
    ));

    let bad_producers: Vec<&str> = catalog
        .iter()
        .filter(|d| {
            d.max_workers > 0
                && !matches!(d.production_type, ProductionType::Garrison)
                && d.work_rate() <= 0.0
        })
        .map(|d| d.name.as_str())
        .collect();
    results.push(TestResult::new(
        "catalog_workers_produce",
        bad_producers.is_empty(),
        if bad_producers.is_empty() {
            "every staffed producer has a positive work rate".to_string()
        } else {
            format!("no work rate: {}", bad_producers.join(", "))
        },
    ));

    if verbose {
        for data in catalog.iter() {
            println!(
                "  {:<12} workers {} rate {:.1} build {:.0}s",
                data.name,
                data.max_workers,
                data.work_rate(),
                data.construction_time
            );
        }
    }
    results
}

// ── 2. Founding ─────────────────────────────────────────────────────────

fn validate_founding(config: &SimConfig, verbose: bool) -> anyhow::Result<Vec<TestResult>> {
    println!("--- Founding ---");
    let mut results = Vec::new();

    let mut engine = SettlementEngine::new(config.clone())?;
    let founders = engine.generate(20);
    let stats = engine.population_stats();

    results.push(TestResult::new(
        "founding_population",
        stats.total == 20 && founders.len() == 20,
        format!("{} founders registered", stats.total),
    ));
    results.push(TestResult::new(
        "founding_has_children",
        stats.young == 5 && stats.mature == 15,
        format!("{} young, {} mature", stats.young, stats.mature),
    ));
    results.push(TestResult::new(
        "founding_town_hall",
        engine.buildings().len() == 1,
        format!("{} buildings", engine.buildings().len()),
    ));
    results.push(invariants_result("founding_invariants", &engine));

    if verbose {
        println!("  {}", serde_json::to_string(&stats)?);
    }
    Ok(results)
}

// ── 3. Economy ──────────────────────────────────────────────────────────

fn validate_economy(config: &SimConfig, verbose: bool) -> anyhow::Result<Vec<TestResult>> {
    println!("--- Economy ---");
    let mut results = Vec::new();

    let mut engine = SettlementEngine::new(config.clone())?;
    engine.generate(12);
    engine.add_resource(ResourceKind::Fish, 100.0);

    let fishery = engine.place_building(BuildingType::Fishery, Vec2::new(10.0, 0.0))?;
    let camp = engine.place_building(BuildingType::LumberCamp, Vec2::new(-10.0, 0.0))?;
    let wood_after_build = engine.resource(ResourceKind::Wood);

    let mut assigned = 0;
    for v in engine.unemployed_villagers() {
        let target = if assigned % 2 == 0 { fishery } else { camp };
        if engine.assign_worker(target, v).is_ok() {
            assigned += 1;
        }
    }
    results.push(TestResult::new(
        "economy_assignment_capped",
        assigned == 6,
        format!("{} workers placed in two buildings of 3", assigned),
    ));

    let hall = engine.buildings()[0];
    let spare = engine.unemployed_villagers();
    let rejected = spare
        .first()
        .map(|&v| engine.assign_worker(hall, v).is_err())
        .unwrap_or(true);
    results.push(TestResult::new(
        "economy_town_hall_has_no_jobs",
        rejected,
        "assignment to the town hall is refused",
    ));

    run_for(&mut engine, 120.0, 0.1);

    let wood = engine.resource(ResourceKind::Wood);
    results.push(TestResult::new(
        "economy_wood_gathered",
        wood > wood_after_build,
        format!("wood {:.1} -> {:.1}", wood_after_build, wood),
    ));
    let cycles = engine
        .drain_events()
        .iter()
        .filter(|e| matches!(e, SettlementEvent::ProductionCompleted { .. }))
        .count();
    results.push(TestResult::new(
        "economy_cycles_completed",
        cycles > 0,
        format!("{} production cycles", cycles),
    ));
    if verbose {
        for b in [fishery, camp] {
            println!(
                "  {:?}: progress {:.1}%, next in {:.1}s",
                b,
                engine.production_progress_percent(b).unwrap_or(0.0),
                engine.estimated_time_to_completion(b).unwrap_or(f32::INFINITY)
            );
        }
    }
    results.push(invariants_result("economy_invariants", &engine));
    Ok(results)
}

// ── 4. Meals ────────────────────────────────────────────────────────────

fn validate_meals(config: &SimConfig) -> anyhow::Result<Vec<TestResult>> {
    println!("--- Meals ---");
    let mut results = Vec::new();

    let mut config = config.clone();
    config.economy.food_per_villager = 1.0;
    config.economy.starting_resources =
        vec![ResourceAmount::new(config.economy.meal_resource, 5.0)];
    config.tick.interval_seconds = f32::MAX;

    let mut engine = SettlementEngine::new(config.clone())?;
    engine.generate(8);
    run_for(&mut engine, config.clock.day_length_seconds, 0.5);

    let served = engine.drain_events().into_iter().find_map(|e| match e {
        SettlementEvent::MealServed { fed, hungry } => Some((fed, hungry)),
        _ => None,
    });
    results.push(TestResult::new(
        "meals_shortage_split",
        served == Some((5, 3)),
        format!("served {:?}", served),
    ));
    results.push(TestResult::new(
        "meals_stock_emptied",
        engine.resource(config.economy.meal_resource) == 0.0,
        format!("{:.1} left", engine.resource(config.economy.meal_resource)),
    ));
    Ok(results)
}

// ── 5. Generations ──────────────────────────────────────────────────────

fn validate_generations(
    config: &SimConfig,
    verbose: bool,
) -> anyhow::Result<(Vec<TestResult>, SettlementEngine)> {
    println!("--- Generations ---");
    let mut results = Vec::new();

    let mut engine = SettlementEngine::new(config.clone())?;
    engine.generate(16);
    engine.add_resource(ResourceKind::Fish, 1000.0);

    let years = 30.0;
    let seconds =
        years / config.tick.years_per_tick * config.tick.interval_seconds;
    let mut violations = Vec::new();
    let mut elapsed = 0.0;
    while elapsed < seconds {
        run_for(&mut engine, 10.0, 0.5);
        elapsed += 10.0;
        violations.extend(invariant_violations(&engine));
    }

    let stats = engine.population_stats();
    results.push(TestResult::new(
        "generations_births",
        stats.births > 0,
        format!("{} births over {} years", stats.births, years),
    ));
    results.push(TestResult::new(
        "generations_invariants",
        violations.is_empty(),
        if violations.is_empty() {
            format!("{} villagers alive", stats.total)
        } else {
            violations.join("; ")
        },
    ));
    if verbose {
        println!("  {}", serde_json::to_string(&stats)?);
    }
    Ok((results, engine))
}

// ── 6. Raid ─────────────────────────────────────────────────────────────

fn validate_raid(config: &SimConfig, verbose: bool) -> anyhow::Result<Vec<TestResult>> {
    println!("--- Raid ---");
    let mut results = Vec::new();

    let mut engine = SettlementEngine::new(config.clone())?;
    engine.generate(16);
    engine.add_resource(ResourceKind::Shield, 10.0);
    for i in 0..3 {
        engine.spawn_enemy(Vec2::new(8.0 * i as f32 - 8.0, 12.0));
    }

    let mut violations = Vec::new();
    for _ in 0..120 {
        run_for(&mut engine, 0.5, 0.1);
        violations.extend(invariant_violations(&engine));
    }

    let events = engine.drain_events();
    let killed = events
        .iter()
        .filter(|e| matches!(e, SettlementEvent::EnemyKilled { .. }))
        .count();
    let fallen: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SettlementEvent::VillagerDied {
                villager,
                cause: DeathCause::Combat,
            } => Some(*villager),
            _ => None,
        })
        .collect();

    results.push(TestResult::new(
        "raid_fallen_unregistered",
        fallen.iter().all(|v| !engine.villagers().contains(v)),
        format!("{} villagers fell, {} enemies killed", fallen.len(), killed),
    ));
    results.push(TestResult::new(
        "raid_invariants",
        violations.is_empty(),
        violations.join("; "),
    ));
    if verbose {
        println!(
            "  shields left {:.0}, enemies standing {}",
            engine.resource(ResourceKind::Shield),
            engine.enemy_count()
        );
    }
    Ok(results)
}

// ── 7. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(engine: &SettlementEngine) -> anyhow::Result<Vec<TestResult>> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    let mut buffer = Vec::new();
    engine.save(&mut buffer).context("saving settlement")?;

    let mut loaded = SettlementEngine::new(engine.config.clone())?;
    loaded.load(&buffer[..]).context("loading settlement")?;

    results.push(TestResult::new(
        "persistence_registry",
        loaded.villagers() == engine.villagers() && loaded.buildings() == engine.buildings(),
        format!("{} bytes", buffer.len()),
    ));
    results.push(TestResult::new(
        "persistence_stats",
        loaded.population_stats() == engine.population_stats(),
        format!("{} villagers", loaded.population_stats().total),
    ));
    results.push(invariants_result("persistence_invariants", &loaded));
    Ok(results)
}
