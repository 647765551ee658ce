//! Headless battle runner
//!
//! Recruits a player army from the stock roster, mirrors a computer army
//! against it and lets the AI play both sides until one is left standing.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use skirmish::battle::{
    check_stage_size, spawn_recruits, Battle, Faction, Grid, DEFAULT_RECRUITS,
};
use skirmish::core::{EngineConfig, EventLog, NameRegistry, Result};
use skirmish::persistence::{load_battle, save_battle};

/// Headless Battle Runner - AI vs AI skirmishes
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(about = "Run an AI vs AI skirmish and print the result")]
struct Args {
    /// Grid width in cells
    #[arg(long, default_value_t = 8)]
    width: u32,

    /// Grid height in cells
    #[arg(long, default_value_t = 6)]
    height: u32,

    /// Units per army, taken from the stock roster
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=11))]
    army: u8,

    /// Stop after this many rounds even if undecided
    #[arg(long, default_value_t = 200)]
    max_turns: u32,

    /// Random seed for critical hits (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Engine config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resume from a save file instead of starting a new battle
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write the final state to this save file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print the event log to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct FactionSummary {
    name: String,
    alive_units: usize,
    total_hp: i32,
}

/// JSON output structure
#[derive(Serialize)]
struct RunResult {
    winner: Option<String>,
    decided: bool,
    turns: u32,
    ai_actions: usize,
    factions: Vec<FactionSummary>,
    events: usize,
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skirmish=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let seed = config.seed;

    let mut names = NameRegistry::new();
    let mut battle = match &args.load {
        Some(path) => load_battle(path, &mut names, config)?,
        None => new_battle(&args, config, &mut names)?,
    };
    tracing::info!(turn = battle.turn(), "skirmish starting");

    let mut ai_actions = 0;
    while !battle.is_game_over() && battle.turn() <= args.max_turns {
        ai_actions += battle.run_ai_turn()?;
        if !battle.end_faction_turn() {
            break;
        }
        battle.advance_turn()?;
    }

    if args.verbose {
        for event in battle.log().iter() {
            eprintln!("  [{}] {}", event.turn, event.description);
        }
    }

    if let Some(path) = &args.save {
        save_battle(&mut battle, path)?;
    }

    let result = summarize(&battle, ai_actions, seed);
    match args.format.as_str() {
        "text" => print_text(&result),
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}

/// Player army from the stock roster, computer army mirrored from it
fn new_battle(args: &Args, config: EngineConfig, names: &mut NameRegistry) -> Result<Battle> {
    let army = args.army as usize;
    check_stage_size(args.width, args.height, army, &config)?;

    let mut log = EventLog::new();
    let mut grid = Grid::new(args.width, args.height)?;
    let recruits = spawn_recruits(&DEFAULT_RECRUITS, &mut grid, names)?;
    let (chosen, spare) = recruits.split_at(army);

    let mut player = Faction::new(names, "Player")?;
    for &id in chosen {
        player.add_unit(&mut grid, id, &mut log);
    }
    let mut computer = Faction::new(names, "Computer")?;
    computer.mirror_roster(&player, spare, &mut grid, names, &mut log)?;

    player.auto_place(&mut grid, &config, &mut log)?;
    computer.auto_place(&mut grid, &config, &mut log)?;

    let mut battle = Battle::new(grid, vec![player, computer], config, log)?;
    battle.begin();
    Ok(battle)
}

fn summarize(battle: &Battle, ai_actions: usize, seed: u64) -> RunResult {
    let grid = battle.grid();
    let factions = battle
        .factions()
        .iter()
        .map(|faction| {
            let alive: Vec<_> = faction
                .units()
                .iter()
                .map(|&id| grid.unit(id))
                .filter(|unit| unit.is_alive())
                .collect();
            FactionSummary {
                name: faction.name().to_string(),
                alive_units: alive.len(),
                total_hp: alive.iter().map(|unit| unit.hp()).sum(),
            }
        })
        .collect();

    RunResult {
        winner: battle.winner().map(|f| f.name().to_string()),
        decided: battle.is_game_over(),
        turns: battle.turn(),
        ai_actions,
        factions,
        events: battle.log().len(),
        seed,
    }
}

fn print_text(result: &RunResult) {
    println!("Skirmish Result");
    println!("===============");
    match &result.winner {
        Some(name) => println!("Winner: {}", name),
        None => println!("Winner: none (undecided)"),
    }
    println!("Turns: {}", result.turns);
    println!("AI actions: {}", result.ai_actions);
    for faction in &result.factions {
        println!(
            "  {}: {} units standing, {} hp",
            faction.name, faction.alive_units, faction.total_hp
        );
    }
    println!("Events: {}", result.events);
    println!("Seed: {}", result.seed);
}
