#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Tower Siege matches.

mod save_files;

use std::{
    fs,
    path::PathBuf,
    str::FromStr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use tower_siege_core::{
    Balance, CellCoord, Command, Difficulty, Event, MapKind, MatchStatus, TowerKind, WavePhase,
};
use tower_siege_system_pathfinding::{derive_routes, maps};
use tower_siege_world::{apply, query, Match, MatchConfig};

use save_files::SaveFile;

/// Banner printed before a simulated match starts.
const WELCOME_BANNER: &str = "Welcome to Tower Siege.";

/// Command line interface of the Tower Siege simulator.
#[derive(Debug, Parser)]
#[command(name = "tower-siege", version, about = "Headless wave-based tower defence")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Plays a match with a fixed tower layout until it ends or time runs out.
    Simulate(SimulateArgs),
    /// Prints the enemy routes derived for a map.
    Routes {
        /// Map layout to inspect.
        #[arg(long, default_value = "forest")]
        map: MapKind,
    },
    /// Prints the default balance table as TOML.
    Balance,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Map layout.
    #[arg(long, default_value = "forest")]
    map: MapKind,
    /// Difficulty level.
    #[arg(long, default_value = "normal")]
    difficulty: Difficulty,
    /// Seed of the match's random number generator.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Tower to build before the first wave, as `KIND@COLUMN,ROW[:LEVEL]`.
    #[arg(long = "tower", value_name = "PLAN")]
    towers: Vec<TowerPlan>,
    /// TOML file overriding parts of the balance table.
    #[arg(long)]
    balance: Option<PathBuf>,
    /// Save file to resume from instead of starting fresh.
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Save file written when the simulation stops.
    #[arg(long)]
    save: Option<PathBuf>,
    /// Simulated seconds after which the run stops.
    #[arg(long, default_value_t = 1800)]
    time_limit: u64,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Starts each wave as soon as the field is clear.
    #[arg(long)]
    auto_start: bool,
    /// Name recorded in the high score table on victory.
    #[arg(long, default_value = "player")]
    name: String,
    /// High score table location.
    #[arg(long)]
    scores: Option<PathBuf>,
}

/// Tower placement requested on the command line.
#[derive(Clone, Copy, Debug, PartialEq)]
struct TowerPlan {
    kind: TowerKind,
    cell: CellCoord,
    level: u32,
}

impl FromStr for TowerPlan {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = value
            .split_once('@')
            .ok_or_else(|| format!("expected KIND@COLUMN,ROW[:LEVEL], got '{value}'"))?;
        let kind = kind.trim().parse::<TowerKind>().map_err(|error| error.to_string())?;

        let (cell, level) = match rest.split_once(':') {
            Some((cell, level)) => (
                cell,
                level
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| format!("invalid tower level '{level}'"))?,
            ),
            None => (rest, 1),
        };
        let (column, row) = cell
            .split_once(',')
            .ok_or_else(|| format!("expected COLUMN,ROW, got '{cell}'"))?;
        let column = column
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid column '{column}'"))?;
        let row = row
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid row '{row}'"))?;
        if level == 0 {
            return Err("tower level starts at 1".to_owned());
        }

        Ok(Self {
            kind,
            cell: CellCoord::new(column, row),
            level,
        })
    }
}

/// Entry point for the Tower Siege command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        CliCommand::Simulate(args) => simulate(&args),
        CliCommand::Routes { map } => print_routes(map),
        CliCommand::Balance => {
            let toml = Balance::default()
                .to_toml_string()
                .context("could not render the default balance table")?;
            print!("{toml}");
            Ok(())
        }
    }
}

fn load_balance(args: &SimulateArgs) -> Result<Balance> {
    let Some(path) = &args.balance else {
        return Ok(Balance::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;
    Balance::from_toml_str(&text).with_context(|| format!("invalid balance in {}", path.display()))
}

fn start_match(args: &SimulateArgs, balance: Balance) -> Result<(Match, u64)> {
    if let Some(path) = &args.resume {
        let save = SaveFile::read(path)?;
        let (game, report) = Match::from_snapshot(&save.snapshot, save.seed, balance)
            .context("could not rebuild the saved map")?;
        if !report.is_clean() {
            log::warn!(
                "{} value(s) in {} were skipped",
                report.skipped.len(),
                path.display()
            );
        }
        return Ok((game, save.seed));
    }

    let game = Match::new(MatchConfig {
        difficulty: args.difficulty,
        map: args.map,
        seed: args.seed,
        balance,
    })
    .context("could not build the map")?;
    Ok((game, args.seed))
}

fn build_towers(game: &mut Match, plans: &[TowerPlan], events: &mut Vec<Event>) {
    for plan in plans {
        let position = query::tile_grid(game).cell_center(plan.cell);
        apply(game, Command::SelectTowerKind { kind: plan.kind }, events);
        apply(game, Command::PlaceTower { position }, events);
        if let Some(Event::TowerPlacementRejected { reason, .. }) = events.last() {
            log::warn!(
                "could not build {} at {},{}: {reason}",
                plan.kind,
                plan.cell.column(),
                plan.cell.row()
            );
            continue;
        }
        for _ in 1..plan.level {
            apply(game, Command::UpgradeSelectedTower, events);
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    fired: u64,
    kills: u64,
    escapes: u64,
    criticals: u64,
    evasions: u64,
    bosses: u64,
}

impl Tally {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TowerFired { .. } => self.fired += 1,
                Event::EnemyKilled { .. } => self.kills += 1,
                Event::EnemyEscaped { .. } => self.escapes += 1,
                Event::CriticalHit { .. } => self.criticals += 1,
                Event::HitEvaded { .. } => self.evasions += 1,
                Event::BossSpawned { kind, .. } => {
                    self.bosses += 1;
                    log::info!("{kind} entered the field");
                }
                _ => {}
            }
        }
    }
}

fn simulate(args: &SimulateArgs) -> Result<()> {
    let balance = load_balance(args)?;
    let (mut game, seed) = start_match(args, balance)?;
    println!("{WELCOME_BANNER}");

    let mut events = Vec::new();
    build_towers(&mut game, &args.towers, &mut events);
    let mut tally = Tally::default();
    tally.record(&events);

    let dt = Duration::from_millis(args.tick_ms.max(1));
    let limit = Duration::from_secs(args.time_limit);
    let mut elapsed = Duration::ZERO;

    while query::status(&game) == MatchStatus::Running && elapsed < limit {
        events.clear();
        let phase = query::wave_status(&game).phase;
        if args.auto_start && matches!(phase, WavePhase::Idle | WavePhase::Countdown { .. }) {
            apply(&mut game, Command::StartWaveNow, &mut events);
        }
        apply(&mut game, Command::Tick { dt }, &mut events);
        tally.record(&events);
        elapsed += dt;
    }

    let economy = query::economy(&game);
    let waves = query::wave_status(&game);
    println!(
        "{} on {} ({}) after {:.1}s: wave {}/{}, money {}, lives {}, score {}",
        status_label(query::status(&game)),
        query::map(&game),
        query::difficulty(&game),
        elapsed.as_secs_f32(),
        waves.started,
        waves.total,
        economy.money,
        economy.lives,
        economy.score
    );
    println!(
        "shots {}, kills {}, escapes {}, criticals {}, evasions {}, bosses {}",
        tally.fired, tally.kills, tally.escapes, tally.criticals, tally.evasions, tally.bosses
    );

    record_high_score(&game, args)?;

    if let Some(path) = &args.save {
        SaveFile::new(seed, game.save_snapshot()).write(path)?;
        println!("saved to {}", path.display());
    }
    Ok(())
}

fn record_high_score(game: &Match, args: &SimulateArgs) -> Result<()> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |since| since.as_secs());
    let Some(entry) = query::high_score(game, &args.name, timestamp) else {
        return Ok(());
    };

    let path = args
        .scores
        .clone()
        .unwrap_or_else(save_files::default_scores_path);
    let mut table = save_files::load_scores(&path)?;
    match table.record(entry) {
        Some(rank) => println!("high score rank {} of {}", rank + 1, table.capacity()),
        None => println!("score did not reach the high score table"),
    }
    save_files::store_scores(&path, &table)
}

fn status_label(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Running => "stopped",
        MatchStatus::Paused => "paused",
        MatchStatus::GameOver => "game over",
        MatchStatus::Victory => "victory",
    }
}

fn print_routes(map: MapKind) -> Result<()> {
    let grid = maps::builtin(map).with_context(|| format!("could not build map {map}"))?;
    for (index, route) in derive_routes(&grid).iter().enumerate() {
        let cells = route
            .waypoints()
            .iter()
            .filter_map(|point| grid.cell_at(*point))
            .map(|cell| format!("({},{})", cell.column(), cell.row()))
            .collect::<Vec<_>>();
        let note = if route.is_degraded() { " [fallback]" } else { "" };
        println!(
            "route {index}: {} waypoints{note}: {}",
            cells.len(),
            cells.join(" ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tower_plans_parse_kind_cell_and_level() {
        assert_eq!(
            "laser@3,7:2".parse::<TowerPlan>(),
            Ok(TowerPlan {
                kind: TowerKind::Laser,
                cell: CellCoord::new(3, 7),
                level: 2,
            })
        );
        assert_eq!(
            "Sniper@0,1".parse::<TowerPlan>().map(|plan| plan.level),
            Ok(1)
        );
        assert!("catapult@1,1".parse::<TowerPlan>().is_err());
        assert!("tesla@1".parse::<TowerPlan>().is_err());
        assert!("tesla@1,1:0".parse::<TowerPlan>().is_err());
    }

    #[test]
    fn arguments_parse_into_a_simulation() {
        let cli = Cli::try_parse_from([
            "tower-siege",
            "simulate",
            "--map",
            "hell",
            "--difficulty",
            "hard",
            "--tower",
            "rocket@4,4:3",
            "--auto-start",
        ])
        .expect("arguments parse");

        let CliCommand::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.map, MapKind::Hell);
        assert_eq!(args.difficulty, Difficulty::Hard);
        assert_eq!(args.towers.len(), 1);
        assert!(args.auto_start);
    }

    #[test]
    fn planned_towers_are_built_and_upgraded() {
        let mut balance = Balance::default();
        balance.economy.starting_money.normal = 5000;
        let mut game = Match::new(MatchConfig {
            balance,
            ..MatchConfig::default()
        })
        .expect("forest parses");
        let spot = query::tile_grid(&game).tower_spots()[0];

        let mut events = Vec::new();
        build_towers(
            &mut game,
            &[TowerPlan {
                kind: TowerKind::Artillery,
                cell: spot,
                level: 3,
            }],
            &mut events,
        );

        let towers = query::tower_view(&game).into_vec();
        assert_eq!(towers.len(), 1);
        assert_eq!(towers[0].kind, TowerKind::Artillery);
        assert_eq!(towers[0].level, 3);
    }
}
