use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use deck_descent::config::GameConfig;
use deck_descent::engine::{GameEngine, GameEngineOptions};
use deck_descent::ranking_store::RankingStore;
use deck_descent::types::{
    AbilityId, CellKind, Command, GameEvent, GameOverReason, GameSummary, ShopItem, Snapshot,
    SupplyKind, UpgradeId, Vec2,
};
use deck_descent::world::{is_walkable_terrain, Grid};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const STEPS: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];
const PISTOL_RANGE: i32 = 6;

/// Plays whole runs with a simple bot and prints one JSON line per run.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 3)]
    runs: u32,
    /// TOML file overriding the balance defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 5_000)]
    max_turns: u64,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    ranking_file: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunResultLine {
    seed: u32,
    reason: Option<GameOverReason>,
    floor: u32,
    turns: u64,
    level: i32,
    gold: i32,
    kills: u32,
    score: i64,
    dodges: u32,
    chain_strikes: u32,
    counter_attacks: u32,
    shield_blocks: u32,
    transmissions: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    turn: u64,
    message: String,
}

struct SimulationRun {
    result: RunResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    summary: GameSummary,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    started_at: String,
    finished_at: String,
    run_count: usize,
    anomaly_count: usize,
    average_floor: f32,
    best_score: i64,
    reason_counts: BTreeMap<String, usize>,
    runs: Vec<RunResultLine>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => match GameConfig::load(path) {
            Ok(config) => config,
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to load config");
                std::process::exit(2);
            }
        },
        None => GameConfig::default(),
    };

    let base_seed = cli.seed.unwrap_or_else(rand::random);
    let started_at = chrono::Utc::now().to_rfc3339();
    let mut ranking = cli.ranking_file.clone().map(RankingStore::new);
    let mut results = Vec::new();
    let mut has_anomaly = false;

    for offset in 0..cli.runs {
        let seed = base_seed.wrapping_add(offset);
        info!(seed, "run started");
        let SimulationRun {
            result,
            anomaly_records,
            summary,
        } = run_simulation(seed, &config, cli.max_turns);
        for record in &anomaly_records {
            warn!(seed, turn = record.turn, message = %record.message, "anomaly detected");
        }
        has_anomaly |= !result.anomalies.is_empty();
        info!(
            seed,
            reason = ?result.reason,
            floor = result.floor,
            turns = result.turns,
            score = result.score,
            "run finished"
        );

        if let Some(store) = ranking.as_mut().filter(|_| summary.reason.is_some()) {
            if let Some(rank) = store.record_run(&format!("bot-{seed}"), &summary) {
                info!(seed, rank, "run entered the ranking");
            }
        }

        match serde_json::to_string(&result) {
            Ok(line) => println!("{line}"),
            Err(error) => warn!(%error, "failed to serialize run result"),
        }
        results.push(result);
    }

    let summary = build_run_summary(started_at, chrono::Utc::now().to_rfc3339(), results);
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            warn!(path = %path.display(), %error, "summary write failed");
            std::process::exit(2);
        }
    }
    info!(
        runs = summary.run_count,
        anomalies = summary.anomaly_count,
        average_floor = summary.average_floor,
        best_score = summary.best_score,
        "simulation finished"
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_simulation(seed: u32, config: &GameConfig, max_turns: u64) -> SimulationRun {
    let mut engine = GameEngine::new(GameEngineOptions {
        seed,
        config: config.clone(),
    });
    let mut anomalies = Vec::new();
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut counters = EventCounters::default();
    let mut stalled = 0u32;

    while !engine.is_ended() {
        let turn_before = engine.turn_count();
        let floor_before = engine.floor();
        for command in plan_commands(&engine) {
            if engine.handle_command(command).is_err() && !engine.is_menu_open() {
                break;
            }
        }
        if engine.turn_count() == turn_before && engine.floor() == floor_before && !engine.is_ended() {
            stalled += 1;
            if stalled > 3 {
                if let Err(error) = engine.handle_command(Command::Wait) {
                    warn!(seed, turn = engine.turn_count(), %error, "stall fallback wait rejected");
                }
                stalled = 0;
            }
        } else {
            stalled = 0;
        }

        let snapshot = engine.build_snapshot(true);
        counters.absorb(&snapshot.events);
        for message in collect_snapshot_anomalies(&snapshot) {
            push_anomaly(&mut anomalies, &mut records, &mut seen, snapshot.turn, message);
        }
        if engine.turn_count() > max_turns {
            push_anomaly(
                &mut anomalies,
                &mut records,
                &mut seen,
                engine.turn_count(),
                "turn safety limit exceeded".to_string(),
            );
            break;
        }
    }

    let summary = engine.build_summary();
    let result = RunResultLine {
        seed,
        reason: summary.reason,
        floor: summary.floor,
        turns: summary.turns,
        level: summary.level,
        gold: summary.gold,
        kills: summary.kills,
        score: summary.score,
        dodges: counters.dodges,
        chain_strikes: counters.chain_strikes,
        counter_attacks: counters.counter_attacks,
        shield_blocks: counters.shield_blocks,
        transmissions: counters.transmissions,
        anomalies,
    };
    SimulationRun {
        result,
        anomaly_records: records,
        summary,
    }
}

#[derive(Default)]
struct EventCounters {
    dodges: u32,
    chain_strikes: u32,
    counter_attacks: u32,
    shield_blocks: u32,
    transmissions: u32,
}

impl EventCounters {
    fn absorb(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::Dodge { .. } => self.dodges += 1,
                GameEvent::ChainStrike { .. } => self.chain_strikes += 1,
                GameEvent::CounterAttack { .. } => self.counter_attacks += 1,
                GameEvent::ShieldBlock { .. } => self.shield_blocks += 1,
                GameEvent::Transmission { .. } => self.transmissions += 1,
                _ => {}
            }
        }
    }
}

/// One bot decision. Commands run in order until one is refused, except at
/// the terminal where refused purchases are skipped.
fn plan_commands(engine: &GameEngine) -> Vec<Command> {
    let player = engine.player();
    if engine.is_menu_open() {
        let mut plan: Vec<Command> = [
            UpgradeId::ChainStrike,
            UpgradeId::CounterAttack,
            UpgradeId::AutoRepair,
        ]
        .into_iter()
        .map(|upgrade| Command::PurchaseUpgrade { upgrade })
        .collect();
        if player.hp_ratio() < 0.5 {
            plan.insert(0, Command::PurchaseShopItem {
                item: ShopItem::HullPlating,
            });
        }
        plan.push(Command::ConfirmFloorTransition);
        return plan;
    }

    let live_enemies: Vec<Vec2> = engine
        .enemies()
        .iter()
        .filter(|enemy| enemy.alive)
        .map(|enemy| enemy.pos)
        .collect();

    if let Some(adjacent) = live_enemies
        .iter()
        .find(|pos| chebyshev(**pos, player.pos) == 1)
    {
        if player.hp_ratio() < 0.4 && shield_ready(engine) {
            return vec![Command::UseAbility {
                ability: AbilityId::EnergyShield,
            }];
        }
        return vec![Command::Move {
            dx: adjacent.x - player.pos.x,
            dy: adjacent.y - player.pos.y,
        }];
    }

    if player.ammo[0] > 0 {
        if let Some(target) = live_enemies.iter().find(|pos| {
            chebyshev(**pos, player.pos) <= PISTOL_RANGE && engine.is_visible(**pos)
        }) {
            return vec![
                Command::SelectRangedWeapon { slot: 0 },
                Command::RangedAttack {
                    x: target.x,
                    y: target.y,
                },
            ];
        }
    }

    let goal = if player.oxygen_ratio() < 0.4 {
        nearest_supply(engine, SupplyKind::Oxygen).unwrap_or(engine.exit())
    } else {
        engine.exit()
    };
    match first_step(engine.grid(), player.pos, goal) {
        Some((dx, dy)) => vec![Command::Move { dx, dy }],
        None => vec![Command::Wait],
    }
}

fn shield_ready(engine: &GameEngine) -> bool {
    let player = engine.player();
    let Some(state) = player.abilities.get(&AbilityId::EnergyShield) else {
        return false;
    };
    state.unlocked
        && state.uses > 0
        && !player.shield_active
        && player.power >= AbilityId::EnergyShield.power_cost()
}

fn nearest_supply(engine: &GameEngine, kind: SupplyKind) -> Option<Vec2> {
    let from = engine.player().pos;
    engine
        .supplies()
        .iter()
        .filter(|supply| !supply.taken && supply.kind == kind)
        .min_by_key(|supply| chebyshev(supply.pos, from))
        .map(|supply| supply.pos)
}

fn chebyshev(a: Vec2, b: Vec2) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// Breadth-first search over walkable cells; returns the first move delta.
fn first_step(grid: &Grid, from: Vec2, goal: Vec2) -> Option<(i32, i32)> {
    if from == goal {
        return None;
    }
    let mut came_from: HashMap<Vec2, Vec2> = HashMap::new();
    came_from.insert(from, from);
    let mut queue = VecDeque::from([from]);
    while let Some(cell) = queue.pop_front() {
        if cell == goal {
            let mut step = cell;
            while let Some(prev) = came_from.get(&step).copied() {
                if prev == from {
                    return Some((step.x - from.x, step.y - from.y));
                }
                step = prev;
            }
            return None;
        }
        for (dx, dy) in STEPS {
            let next = cell.offset(dx, dy);
            if came_from.contains_key(&next)
                || !grid.at(next).map(is_walkable_terrain).unwrap_or(false)
            {
                continue;
            }
            came_from.insert(next, cell);
            queue.push_back(next);
        }
    }
    None
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    let player = &snapshot.player;
    if player.hp < 0 || player.hp > player.max_hp {
        anomalies.push(format!("player hp out of range: {}/{}", player.hp, player.max_hp));
    }
    if !player.oxygen.is_finite() || player.oxygen < 0.0 || player.oxygen > player.max_oxygen {
        anomalies.push(format!(
            "player oxygen out of range: {}/{}",
            player.oxygen, player.max_oxygen
        ));
    }

    let player_tiles: usize = snapshot
        .tiles
        .iter()
        .map(|row| row.chars().filter(|c| *c == CellKind::Player.glyph()).count())
        .sum();
    if player_tiles != 1 {
        anomalies.push(format!("expected one player tile, found {player_tiles}"));
    }

    let mut occupied = HashSet::new();
    for enemy in &snapshot.enemies {
        if enemy.hp <= 0 {
            anomalies.push(format!("enemy hp <= 0 remains: {}", enemy.id));
        }
        if !occupied.insert((enemy.x, enemy.y)) {
            anomalies.push(format!("two enemies share ({},{})", enemy.x, enemy.y));
        }
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    records: &mut Vec<AnomalyRecord>,
    seen: &mut HashSet<String>,
    turn: u64,
    message: String,
) {
    records.push(AnomalyRecord {
        turn,
        message: message.clone(),
    });
    if seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn build_run_summary(
    started_at: String,
    finished_at: String,
    runs: Vec<RunResultLine>,
) -> RunSummary {
    let run_count = runs.len();
    let mut reason_counts = BTreeMap::new();
    for run in &runs {
        let key = match run.reason {
            Some(GameOverReason::Victory) => "victory",
            Some(GameOverReason::Killed) => "killed",
            Some(GameOverReason::Suffocated) => "suffocated",
            None => "unfinished",
        };
        *reason_counts.entry(key.to_string()).or_insert(0) += 1;
    }
    let average_floor = if run_count == 0 {
        0.0
    } else {
        runs.iter().map(|run| run.floor as f32).sum::<f32>() / run_count as f32
    };
    RunSummary {
        started_at,
        finished_at,
        run_count,
        anomaly_count: runs.iter().map(|run| run.anomalies.len()).sum(),
        average_floor,
        best_score: runs.iter().map(|run| run.score).max().unwrap_or(0),
        reason_counts,
        runs,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, text)
}
