use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use deck_descent::command_protocol::parse_command;
use deck_descent::config::GameConfig;
use deck_descent::engine::{GameEngine, GameEngineOptions};
use deck_descent::ranking_store::RankingStore;
use deck_descent::save::SaveData;
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Line-oriented front end: one JSON command per stdin line, one JSON frame
/// per stdout line.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = 1)]
    seed: u32,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Resume from a save written by `--save-out`.
    #[arg(long)]
    load: Option<PathBuf>,
    #[arg(long)]
    save_out: Option<PathBuf>,
    #[arg(long)]
    ranking_file: Option<PathBuf>,
    #[arg(long, default_value = "survivor")]
    name: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut engine = match start_engine(&cli) {
        Ok(engine) => engine,
        Err(message) => {
            warn!(%message, "failed to start");
            std::process::exit(2);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    emit(&mut out, snapshot_frame(&mut engine, None));

    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(command) = parse_command(trimmed) else {
            emit(&mut out, json!({"type": "error", "message": "invalid command"}));
            continue;
        };
        let outcome = match engine.handle_command(command) {
            Ok(outcome) => json!({"outcome": outcome}),
            Err(error) => json!({"error": error.to_string()}),
        };
        emit(&mut out, snapshot_frame(&mut engine, Some(outcome)));

        if engine.is_ended() {
            let summary = engine.build_summary();
            let rank = cli
                .ranking_file
                .clone()
                .map(RankingStore::new)
                .and_then(|mut store| store.record_run(&cli.name, &summary));
            info!(reason = ?summary.reason, score = summary.score, ?rank, "run over");
            emit(&mut out, json!({"type": "game_over", "summary": summary, "rank": rank}));
            break;
        }
    }

    if let Some(path) = cli.save_out.as_ref().filter(|_| !engine.is_ended()) {
        let written = engine
            .to_save()
            .to_json()
            .map_err(|error| error.to_string())
            .and_then(|text| std::fs::write(path, text).map_err(|error| error.to_string()));
        if let Err(error) = written {
            warn!(path = %path.display(), %error, "failed to write save");
            std::process::exit(2);
        }
    }
}

fn start_engine(cli: &Cli) -> Result<GameEngine, String> {
    let config = match cli.config.as_deref() {
        Some(path) => GameConfig::load(path).map_err(|error| error.to_string())?,
        None => GameConfig::default(),
    };
    let options = GameEngineOptions {
        seed: cli.seed,
        config,
    };
    match cli.load.as_deref() {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|error| error.to_string())?;
            let data = SaveData::from_json(&text).map_err(|error| error.to_string())?;
            GameEngine::from_save(data, options).map_err(|error| error.to_string())
        }
        None => Ok(GameEngine::new(options)),
    }
}

fn snapshot_frame(engine: &mut GameEngine, result: Option<Value>) -> Value {
    json!({
        "type": "snapshot",
        "result": result,
        "snapshot": engine.build_snapshot(true),
    })
}

fn emit(out: &mut impl Write, frame: Value) {
    if let Err(error) = writeln!(out, "{frame}").and_then(|_| out.flush()) {
        warn!(%error, "failed to write frame");
    }
}
