//! delve-runner: headless runner for the delve loot simulator.
//!
//! Usage:
//!   delve-runner --seed 12345 --runs 1000 --max-level 9
//!   delve-runner --data-dir ./data --speed fast --ipc-mode

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use delve_core::{
    assets::DEFAULT_IMAGE_BASE,
    clock::SimSpeed,
    config::DropTable,
    engine::{RunOutcome, SimEngine},
    estimator::ItemEstimate,
    event::SimEvent,
    settings::{SettingsUpdate, SimSettings},
    snapshot::SimSnapshot,
    types::Level,
};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "delve-runner", version, about = "Simulate delve runs against the drop table")]
struct Args {
    /// Master seed; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Runs per simulation.
    #[arg(long, default_value_t = 100)]
    runs: u64,

    /// Deepest level reached each run.
    #[arg(long, default_value_t = 9)]
    max_level: Level,

    /// Pacing between runs: instant, fast, normal or slow.
    #[arg(long, default_value = "instant")]
    speed: SimSpeed,

    /// Directory holding drop_table.json and common_loot.json.
    /// The built-in table is used when omitted.
    #[arg(long)]
    data_dir: Option<String>,

    /// Prefix for item image paths in snapshots.
    #[arg(long, default_value = DEFAULT_IMAGE_BASE)]
    image_base: String,

    /// Speak the JSON-lines protocol on stdin/stdout.
    #[arg(long)]
    ipc_mode: bool,

    /// Print the summary as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Run {
        #[serde(default)]
        count: Option<u64>,
    },
    Stop,
    Reset,
    SetSettings {
        settings: SettingsUpdate,
    },
    Estimate {
        item_id:   String,
        #[serde(default)]
        max_level: Option<Level>,
        #[serde(default)]
        runs:      Option<u64>,
    },
    Quit,
}

#[derive(Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
enum IpcReply<'a> {
    State(&'a SimSnapshot),
    Event(&'a SimEvent),
    Estimate(&'a ItemEstimate),
    Error { message: String },
}

#[derive(Serialize)]
struct JsonReport<'a> {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    outcome:    RunOutcome,
    estimates:  Vec<ItemEstimate>,
    state:      &'a SimSnapshot,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let table = match &args.data_dir {
        Some(dir) => DropTable::load(dir)?,
        None => DropTable::builtin(),
    };
    let settings = SimSettings {
        max_level: args.max_level,
        runs_to_simulate: args.runs,
        speed: args.speed,
        seed: args.seed,
        ..Default::default()
    };
    let mut engine = SimEngine::new(table, settings)?.with_image_base(&args.image_base);

    let session_id = Uuid::new_v4();
    let started_at = Utc::now();
    log::info!("Session {session_id} started at {started_at}");

    if args.ipc_mode {
        return run_ipc_loop(&mut engine);
    }

    if !args.json {
        println!("Delve loot simulator: delve-runner");
        println!("  session:   {session_id}");
        println!("  seed:      {}", engine.seed());
        println!("  runs:      {}", args.runs);
        println!("  max level: {}", args.max_level);
        println!("  speed:     {}", args.speed);
        println!("  data_dir:  {}", args.data_dir.as_deref().unwrap_or("(built-in)"));
        println!();
    }

    let total = args.runs;
    let outcome = engine.run_with(Some(total), |event, store| {
        if let SimEvent::RunCompleted { index, .. } = event {
            if total >= 10 && index % (total / 10) == 0 {
                log::info!(
                    "progress: {index}/{total} runs, {} uniques",
                    store.total_uniques()
                );
            }
        }
    });

    let snapshot = engine.snapshot();
    if args.json {
        let report = JsonReport {
            session_id,
            started_at,
            outcome,
            estimates: estimates_for(&engine),
            state: &snapshot,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&engine, &snapshot, outcome);
    }
    Ok(())
}

fn estimates_for(engine: &SimEngine) -> Vec<ItemEstimate> {
    let runs = engine.store().total_runs();
    engine
        .table()
        .items
        .iter()
        .map(|item| engine.estimate(&item.id, None, Some(runs)))
        .collect()
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn emit(reply: &IpcReply<'_>) {
    match serde_json::to_string(reply) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Cannot serialize reply: {e}"),
    }
}

fn emit_error(message: impl Into<String>) {
    emit(&IpcReply::Error { message: message.into() });
}

fn parse_command(line: &str) -> Option<IpcCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(cmd) => Some(cmd),
        Err(e) => {
            emit_error(e.to_string());
            None
        }
    }
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let lines = spawn_stdin_reader();

    while let Ok(line) = lines.recv() {
        let Some(cmd) = parse_command(&line) else { continue };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => emit(&IpcReply::State(&engine.snapshot())),
            IpcCommand::Run { count } => {
                let streamed = run_streaming(engine, count, &lines)?;
                emit(&IpcReply::State(&engine.snapshot()));
                if streamed.quit {
                    break;
                }
            }
            IpcCommand::Stop => {
                // Idle here: a stop only matters while run_streaming is active.
                engine.stop();
                emit(&IpcReply::State(&engine.snapshot()));
            }
            IpcCommand::Reset => match engine.reset() {
                Ok(()) => emit(&IpcReply::State(&engine.snapshot())),
                Err(e) => emit_error(e.to_string()),
            },
            IpcCommand::SetSettings { settings } => match engine.apply_settings(&settings) {
                Ok(()) => emit(&IpcReply::State(&engine.snapshot())),
                Err(e) => emit_error(e.to_string()),
            },
            IpcCommand::Estimate { item_id, max_level, runs } => {
                emit(&IpcReply::Estimate(&engine.estimate(&item_id, max_level, runs)));
            }
        }
    }
    Ok(())
}

/// How a streamed simulation ended.
#[derive(Debug)]
struct StreamedRun {
    outcome: RunOutcome,
    /// A `quit` arrived (or stdin closed) while the simulation ran.
    quit:    bool,
}

/// Run on a worker thread while this thread keeps reading commands, so a
/// `stop` line can interrupt the simulation.
///
/// Commands are only read once the worker has left Idle; a `stop` queued
/// right behind `run` would otherwise hit an idle engine and be dropped.
fn run_streaming(engine: &mut SimEngine, count: Option<u64>, lines: &Receiver<String>) -> Result<StreamedRun> {
    let handle = engine.stop_handle();
    let (started_tx, started_rx) = mpsc::channel();
    let mut quit = false;
    let mut input_closed = false;

    let outcome = std::thread::scope(|scope| -> Result<RunOutcome> {
        let worker = scope.spawn(move || {
            engine.run_with(count, |event, _| {
                if matches!(event, SimEvent::SimulationStarted { .. } | SimEvent::SimulationRejected) {
                    let _ = started_tx.send(());
                }
                emit(&IpcReply::Event(event));
            })
        });

        // Err means the worker is gone before reporting; the join below covers it.
        let _ = started_rx.recv();

        while !worker.is_finished() {
            if input_closed {
                std::thread::sleep(Duration::from_millis(20));
                continue;
            }
            match lines.recv_timeout(Duration::from_millis(20)) {
                Ok(line) => match parse_command(&line) {
                    Some(IpcCommand::Stop) => {
                        handle.stop();
                    }
                    Some(IpcCommand::Quit) => {
                        handle.stop();
                        quit = true;
                    }
                    Some(_) => emit_error("a simulation is running; only stop and quit are accepted"),
                    None => {}
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    handle.stop();
                    input_closed = true;
                    quit = true;
                }
            }
        }

        let outcome = worker
            .join()
            .map_err(|_| anyhow::anyhow!("simulation thread panicked"))?;
        log::debug!("Streaming run finished: {outcome:?}");
        Ok(outcome)
    })?;

    Ok(StreamedRun { outcome, quit })
}

fn print_summary(engine: &SimEngine, snapshot: &SimSnapshot, outcome: RunOutcome) {
    let table = engine.table();

    println!("=== RUN SUMMARY ===");
    println!("  runs completed: {}", outcome.completed);
    if outcome.cancelled {
        println!("  (cancelled before finishing)");
    }
    println!("  total runs:     {}", snapshot.total_runs);
    println!("  {}:     {}", table.currency.name.to_lowercase(), snapshot.total_currency);
    println!("  total value:    {}", format_gp(snapshot.total_value));
    println!("  value per run:  {}", format_gp(snapshot.value_per_run));
    println!("  uniques:        {}", snapshot.total_uniques);
    println!("  longest dry:    {}", snapshot.longest_dry_streak);
    println!("  current dry:    {}", snapshot.current_dry_streak);

    println!();
    println!("=== UNIQUES (level 1-{}) ===", snapshot.settings.max_level);
    for (count, estimate) in snapshot.unique_counts.iter().zip(estimates_for(engine)) {
        println!(
            "  {:<16} x{:<4} | 1 in {:>6} runs | P(>=1 in {}) = {:>5.1}%",
            count.name,
            count.count,
            estimate.expected_runs.to_string(),
            estimate.runs,
            estimate.probability * 100.0
        );
    }
}

/// 45_000_000 → "45.0M", 18_000 → "18.0K".
fn format_gp(value: u64) -> String {
    match value {
        v if v >= 1_000_000_000 => format!("{:.2}B", v as f64 / 1e9),
        v if v >= 1_000_000 => format!("{:.1}M", v as f64 / 1e6),
        v if v >= 1_000 => format!("{:.1}K", v as f64 / 1e3),
        v => v.to_string(),
    }
}
