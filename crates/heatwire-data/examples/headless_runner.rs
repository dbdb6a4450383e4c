//! Headless runner: plays a level without a UI and prints what happens.
//!
//! With no argument it plays the built-in level one with its sample graph.
//! Given a directory, it loads `level.{ron,toml,json}` and an optional
//! `graph.{ron,toml,json}` from it. Logs go to stderr via `RUST_LOG`.
//!
//! Run with: `cargo run -p heatwire-data --example headless_runner -- [LEVEL_DIR] [TICKS]`

use std::path::Path;
use std::process::ExitCode;

use heatwire_core::event::SimEvent;
use heatwire_data::{LevelBundle, LevelMode, build_level, load_level_dir};

const DEFAULT_TICKS: u64 = 2_000;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let dir = args
        .next()
        .unwrap_or_else(|| concat!(env!("CARGO_MANIFEST_DIR"), "/levels/level_one").to_string());
    let ticks = match args.next().map(|t| t.parse::<u64>()) {
        None => DEFAULT_TICKS,
        Some(Ok(t)) => t,
        Some(Err(e)) => {
            eprintln!("bad tick count: {e}");
            return ExitCode::FAILURE;
        }
    };

    let LevelBundle { config, graph } = match load_level_dir(Path::new(&dir)) {
        Ok(bundle) => bundle,
        Err(e) => {
            eprintln!("could not load {dir}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut engine = match build_level(&config, LevelMode::Live, graph) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("could not build level '{}': {e}", config.name);
            return ExitCode::FAILURE;
        }
    };

    println!("=== {} ({} ticks at {} fps) ===\n", config.name, ticks, config.world.target_fps);
    println!("pipeline: {}\n", engine.pipeline().names().join(" -> "));

    let report_every = (config.world.target_fps.round() as u64).max(1) * 10;
    for _ in 0..ticks {
        let result = engine.step();
        let state = engine.state();

        for event in engine.last_events() {
            match event {
                SimEvent::GraphSettled { .. } => {}
                other => println!("  [tick {:>5}] {:?}", state.time, other),
            }
        }
        if state.time % report_every == 0 {
            println!(
                "tick {:>5}: coins {:>8.2}  score {:>8.2}  heat points {:>2}  pins {}",
                state.time,
                state.coins,
                state.score,
                state.heat_points.len(),
                state.active_controller_count()
            );
        }
        if result.finished {
            break;
        }
    }

    let state = engine.state();
    let verdict = match (state.game_finished, state.is_game_over) {
        (true, false) => "won",
        (true, true) => "lost",
        _ => "still running",
    };
    println!("\nfinal: {verdict} at tick {} (score {:.2}, state hash {:016x})", state.time, state.score, engine.state_hash());
    ExitCode::SUCCESS
}
