//=========================================================================
// Score Demo
//=========================================================================
//
// Runs a single `GameScore` through a start → pause → resume → stop
// session, with the main thread acting as the UI context.
//
// Run with:
//   RUST_LOG=debug cargo run --example score
//
//=========================================================================

use std::time::Duration;

use hanabi_engine::logging::{init_logging, LoggingConfig};
use hanabi_engine::prelude::*;

fn main() -> Result<(), EngineError> {
    init_logging(LoggingConfig::default());

    let (queue, ui) = ui_channel();
    let engine = GameEngine::new(queue);

    let mut last_shown = String::new();
    engine.add_game_object(Box::new(GameScore::new(move |text: &str| {
        if text != last_shown {
            println!("score: {text}");
            last_shown = text.to_owned();
        }
    })));

    engine.start_game()?;
    ui.run_for(Duration::from_millis(500));

    engine.pause_game()?;
    println!("paused: {}", engine.is_game_paused());
    ui.run_for(Duration::from_millis(500));

    engine.resume_game()?;
    ui.run_for(Duration::from_millis(500));

    engine.stop_game();
    ui.run_pending();
    println!("running: {}", engine.is_game_running());

    Ok(())
}
