//=========================================================================
// Hanabi Engine — Library Root
//
// A minimal real-time game loop: one update thread, one draw thread and
// a registry of game objects mutated safely while both run.
//
// Responsibilities:
// - Expose the `GameEngine` facade and its builder
// - Expose the loop building blocks (`core`) for custom hosts
// - Keep registry internals private
//
// Typical usage:
// ```no_run
// use hanabi_engine::prelude::*;
//
// let (queue, ui) = ui_channel();
// let engine = GameEngine::new(queue);
// engine.start_game().unwrap();
// ui.run_for(std::time::Duration::from_secs(1));
// engine.stop_game();
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the loop driver, tick strategies, object contract and the
// UI execution context. Most applications only need `GameEngine`.
//
pub mod core;
pub mod logging;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `engine` defines the facade; `error` the public error type. Both are
// re-exported below.
//
mod engine;
mod error;

//--- Public Exports ------------------------------------------------------

pub use engine::{EngineBuilder, GameEngine};
pub use error::EngineError;
