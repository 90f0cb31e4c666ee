//=========================================================================
// Core Systems
//
// Building blocks of the game loop, used by the `GameEngine` facade.
//
// Responsibilities:
// - Drive pausable, cancellable timed loops (`GameThread`)
// - Provide the update and draw tick strategies
// - Hold the object registry and its pending queues
// - Abstract the UI-owned execution context
//
// Notes:
// The loops never own the engine. They hold a weak handle and call back
// into it each tick, so dropping the engine stops them.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod draw_thread;
pub mod game_object;
pub mod game_thread;
pub(crate) mod registry;
pub mod score;
pub mod ui_context;
pub mod update_thread;

//=== Public API ==========================================================

pub use draw_thread::{min_elapsed_millis, FramePacer, DEFAULT_TARGET_FPS, DRAW_THREAD_NAME};
pub use game_object::{GameObject, ObjectId};
pub use game_thread::{GameThread, ThreadState, Tick};
pub use score::{GameScore, ScoreDisplay};
pub use ui_context::{ui_channel, UiExecutor, UiLoop, UiQueue, UiTask};
pub use update_thread::UPDATE_THREAD_NAME;
