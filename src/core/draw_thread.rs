//=========================================================================
// Draw Thread
//=========================================================================
//
// Render loop: throttles to a target frame rate, then asks the engine to
// schedule a draw pass on the UI context.
//
// Pacing per tick:
//   elapsed < min_elapsed  →  sleep(min_elapsed - elapsed)  →  frame
//   elapsed ≥ min_elapsed  →  frame
//
//=========================================================================

//=== External Dependencies ===============================================

use std::thread;
use std::time::Duration;

use log::trace;

//=== Internal Dependencies ===============================================

use super::game_thread::{GameThread, Tick};
use crate::engine::WeakEngine;

/// OS thread name of the draw loop.
pub const DRAW_THREAD_NAME: &str = "hanabi-draw";

/// Frame rate used when none is configured.
pub const DEFAULT_TARGET_FPS: u32 = 60;

/// Minimum milliseconds between frames for `target_fps` (integer division).
///
/// # Panics
///
/// Panics if `target_fps == 0`.
pub fn min_elapsed_millis(target_fps: u32) -> u64 {
    assert!(target_fps > 0, "Target FPS must be positive");
    1000 / u64::from(target_fps)
}

//=== FramePacer ==========================================================

/// Tick strategy that sleeps off the remainder of a frame budget before
/// producing a frame.
pub struct FramePacer<F> {
    min_elapsed_millis: u64,
    on_frame: F,
}

impl<F> FramePacer<F>
where
    F: FnMut() + Send + 'static,
{
    /// Creates a pacer for `target_fps` calling `on_frame` once per tick.
    pub fn new(target_fps: u32, on_frame: F) -> Self {
        Self {
            min_elapsed_millis: min_elapsed_millis(target_fps),
            on_frame,
        }
    }

    pub fn min_elapsed_millis(&self) -> u64 {
        self.min_elapsed_millis
    }
}

impl<F> Tick for FramePacer<F>
where
    F: FnMut() + Send + 'static,
{
    fn tick(&mut self, elapsed_millis: u64) {
        if elapsed_millis < self.min_elapsed_millis {
            let remaining = self.min_elapsed_millis - elapsed_millis;
            trace!(target: "engine::thread", "Frame pacing: sleeping {} ms", remaining);
            thread::sleep(Duration::from_millis(remaining));
        }
        (self.on_frame)();
    }
}

/// Builds an idle draw loop bound to `engine`.
pub(crate) fn draw_thread(engine: WeakEngine, target_fps: u32) -> GameThread {
    let pacer = FramePacer::new(target_fps, move || {
        if let Some(engine) = engine.upgrade() {
            engine.draw_game();
        }
    });
    GameThread::new(DRAW_THREAD_NAME, pacer)
}

//=========================================================================
// Unit Tests
//=========================================================================
