//=========================================================================
// Update Thread
//=========================================================================
//
// Simulation loop: forwards every tick to `GameEngine::update_game`.
// No pacing, it runs as fast as the scheduler allows.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::game_thread::{GameThread, Tick};
use crate::engine::WeakEngine;

/// OS thread name of the update loop.
pub const UPDATE_THREAD_NAME: &str = "hanabi-update";

//=== UpdateTick ==========================================================

/// Tick strategy of the update loop.
pub(crate) struct UpdateTick {
    engine: WeakEngine,
}

impl Tick for UpdateTick {
    fn tick(&mut self, elapsed_millis: u64) {
        // The engine may be mid-drop; its Drop stops this loop.
        if let Some(engine) = self.engine.upgrade() {
            engine.update_game(elapsed_millis);
        }
    }
}

/// Builds an idle update loop bound to `engine`.
pub(crate) fn update_thread(engine: WeakEngine) -> GameThread {
    GameThread::new(UPDATE_THREAD_NAME, UpdateTick { engine })
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::game_object::GameObject;
    use crate::core::ui_context::ui_channel;
    use crate::engine::GameEngine;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    struct Counter {
        updates: Arc<AtomicUsize>,
        last_elapsed: Arc<AtomicU64>,
    }

    impl GameObject for Counter {
        fn on_game_start(&mut self) {}

        fn on_update(&mut self, elapsed_millis: u64, _engine: &GameEngine) {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.last_elapsed.store(elapsed_millis, Ordering::SeqCst);
        }

        fn on_draw(&mut self) {}
    }

    #[test]
    fn tick_forwards_elapsed_to_engine() {
        let (queue, _ui) = ui_channel();
        let engine = GameEngine::new(queue);
        let updates = Arc::new(AtomicUsize::new(0));
        let last_elapsed = Arc::new(AtomicU64::new(0));
        engine.add_game_object(Box::new(Counter {
            updates: Arc::clone(&updates),
            last_elapsed: Arc::clone(&last_elapsed),
        }));

        let mut tick = UpdateTick { engine: engine.downgrade() };
        tick.tick(42);

        assert_eq!(updates.load(Ordering::SeqCst), 1);
        assert_eq!(last_elapsed.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn tick_after_engine_dropped_is_noop() {
        let (queue, _ui) = ui_channel();
        let engine = GameEngine::new(queue);
        let mut tick = UpdateTick { engine: engine.downgrade() };
        drop(engine);

        tick.tick(16);
    }

    #[test]
    fn loop_updates_continuously() {
        let (queue, _ui) = ui_channel();
        let engine = GameEngine::new(queue);
        let updates = Arc::new(AtomicUsize::new(0));
        engine.add_game_object(Box::new(Counter {
            updates: Arc::clone(&updates),
            last_elapsed: Arc::new(AtomicU64::new(0)),
        }));

        let mut thread = update_thread(engine.downgrade());
        thread.start().unwrap();
        thread::sleep(Duration::from_millis(50));
        thread.stop();
        thread.join();

        assert!(updates.load(Ordering::SeqCst) > 1);
        assert_eq!(thread.name(), UPDATE_THREAD_NAME);
    }
}
