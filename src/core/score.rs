//=========================================================================
// Game Score
//=========================================================================
//
// Sample game object: counts the milliseconds played and shows the total
// on every draw.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::game_object::GameObject;
use crate::engine::GameEngine;

//=== ScoreDisplay ========================================================

/// Where a [`GameScore`] writes its text (a label, a terminal, a test buffer).
pub trait ScoreDisplay: Send {
    fn show(&mut self, text: &str);
}

impl<F> ScoreDisplay for F
where
    F: FnMut(&str) + Send,
{
    fn show(&mut self, text: &str) {
        self(text)
    }
}

//=== GameScore ===========================================================

/// Score equal to the total elapsed milliseconds of the current game.
pub struct GameScore {
    display: Box<dyn ScoreDisplay>,
    total_millis: u64,
}

impl GameScore {
    pub fn new(display: impl ScoreDisplay + 'static) -> Self {
        Self {
            display: Box::new(display),
            total_millis: 0,
        }
    }

    pub fn total_millis(&self) -> u64 {
        self.total_millis
    }
}

impl GameObject for GameScore {
    fn on_game_start(&mut self) {
        self.total_millis = 0;
    }

    fn on_update(&mut self, elapsed_millis: u64, _engine: &GameEngine) {
        self.total_millis += elapsed_millis;
    }

    fn on_draw(&mut self) {
        self.display.show(&self.total_millis.to_string());
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
