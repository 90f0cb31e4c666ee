//=========================================================================
// Game Objects
//=========================================================================
//
// Capability contract for everything the engine updates and draws.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use crate::engine::GameEngine;

//=== ObjectId ============================================================

/// Engine-unique identity of a registered [`GameObject`].
///
/// Returned by [`GameEngine::add_game_object`] and used to remove the
/// object later. Ids are never reused within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//=== GameObject Trait ====================================================

/// An entity driven by the engine's update and draw loops.
///
/// Ownership moves into the engine on registration. Every callback must
/// return quickly: a blocking callback stalls the loop that invoked it.
///
/// # Callback threads
///
/// | Callback                | Invoked on            |
/// |-------------------------|-----------------------|
/// | `on_game_start`         | caller of `start_game`|
/// | `on_update`             | update thread         |
/// | `on_draw`               | UI execution context  |
/// | `on_added_to_game`      | UI execution context  |
/// | `on_removed_from_game`  | UI execution context  |
///
/// # Minimal Implementation
///
/// ```rust
/// use hanabi_engine::prelude::*;
///
/// struct Blinker { lit: bool }
///
/// impl GameObject for Blinker {
///     fn on_game_start(&mut self) {
///         self.lit = false;
///     }
///
///     fn on_update(&mut self, _elapsed_millis: u64, _engine: &GameEngine) {
///         self.lit = !self.lit;
///     }
///
///     fn on_draw(&mut self) {}
/// }
/// ```
pub trait GameObject: Send {
    /// Resets the object before a game session starts.
    ///
    /// Only objects already active when [`GameEngine::start_game`] runs get
    /// this call. Objects added later through the pending queue do not.
    fn on_game_start(&mut self);

    /// Advances the object by `elapsed_millis`.
    ///
    /// `engine` may be used to add or remove objects; those changes apply
    /// at the end of the current tick.
    fn on_update(&mut self, elapsed_millis: u64, engine: &GameEngine);

    /// Renders the object.
    fn on_draw(&mut self);

    /// Called once the object has been handed to the engine.
    fn on_added_to_game(&mut self) {}

    /// Called once removal of the object has been requested.
    fn on_removed_from_game(&mut self) {}
}

//=========================================================================
// Unit Tests
//=========================================================================
