//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use hanabi_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine facade
pub use crate::engine::{EngineBuilder, GameEngine};
pub use crate::error::EngineError;

// Game objects
pub use crate::core::{GameObject, GameScore, ObjectId, ScoreDisplay};

// Loops
pub use crate::core::{GameThread, ThreadState, Tick};

// UI execution context
pub use crate::core::{ui_channel, UiExecutor, UiLoop, UiQueue, UiTask};
