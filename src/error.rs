//=========================================================================
// Engine Errors
//=========================================================================
//
// Failures surfaced by the public engine API.
//
// Only programming-contract violations and OS thread creation failures
// are reported. Interrupted waits and sleeps are recovered locally inside
// the loops and never reach this type.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== EngineError =========================================================

/// Errors returned by [`crate::GameEngine`] and [`crate::core::GameThread`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// A lifecycle operation was called in a state that does not allow it
    /// (e.g. pausing before any game was started, starting a thread twice).
    #[error("invalid engine state: {0}")]
    InvalidState(&'static str),

    /// The operating system refused to create a loop thread.
    #[error("failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

//=========================================================================
// Unit Tests
//=========================================================================
