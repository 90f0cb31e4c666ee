//=========================================================================
// Game Thread
//=========================================================================
//
// Cancellable, pausable timed loop running on a dedicated OS thread.
//
// Architecture:
// ```text
//   GameThread ──start()──> [loop thread]
//     │                        │
//     ├─ pause()   ─┐          ├─ measure elapsed ms
//     ├─ resume()  ─┼─> flags ─┤─ wait on gate while paused
//     └─ stop()    ─┘          ├─ Tick::tick(elapsed)
//                              └─ exit when running == false
// ```
//
// The per-iteration work is injected as a `Tick` strategy, so the update
// and draw loops share this driver instead of subclassing it.
//
// State machine:
//   Idle ──start──> Running <──pause/resume──> Paused
//                      └──────stop──────> Stopped (terminal)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{debug, error, trace, warn};

//=== Internal Dependencies ===============================================

use crate::error::EngineError;

//=== Tick ================================================================

/// Work performed once per loop iteration.
///
/// Implemented for any `FnMut(u64) + Send + 'static`, so simple loops can
/// be driven by a closure.
pub trait Tick: Send + 'static {
    /// Runs one iteration with the milliseconds elapsed since the previous one.
    fn tick(&mut self, elapsed_millis: u64);
}

impl<F> Tick for F
where
    F: FnMut(u64) + Send + 'static,
{
    fn tick(&mut self, elapsed_millis: u64) {
        self(elapsed_millis)
    }
}

//=== ThreadState =========================================================

/// Observable lifecycle state of a [`GameThread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Idle,
    Running,
    Paused,
    Stopped,
}

//=== LoopFlags ===========================================================

/// Flags shared between the controlling thread and the loop thread.
///
/// `running` is lock-free. `paused` lives under the same mutex the pause
/// gate waits on, so a resume can never slip between the check and the wait.
pub(crate) struct LoopFlags {
    running: AtomicBool,
    paused: Mutex<bool>,
    resumed: Condvar,
}

impl LoopFlags {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            paused: Mutex::new(false),
            resumed: Condvar::new(),
        }
    }

    fn paused_guard(&self) -> MutexGuard<'_, bool> {
        self.paused.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn is_paused(&self) -> bool {
        *self.paused_guard()
    }

    /// Blocks while paused. Returns the instant the gate opened, or `None`
    /// when the loop was not paused.
    ///
    /// Re-checks the flag after every wake-up, spurious or not.
    fn wait_while_paused(&self) -> Option<Instant> {
        let mut paused = self.paused_guard();
        if !*paused {
            return None;
        }

        while *paused {
            paused = self
                .resumed
                .wait(paused)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Some(Instant::now())
    }
}

//=== GameThread ==========================================================

/// A timed loop that calls its [`Tick`] strategy until stopped.
///
/// Instances are single-use: once started they can be paused, resumed and
/// stopped, but never started again. Create a new instance to run again.
///
/// # Examples
///
/// ```no_run
/// use hanabi_engine::core::GameThread;
///
/// let mut thread = GameThread::new("ticker", |elapsed_millis: u64| {
///     println!("{elapsed_millis} ms since last tick");
/// });
/// thread.start().unwrap();
/// thread.pause();
/// thread.resume();
/// thread.stop();
/// thread.join();
/// ```
pub struct GameThread {
    name: &'static str,
    flags: Arc<LoopFlags>,
    tick: Option<Box<dyn Tick>>,
    handle: Option<JoinHandle<()>>,
    started: bool,
}

impl GameThread {
    //--- Construction -----------------------------------------------------

    /// Creates an idle loop. Nothing runs until [`GameThread::start`].
    pub fn new(name: &'static str, tick: impl Tick) -> Self {
        Self {
            name,
            flags: Arc::new(LoopFlags::new()),
            tick: Some(Box::new(tick)),
            handle: None,
            started: false,
        }
    }

    //--- Queries ----------------------------------------------------------

    /// Name given to the OS thread.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.flags.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.flags.is_paused()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ThreadState {
        if !self.started {
            ThreadState::Idle
        } else if !self.is_running() {
            ThreadState::Stopped
        } else if self.is_paused() {
            ThreadState::Paused
        } else {
            ThreadState::Running
        }
    }

    //--- Lifecycle --------------------------------------------------------

    /// Marks the loop running and unpaused, then spawns its thread.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidState`] if this instance was already started.
    /// - [`EngineError::ThreadSpawn`] if the OS thread could not be created.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let mut tick = self
            .tick
            .take()
            .ok_or(EngineError::InvalidState("game thread already started"))?;

        self.flags.running.store(true, Ordering::Release);
        *self.flags.paused_guard() = false;

        let flags = Arc::clone(&self.flags);
        let name = self.name;
        let spawned = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || run_loop(name, &flags, tick.as_mut()));

        match spawned {
            Ok(handle) => {
                debug!(target: "engine::thread", "Spawned {} loop", name);
                self.handle = Some(handle);
                self.started = true;
                Ok(())
            }
            Err(source) => {
                self.flags.running.store(false, Ordering::Release);
                Err(EngineError::ThreadSpawn { name, source })
            }
        }
    }

    /// Requests a pause. Observed at the start of the next iteration; an
    /// in-flight tick is not interrupted.
    pub fn pause(&self) {
        *self.flags.paused_guard() = true;
        trace!(target: "engine::thread", "{} paused", self.name);
    }

    /// Clears the pause flag and wakes the loop. No-op when not paused.
    pub fn resume(&self) {
        let mut paused = self.flags.paused_guard();
        if *paused {
            *paused = false;
            self.flags.resumed.notify_all();
            trace!(target: "engine::thread", "{} resumed", self.name);
        }
    }

    /// Cooperative cancellation: clears `running` and wakes a paused loop so
    /// it observes the stop instead of waiting forever.
    pub fn stop(&self) {
        self.flags.running.store(false, Ordering::Release);
        self.resume();
    }

    /// Waits for the loop thread to exit.
    ///
    /// Does nothing for an idle instance or when called from the loop
    /// thread itself. A panic inside the loop is logged, not propagated.
    pub fn join(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        if handle.thread().id() == thread::current().id() {
            self.handle = Some(handle);
            return;
        }

        if handle.join().is_err() {
            error!(target: "engine::thread", "{} loop panicked", self.name);
        }
    }

    #[cfg(test)]
    pub(crate) fn flags(&self) -> &LoopFlags {
        &self.flags
    }
}

impl Drop for GameThread {
    fn drop(&mut self) {
        if self.handle.is_some() && self.is_running() {
            warn!(target: "engine::thread", "{} dropped while running, stopping", self.name);
            self.stop();
        }
    }
}

//--- run_loop() ----------------------------------------------------------
//
// Body of the loop thread.
//
// Each iteration:
//  1. Measures ms since the previous iteration started
//  2. Waits on the pause gate, discarding the paused duration
//  3. Runs the tick
//  4. Remembers this iteration's start for the next delta
//
fn run_loop(name: &'static str, flags: &LoopFlags, tick: &mut dyn Tick) {
    let mut previous = Instant::now();

    while flags.is_running() {
        let mut now = Instant::now();
        let elapsed_millis = millis_between(previous, now);

        if let Some(resumed_at) = flags.wait_while_paused() {
            if !flags.is_running() {
                break;
            }
            now = resumed_at;
        }

        tick.tick(elapsed_millis);
        previous = now;
    }

    debug!(target: "engine::thread", "{} loop exited", name);
}

fn millis_between(earlier: Instant, later: Instant) -> u64 {
    later.saturating_duration_since(earlier).as_millis() as u64
}

//=========================================================================
// Unit Tests
//=========================================================================
