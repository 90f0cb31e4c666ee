//=========================================================================
// Hanabi Engine
//
// Main entry point and coordinator for the game loop.
//
// Architecture:
// ```text
//     EngineBuilder ──build()──> GameEngine ──start_game()──> [Session]
//         │                         │                           │
//         └─ with_target_fps()      ├─ Registry (mutex)         ├─ update thread
//                                   │    active / pending       │    └─ update_game()
//                                   └─ UiExecutor               └─ draw thread
//                                        └─ draw pass,               └─ draw_game()
//                                           notifications
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::{debug, info, trace, warn};

//=== Internal Dependencies ===============================================

use crate::core::draw_thread::{draw_thread, DEFAULT_TARGET_FPS};
use crate::core::registry::{lock_registry, ObjectSlot, Registry, SharedSlot};
use crate::core::update_thread::update_thread;
use crate::core::{GameObject, GameThread, ObjectId, UiExecutor};
use crate::error::EngineError;

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing a [`GameEngine`].
///
/// # Default Values
///
/// - **Target FPS**: 60 (draw loop pacing)
///
/// # Examples
///
/// ```no_run
/// use hanabi_engine::prelude::*;
///
/// let (queue, ui) = ui_channel();
/// let engine = EngineBuilder::new(queue)
///     .with_target_fps(30)
///     .build();
///
/// engine.start_game().unwrap();
/// ui.run_for(std::time::Duration::from_secs(1));
/// engine.stop_game();
/// ```
pub struct EngineBuilder {
    executor: Arc<dyn UiExecutor>,
    target_fps: u32,
}

impl EngineBuilder {
    /// Creates a builder that will schedule UI work on `executor`.
    pub fn new(executor: impl UiExecutor + 'static) -> Self {
        Self {
            executor: Arc::new(executor),
            target_fps: DEFAULT_TARGET_FPS,
        }
    }

    /// Sets the frame rate the draw loop paces itself to.
    ///
    /// Default: 60
    ///
    /// # Panics
    ///
    /// Panics if `fps == 0`.
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        assert!(fps > 0, "Target FPS must be positive, got {}", fps);
        self.target_fps = fps;
        self
    }

    /// Builds the engine. No thread runs until [`GameEngine::start_game`].
    pub fn build(self) -> GameEngine {
        info!(target: "engine", "Building engine (target FPS: {})", self.target_fps);

        GameEngine {
            shared: Arc::new(EngineShared {
                executor: self.executor,
                registry: Mutex::new(Registry::new()),
                session: Mutex::new(None),
                next_id: AtomicU64::new(1),
                target_fps: self.target_fps,
            }),
        }
    }
}

//=== Session =============================================================

/// The pair of loops belonging to one `start_game` call.
struct Session {
    update: GameThread,
    draw: GameThread,
}

impl Session {
    fn start(&mut self) -> Result<(), EngineError> {
        self.update.start()?;
        self.draw.start()
    }

    fn pause(&self) {
        self.update.pause();
        self.draw.pause();
    }

    fn resume(&self) {
        self.update.resume();
        self.draw.resume();
    }

    /// Signals both loops, then waits for them (skipping the calling loop).
    fn shutdown(mut self) {
        self.update.stop();
        self.draw.stop();
        self.update.join();
        self.draw.join();
    }
}

//=== EngineShared ========================================================

struct EngineShared {
    executor: Arc<dyn UiExecutor>,
    registry: Mutex<Registry>,
    session: Mutex<Option<Session>>,
    next_id: AtomicU64,
    target_fps: u32,
}

impl EngineShared {
    fn session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!(target: "engine", "Session lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl Drop for EngineShared {
    fn drop(&mut self) {
        let session = self
            .session
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(session) = session {
            info!(target: "engine", "Engine dropped, stopping game");
            session.shutdown();
        }
    }
}

//=== WeakEngine ==========================================================

/// Non-owning engine handle held by the loop threads.
#[derive(Clone)]
pub(crate) struct WeakEngine(Weak<EngineShared>);

impl WeakEngine {
    pub(crate) fn upgrade(&self) -> Option<GameEngine> {
        self.0.upgrade().map(|shared| GameEngine { shared })
    }
}

//=== GameEngine ==========================================================

/// Owns the game objects and drives them from an update and a draw loop.
///
/// `GameEngine` is a cheap, cloneable handle; every clone controls the
/// same engine. Dropping the last handle stops a running game.
///
/// # Threads
///
/// ```text
/// caller thread   start/pause/resume/stop, add/remove
/// update thread   update_game() as fast as possible
/// draw thread     draw_game() paced to the target FPS
/// UI context      draw passes, added/removed notifications
/// ```
///
/// `start_game` must not be called from inside a [`GameObject`] callback:
/// it runs `on_game_start` on every object, including the caller. Neither
/// may `stop_game` be called from callbacks on the UI context, since it
/// joins an update loop that may be waiting for the object being drawn.
/// Adding and removing objects from callbacks is fine, including an object
/// removing itself; its notification runs once the callback returns.
#[derive(Clone)]
pub struct GameEngine {
    shared: Arc<EngineShared>,
}

impl GameEngine {
    //--- Construction -----------------------------------------------------

    /// Creates an engine with default settings.
    pub fn new(executor: impl UiExecutor + 'static) -> Self {
        EngineBuilder::new(executor).build()
    }

    /// Starts configuring an engine.
    pub fn builder(executor: impl UiExecutor + 'static) -> EngineBuilder {
        EngineBuilder::new(executor)
    }

    pub(crate) fn downgrade(&self) -> WeakEngine {
        WeakEngine(Arc::downgrade(&self.shared))
    }

    //--- State Queries ----------------------------------------------------

    /// Whether the current update loop is running. `false` before the
    /// first start and after a stop.
    pub fn is_game_running(&self) -> bool {
        self.shared
            .session()
            .as_ref()
            .map_or(false, |session| session.update.is_running())
    }

    /// Whether the current update loop is paused.
    pub fn is_game_paused(&self) -> bool {
        self.shared
            .session()
            .as_ref()
            .map_or(false, |session| session.update.is_paused())
    }

    /// Frame rate the draw loop paces itself to.
    pub fn target_fps(&self) -> u32 {
        self.shared.target_fps
    }

    /// Number of objects in the active set.
    pub fn active_object_count(&self) -> usize {
        lock_registry(&self.shared.registry).active_len()
    }

    /// Ids of the active set, in update/draw order.
    pub fn active_object_ids(&self) -> Vec<ObjectId> {
        lock_registry(&self.shared.registry).active_ids()
    }

    /// Whether `id` is in the active set (pending additions are not).
    pub fn is_active(&self, id: ObjectId) -> bool {
        lock_registry(&self.shared.registry).is_active(id)
    }

    /// Number of additions waiting for the next update tick.
    pub fn pending_add_count(&self) -> usize {
        lock_registry(&self.shared.registry).pending_add_len()
    }

    /// Number of removals waiting for the next update tick.
    pub fn pending_remove_count(&self) -> usize {
        lock_registry(&self.shared.registry).pending_remove_len()
    }

    //--- Game Lifecycle ---------------------------------------------------

    /// Starts a new game session.
    ///
    /// # Lifecycle
    ///
    /// 1. Stops and joins the previous session, if any
    /// 2. Calls `on_game_start` on every active object (pending ones are skipped)
    /// 3. Spawns a fresh update loop and a fresh draw loop
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ThreadSpawn`] if a loop thread cannot be
    /// created. No session is left running in that case.
    pub fn start_game(&self) -> Result<(), EngineError> {
        self.stop_game();

        for slot in self.snapshot() {
            slot.with(|object| object.on_game_start());
        }

        let mut session = Session {
            update: update_thread(self.downgrade()),
            draw: draw_thread(self.downgrade(), self.shared.target_fps),
        };

        let displaced = {
            let mut current = self.shared.session();
            let displaced = current.take();
            match session.start() {
                Ok(()) => *current = Some(session),
                Err(e) => {
                    drop(current);
                    session.shutdown();
                    if let Some(displaced) = displaced {
                        displaced.shutdown();
                    }
                    return Err(e);
                }
            }
            displaced
        };

        // Another caller raced us between stop and install.
        if let Some(displaced) = displaced {
            debug!(target: "engine", "Replacing a concurrently started session");
            displaced.shutdown();
        }

        info!(target: "engine", "Game started");
        Ok(())
    }

    /// Pauses both loops.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidState`] if no game has been started.
    pub fn pause_game(&self) -> Result<(), EngineError> {
        let session = self.shared.session();
        let session = session
            .as_ref()
            .ok_or(EngineError::InvalidState("pause_game called before start_game"))?;

        session.pause();
        info!(target: "engine", "Game paused");
        Ok(())
    }

    /// Resumes both loops.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidState`] if no game has been started.
    pub fn resume_game(&self) -> Result<(), EngineError> {
        let session = self.shared.session();
        let session = session
            .as_ref()
            .ok_or(EngineError::InvalidState("resume_game called before start_game"))?;

        session.resume();
        info!(target: "engine", "Game resumed");
        Ok(())
    }

    /// Stops both loops and waits for them to exit. No-op without a session.
    ///
    /// When called from one of the loops themselves, that loop is only
    /// signalled and exits after its current iteration.
    pub fn stop_game(&self) {
        let session = self.shared.session().take();

        if let Some(session) = session {
            session.shutdown();
            info!(target: "engine", "Game stopped");
        }
    }

    //--- Loop Callbacks ---------------------------------------------------

    /// Runs one simulation tick.
    ///
    /// Every object active at the start of the tick gets `on_update` with
    /// the same `elapsed_millis`. Then pending removals and additions are
    /// applied, in that order, each queue fully drained.
    pub fn update_game(&self, elapsed_millis: u64) {
        for slot in self.snapshot() {
            slot.with(|object| object.on_update(elapsed_millis, self));
        }

        let drained = lock_registry(&self.shared.registry).apply_pending();
        if drained.removed > 0 || drained.added > 0 {
            debug!(
                target: "engine::registry",
                "Applied pending changes: -{} +{}",
                drained.removed,
                drained.added
            );
        }
    }

    /// Schedules a draw pass on the UI context and returns immediately.
    pub fn draw_game(&self) {
        let engine = self.downgrade();
        self.shared.executor.schedule(Box::new(move || {
            if let Some(engine) = engine.upgrade() {
                engine.draw_pass();
            }
        }));
    }

    /// Calls `on_draw` on the active set, in order. Runs on the UI context.
    fn draw_pass(&self) {
        let snapshot = self.snapshot();
        trace!(target: "engine", "Drawing {} objects", snapshot.len());

        for slot in snapshot {
            slot.visit(|object| object.on_draw());
        }
    }

    //--- Object Registry --------------------------------------------------

    /// Hands `object` to the engine.
    ///
    /// While a game runs the object waits in the pending queue until the
    /// end of the next update tick; otherwise it becomes active at once.
    /// Either way `on_added_to_game` is scheduled on the UI context.
    pub fn add_game_object(&self, object: Box<dyn GameObject>) -> ObjectId {
        let id = ObjectId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let slot = ObjectSlot::new(id, object);

        // Lock order is registry, then session. A `start_game` on another
        // thread that is past its `on_game_start` pass may still install
        // its session after this check; the object then joins that session
        // without `on_game_start`, like any deferred add.
        let running = {
            let mut registry = lock_registry(&self.shared.registry);
            let running = self.is_game_running();
            if running {
                registry.queue_add(Arc::clone(&slot));
            } else {
                registry.insert(Arc::clone(&slot));
            }
            running
        };

        debug!(
            target: "engine::registry",
            "Object {} {}",
            id,
            if running { "queued for addition" } else { "added" }
        );

        self.shared
            .executor
            .schedule(Box::new(move || slot.visit(|object| object.on_added_to_game())));
        id
    }

    /// Requests removal of `id` at the end of the next update tick, whether
    /// or not a game is running, and schedules `on_removed_from_game`.
    pub fn remove_game_object(&self, id: ObjectId) {
        let slot = {
            let mut registry = lock_registry(&self.shared.registry);
            registry.queue_remove(id);
            registry.find(id)
        };

        match slot {
            Some(slot) => {
                debug!(target: "engine::registry", "Object {} queued for removal", id);
                self.shared
                    .executor
                    .schedule(Box::new(move || slot.visit(|object| object.on_removed_from_game())));
            }
            None => {
                warn!(target: "engine::registry", "Removing unknown object {}", id);
            }
        }
    }

    fn snapshot(&self) -> Vec<SharedSlot> {
        lock_registry(&self.shared.registry).snapshot()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
