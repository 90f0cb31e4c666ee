//=========================================================================
// Object Registry
//=========================================================================
//
// Active set plus the two pending queues, guarded together by the
// engine's registry mutex.
//
// Architecture:
//   add (running) ──> pending_add ────┐
//   remove        ──> pending_remove ─┼─ apply_pending() ─> active
//   add (stopped) ────────────────────┘ (direct)
//
// Pattern: snapshot → run callbacks unlocked → apply_pending at tick end
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use log::{trace, warn};

//=== Internal Dependencies ===============================================

use super::game_object::{GameObject, ObjectId};

//=== ObjectSlot ==========================================================

/// A call deferred until the thread holding an object releases it.
pub(crate) type SlotCall = Box<dyn FnOnce(&mut dyn GameObject) + Send + 'static>;

/// A registered object behind its own lock.
///
/// The update thread and the UI context reach the same object through
/// shared slots, so each call is serialized per object.
///
/// A thread that already holds the object (an object removing itself from
/// `on_draw`, with an executor running tasks inline) cannot lock it again.
/// Calls made through [`ObjectSlot::visit`] on that thread are queued and
/// run when the outer [`ObjectSlot::with`] finishes.
pub(crate) struct ObjectSlot {
    id: ObjectId,
    object: Mutex<Box<dyn GameObject>>,
    holder: Mutex<Option<ThreadId>>,
    deferred: Mutex<VecDeque<SlotCall>>,
}

pub(crate) type SharedSlot = Arc<ObjectSlot>;

impl ObjectSlot {
    pub(crate) fn new(id: ObjectId, object: Box<dyn GameObject>) -> SharedSlot {
        Arc::new(Self {
            id,
            object: Mutex::new(object),
            holder: Mutex::new(None),
            deferred: Mutex::new(VecDeque::new()),
        })
    }

    pub(crate) fn id(&self) -> ObjectId {
        self.id
    }

    /// Runs `f` with exclusive access to the object, then any calls
    /// deferred onto it meanwhile.
    ///
    /// Must not be re-entered from the thread already holding the object;
    /// use [`ObjectSlot::visit`] on paths that can be.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut dyn GameObject) -> R) -> R {
        let mut guard = self.object.lock().unwrap_or_else(|poisoned| {
            warn!(target: "engine::registry", "Object {} lock poisoned, recovering", self.id);
            poisoned.into_inner()
        });
        let _held = Held::mark(self);

        let result = f(guard.as_mut());

        // Deferred calls may defer further calls; drain until quiet.
        loop {
            let next = lock_ignoring_poison(&self.deferred).pop_front();
            match next {
                Some(call) => call(guard.as_mut()),
                None => break,
            }
        }
        result
    }

    /// Runs `f` on the object now, or once the current thread releases it.
    pub(crate) fn visit(&self, f: impl FnOnce(&mut dyn GameObject) + Send + 'static) {
        if self.is_held_by_current_thread() {
            trace!(target: "engine::registry", "Object {} busy on this thread, deferring call", self.id);
            lock_ignoring_poison(&self.deferred).push_back(Box::new(f));
        } else {
            self.with(f);
        }
    }

    fn is_held_by_current_thread(&self) -> bool {
        *lock_ignoring_poison(&self.holder) == Some(thread::current().id())
    }
}

/// Records the holding thread for the lifetime of a [`ObjectSlot::with`]
/// call, clearing it on unwind too.
struct Held<'a>(&'a ObjectSlot);

impl<'a> Held<'a> {
    fn mark(slot: &'a ObjectSlot) -> Self {
        *lock_ignoring_poison(&slot.holder) = Some(thread::current().id());
        Held(slot)
    }
}

impl Drop for Held<'_> {
    fn drop(&mut self) {
        *lock_ignoring_poison(&self.0.holder) = None;
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//=== Drained =============================================================

/// Outcome of one [`Registry::apply_pending`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Drained {
    pub removed: usize,
    pub added: usize,
}

//=== Registry ============================================================

#[derive(Default)]
pub(crate) struct Registry {
    active: Vec<SharedSlot>,
    pending_add: VecDeque<SharedSlot>,
    pending_remove: VecDeque<ObjectId>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    //--- Mutation ---------------------------------------------------------

    /// Appends straight to the active set.
    pub(crate) fn insert(&mut self, slot: SharedSlot) {
        self.active.push(slot);
    }

    /// Defers insertion to the next [`Registry::apply_pending`].
    pub(crate) fn queue_add(&mut self, slot: SharedSlot) {
        self.pending_add.push_back(slot);
    }

    /// Defers removal to the next [`Registry::apply_pending`].
    pub(crate) fn queue_remove(&mut self, id: ObjectId) {
        self.pending_remove.push_back(id);
    }

    /// Drains both queues in FIFO order, removals first.
    ///
    /// A removal only affects the active set, so an id still waiting in
    /// `pending_add` is added back by the same drain.
    pub(crate) fn apply_pending(&mut self) -> Drained {
        let mut drained = Drained::default();

        while let Some(id) = self.pending_remove.pop_front() {
            if let Some(index) = self.active.iter().position(|slot| slot.id() == id) {
                self.active.remove(index);
                drained.removed += 1;
            }
        }

        while let Some(slot) = self.pending_add.pop_front() {
            self.active.push(slot);
            drained.added += 1;
        }

        drained
    }

    //--- Queries ----------------------------------------------------------

    /// Clones the active handles in order, so callbacks can run unlocked.
    pub(crate) fn snapshot(&self) -> Vec<SharedSlot> {
        self.active.clone()
    }

    /// Looks up an id in the active set, then in the pending-add queue.
    pub(crate) fn find(&self, id: ObjectId) -> Option<SharedSlot> {
        self.active
            .iter()
            .chain(self.pending_add.iter())
            .find(|slot| slot.id() == id)
            .cloned()
    }

    pub(crate) fn is_active(&self, id: ObjectId) -> bool {
        self.active.iter().any(|slot| slot.id() == id)
    }

    pub(crate) fn active_ids(&self) -> Vec<ObjectId> {
        self.active.iter().map(|slot| slot.id()).collect()
    }

    pub(crate) fn active_len(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn pending_add_len(&self) -> usize {
        self.pending_add.len()
    }

    pub(crate) fn pending_remove_len(&self) -> usize {
        self.pending_remove.len()
    }
}

/// Locks the registry, recovering from poisoning.
pub(crate) fn lock_registry(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        warn!(target: "engine::registry", "Registry lock poisoned, recovering");
        poisoned.into_inner()
    })
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GameEngine;

    struct Inert;

    impl GameObject for Inert {
        fn on_game_start(&mut self) {}
        fn on_update(&mut self, _elapsed_millis: u64, _engine: &GameEngine) {}
        fn on_draw(&mut self) {}
    }

    fn slot(id: u64) -> SharedSlot {
        ObjectSlot::new(ObjectId(id), Box::new(Inert))
    }

    fn ids(ids: &[u64]) -> Vec<ObjectId> {
        ids.iter().copied().map(ObjectId).collect()
    }

    //--- ObjectSlot -------------------------------------------------------

    fn order_log() -> Arc<Mutex<Vec<&'static str>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn visit_on_free_slot_runs_immediately() {
        let slot = slot(1);
        let order = order_log();

        let log = Arc::clone(&order);
        slot.visit(move |_| log.lock().unwrap().push("visit"));

        assert_eq!(*order.lock().unwrap(), vec!["visit"]);
    }

    #[test]
    fn visit_from_holding_thread_runs_after_outer_call() {
        let slot = slot(1);
        let order = order_log();

        let reentry = Arc::clone(&slot);
        let outer = Arc::clone(&order);
        slot.with(|_| {
            let log = Arc::clone(&outer);
            reentry.visit(move |_| log.lock().unwrap().push("visit"));
            outer.lock().unwrap().push("with");
        });

        assert_eq!(*order.lock().unwrap(), vec!["with", "visit"]);
    }

    #[test]
    fn deferred_calls_can_defer_more() {
        let slot = slot(1);
        let order = order_log();

        let reentry = Arc::clone(&slot);
        let outer = Arc::clone(&order);
        slot.with(|_| {
            let again = Arc::clone(&reentry);
            let log = Arc::clone(&outer);
            reentry.visit(move |_| {
                log.lock().unwrap().push("first");
                let log = Arc::clone(&log);
                again.visit(move |_| log.lock().unwrap().push("second"));
            });
        });

        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn slot_is_released_after_a_panicking_call() {
        let slot = slot(1);
        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            slot.with(|_| panic!("boom"));
        }));
        assert!(panicked.is_err());

        let order = order_log();
        let log = Arc::clone(&order);
        slot.visit(move |_| log.lock().unwrap().push("visit"));

        assert_eq!(*order.lock().unwrap(), vec!["visit"], "call must not stay deferred");
    }

    //--- Registry ---------------------------------------------------------

    #[test]
    fn new_registry_is_empty() {
        let registry = Registry::new();
        assert_eq!(registry.active_len(), 0);
        assert_eq!(registry.pending_add_len(), 0);
        assert_eq!(registry.pending_remove_len(), 0);
    }

    #[test]
    fn insert_is_immediate() {
        let mut registry = Registry::new();
        registry.insert(slot(1));
        assert!(registry.is_active(ObjectId(1)));
    }

    #[test]
    fn queued_add_waits_for_drain() {
        let mut registry = Registry::new();
        registry.queue_add(slot(1));

        assert!(!registry.is_active(ObjectId(1)));
        assert!(registry.find(ObjectId(1)).is_some(), "pending objects are findable");

        let drained = registry.apply_pending();

        assert_eq!(drained, Drained { removed: 0, added: 1 });
        assert!(registry.is_active(ObjectId(1)));
        assert_eq!(registry.pending_add_len(), 0);
    }

    #[test]
    fn queued_remove_waits_for_drain() {
        let mut registry = Registry::new();
        registry.insert(slot(1));
        registry.queue_remove(ObjectId(1));

        assert!(registry.is_active(ObjectId(1)), "removal must be deferred");

        registry.apply_pending();

        assert!(!registry.is_active(ObjectId(1)));
        assert_eq!(registry.pending_remove_len(), 0);
    }

    #[test]
    fn drain_preserves_fifo_order() {
        let mut registry = Registry::new();
        registry.insert(slot(1));
        registry.queue_add(slot(3));
        registry.queue_add(slot(2));

        registry.apply_pending();

        assert_eq!(registry.active_ids(), ids(&[1, 3, 2]));
    }

    #[test]
    fn removals_apply_before_additions() {
        let mut registry = Registry::new();
        registry.queue_add(slot(1));
        registry.queue_remove(ObjectId(1));

        let drained = registry.apply_pending();

        assert_eq!(drained, Drained { removed: 0, added: 1 });
        assert!(registry.is_active(ObjectId(1)));
    }

    #[test]
    fn drain_empties_both_queues_at_once() {
        let mut registry = Registry::new();
        for id in 1..=3 {
            registry.insert(slot(id));
        }
        registry.queue_remove(ObjectId(1));
        registry.queue_remove(ObjectId(3));
        registry.queue_add(slot(4));
        registry.queue_add(slot(5));

        let drained = registry.apply_pending();

        assert_eq!(drained, Drained { removed: 2, added: 2 });
        assert_eq!(registry.active_ids(), ids(&[2, 4, 5]));
    }

    #[test]
    fn unknown_removal_is_dropped() {
        let mut registry = Registry::new();
        registry.insert(slot(1));
        registry.queue_remove(ObjectId(9));

        let drained = registry.apply_pending();

        assert_eq!(drained.removed, 0);
        assert_eq!(registry.active_len(), 1);
    }

    #[test]
    fn snapshot_is_detached() {
        let mut registry = Registry::new();
        registry.insert(slot(1));

        let snapshot = registry.snapshot();
        registry.queue_remove(ObjectId(1));
        registry.apply_pending();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.active_len(), 0);
    }
}
