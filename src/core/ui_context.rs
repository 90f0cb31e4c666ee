//=========================================================================
// UI Execution Context
//=========================================================================
//
// Abstraction over "the thread that owns visual state".
//
// Architecture:
// ```text
//   Draw thread ─┐
//   Caller     ──┼─ schedule(task) ─> UiQueue ══channel══> UiLoop
//                │                                          │
//                │                               owning thread runs tasks
//                └─ fire-and-forget, FIFO per sender        serially
// ```
//
// Hosts with their own UI loop implement `UiExecutor` directly. Everyone
// else can use the channel-backed `UiQueue` / `UiLoop` pair.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{trace, warn};

//=== UiExecutor ==========================================================

/// A unit of work scheduled onto the UI context.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Serial executor that owns visual state.
///
/// `schedule` must not block and must not run the task synchronously on a
/// thread other than the one owning visual state. Running it inline when
/// already on that thread is allowed, including from inside a
/// [`GameObject`](crate::core::GameObject) callback: a notification for the
/// object currently in its callback is delivered when the callback returns.
pub trait UiExecutor: Send + Sync {
    /// Enqueues `task` for execution on the UI context.
    fn schedule(&self, task: UiTask);
}

//=== UiQueue =============================================================

/// Sending half of the channel-backed UI context.
#[derive(Clone)]
pub struct UiQueue {
    sender: Sender<UiTask>,
}

impl UiExecutor for UiQueue {
    fn schedule(&self, task: UiTask) {
        if self.sender.send(task).is_err() {
            warn!(target: "engine::ui", "UI loop gone, dropping scheduled task");
        }
    }
}

//=== UiLoop ==============================================================

/// Receiving half of the channel-backed UI context.
///
/// Lives on the thread that owns visual state and runs tasks one at a time.
pub struct UiLoop {
    receiver: Receiver<UiTask>,
}

/// Creates a connected queue/loop pair.
pub fn ui_channel() -> (UiQueue, UiLoop) {
    let (sender, receiver) = unbounded();
    (UiQueue { sender }, UiLoop { receiver })
}

impl UiLoop {
    /// Upper bound for [`UiLoop::run_pending`], so a hot draw loop cannot
    /// starve the caller.
    pub const MAX_TASKS_PER_PASS: usize = 256;

    /// Runs tasks already queued, up to [`UiLoop::MAX_TASKS_PER_PASS`].
    ///
    /// Returns the number of tasks executed.
    pub fn run_pending(&self) -> usize {
        let mut executed = 0;

        while executed < Self::MAX_TASKS_PER_PASS {
            match self.receiver.try_recv() {
                Ok(task) => {
                    task();
                    executed += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if executed > 0 {
            trace!(target: "engine::ui", "Ran {} UI tasks", executed);
        }
        executed
    }

    /// Runs tasks as they arrive for `duration`, then returns the count.
    pub fn run_for(&self, duration: Duration) -> usize {
        let deadline = Instant::now() + duration;
        let mut executed = 0;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.receiver.recv_timeout(remaining) {
                Ok(task) => {
                    task();
                    executed += 1;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        executed
    }

    /// Runs tasks until every [`UiQueue`] handle has been dropped.
    pub fn run(&self) {
        for task in self.receiver.iter() {
            task();
        }
        trace!(target: "engine::ui", "All UI queues dropped, loop finished");
    }

    /// Number of tasks waiting.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
