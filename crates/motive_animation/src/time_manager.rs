//! Deterministic time manager
//!
//! The host render loop owns the clock and pushes it forward with
//! [`TimeManager::update_time`]. Nothing here reads a wall clock or spawns a
//! thread, so a recorded sequence of updates always replays identically.
//!
//! Two kinds of entries are scheduled:
//!
//! - **Timeouts** fire once when the clock reaches their end time.
//! - **Animators** are called on every update with the time elapsed since
//!   they were registered, and one final time with their full duration once
//!   the clock reaches their end time.
//!
//! Entries live in a min-heap keyed on end time. Callbacks are never invoked
//! while the internal lock is held, so they may register or cancel entries.
//!
//! # Example
//!
//! ```ignore
//! use motive_animation::TimeManager;
//!
//! let timers = TimeManager::new();
//! timers.set_timeout(|| println!("fired"), 100);
//! timers.set_animator(|elapsed| println!("elapsed {elapsed}"), 300);
//!
//! timers.update_time(16); // animator(16)
//! timers.update_time(120); // timeout fires, animator(120)
//! timers.update_time(300); // animator(300), then it is removed
//! ```

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use motive_core::Millis;
use rustc_hash::FxHashMap;

/// Identifier of a scheduled timeout or animator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// One-shot callback
pub type TimeoutCallback = Box<dyn FnOnce() + Send>;

/// Per-tick callback receiving the elapsed time since registration
pub type AnimatorCallback = Box<dyn FnMut(Millis) + Send>;

enum Callback {
    Timeout(TimeoutCallback),
    Animator(AnimatorCallback),
}

/// Heap key. Ties on end time are broken by registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
    end: Millis,
    id: TimerId,
}

struct Pending {
    start: Millis,
    end: Millis,
    is_animator: bool,
    /// Taken out while the callback runs
    callback: Option<Callback>,
}

#[derive(Default)]
struct TimerState {
    heap: BinaryHeap<Reverse<HeapEntry>>,
    pending: FxHashMap<TimerId, Pending>,
    current_time: Millis,
    next_id: u64,
    animator_count: usize,
}

impl TimerState {
    fn allocate_id(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }

    /// Pop the earliest entry if it is due at `time`
    fn pop_due(&mut self, time: Millis) -> Option<(TimerId, Pending)> {
        loop {
            let Reverse(top) = *self.heap.peek()?;
            if top.end > time {
                return None;
            }
            self.heap.pop();
            if let Some(pending) = self.pending.remove(&top.id) {
                if pending.is_animator {
                    self.animator_count -= 1;
                }
                return Some((top.id, pending));
            }
        }
    }
}

/// Scheduler of timeouts and animators driven by an external clock
pub struct TimeManager {
    state: Mutex<TimerState>,
    terminated: AtomicBool,
}

impl Default for TimeManager {
    fn default() -> Self {
        Self {
            state: Mutex::new(TimerState::default()),
            terminated: AtomicBool::new(false),
        }
    }
}

impl TimeManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a manager whose clock starts at `time`
    pub fn starting_at(time: Millis) -> Arc<Self> {
        let manager = Self::default();
        manager.state.lock().unwrap().current_time = time;
        Arc::new(manager)
    }

    fn schedule(&self, callback: Callback, delay: Millis) -> TimerId {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate_id();
        if self.is_terminated() {
            tracing::debug!(%id, "ignoring registration on terminated time manager");
            return id;
        }

        let start = state.current_time;
        let end = start.saturating_add(delay);
        let is_animator = matches!(callback, Callback::Animator(_));
        if is_animator {
            state.animator_count += 1;
        }
        state.pending.insert(
            id,
            Pending {
                start,
                end,
                is_animator,
                callback: Some(callback),
            },
        );
        state.heap.push(Reverse(HeapEntry { end, id }));
        id
    }

    /// Run `callback` once, `delay` ms from now
    pub fn set_timeout<F>(&self, callback: F, delay: Millis) -> TimerId
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule(Callback::Timeout(Box::new(callback)), delay)
    }

    /// Run `callback(elapsed)` on every update until `duration` has passed
    pub fn set_animator<F>(&self, callback: F, duration: Millis) -> TimerId
    where
        F: FnMut(Millis) + Send + 'static,
    {
        self.schedule(Callback::Animator(Box::new(callback)), duration)
    }

    /// Cancel an entry. Returns false if the id is unknown or already fired.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        let removed = {
            let mut state = self.state.lock().unwrap();
            let before = state.heap.len();
            state.heap.retain(|Reverse(entry)| entry.id != id);
            if state.heap.len() == before {
                return false;
            }
            let removed = state.pending.remove(&id);
            if removed.as_ref().is_some_and(|p| p.is_animator) {
                state.animator_count -= 1;
            }
            removed
        };
        drop(removed);
        true
    }

    /// Advance the clock to `time`, firing everything that falls due
    ///
    /// A time at or before the current time flushes entries that are already
    /// due without moving the clock or ticking animators.
    pub fn update_time(&self, time: Millis) {
        if self.is_terminated() {
            tracing::error!(time, "update_time called on terminated time manager");
            return;
        }

        let current = self.current_time();
        if time <= current {
            self.fire_due(current);
            return;
        }

        self.fire_due(time);

        let animators: Vec<(TimerId, Millis)> = {
            let mut state = self.state.lock().unwrap();
            state.current_time = time;
            let mut live: Vec<(TimerId, Millis)> = state
                .pending
                .iter()
                .filter(|(_, p)| p.is_animator && p.end > time)
                .map(|(id, p)| (*id, p.start))
                .collect();
            live.sort_unstable();
            live
        };

        for (id, start) in animators {
            self.tick_animator(id, time - start);
        }

        // Zero-delay work registered by animators
        self.fire_due(time);
    }

    fn tick_animator(&self, id: TimerId, elapsed: Millis) {
        let callback = {
            let mut state = self.state.lock().unwrap();
            state.pending.get_mut(&id).and_then(|p| p.callback.take())
        };
        let Some(Callback::Animator(mut animator)) = callback else {
            return;
        };

        animator(elapsed);

        let mut state = self.state.lock().unwrap();
        if let Some(pending) = state.pending.get_mut(&id) {
            pending.callback = Some(Callback::Animator(animator));
        }
    }

    fn fire_due(&self, time: Millis) {
        loop {
            let next = {
                let mut state = self.state.lock().unwrap();
                let next = state.pop_due(time);
                if let Some((_, pending)) = &next {
                    state.current_time = state.current_time.max(pending.end);
                }
                next
            };
            let Some((id, pending)) = next else {
                break;
            };

            match pending.callback {
                Some(Callback::Timeout(callback)) => {
                    tracing::trace!(%id, end = pending.end, "timeout fired");
                    callback();
                }
                Some(Callback::Animator(mut animator)) => {
                    tracing::trace!(%id, end = pending.end, "animator finished");
                    animator(pending.end - pending.start);
                }
                None => {}
            }
        }
    }

    /// Fire everything due at the current time
    pub fn run_pending(&self) {
        if self.is_terminated() {
            return;
        }
        self.fire_due(self.current_time());
    }

    /// Time at which the host should next call [`TimeManager::update_time`]
    ///
    /// While any animator is live this is the next millisecond, so the host
    /// keeps ticking every frame. `None` when nothing is scheduled.
    pub fn next_timeout(&self) -> Option<Millis> {
        let state = self.state.lock().unwrap();
        if state.animator_count > 0 {
            return Some(state.current_time + 1);
        }
        state.heap.peek().map(|Reverse(entry)| entry.end)
    }

    pub fn current_time(&self) -> Millis {
        self.state.lock().unwrap().current_time
    }

    /// Drop every entry without firing it
    pub fn clear(&self) {
        let pending = {
            let mut state = self.state.lock().unwrap();
            state.heap.clear();
            state.animator_count = 0;
            std::mem::take(&mut state.pending)
        };
        drop(pending);
    }

    /// Clear and refuse all further work. There is no way back.
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::SeqCst);
        self.clear();
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Number of scheduled entries
    pub fn size(&self) -> usize {
        self.state.lock().unwrap().heap.len()
    }

    /// Number of live animators
    pub fn animator_count(&self) -> usize {
        self.state.lock().unwrap().animator_count
    }
}

impl fmt::Debug for TimeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("TimeManager")
            .field("current_time", &state.current_time)
            .field("entries", &state.heap.len())
            .field("animators", &state.animator_count)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
