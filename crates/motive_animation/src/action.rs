//! Actions
//!
//! An [`Action`] is a handle to work that completes later: an animation, a
//! delay, a page transition waiting for its host. It is `Pending` until it is
//! either resolved or terminated; both are final.
//!
//! Continuations registered with [`Action::then`] never run synchronously.
//! They are scheduled on the [`TimeManager`] with zero delay once the action
//! resolves, so they run within the next clock update.
//!
//! # Example
//!
//! ```ignore
//! let fade = Action::make_animation(&timers, 300, move |elapsed| {
//!     set_opacity(1.0 - elapsed as f32 / 300.0);
//! });
//! fade.then(|_| tracing::debug!("fade complete"));
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use motive_core::{ExecutionResource, Millis, ResourceArbitrator, ResourceOwner};
use smallvec::SmallVec;

use crate::time_manager::{TimeManager, TimerId};

/// Lifecycle of an [`Action`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionState {
    Pending,
    Resolved,
    Terminated,
}

pub type ThenCallback = Box<dyn FnOnce(&Action) + Send>;
pub type TerminateCallback = Box<dyn FnOnce() + Send>;

struct ActionData {
    state: ActionState,
    then: Option<ThenCallback>,
    timer: Option<TimerId>,
    on_terminate: SmallVec<[TerminateCallback; 2]>,
}

struct ActionInner {
    timers: Arc<TimeManager>,
    data: Mutex<ActionData>,
}

impl ActionInner {
    fn terminate(&self) {
        let (timer, callbacks) = {
            let mut data = self.data.lock().unwrap();
            if data.state != ActionState::Pending {
                return;
            }
            data.state = ActionState::Terminated;
            data.then = None;
            (data.timer.take(), std::mem::take(&mut data.on_terminate))
        };

        if let Some(id) = timer {
            self.timers.clear_timeout(id);
        }
        for callback in callbacks {
            callback();
        }
    }
}

impl ResourceOwner for ActionInner {
    fn on_resource_loss(&self) {
        tracing::debug!("action lost its resource");
        self.terminate();
    }
}

impl Drop for ActionInner {
    fn drop(&mut self) {
        let timer = self.data.get_mut().map(|data| data.timer.take()).ok().flatten();
        if let Some(id) = timer {
            self.timers.clear_timeout(id);
        }
    }
}

/// Shared handle to a unit of deferred work
#[derive(Clone)]
pub struct Action(Arc<ActionInner>);

impl Action {
    fn pending(timers: &Arc<TimeManager>) -> Action {
        Action(Arc::new(ActionInner {
            timers: timers.clone(),
            data: Mutex::new(ActionData {
                state: ActionState::Pending,
                then: None,
                timer: None,
                on_terminate: SmallVec::new(),
            }),
        }))
    }

    fn downgrade(&self) -> Weak<ActionInner> {
        Arc::downgrade(&self.0)
    }

    fn set_timer(&self, timer: Option<TimerId>) {
        self.0.data.lock().unwrap().timer = timer;
    }

    /// Create a pending action and hand it to `start`, which resolves or
    /// terminates it now or later
    pub fn make<F>(timers: &Arc<TimeManager>, start: F) -> Action
    where
        F: FnOnce(&Action),
    {
        let action = Self::pending(timers);
        start(&action);
        action
    }

    /// An action that is already resolved
    pub fn resolved(timers: &Arc<TimeManager>) -> Action {
        let action = Self::pending(timers);
        action.resolve();
        action
    }

    /// An action that resolves once `delay` has passed
    pub fn make_delayed(timers: &Arc<TimeManager>, delay: Millis) -> Action {
        Self::make_delayed_with(timers, delay, |action| action.resolve())
    }

    /// Run `start` after `delay`, unless the action was terminated first
    pub fn make_delayed_with<F>(timers: &Arc<TimeManager>, delay: Millis, start: F) -> Action
    where
        F: FnOnce(&Action) + Send + 'static,
    {
        if delay == 0 {
            return Self::make(timers, start);
        }

        let action = Self::pending(timers);
        let weak = action.downgrade();
        let id = timers.set_timeout(
            move || {
                if let Some(inner) = weak.upgrade() {
                    let action = Action(inner);
                    action.set_timer(None);
                    if action.is_pending() {
                        start(&action);
                    }
                }
            },
            delay,
        );
        action.set_timer(Some(id));
        action
    }

    /// Drive `animator(elapsed)` on every clock update for `duration`, then
    /// resolve. The final call always receives exactly `duration`.
    pub fn make_animation<F>(timers: &Arc<TimeManager>, duration: Millis, mut animator: F) -> Action
    where
        F: FnMut(Millis) + Send + 'static,
    {
        let action = Self::pending(timers);
        let weak = action.downgrade();
        let id = timers.set_animator(
            move |elapsed| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let action = Action(inner);
                if action.is_terminated() {
                    return;
                }
                if elapsed < duration {
                    animator(elapsed);
                } else {
                    animator(duration);
                    action.set_timer(None);
                    action.resolve();
                }
            },
            duration,
        );
        action.set_timer(Some(id));
        action
    }

    /// Resolves once every action in `actions` has resolved
    pub fn make_all(timers: &Arc<TimeManager>, actions: Vec<Action>) -> Action {
        Self::make_collection(timers, actions, false)
    }

    /// Resolves as soon as any action in `actions` resolves; the others are
    /// terminated
    pub fn make_any(timers: &Arc<TimeManager>, actions: Vec<Action>) -> Action {
        Self::make_collection(timers, actions, true)
    }

    fn make_collection(timers: &Arc<TimeManager>, actions: Vec<Action>, any: bool) -> Action {
        let remaining: Vec<Action> = actions.into_iter().filter(|a| !a.is_terminated()).collect();
        if remaining.is_empty() {
            return Self::resolved(timers);
        }

        let parent = Self::pending(timers);
        let children = Arc::new(Mutex::new(remaining.clone()));

        let owned = children.clone();
        parent.add_terminate_callback(move || {
            let children = std::mem::take(&mut *owned.lock().unwrap());
            for child in children {
                child.terminate();
            }
        });

        for child in remaining {
            let parent_ref = parent.downgrade();
            let children_ref = Arc::downgrade(&children);
            child.then(move |finished| {
                let (Some(parent), Some(children)) = (parent_ref.upgrade(), children_ref.upgrade())
                else {
                    return;
                };
                let parent = Action(parent);
                if !parent.is_pending() {
                    return;
                }

                let others = {
                    let mut children = children.lock().unwrap();
                    children.retain(|c| !c.ptr_eq(finished));
                    if any {
                        std::mem::take(&mut *children)
                    } else if children.is_empty() {
                        Vec::new()
                    } else {
                        return;
                    }
                };
                for other in others {
                    other.terminate();
                }
                parent.resolve();
            });
        }

        parent
    }

    /// Register the continuation. It runs on a zero-delay timeout after the
    /// action resolves and never runs for a terminated action.
    pub fn then<F>(&self, callback: F)
    where
        F: FnOnce(&Action) + Send + 'static,
    {
        self.0.data.lock().unwrap().then = Some(Box::new(callback));
        self.schedule_then();
    }

    pub fn add_terminate_callback<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.0
            .data
            .lock()
            .unwrap()
            .on_terminate
            .push(Box::new(callback));
    }

    /// Mark the action complete
    pub fn resolve(&self) {
        {
            let mut data = self.0.data.lock().unwrap();
            if data.state != ActionState::Pending {
                return;
            }
            data.state = ActionState::Resolved;
        }
        self.schedule_then();
    }

    /// Abandon the action, running its terminate callbacks
    pub fn terminate(&self) {
        self.0.terminate();
    }

    fn schedule_then(&self) {
        {
            let data = self.0.data.lock().unwrap();
            if data.state != ActionState::Resolved || data.then.is_none() {
                return;
            }
        }

        let weak = self.downgrade();
        let id = self.0.timers.set_timeout(
            move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let callback = {
                    let mut data = inner.data.lock().unwrap();
                    data.timer = None;
                    if data.state != ActionState::Resolved {
                        return;
                    }
                    data.then.take()
                };
                if let Some(callback) = callback {
                    callback(&Action(inner));
                }
            },
            0,
        );
        self.set_timer(Some(id));
    }

    pub fn state(&self) -> ActionState {
        self.0.data.lock().unwrap().state
    }

    pub fn is_pending(&self) -> bool {
        self.state() == ActionState::Pending
    }

    pub fn is_resolved(&self) -> bool {
        self.state() == ActionState::Resolved
    }

    pub fn is_terminated(&self) -> bool {
        self.state() == ActionState::Terminated
    }

    pub fn ptr_eq(&self, other: &Action) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A handle that does not keep the action alive
    pub fn downgrade_handle(&self) -> WeakAction {
        WeakAction(self.downgrade())
    }

    /// Identity used by the resource arbitrator
    pub fn owner_id(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

/// Non-owning reference to an [`Action`]
#[derive(Clone)]
pub struct WeakAction(Weak<ActionInner>);

impl WeakAction {
    pub fn upgrade(&self) -> Option<Action> {
        self.0.upgrade().map(Action)
    }
}

/// Lets a running command hold an execution resource
pub trait ClaimAction {
    /// Grant `resource` to `action`; losing it terminates the action
    fn claim_action(&self, resource: ExecutionResource, action: &Action);
}

impl ClaimAction for ResourceArbitrator {
    fn claim_action(&self, resource: ExecutionResource, action: &Action) {
        let owner: Arc<dyn ResourceOwner> = action.0.clone();
        self.claim_resource(resource, owner);
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Action").field(&self.state()).finish()
    }
}
