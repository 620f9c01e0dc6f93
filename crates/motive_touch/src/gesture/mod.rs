//! Gestures
//!
//! A gesture turns a pointer sequence into motion of the component it is
//! attached to. The set of gestures is closed, so they are variants of one
//! [`Gesture`] enum behind a shared [`GestureHandle`].
//!
//! Gestures are reset, not destroyed, between interactions. Anything that
//! calls back into a gesture later (a scroller finishing, an animation
//! resolving, a resource being preempted) holds the handle weakly and does
//! nothing if the gesture is gone.
//!
//! Collaborators are told that an interaction ended (a page move or swipe
//! settling) with the gesture unlocked and its resource already released,
//! so they may call back into the handle or move the component themselves.
//! Every other collaborator call runs while the gesture is locked and must
//! not reach the same handle.
//!
//! # Example
//!
//! ```ignore
//! let context = MotionContext::new(MotionConfig::default());
//! let gesture = GestureHandle::scroll(&context, &list);
//!
//! gesture.on_down(&PointerEvent::down(0.0, 100.0), 0);
//! gesture.on_move(&PointerEvent::moved(0.0, 40.0), 120);
//! gesture.on_up(&PointerEvent::up(0.0, 40.0), 140);
//! context.timers.update_time(156);
//! ```

mod fling;
mod pager_fling;
mod scroll;
mod swipe_away;
mod tap;

use std::sync::{Arc, Mutex, Weak};

use motive_core::{Millis, PointerEvent, PointerEventKind};

pub use pager_fling::PagerFlingGesture;
pub use scroll::ScrollGesture;
pub use swipe_away::SwipeAwayGesture;
pub use tap::TapGesture;

use crate::collaborators::{
    Pager, Scrollable, SwipeAwayMode, SwipeDirection, SwipeHost, TapTarget,
};
use crate::context::MotionContext;

/// Accessibility action that presses a tap target
pub const ACTION_ACTIVATE: &str = "activate";
/// Accessibility action that completes a swipe-away
pub const ACTION_SWIPE_AWAY: &str = "swipeaway";

pub(crate) type GestureRef = Weak<Mutex<Gesture>>;

/// Run `f` on the gesture if it still exists
pub(crate) fn with_gesture<F>(this: &GestureRef, f: F)
where
    F: FnOnce(&mut Gesture),
{
    if let Some(gesture) = this.upgrade() {
        let mut gesture = gesture.lock().unwrap();
        f(&mut gesture);
    }
}

/// Every gesture kind
#[derive(Debug)]
pub enum Gesture {
    Scroll(ScrollGesture),
    PagerFling(PagerFlingGesture),
    SwipeAway(SwipeAwayGesture),
    Tap(TapGesture),
}

impl Gesture {
    pub fn on_down(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        match self {
            Gesture::Scroll(g) => g.on_down(event, timestamp),
            Gesture::PagerFling(g) => g.on_down(event, timestamp),
            Gesture::SwipeAway(g) => g.on_down(event, timestamp),
            Gesture::Tap(g) => g.on_down(event, timestamp),
        }
    }

    pub fn on_move(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        match self {
            Gesture::Scroll(g) => g.on_move(event, timestamp),
            Gesture::PagerFling(g) => g.on_move(event, timestamp),
            Gesture::SwipeAway(g) => g.on_move(event, timestamp),
            Gesture::Tap(g) => g.on_move(event, timestamp),
        }
    }

    pub fn on_up(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        match self {
            Gesture::Scroll(g) => g.on_up(event, timestamp),
            Gesture::PagerFling(g) => g.on_up(event, timestamp),
            Gesture::SwipeAway(g) => g.on_up(event, timestamp),
            Gesture::Tap(g) => g.on_up(event, timestamp),
        }
    }

    pub fn on_cancel(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        match self {
            Gesture::Scroll(g) => g.on_cancel(event, timestamp),
            Gesture::PagerFling(g) => g.on_cancel(event, timestamp),
            Gesture::SwipeAway(g) => g.on_cancel(event, timestamp),
            Gesture::Tap(g) => g.on_cancel(event, timestamp),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Gesture::Scroll(g) => g.reset(),
            Gesture::PagerFling(g) => g.reset(),
            Gesture::SwipeAway(g) => g.reset(),
            Gesture::Tap(g) => g.reset(),
        }
    }

    /// Give up any held resource for good and reset
    pub fn release(&mut self) {
        match self {
            Gesture::Scroll(g) => g.release(),
            Gesture::PagerFling(g) => g.release(),
            Gesture::SwipeAway(g) => g.reset(),
            Gesture::Tap(g) => g.reset(),
        }
    }

    pub fn is_triggered(&self) -> bool {
        match self {
            Gesture::Scroll(g) => g.is_triggered(),
            Gesture::PagerFling(g) => g.is_triggered(),
            Gesture::SwipeAway(g) => g.is_triggered(),
            Gesture::Tap(_) => false,
        }
    }

    pub fn accessibility_actions(&self) -> &'static [&'static str] {
        match self {
            Gesture::SwipeAway(_) => &[ACTION_SWIPE_AWAY],
            Gesture::Tap(_) => &[ACTION_ACTIVATE],
            Gesture::Scroll(_) | Gesture::PagerFling(_) => &[],
        }
    }

    pub fn invoke_accessibility_action(&mut self, name: &str) -> bool {
        match self {
            Gesture::SwipeAway(g) => g.invoke_accessibility_action(name),
            Gesture::Tap(g) => g.invoke_accessibility_action(name),
            Gesture::Scroll(_) | Gesture::PagerFling(_) => false,
        }
    }

    /// Route an event by kind. Target changes cancel.
    pub fn handle_event(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        match event.kind {
            PointerEventKind::Down => self.on_down(event, timestamp),
            PointerEventKind::Move => self.on_move(event, timestamp),
            PointerEventKind::Up => self.on_up(event, timestamp),
            PointerEventKind::Cancel | PointerEventKind::TargetChanged => {
                self.on_cancel(event, timestamp)
            }
        }
    }
}

/// Shared handle to a gesture attached to one component
#[derive(Clone, Debug)]
pub struct GestureHandle(Arc<Mutex<Gesture>>);

impl GestureHandle {
    pub fn scroll(context: &MotionContext, scrollable: &Arc<dyn Scrollable>) -> Self {
        Self(Arc::new_cyclic(|this| {
            Mutex::new(Gesture::Scroll(ScrollGesture::new(
                context,
                scrollable,
                this.clone(),
            )))
        }))
    }

    pub fn pager_fling(context: &MotionContext, pager: &Arc<dyn Pager>) -> Self {
        Self(Arc::new_cyclic(|this| {
            Mutex::new(Gesture::PagerFling(PagerFlingGesture::new(
                context,
                pager,
                this.clone(),
            )))
        }))
    }

    pub fn swipe_away(
        context: &MotionContext,
        host: &Arc<dyn SwipeHost>,
        mode: SwipeAwayMode,
        direction: SwipeDirection,
    ) -> Self {
        Self(Arc::new_cyclic(|this| {
            Mutex::new(Gesture::SwipeAway(SwipeAwayGesture::new(
                context,
                host,
                mode,
                direction,
                this.clone(),
            )))
        }))
    }

    pub fn tap(context: &MotionContext, target: &Arc<dyn TapTarget>) -> Self {
        Self(Arc::new(Mutex::new(Gesture::Tap(TapGesture::new(
            context, target,
        )))))
    }

    pub fn on_down(&self, event: &PointerEvent, timestamp: Millis) -> bool {
        self.0.lock().unwrap().on_down(event, timestamp)
    }

    pub fn on_move(&self, event: &PointerEvent, timestamp: Millis) -> bool {
        self.0.lock().unwrap().on_move(event, timestamp)
    }

    pub fn on_up(&self, event: &PointerEvent, timestamp: Millis) -> bool {
        self.0.lock().unwrap().on_up(event, timestamp)
    }

    pub fn on_cancel(&self, event: &PointerEvent, timestamp: Millis) -> bool {
        self.0.lock().unwrap().on_cancel(event, timestamp)
    }

    pub fn handle_event(&self, event: &PointerEvent, timestamp: Millis) -> bool {
        self.0.lock().unwrap().handle_event(event, timestamp)
    }

    pub fn reset(&self) {
        self.0.lock().unwrap().reset();
    }

    pub fn release(&self) {
        self.0.lock().unwrap().release();
    }

    pub fn is_triggered(&self) -> bool {
        self.0.lock().unwrap().is_triggered()
    }

    pub fn accessibility_actions(&self) -> &'static [&'static str] {
        self.0.lock().unwrap().accessibility_actions()
    }

    pub fn invoke_accessibility_action(&self, name: &str) -> bool {
        self.0.lock().unwrap().invoke_accessibility_action(name)
    }

    /// Inspect or drive the gesture directly
    pub fn with<R>(&self, f: impl FnOnce(&mut Gesture) -> R) -> R {
        f(&mut self.0.lock().unwrap())
    }
}
