//! Motive Touch
//!
//! Turns pointer input into motion. A [`VelocityTracker`] estimates pointer
//! speed, gestures drive scrollables, pagers and swipe hosts, and an
//! [`AutoScroller`] carries a release velocity on as decelerating motion.
//!
//! Gestures and commands coordinate through execution resources: whoever
//! wants to move a component's position claims its resource first, and the
//! previous holder stops.
//!
//! # Example
//!
//! ```ignore
//! use motive_core::{MotionConfig, PointerEvent};
//! use motive_touch::{GestureHandle, MotionContext};
//!
//! let context = MotionContext::new(MotionConfig::default());
//! let gesture = GestureHandle::scroll(&context, &list);
//!
//! gesture.handle_event(&PointerEvent::down(0.0, 100.0), 0);
//! gesture.handle_event(&PointerEvent::moved(0.0, 40.0), 120);
//! gesture.handle_event(&PointerEvent::up(0.0, 40.0), 140);
//!
//! // Drive the fling
//! context.timers.update_time(156);
//! ```

pub mod auto_scroller;
pub mod collaborators;
pub mod commands;
pub mod context;
pub mod gesture;
pub mod page_move;
pub mod velocity_tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use auto_scroller::{AutoScroller, FinishCallback};
pub use collaborators::{
    PageDirection, Pager, Scrollable, SwipeAwayMode, SwipeChild, SwipeDirection, SwipeHost,
    TapTarget,
};
pub use commands::{scroll_to, set_page, set_scroll_position};
pub use context::MotionContext;
pub use gesture::{
    Gesture, GestureHandle, PagerFlingGesture, ScrollGesture, SwipeAwayGesture, TapGesture,
    ACTION_ACTIVATE, ACTION_SWIPE_AWAY,
};
pub use page_move::{PageMoveHandler, PageTransition};
pub use velocity_tracker::{MovementSample, VelocityTracker, HISTORY_CAPACITY};
