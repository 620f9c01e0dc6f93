//! Motive Animation
//!
//! Everything that moves over time: a deterministic, externally clocked
//! [`TimeManager`], text-described [`Easing`] curves and the [`Action`]
//! handles that sequence animated work.
//!
//! Nothing here reads the wall clock. The host advances time explicitly,
//! which keeps every animation reproducible in tests.
//!
//! # Example
//!
//! ```ignore
//! use motive_animation::{Action, Easing, TimeManager};
//!
//! let timers = TimeManager::new();
//! let curve = Easing::parse("ease-in-out");
//! let slide = Action::make_animation(&timers, 250, move |elapsed| {
//!     let alpha = curve.calc(elapsed as f32 / 250.0);
//!     move_to(alpha * 400.0);
//! });
//!
//! timers.update_time(16);
//! ```

pub mod action;
pub mod easing;
pub mod time_manager;

pub use action::{Action, ActionState, ClaimAction, WeakAction};
pub use easing::{
    cached_curve_count, reset_cache, CurveDefinition, Easing, EasingBounds, EasingCurve,
    EasingError, Segment, SegmentKind, SpatialApproximation, EASING_POINTS,
};
pub use time_manager::{AnimatorCallback, TimeManager, TimeoutCallback, TimerId};
