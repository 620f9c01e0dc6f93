//! Shared state of pointer-tracking gestures
//!
//! Scroll, pager and swipe gestures all record where and when the pointer
//! went down, feed every event to a velocity tracker and refuse to start
//! moving until the tap-or-scroll window has passed.

use std::sync::Arc;

use motive_core::{Millis, MotionConfig, Point, PointerEvent, Transform2D};

use crate::velocity_tracker::VelocityTracker;

const MS_PER_SECOND: f32 = 1000.0;

#[derive(Debug)]
pub(crate) struct FlingState {
    pub triggered: bool,
    pub start_position: Point,
    pub start_time: Millis,
    pub tracker: VelocityTracker,
    pub config: Arc<MotionConfig>,
}

impl FlingState {
    pub fn new(config: Arc<MotionConfig>) -> Self {
        Self {
            triggered: false,
            start_position: Point::ZERO,
            start_time: 0,
            tracker: VelocityTracker::new(config.pointer_inactivity_timeout),
            config,
        }
    }

    /// `local` is the event position in the component's coordinates
    pub fn on_down(&mut self, event: &PointerEvent, timestamp: Millis, local: Point) -> bool {
        self.tracker.reset();
        self.tracker.add_pointer_event(event, timestamp);
        self.start_position = local;
        self.start_time = timestamp;
        true
    }

    /// False while the pointer may still turn out to be a tap
    pub fn on_move(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        self.tracker.add_pointer_event(event, timestamp);
        self.triggered
            || timestamp >= self.start_time.saturating_add(self.config.tap_or_scroll_timeout)
    }

    /// False when the gesture never triggered; the caller resets
    pub fn on_up(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        self.tracker.add_pointer_event(event, timestamp);
        self.triggered
    }

    pub fn reset(&mut self) {
        self.triggered = false;
        self.tracker.reset();
    }

    /// Perpendicular drift is within `slope` of the primary displacement
    pub fn is_slope_within_tolerance(&self, local: Point, horizontal: bool, slope: f32) -> bool {
        if !local.is_finite() || !self.start_position.is_finite() {
            return false;
        }
        let delta = local - self.start_position;
        if horizontal {
            delta.x.abs() * slope >= delta.y.abs()
        } else {
            delta.y.abs() * slope >= delta.x.abs()
        }
    }

    /// Estimated velocity in local units per millisecond
    pub fn local_velocity(&self, transform: &Transform2D) -> Point {
        transform.apply_vector(self.tracker.estimated_velocity())
    }
}

/// Scale a global threshold into local units along one axis
pub(crate) fn to_local_threshold(transform: &Transform2D, threshold: f32, horizontal: bool) -> f32 {
    let scaling = if horizontal {
        transform.x_scaling()
    } else {
        transform.y_scaling()
    };
    (threshold * scaling).abs()
}

/// Convert a per-second velocity threshold to local units per millisecond
pub(crate) fn to_local_velocity_threshold(
    transform: &Transform2D,
    per_second: f32,
    horizontal: bool,
) -> f32 {
    to_local_threshold(transform, per_second, horizontal) / MS_PER_SECOND
}

/// A transform gestures cannot work through
pub(crate) fn is_singular(transform: &Transform2D, horizontal: bool) -> bool {
    let scaling = if horizontal {
        transform.x_scaling()
    } else {
        transform.y_scaling()
    };
    !scaling.is_finite() || scaling == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> FlingState {
        FlingState::new(Arc::new(MotionConfig::default()))
    }

    #[test]
    fn test_tap_window_blocks_early_moves() {
        let mut fling = state();
        fling.on_down(&PointerEvent::down(0.0, 0.0), 1000, Point::ZERO);
        assert!(!fling.on_move(&PointerEvent::moved(0.0, 50.0), 1050));
        assert!(fling.on_move(&PointerEvent::moved(0.0, 60.0), 1100));
        assert_eq!(fling.tracker.history().count(), 3);
    }

    #[test]
    fn test_slope() {
        let mut fling = state();
        fling.on_down(&PointerEvent::down(0.0, 0.0), 0, Point::ZERO);
        assert!(fling.is_slope_within_tolerance(Point::new(10.0, 50.0), false, 1.0));
        assert!(!fling.is_slope_within_tolerance(Point::new(60.0, 50.0), false, 1.0));
        assert!(fling.is_slope_within_tolerance(Point::new(60.0, 50.0), true, 1.0));
        assert!(!fling.is_slope_within_tolerance(Point::new(f32::NAN, 0.0), true, 1.0));
    }

    #[test]
    fn test_local_thresholds() {
        let transform = Transform2D::scale(2.0, 0.5);
        assert_eq!(to_local_threshold(&transform, 10.0, true), 20.0);
        assert_eq!(to_local_threshold(&transform, 10.0, false), 5.0);
        assert_eq!(to_local_velocity_threshold(&transform, 1000.0, true), 2.0);
        assert!(is_singular(&Transform2D::scale(0.0, 1.0), true));
        assert!(!is_singular(&Transform2D::scale(0.0, 1.0), false));
        assert!(is_singular(&Transform2D::scale(0.0, 0.0).inverse(), false));
    }
}
