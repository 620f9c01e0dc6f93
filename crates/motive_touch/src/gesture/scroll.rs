//! Drag-to-scroll with fling
//!
//! The gesture claims the component's position resource once the pointer has
//! moved past the slop threshold along the scrolling axis, and from then on
//! writes the scroll position directly. On release a fast enough pointer
//! hands over to a velocity [`AutoScroller`]; after that (or instead of it,
//! for slow releases on components that demand it) the content snaps.

use std::fmt;
use std::sync::{Arc, Weak};

use motive_core::{ExecutionResource, ExecutionResourceHolder, Millis, Point, PointerEvent};

use super::fling::{self, FlingState};
use super::{with_gesture, Gesture, GestureRef};
use crate::auto_scroller::AutoScroller;
use crate::collaborators::Scrollable;
use crate::context::MotionContext;

pub struct ScrollGesture {
    context: MotionContext,
    fling: FlingState,
    scrollable: Weak<dyn Scrollable>,
    holder: Arc<ExecutionResourceHolder>,
    scroller: Option<AutoScroller>,
    last_local: Point,
    this: GestureRef,
}

fn as_scroll(gesture: &mut Gesture) -> Option<&mut ScrollGesture> {
    match gesture {
        Gesture::Scroll(scroll) => Some(scroll),
        _ => None,
    }
}

impl ScrollGesture {
    pub(crate) fn new(
        context: &MotionContext,
        scrollable: &Arc<dyn Scrollable>,
        this: GestureRef,
    ) -> Self {
        let resource = ExecutionResource::position(scrollable.component_id());
        let on_loss = this.clone();
        let holder = ExecutionResourceHolder::create(resource, &context.arbitrator, move || {
            tracing::debug!(%resource, "scroll gesture lost its resource");
            with_gesture(&on_loss, Gesture::reset);
        });

        Self {
            context: context.clone(),
            fling: FlingState::new(context.config.clone()),
            scrollable: Arc::downgrade(scrollable),
            holder,
            scroller: None,
            last_local: Point::ZERO,
            this,
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.fling.triggered
    }

    /// True while a fling or snap animation is running
    pub fn is_scrolling(&self) -> bool {
        self.scroller.as_ref().is_some_and(|s| !s.is_finished())
    }

    pub fn reset(&mut self) {
        if self.fling.triggered {
            self.holder.release_resource();
        }
        self.fling.reset();
        self.scroller = None;
    }

    pub fn release(&mut self) {
        self.holder.release();
        self.reset();
    }

    pub fn on_down(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        let Some(scrollable) = self.scrollable.upgrade() else {
            self.reset();
            return false;
        };
        let local = scrollable.global_to_local().apply(event.position);
        self.fling.on_down(event, timestamp, local);
        if self.fling.triggered {
            // Touching a running fling stops it; the drag continues from here
            self.scroller = None;
        }
        self.last_local = self.fling.start_position;
        true
    }

    pub fn on_move(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        if !self.fling.on_move(event, timestamp) {
            return false;
        }
        let Some(scrollable) = self.scrollable.upgrade() else {
            self.reset();
            return false;
        };

        let transform = scrollable.global_to_local();
        let position = transform.apply(event.position);
        let delta = position - self.fling.start_position;
        if !delta.is_finite() {
            tracing::debug!("non-finite pointer delta during scroll");
            return false;
        }

        let vertical = scrollable.is_vertical();
        let scroll_position = scrollable.scroll_position();
        let new_position = scrollable.trim_scroll(scroll_position - (position - self.last_local));

        if !self.fling.triggered {
            let threshold = fling::to_local_threshold(
                &transform,
                self.context.config.pointer_slop_threshold,
                !vertical,
            );
            if delta.along(vertical).abs() > threshold {
                let slope = if vertical {
                    self.context.config.scroll_angle_slope_vertical
                } else {
                    self.context.config.scroll_angle_slope_horizontal
                };
                if !self.fling.is_slope_within_tolerance(position, !vertical, slope) {
                    self.reset();
                    return false;
                }

                if scroll_position != new_position {
                    tracing::debug!(component = scrollable.component_id(), "scroll triggered");
                    self.fling.triggered = true;
                    self.holder.take_resource();
                }
            }
        }

        if self.fling.triggered {
            scrollable.set_scroll_position(new_position.along(vertical));
        }

        self.last_local = position;
        true
    }

    pub fn on_up(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        if !self.fling.on_up(event, timestamp) {
            self.reset();
            return false;
        }
        let Some(scrollable) = self.scrollable.upgrade() else {
            self.reset();
            return false;
        };

        let config = self.context.config.clone();
        let transform = scrollable.global_to_local();
        let vertical = scrollable.is_vertical();
        let mut velocities = self.fling.local_velocity(&transform);
        let velocity = velocities.along(vertical);
        if velocity.is_nan() {
            self.context
                .session
                .warn("Singularity encountered during scroll, resetting");
            self.reset();
            return false;
        }

        let minimum =
            fling::to_local_velocity_threshold(&transform, config.minimum_fling_velocity, !vertical);
        if velocity.abs() >= minimum {
            let travel = transform.apply(event.position) - self.fling.start_position;
            let limit = self.velocity_limit(scrollable.as_ref(), travel);
            if velocity.abs() > limit {
                tracing::debug!(velocity, limit, "fling velocity limited");
                let limited = limit.copysign(velocity);
                velocities = Point::new(limited, limited);
            }

            let this = self.this.clone();
            self.scroller =
                AutoScroller::with_velocity(&self.context, &scrollable, velocities, move || {
                    with_gesture(&this, |gesture| {
                        if let Some(scroll) = as_scroll(gesture) {
                            scroll.scroll_to_snap();
                        }
                    });
                });
            if self.scroller.is_none() {
                self.reset();
            }
        } else if scrollable.should_force_snap() {
            self.scroll_to_snap();
        } else {
            tracing::debug!(velocity, "velocity too low to fling");
            self.reset();
        }
        true
    }

    pub fn on_cancel(&mut self, _event: &PointerEvent, _timestamp: Millis) -> bool {
        self.reset();
        false
    }

    /// Fastest fling allowed for a release after `travel`, in units per ms
    ///
    /// Short drags are capped lower than long ones, following the configured
    /// limit easing across one viewport of travel.
    fn velocity_limit(&self, scrollable: &dyn Scrollable, travel: Point) -> f32 {
        let config = &self.context.config;
        let vertical = scrollable.is_vertical();
        let max_travel = scrollable.viewport().along(vertical);
        let easing = self.context.easing(if vertical {
            &config.scroll_fling_velocity_limit_easing_vertical
        } else {
            &config.scroll_fling_velocity_limit_easing_horizontal
        });

        let directional = travel.along(vertical).abs();
        let maximum = fling::to_local_threshold(
            &scrollable.global_to_local(),
            config.maximum_fling_velocity,
            !vertical,
        );

        let mut limit = maximum;
        if directional <= max_travel {
            let alpha = (directional / max_travel).min(1.0);
            limit = maximum * easing.calc(alpha);
        }
        limit / 1000.0
    }

    fn scroll_to_snap(&mut self) {
        let Some(scrollable) = self.scrollable.upgrade() else {
            self.reset();
            return;
        };

        let snap = scrollable.snap_offset();
        if snap == Point::ZERO {
            self.reset();
            return;
        }

        let this = self.this.clone();
        self.scroller = AutoScroller::to_target(
            &self.context,
            &scrollable,
            snap,
            self.context.config.scroll_snap_duration,
            move || with_gesture(&this, Gesture::reset),
        );
    }
}

impl fmt::Debug for ScrollGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollGesture")
            .field("triggered", &self.fling.triggered)
            .field("start_position", &self.fling.start_position)
            .field("scroller", &self.scroller)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::GestureHandle;
    use crate::testing::{capturing_context, test_context, FakeScrollable};
    use motive_core::{ExecutionResource, Transform2D};

    fn scroll_handle(
        context: &MotionContext,
        scrollable: &Arc<FakeScrollable>,
    ) -> GestureHandle {
        let dyn_scrollable: Arc<dyn Scrollable> = scrollable.clone();
        GestureHandle::scroll(context, &dyn_scrollable)
    }

    #[test]
    fn test_drag_then_fling() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        let gesture = scroll_handle(&context, &scrollable);

        assert!(gesture.on_down(&PointerEvent::down(0.0, 100.0), 0));
        assert!(gesture.on_move(&PointerEvent::moved(0.0, 50.0), 200));
        assert!(gesture.is_triggered());
        assert_eq!(scrollable.position(), 50.0);

        assert!(gesture.on_move(&PointerEvent::moved(0.0, 0.0), 400));
        assert_eq!(scrollable.position(), 100.0);

        context.timers.update_time(400);
        assert!(gesture.on_up(&PointerEvent::up(0.0, 0.0), 400));
        assert!(gesture.is_triggered());

        // v = 0.25/ms, deceleration 20%: 625 units over 2500ms
        context.timers.update_time(3000);
        assert!((scrollable.position() - 725.0).abs() < 1e-3);
        assert!(!gesture.is_triggered());
        assert!(!context
            .arbitrator
            .is_claimed(ExecutionResource::position(scrollable.id())));
    }

    #[test]
    fn test_slow_release_does_not_fling() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        let gesture = scroll_handle(&context, &scrollable);

        gesture.on_down(&PointerEvent::down(0.0, 100.0), 0);
        gesture.on_move(&PointerEvent::moved(0.0, 80.0), 1000);
        gesture.on_move(&PointerEvent::moved(0.0, 79.0), 2000);
        assert!(gesture.is_triggered());
        assert!(gesture.on_up(&PointerEvent::up(0.0, 79.0), 2000));
        assert!(!gesture.is_triggered());
        assert_eq!(scrollable.position(), 21.0);
        assert_eq!(context.timers.size(), 0);
    }

    #[test]
    fn test_small_moves_do_not_trigger() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        let gesture = scroll_handle(&context, &scrollable);

        gesture.on_down(&PointerEvent::down(0.0, 100.0), 0);
        gesture.on_move(&PointerEvent::moved(0.0, 95.0), 50);
        assert!(!gesture.is_triggered());
        assert!(!gesture.on_up(&PointerEvent::up(0.0, 95.0), 60));
        assert_eq!(scrollable.position(), 0.0);
    }

    #[test]
    fn test_diagonal_drag_is_rejected() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        let gesture = scroll_handle(&context, &scrollable);

        gesture.on_down(&PointerEvent::down(100.0, 100.0), 0);
        assert!(!gesture.on_move(&PointerEvent::moved(0.0, 50.0), 100));
        assert!(!gesture.is_triggered());
    }

    #[test]
    fn test_drag_at_range_start_does_not_trigger() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        let gesture = scroll_handle(&context, &scrollable);

        // Pulling down at offset zero has nothing to scroll
        gesture.on_down(&PointerEvent::down(0.0, 100.0), 0);
        gesture.on_move(&PointerEvent::moved(0.0, 150.0), 100);
        assert!(!gesture.is_triggered());
    }

    #[test]
    fn test_preemption_resets_gesture() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        let first = scroll_handle(&context, &scrollable);
        let second = scroll_handle(&context, &scrollable);

        first.on_down(&PointerEvent::down(0.0, 100.0), 0);
        first.on_move(&PointerEvent::moved(0.0, 50.0), 100);
        assert!(first.is_triggered());

        second.on_down(&PointerEvent::down(0.0, 100.0), 0);
        second.on_move(&PointerEvent::moved(0.0, 50.0), 100);
        assert!(second.is_triggered());
        assert!(!first.is_triggered());
    }

    #[test]
    fn test_snap_after_slow_release() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        scrollable.set_snap(Point::new(0.0, -30.0), true);
        let gesture = scroll_handle(&context, &scrollable);

        gesture.on_down(&PointerEvent::down(0.0, 100.0), 0);
        gesture.on_move(&PointerEvent::moved(0.0, 50.0), 1000);
        gesture.on_move(&PointerEvent::moved(0.0, 50.0), 2000);
        assert!(gesture.on_up(&PointerEvent::up(0.0, 50.0), 2000));
        assert!(gesture.is_triggered());

        context.timers.update_time(context.config.scroll_snap_duration);
        assert!((scrollable.position() - 20.0).abs() < 1e-3);
        assert!(!gesture.is_triggered());
    }

    #[test]
    fn test_singular_transform_aborts_release() {
        let (context, session) = capturing_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        let gesture = scroll_handle(&context, &scrollable);

        gesture.on_down(&PointerEvent::down(0.0, 100.0), 0);
        gesture.on_move(&PointerEvent::moved(0.0, 50.0), 200);
        assert!(gesture.is_triggered());

        scrollable.set_transform(Transform2D::scale(0.0, 0.0).inverse());
        assert!(!gesture.on_up(&PointerEvent::up(0.0, 0.0), 400));
        assert!(!gesture.is_triggered());
        assert_eq!(session.count(), 1);
    }

    #[test]
    fn test_touch_during_fling_stops_it() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        let gesture = scroll_handle(&context, &scrollable);

        gesture.on_down(&PointerEvent::down(0.0, 100.0), 0);
        gesture.on_move(&PointerEvent::moved(0.0, 50.0), 200);
        gesture.on_move(&PointerEvent::moved(0.0, 0.0), 400);
        gesture.on_up(&PointerEvent::up(0.0, 0.0), 400);
        context.timers.update_time(100);
        let stopped_at = scrollable.position();
        assert!(stopped_at > 100.0);

        gesture.on_down(&PointerEvent::down(0.0, 100.0), 500);
        context.timers.update_time(1000);
        assert_eq!(scrollable.position(), stopped_at);
        assert!(gesture.is_triggered());
    }
}
