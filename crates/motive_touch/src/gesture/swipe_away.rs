//! Swipe-away
//!
//! Dragging the host's child in the configured direction slides it out and
//! a replacement in. The replacement is injected when the gesture triggers;
//! depending on the [`SwipeAwayMode`] the original, the replacement or both
//! follow the pointer.
//!
//! On release the swipe completes when it was fast enough in the swipe
//! direction or travelled far enough; otherwise it springs back. Either way
//! the remainder is animated with the configured easing, and a completed
//! swipe permanently removes the original child.

use std::fmt;
use std::sync::{Arc, Weak};

use motive_animation::{Action, Easing};
use motive_core::{Millis, Point, PointerEvent, Transform2D};

use super::fling::{self, FlingState};
use super::{with_gesture, Gesture, GestureRef, ACTION_SWIPE_AWAY};
use crate::collaborators::{SwipeAwayMode, SwipeChild, SwipeDirection, SwipeHost};
use crate::context::MotionContext;

pub struct SwipeAwayGesture {
    context: MotionContext,
    fling: FlingState,
    host: Weak<dyn SwipeHost>,
    mode: SwipeAwayMode,
    assigned: SwipeDirection,
    /// `assigned` with forward/backward resolved for the current layout
    direction: SwipeDirection,
    /// Travel needed to complete the swipe
    local_distance: f32,
    traveled: f32,
    easing: Easing,
    injected: bool,
    action: Option<Action>,
    this: GestureRef,
}

fn as_swipe(gesture: &mut Gesture) -> Option<&mut SwipeAwayGesture> {
    match gesture {
        Gesture::SwipeAway(swipe) => Some(swipe),
        _ => None,
    }
}

/// Offset of a child fully moved out along `direction`
fn exit_offset(direction: SwipeDirection, size: Point) -> Point {
    match direction {
        SwipeDirection::Left => Point::new(-size.x, 0.0),
        SwipeDirection::Right => Point::new(size.x, 0.0),
        SwipeDirection::Up => Point::new(0.0, -size.y),
        SwipeDirection::Down => Point::new(0.0, size.y),
        SwipeDirection::Forward | SwipeDirection::Backward => Point::ZERO,
    }
}

impl SwipeAwayGesture {
    pub(crate) fn new(
        context: &MotionContext,
        host: &Arc<dyn SwipeHost>,
        mode: SwipeAwayMode,
        direction: SwipeDirection,
        this: GestureRef,
    ) -> Self {
        Self {
            context: context.clone(),
            fling: FlingState::new(context.config.clone()),
            host: Arc::downgrade(host),
            mode,
            assigned: direction,
            direction: direction.resolve(host.is_rtl()),
            local_distance: 0.0,
            traveled: 0.0,
            easing: context.easing(&context.config.swipe_away_animation_easing),
            injected: false,
            action: None,
            this,
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.fling.triggered
    }

    pub fn mode(&self) -> SwipeAwayMode {
        self.mode
    }

    pub fn direction(&self) -> SwipeDirection {
        self.direction
    }

    /// Fraction of the swipe travelled so far
    pub fn progress(&self) -> f32 {
        if self.local_distance > 0.0 {
            self.traveled / self.local_distance
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        if let Some(action) = self.action.take() {
            action.terminate();
        }
        if self.injected {
            if let Some(host) = self.host.upgrade() {
                self.apply_transforms(host.as_ref(), 0.0);
                host.remove_replacement();
            }
            self.injected = false;
        }
        self.traveled = 0.0;
        self.fling.reset();
    }

    pub fn invoke_accessibility_action(&mut self, name: &str) -> bool {
        if name != ACTION_SWIPE_AWAY {
            return false;
        }
        if let Some(host) = self.host.upgrade() {
            self.context
                .timers
                .set_timeout(move || host.on_swipe_done(None), 0);
        }
        true
    }

    fn is_horizontal(&self) -> bool {
        self.direction.is_horizontal()
    }

    /// Travel towards the swipe direction; motion the other way counts as none
    fn travel(&self, local: Point) -> f32 {
        if local == self.fling.start_position {
            return 0.0;
        }
        let delta = self.fling.start_position - local;
        match self.direction {
            SwipeDirection::Left => delta.x.max(0.0),
            SwipeDirection::Right => (-delta.x).max(0.0),
            SwipeDirection::Up => delta.y.max(0.0),
            SwipeDirection::Down => (-delta.y).max(0.0),
            SwipeDirection::Forward | SwipeDirection::Backward => 0.0,
        }
    }

    /// Sign of velocity along the axis that completes the swipe
    fn fulfill_sign(&self) -> f32 {
        match self.direction {
            SwipeDirection::Left | SwipeDirection::Up => -1.0,
            _ => 1.0,
        }
    }

    fn apply_transforms(&self, host: &dyn SwipeHost, alpha: f32) {
        let exit = exit_offset(self.direction, host.size());
        if self.mode.moves_original() {
            let offset = exit * alpha;
            host.set_child_transform(
                SwipeChild::Original,
                Transform2D::translate(offset.x, offset.y),
            );
        }
        if self.mode.moves_replacement() {
            let offset = -exit * (1.0 - alpha);
            host.set_child_transform(
                SwipeChild::Replacement,
                Transform2D::translate(offset.x, offset.y),
            );
        }
    }

    pub fn on_down(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        if self.action.is_some() {
            // Already settling
            return false;
        }
        let Some(host) = self.host.upgrade() else {
            self.reset();
            return false;
        };

        let local = host.global_to_local().apply(event.position);
        self.fling.on_down(event, timestamp, local);

        self.direction = self.assigned.resolve(host.is_rtl());
        let size = host.size();
        self.local_distance = if self.is_horizontal() { size.x } else { size.y };
        self.traveled = 0.0;
        self.local_distance > 0.0
    }

    pub fn on_move(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        if !self.fling.on_move(event, timestamp) || self.action.is_some() {
            return false;
        }
        let Some(host) = self.host.upgrade() else {
            self.reset();
            return false;
        };

        let transform = host.global_to_local();
        let local = transform.apply(event.position);
        let moved = if local.is_finite() {
            self.travel(local)
        } else {
            tracing::debug!("swipe position not representable locally");
            0.0
        };
        let moved = moved.min(self.local_distance);
        if moved == self.traveled {
            return false;
        }
        self.traveled = moved;
        let progress = self.progress();

        if self.fling.triggered {
            self.apply_transforms(host.as_ref(), progress);
        } else {
            let horizontal = self.is_horizontal();
            let threshold = fling::to_local_threshold(
                &transform,
                self.context.config.pointer_slop_threshold,
                horizontal,
            );
            if moved <= threshold {
                return false;
            }
            let slope = self.context.config.swipe_angle_tolerance;
            if !self.fling.is_slope_within_tolerance(local, horizontal, slope) {
                self.reset();
                return false;
            }

            self.fling.triggered = true;
            host.inject_replacement(self.mode != SwipeAwayMode::Reveal);
            self.injected = true;
            self.apply_transforms(host.as_ref(), progress);
            host.cancel_pointer_handlers(local);
            tracing::debug!(direction = %self.direction, mode = ?self.mode, "swipe away triggered");
        }

        host.on_swipe_move(progress, self.direction);
        true
    }

    pub fn on_up(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        if !self.fling.on_up(event, timestamp) {
            self.reset();
            return false;
        }
        if self.action.is_some() {
            return true;
        }
        let Some(host) = self.host.upgrade() else {
            self.reset();
            return false;
        };

        let horizontal = self.is_horizontal();
        let transform = host.global_to_local();
        let velocity = self.fling.local_velocity(&transform).along(!horizontal);

        if fling::is_singular(&transform, horizontal) || !velocity.is_finite() {
            self.context
                .session
                .warn("Singular transform encountered during SwipeAway, aborting swipe");
            self.animate_remainder(host.as_ref(), false, 0.0);
            return true;
        }

        let threshold = fling::to_local_velocity_threshold(
            &transform,
            self.context.config.swipe_velocity_threshold,
            horizontal,
        );
        let fast = self.fulfill_sign() * velocity > 0.0 && velocity.abs() >= threshold;
        let (fulfill, speed) = if fast {
            let limit = self.context.config.swipe_max_velocity / 1000.0;
            (true, velocity.abs().min(limit))
        } else {
            let far = self.progress() >= self.context.config.swipe_away_fulfill_distance_threshold;
            (far, 0.0)
        };

        self.animate_remainder(host.as_ref(), fulfill, speed);
        true
    }

    pub fn on_cancel(&mut self, _event: &PointerEvent, _timestamp: Millis) -> bool {
        if self.action.is_none() {
            self.reset();
        }
        false
    }

    /// Animate from the current progress to 1 (`fulfill`) or 0. `speed` in
    /// local units per millisecond; zero uses the default duration.
    fn animate_remainder(&mut self, host: &dyn SwipeHost, fulfill: bool, speed: f32) {
        let config = &self.context.config;
        let remaining = if fulfill {
            self.local_distance - self.traveled
        } else {
            -self.traveled
        };

        let mut duration = if speed > 0.0 {
            (remaining.abs() / speed) as Millis
        } else {
            config.default_swipe_animation_duration
        };
        duration = duration.min(config.max_swipe_animation_duration);
        if remaining == 0.0 {
            duration = 0;
        }

        let start = self.progress();
        let remaining = if self.local_distance > 0.0 {
            remaining / self.local_distance
        } else {
            0.0
        };
        tracing::debug!(fulfill, duration, "swipe away settling");

        let easing = self.easing.clone();
        let this = self.this.clone();
        let action = Action::make_animation(&self.context.timers, duration, move |offset| {
            let t = if duration == 0 {
                1.0
            } else {
                offset as f32 / duration as f32
            };
            let alpha = (start + easing.calc(t) * remaining).clamp(0.0, 1.0);
            with_gesture(&this, |gesture| {
                if let Some(gesture) = as_swipe(gesture) {
                    gesture.animate_to(alpha);
                }
            });
        });

        if fulfill {
            host.disable_gestures();
        }

        let this = self.this.clone();
        action.then(move |_| {
            let mut settled = None;
            with_gesture(&this, |gesture| {
                if let Some(gesture) = as_swipe(gesture) {
                    settled = gesture.settle(fulfill);
                }
            });
            if let Some((host, direction)) = settled {
                if fulfill {
                    host.remove_original();
                    host.on_swipe_done(Some(direction));
                } else {
                    host.remove_replacement();
                }
            }
        });
        self.action = Some(action);
    }

    fn animate_to(&mut self, alpha: f32) {
        if let Some(host) = self.host.upgrade() {
            self.apply_transforms(host.as_ref(), alpha);
            host.on_swipe_move(alpha, self.direction);
        }
    }

    /// Rest both children and reset. The host is handed back so it can be
    /// told about the outcome once the gesture is unlocked.
    fn settle(&mut self, fulfilled: bool) -> Option<(Arc<dyn SwipeHost>, SwipeDirection)> {
        let host = self.host.upgrade();
        if let Some(host) = &host {
            self.apply_transforms(host.as_ref(), if fulfilled { 1.0 } else { 0.0 });
        }
        let direction = self.direction;
        self.injected = false;
        self.reset();
        host.map(|host| (host, direction))
    }
}

impl fmt::Debug for SwipeAwayGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwipeAwayGesture")
            .field("triggered", &self.fling.triggered)
            .field("mode", &self.mode)
            .field("direction", &self.direction)
            .field("traveled", &self.traveled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{GestureHandle, ACTION_ACTIVATE};
    use crate::testing::{capturing_context, test_context, FakeSwipeHost};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn swipe_handle(
        context: &MotionContext,
        host: &Arc<FakeSwipeHost>,
        mode: SwipeAwayMode,
        direction: SwipeDirection,
    ) -> GestureHandle {
        let dyn_host: Arc<dyn SwipeHost> = host.clone();
        GestureHandle::swipe_away(context, &dyn_host, mode, direction)
    }

    #[test]
    fn test_swiped_far_enough_completes() {
        let context = test_context();
        let host = FakeSwipeHost::new(200.0, 100.0);
        let gesture = swipe_handle(&context, &host, SwipeAwayMode::Slide, SwipeDirection::Left);

        gesture.on_down(&PointerEvent::down(150.0, 50.0), 0);
        assert!(gesture.on_move(&PointerEvent::moved(100.0, 50.0), 100));
        assert!(gesture.is_triggered());
        assert_eq!(host.injected_above(), Some(true));
        assert_eq!(host.transform(SwipeChild::Original).tx, -50.0);
        assert_eq!(host.transform(SwipeChild::Replacement).tx, 150.0);

        gesture.on_move(&PointerEvent::moved(40.0, 50.0), 1000);
        assert!(!gesture.on_move(&PointerEvent::moved(40.0, 50.0), 2000));
        assert!(gesture.on_up(&PointerEvent::up(40.0, 50.0), 2000));
        assert!(host.gestures_disabled());

        context.timers.update_time(context.config.default_swipe_animation_duration + 50);
        assert_eq!(host.original_removed(), 1);
        assert_eq!(host.replacement_removed(), 0);
        assert_eq!(host.done(), vec![Some(SwipeDirection::Left)]);
        assert_eq!(host.transform(SwipeChild::Replacement), Transform2D::IDENTITY);
        assert_eq!(host.last_move(), Some(1.0));
        assert!(!gesture.is_triggered());
    }

    #[test]
    fn test_short_swipe_springs_back() {
        let context = test_context();
        let host = FakeSwipeHost::new(200.0, 100.0);
        let gesture = swipe_handle(&context, &host, SwipeAwayMode::Slide, SwipeDirection::Left);

        gesture.on_down(&PointerEvent::down(150.0, 50.0), 0);
        gesture.on_move(&PointerEvent::moved(130.0, 50.0), 100);
        assert!(gesture.is_triggered());
        gesture.on_move(&PointerEvent::moved(130.0, 50.0), 1000);
        gesture.on_up(&PointerEvent::up(130.0, 50.0), 1000);

        context.timers.update_time(1000);
        assert_eq!(host.replacement_removed(), 1);
        assert_eq!(host.original_removed(), 0);
        assert!(host.done().is_empty());
        assert!(!host.gestures_disabled());
        assert_eq!(host.transform(SwipeChild::Original), Transform2D::IDENTITY);
        assert!(!gesture.is_triggered());
    }

    #[test]
    fn test_fast_fling_completes_early() {
        let context = test_context();
        let host = FakeSwipeHost::new(200.0, 100.0);
        let gesture = swipe_handle(&context, &host, SwipeAwayMode::Slide, SwipeDirection::Left);

        gesture.on_down(&PointerEvent::down(150.0, 50.0), 0);
        gesture.on_move(&PointerEvent::moved(130.0, 50.0), 10);
        gesture.on_move(&PointerEvent::moved(100.0, 50.0), 20);
        gesture.on_up(&PointerEvent::up(100.0, 50.0), 20);

        // 150 remaining at the 2 units/ms cap
        context.timers.update_time(60);
        assert!(host.done().is_empty());
        context.timers.update_time(100);
        assert_eq!(host.done(), vec![Some(SwipeDirection::Left)]);
    }

    #[test]
    fn test_wrong_direction_ignored() {
        let context = test_context();
        let host = FakeSwipeHost::new(200.0, 100.0);
        let gesture = swipe_handle(&context, &host, SwipeAwayMode::Slide, SwipeDirection::Left);

        gesture.on_down(&PointerEvent::down(50.0, 50.0), 0);
        assert!(!gesture.on_move(&PointerEvent::moved(150.0, 50.0), 100));
        assert!(!gesture.is_triggered());
        assert!(!gesture.on_up(&PointerEvent::up(150.0, 50.0), 200));
        assert_eq!(host.injected_above(), None);
    }

    #[test]
    fn test_forward_resolves_against_layout() {
        let context = test_context();
        let host = FakeSwipeHost::new(200.0, 100.0);
        host.set_rtl(true);
        let gesture =
            swipe_handle(&context, &host, SwipeAwayMode::Cover, SwipeDirection::Forward);

        gesture.on_down(&PointerEvent::down(150.0, 50.0), 0);
        assert!(gesture.on_move(&PointerEvent::moved(100.0, 50.0), 100));
        assert_eq!(
            gesture.with(|g| as_swipe(g).map(|s| s.direction())),
            Some(SwipeDirection::Left)
        );
        // Cover only moves the replacement
        assert!(host.has_transform(SwipeChild::Replacement));
        assert!(!host.has_transform(SwipeChild::Original));
    }

    #[test]
    fn test_reveal_injects_below() {
        let context = test_context();
        let host = FakeSwipeHost::new(200.0, 100.0);
        let gesture = swipe_handle(&context, &host, SwipeAwayMode::Reveal, SwipeDirection::Down);

        gesture.on_down(&PointerEvent::down(100.0, 10.0), 0);
        gesture.on_move(&PointerEvent::moved(100.0, 60.0), 100);
        assert_eq!(host.injected_above(), Some(false));
        assert_eq!(host.transform(SwipeChild::Original).ty, 50.0);
        assert!(!host.has_transform(SwipeChild::Replacement));
    }

    #[test]
    fn test_cancel_restores_original() {
        let context = test_context();
        let host = FakeSwipeHost::new(200.0, 100.0);
        let gesture = swipe_handle(&context, &host, SwipeAwayMode::Slide, SwipeDirection::Right);

        gesture.on_down(&PointerEvent::down(50.0, 50.0), 0);
        gesture.on_move(&PointerEvent::moved(120.0, 50.0), 100);
        assert!(gesture.is_triggered());
        assert!(!gesture.on_cancel(&PointerEvent::cancel(120.0, 50.0), 150));
        assert_eq!(host.replacement_removed(), 1);
        assert_eq!(host.transform(SwipeChild::Original), Transform2D::IDENTITY);
    }

    #[test]
    fn test_singular_transform_springs_back() {
        let (context, session) = capturing_context();
        let host = FakeSwipeHost::new(200.0, 100.0);
        let gesture = swipe_handle(&context, &host, SwipeAwayMode::Slide, SwipeDirection::Left);

        gesture.on_down(&PointerEvent::down(150.0, 50.0), 0);
        gesture.on_move(&PointerEvent::moved(40.0, 50.0), 100);
        host.set_transform(Transform2D::scale(0.0, 0.0).inverse());
        assert!(gesture.on_up(&PointerEvent::up(40.0, 50.0), 200));
        assert_eq!(session.count(), 1);

        context.timers.update_time(1000);
        assert_eq!(host.replacement_removed(), 1);
        assert!(host.done().is_empty());
    }

    #[test]
    fn test_accessibility_action() {
        let context = test_context();
        let host = FakeSwipeHost::new(200.0, 100.0);
        let gesture = swipe_handle(&context, &host, SwipeAwayMode::Slide, SwipeDirection::Left);

        assert_eq!(gesture.accessibility_actions(), &[ACTION_SWIPE_AWAY]);
        assert!(!gesture.invoke_accessibility_action(ACTION_ACTIVATE));
        assert!(gesture.invoke_accessibility_action(ACTION_SWIPE_AWAY));
        assert!(host.done().is_empty());
        context.timers.run_pending();
        assert_eq!(host.done(), vec![None]);
    }

    #[test]
    fn test_host_can_query_gesture_when_swipe_completes() {
        let context = test_context();
        let host = FakeSwipeHost::new(200.0, 100.0);
        let gesture = swipe_handle(&context, &host, SwipeAwayMode::Slide, SwipeDirection::Left);

        let still_triggered = Arc::new(AtomicBool::new(true));
        {
            let gesture = gesture.clone();
            let still_triggered = still_triggered.clone();
            host.set_on_done(move || {
                still_triggered.store(gesture.is_triggered(), Ordering::SeqCst);
            });
        }

        let (sender, receiver) = mpsc::channel();
        let worker = {
            let context = context.clone();
            let gesture = gesture.clone();
            thread::spawn(move || {
                gesture.on_down(&PointerEvent::down(150.0, 50.0), 0);
                gesture.on_move(&PointerEvent::moved(100.0, 50.0), 100);
                gesture.on_move(&PointerEvent::moved(40.0, 50.0), 1000);
                gesture.on_move(&PointerEvent::moved(40.0, 50.0), 2000);
                gesture.on_up(&PointerEvent::up(40.0, 50.0), 2000);
                context
                    .timers
                    .update_time(context.config.default_swipe_animation_duration + 50);
                sender.send(()).unwrap();
            })
        };

        assert!(
            receiver.recv_timeout(Duration::from_secs(3)).is_ok(),
            "settling hung while the host inspected the gesture"
        );
        worker.join().unwrap();
        assert_eq!(host.done(), vec![Some(SwipeDirection::Left)]);
        assert!(!still_triggered.load(Ordering::SeqCst));
    }
}
