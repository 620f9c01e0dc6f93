//! Eased scroll animation
//!
//! An [`AutoScroller`] moves a [`Scrollable`] towards a target offset over a
//! fixed duration, driven by an animator on the [`TimeManager`]. It is built
//! either from an explicit target (snapping, scroll commands) or from a
//! release velocity, in which case the travel is the stopping distance under
//! constant deceleration.
//!
//! The scrollable's range is re-read on every tick, so content that grows
//! or shrinks mid-flight clamps the motion instead of being overshot. A
//! scroll position changed by someone else between ticks shifts the start
//! anchor rather than causing a jump.
//!
//! The finish callback is delivered on a zero-delay timeout, never from
//! inside the constructor or the tick itself.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use motive_animation::{Easing, TimeManager, TimerId};
use motive_core::{Millis, Point};

use crate::collaborators::Scrollable;
use crate::context::MotionContext;

const MS_PER_SECOND: f32 = 1000.0;

pub type FinishCallback = Box<dyn FnOnce() + Send>;

struct ScrollerState {
    scrollable: Weak<dyn Scrollable>,
    easing: Easing,
    start: Point,
    last: Point,
    end_target: Point,
    duration: Millis,
    finish: Option<FinishCallback>,
}

impl ScrollerState {
    /// Re-anchor when the position was changed behind our back
    fn fix_start(&mut self, scrollable: &dyn Scrollable) {
        let current = scrollable.scroll_position();
        if current != self.last {
            let diff = current - self.last;
            self.start += diff;
            self.last = current;
            tracing::trace!(dx = diff.x, dy = diff.y, "scroller re-anchored");
        }
    }

    /// Advance to `offset` ms into the animation. Returns the finish
    /// callback when the scroll is complete.
    fn update(&mut self, offset: Millis) -> Option<FinishCallback> {
        self.finish.as_ref()?;
        let Some(scrollable) = self.scrollable.upgrade() else {
            // Component is gone; nothing left to finish
            self.finish = None;
            return None;
        };

        let alpha = self.easing.calc(offset as f32 / self.duration as f32);
        let delta = self.end_target * alpha;

        self.fix_start(scrollable.as_ref());
        let available = scrollable.trim_scroll(self.start + self.end_target);
        self.fix_start(scrollable.as_ref());

        let vertical = scrollable.is_vertical();
        let rtl = !vertical && scrollable.is_rtl();
        let target = (self.start + delta).along(vertical);
        let end_target = (self.start + self.end_target).along(vertical);
        let available = available.along(vertical);

        let resulting = if rtl {
            if target >= end_target {
                available.max(target)
            } else {
                available.min(target)
            }
        } else if target <= end_target {
            available.min(target)
        } else {
            available.max(target)
        };

        self.last = Point::on_axis(resulting, vertical);
        scrollable.set_scroll_position(resulting);

        if offset == 0 {
            return None;
        }

        let finished = if rtl {
            target >= 0.0 || (end_target < target && available > target) || offset >= self.duration
        } else {
            target <= 0.0 || (end_target > target && available < target) || offset >= self.duration
        };
        if finished {
            self.finish.take()
        } else {
            None
        }
    }
}

fn deliver(timers: &TimeManager, finish: FinishCallback) {
    timers.set_timeout(finish, 0);
}

/// Time-driven eased scroll of one [`Scrollable`]
pub struct AutoScroller {
    timers: Arc<TimeManager>,
    timer: TimerId,
    duration: Millis,
    state: Arc<Mutex<ScrollerState>>,
}

impl AutoScroller {
    /// Fling with `velocity` (local units per ms, pointer direction)
    ///
    /// Returns `None` when there is no velocity along the scrolling axis.
    pub fn with_velocity<F>(
        context: &MotionContext,
        scrollable: &Arc<dyn Scrollable>,
        velocity: Point,
        finish: F,
    ) -> Option<AutoScroller>
    where
        F: FnOnce() + Send + 'static,
    {
        let vertical = scrollable.is_vertical();
        let directional = velocity.along(vertical);
        if directional == 0.0 {
            context
                .session
                .warn("Can't create a scroller with 0 velocity");
            return None;
        }

        let config = &context.config;
        let deceleration = -directional * config.scroller_deceleration;
        // s = v^2 / 2a; the pointer moves opposite to the content
        let distance = directional * directional / (2.0 * deceleration) * MS_PER_SECOND;
        let duration = ((distance / directional).abs() as Millis).min(config.scroller_max_duration);
        tracing::debug!(velocity = directional, distance, duration, "fling scroller");

        let easing = context.easing(&config.scroller_velocity_easing);
        Some(Self::start(
            context,
            scrollable,
            easing,
            Point::new(distance, distance),
            duration,
            Box::new(finish),
        ))
    }

    /// Scroll by `target` over `duration`
    ///
    /// `target` is an offset from the current scroll position, never an
    /// absolute position, including for a zero duration. A zero duration
    /// jumps straight there and returns `None`; the finish callback still
    /// runs on the next timer flush.
    pub fn to_target<F>(
        context: &MotionContext,
        scrollable: &Arc<dyn Scrollable>,
        target: Point,
        duration: Millis,
        finish: F,
    ) -> Option<AutoScroller>
    where
        F: FnOnce() + Send + 'static,
    {
        if duration == 0 {
            let vertical = scrollable.is_vertical();
            let position = scrollable.scroll_position() + target;
            let position = scrollable.trim_scroll(position).along(vertical);
            scrollable.set_scroll_position(position);
            deliver(&context.timers, Box::new(finish));
            return None;
        }

        let easing = context.easing(&context.config.scroller_duration_easing);
        Some(Self::start(
            context,
            scrollable,
            easing,
            target,
            duration,
            Box::new(finish),
        ))
    }

    fn start(
        context: &MotionContext,
        scrollable: &Arc<dyn Scrollable>,
        easing: Easing,
        end_target: Point,
        duration: Millis,
        finish: FinishCallback,
    ) -> AutoScroller {
        let position = scrollable.scroll_position();
        let state = Arc::new(Mutex::new(ScrollerState {
            scrollable: Arc::downgrade(scrollable),
            easing,
            start: position,
            last: position,
            end_target,
            duration,
            finish: Some(finish),
        }));

        let ticking = state.clone();
        let timers = Arc::downgrade(&context.timers);
        let timer = context.timers.set_animator(
            move |elapsed| {
                let finish = ticking.lock().unwrap().update(elapsed);
                if let (Some(finish), Some(timers)) = (finish, timers.upgrade()) {
                    deliver(&timers, finish);
                }
            },
            duration,
        );

        AutoScroller {
            timers: context.timers.clone(),
            timer,
            duration,
            state,
        }
    }

    pub fn duration(&self) -> Millis {
        self.duration
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().unwrap().finish.is_none()
    }

    /// Drive the scroll to `offset` ms without waiting for the clock
    pub fn update_offset(&self, offset: Millis) {
        let finish = self.state.lock().unwrap().update(offset.min(self.duration));
        if let Some(finish) = finish {
            deliver(&self.timers, finish);
        }
    }

    /// Point the scroller at a different component, keeping its progress
    pub fn replace_target(&self, scrollable: &Arc<dyn Scrollable>) {
        let mut state = self.state.lock().unwrap();
        state.scrollable = Arc::downgrade(scrollable);
        state.fix_start(scrollable.as_ref());
    }
}

impl Drop for AutoScroller {
    fn drop(&mut self) {
        self.timers.clear_timeout(self.timer);
    }
}

impl fmt::Debug for AutoScroller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoScroller")
            .field("timer", &self.timer)
            .field("duration", &self.duration)
            .field("finished", &self.is_finished())
            .finish()
    }
}
