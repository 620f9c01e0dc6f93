//! Tap
//!
//! A press fires when the pointer comes up no further than the slop
//! threshold from where it went down. Moving further abandons the tap for
//! the rest of the sequence.

use std::fmt;
use std::sync::{Arc, Weak};

use motive_core::{Millis, MotionConfig, Point, PointerEvent};

use super::ACTION_ACTIVATE;
use crate::collaborators::TapTarget;
use crate::context::MotionContext;

pub struct TapGesture {
    config: Arc<MotionConfig>,
    target: Weak<dyn TapTarget>,
    /// Local down position while a tap is still possible
    start: Option<Point>,
}

impl TapGesture {
    pub(crate) fn new(context: &MotionContext, target: &Arc<dyn TapTarget>) -> Self {
        Self {
            config: context.config.clone(),
            target: Arc::downgrade(target),
            start: None,
        }
    }

    /// True between a down and the matching up while within the slop
    pub fn is_pressed(&self) -> bool {
        self.start.is_some()
    }

    pub fn reset(&mut self) {
        self.start = None;
    }

    fn within_slop(&self, target: &dyn TapTarget, position: Point) -> bool {
        let Some(start) = self.start else {
            return false;
        };
        let local = target.global_to_local().apply(position);
        local.is_finite() && start.distance(local) <= self.config.pointer_slop_threshold
    }

    pub fn on_down(&mut self, event: &PointerEvent, _timestamp: Millis) -> bool {
        let Some(target) = self.target.upgrade() else {
            self.reset();
            return false;
        };
        let local = target.global_to_local().apply(event.position);
        self.start = local.is_finite().then_some(local);
        self.start.is_some()
    }

    pub fn on_move(&mut self, event: &PointerEvent, _timestamp: Millis) -> bool {
        let Some(target) = self.target.upgrade() else {
            self.reset();
            return false;
        };
        if self.start.is_some() && !self.within_slop(target.as_ref(), event.position) {
            tracing::trace!("tap abandoned");
            self.reset();
        }
        false
    }

    pub fn on_up(&mut self, event: &PointerEvent, _timestamp: Millis) -> bool {
        let Some(target) = self.target.upgrade() else {
            self.reset();
            return false;
        };
        let pressed = self.within_slop(target.as_ref(), event.position);
        self.reset();
        if pressed {
            target.on_press();
        }
        pressed
    }

    pub fn on_cancel(&mut self, _event: &PointerEvent, _timestamp: Millis) -> bool {
        self.reset();
        false
    }

    pub fn invoke_accessibility_action(&mut self, name: &str) -> bool {
        if name != ACTION_ACTIVATE {
            return false;
        }
        match self.target.upgrade() {
            Some(target) => {
                target.on_press();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for TapGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapGesture")
            .field("start", &self.start)
            .finish()
    }
}
