//! Page swiping
//!
//! Dragging a pager along its axis moves towards the adjacent page. The
//! gesture triggers once the pointer passes the slop threshold in a
//! direction the pager's navigation allows, then drives the page move
//! directly from the drag distance. Dragging past a whole page commits it
//! and continues towards the next one.
//!
//! On release the move is either fulfilled or snapped back, decided by
//! distance (at least half a page) or a fling in the direction of travel,
//! and the remainder is animated linearly. A zero-length follow-up action
//! lets the pager finish its own bookkeeping before the gesture resets.

use std::fmt;
use std::sync::{Arc, Weak};

use motive_animation::Action;
use motive_core::{ExecutionResource, ExecutionResourceHolder, Millis, Point, PointerEvent};

use super::fling::{self, FlingState};
use super::{with_gesture, Gesture, GestureRef};
use crate::collaborators::{PageDirection, Pager};
use crate::context::MotionContext;
use crate::page_move::{PageMoveHandler, PageTransition};

pub struct PagerFlingGesture {
    context: MotionContext,
    fling: FlingState,
    pager: Weak<dyn Pager>,
    holder: Arc<ExecutionResourceHolder>,
    current_page: usize,
    target_page: usize,
    direction: PageDirection,
    amount: f32,
    last_animation_amount: f32,
    transition: Option<Box<dyn PageTransition>>,
    action: Option<Action>,
    this: GestureRef,
}

fn as_pager(gesture: &mut Gesture) -> Option<&mut PagerFlingGesture> {
    match gesture {
        Gesture::PagerFling(pager) => Some(pager),
        _ => None,
    }
}

/// Page direction implied by motion along the paging axis
fn direction_for(motion: f32, flipped: bool) -> PageDirection {
    match (motion < 0.0, flipped) {
        (true, false) | (false, true) => PageDirection::Forward,
        (false, false) | (true, true) => PageDirection::Back,
    }
}

fn target_for(direction: PageDirection, current: usize, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    match direction {
        PageDirection::Forward => (current + 1) % count,
        _ => (current + count - 1) % count,
    }
}

fn page_extent(pager: &dyn Pager) -> f32 {
    let size = pager.size();
    if pager.is_horizontal() {
        size.x
    } else {
        size.y
    }
}

fn is_flipped(pager: &dyn Pager) -> bool {
    pager.is_horizontal() && pager.is_rtl()
}

impl PagerFlingGesture {
    pub(crate) fn new(context: &MotionContext, pager: &Arc<dyn Pager>, this: GestureRef) -> Self {
        let resource = ExecutionResource::position(pager.component_id());
        let on_loss = this.clone();
        let holder = ExecutionResourceHolder::create(resource, &context.arbitrator, move || {
            tracing::debug!(%resource, "pager gesture lost its resource");
            with_gesture(&on_loss, Gesture::reset);
        });

        Self {
            context: context.clone(),
            fling: FlingState::new(context.config.clone()),
            pager: Arc::downgrade(pager),
            holder,
            current_page: 0,
            target_page: 0,
            direction: PageDirection::None,
            amount: 0.0,
            last_animation_amount: 0.0,
            transition: None,
            action: None,
            this,
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.fling.triggered
    }

    pub fn direction(&self) -> PageDirection {
        self.direction
    }

    pub fn target_page(&self) -> usize {
        self.target_page
    }

    pub fn reset(&mut self) {
        if let Some(action) = self.action.take() {
            action.terminate();
        }
        if self.transition.is_some() {
            match self.pager.upgrade() {
                Some(pager) => {
                    self.execute_page_move(pager.as_ref(), 0.0);
                    self.end_page_move(pager.as_ref(), false);
                }
                None => self.transition = None,
            }
        }
        // A reversed drag may hold the resource while untriggered
        self.holder.release_resource();
        self.fling.reset();
        self.direction = PageDirection::None;
        self.amount = 0.0;
        self.last_animation_amount = 0.0;
    }

    pub fn release(&mut self) {
        self.holder.release();
        self.reset();
    }

    fn begin_page_move(&mut self, pager: &dyn Pager) {
        let custom = pager.page_move_handler(self.direction, self.current_page, self.target_page);
        self.transition = custom.or_else(|| {
            PageMoveHandler::create(
                &self.context,
                pager,
                self.direction,
                self.current_page,
                self.target_page,
            )
            .map(|handler| Box::new(handler) as Box<dyn PageTransition>)
        });
    }

    fn execute_page_move(&mut self, pager: &dyn Pager, amount: f32) {
        match self.transition.as_mut() {
            Some(transition) => transition.execute(pager, amount),
            None => self
                .context
                .session
                .error("Page move executed with no active page move handler"),
        }
    }

    fn end_page_move(&mut self, pager: &dyn Pager, fulfilled: bool) {
        let Some(mut transition) = self.transition.take() else {
            return;
        };
        transition.reset(pager);
        if fulfilled {
            pager.set_current_page(self.target_page);
        }
    }

    pub fn on_down(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        let Some(pager) = self.pager.upgrade() else {
            self.reset();
            return false;
        };
        if self.fling.triggered && self.transition.is_none() {
            // Settling; too late to catch this move
            self.reset();
        }

        let local = pager.global_to_local().apply(event.position);
        let start_time = self.fling.start_time;
        self.fling.on_down(event, timestamp, local);

        if self.fling.triggered {
            // Catch the running animation and keep dragging from there
            if let Some(action) = self.action.take() {
                action.terminate();
            }
            let mut sign = if self.direction == PageDirection::Forward {
                1.0
            } else {
                -1.0
            };
            if is_flipped(pager.as_ref()) {
                sign = -sign;
            }
            let covered = sign * self.last_animation_amount * page_extent(pager.as_ref());
            self.fling.start_position += Point::on_axis(covered, !pager.is_horizontal());
            self.fling.start_time = start_time;
            tracing::debug!(covered, "chaining page move");
            return true;
        }

        self.current_page = pager.current_page();
        self.target_page = self.current_page;
        true
    }

    pub fn on_move(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        if !self.fling.on_move(event, timestamp) {
            return false;
        }
        let Some(pager) = self.pager.upgrade() else {
            self.reset();
            return false;
        };
        let pager = pager.as_ref();

        let horizontal = pager.is_horizontal();
        let transform = pager.global_to_local();
        let local = transform.apply(event.position);
        let distance = (local - self.fling.start_position).along(!horizontal);
        let direction = direction_for(distance, is_flipped(pager));

        if self.fling.triggered && direction != self.direction {
            tracing::debug!(from = ?self.direction, "page move reversed");
            self.fling.triggered = false;
            self.end_page_move(pager, false);
        }

        if !self.fling.triggered {
            let threshold = fling::to_local_threshold(
                &transform,
                self.context.config.pointer_slop_threshold,
                horizontal,
            );
            if distance.abs() > threshold && pager.available_direction().permits(direction) {
                let slope = self.context.config.swipe_angle_tolerance;
                if !self.fling.is_slope_within_tolerance(local, horizontal, slope) {
                    self.reset();
                    return false;
                }

                self.fling.triggered = true;
                self.holder.take_resource();
                self.direction = direction;
                self.target_page = target_for(direction, self.current_page, pager.page_count());
                tracing::debug!(
                    current = self.current_page,
                    target = self.target_page,
                    "page move triggered"
                );
                self.begin_page_move(pager);
            }
        }

        if self.fling.triggered {
            self.amount = distance.abs() / page_extent(pager);
            if self.amount > 1.0 {
                // A whole page covered: commit it and head for the next one
                self.end_page_move(pager, true);
                if pager.available_direction().permits(direction) {
                    self.fling.start_position = local;
                    self.amount -= 1.0;
                    self.current_page = self.target_page;
                    self.target_page =
                        target_for(direction, self.current_page, pager.page_count());
                    self.begin_page_move(pager);
                } else {
                    self.reset();
                    return true;
                }
            }
            self.last_animation_amount = self.amount;
            self.execute_page_move(pager, self.amount);
        }

        true
    }

    pub fn on_up(&mut self, event: &PointerEvent, timestamp: Millis) -> bool {
        if !self.fling.on_up(event, timestamp) {
            self.reset();
            return false;
        }
        let Some(pager) = self.pager.upgrade() else {
            self.reset();
            return false;
        };

        let local = pager.global_to_local().apply(event.position);
        let distance = (local - self.fling.start_position).along(!pager.is_horizontal());
        if distance.is_finite() {
            self.amount = (distance.abs() / page_extent(pager.as_ref())).min(1.0);
        }
        self.finish_up(pager.as_ref())
    }

    pub fn on_cancel(&mut self, _event: &PointerEvent, _timestamp: Millis) -> bool {
        // The cancel position may lie outside the pager; settle from where we are
        if !self.fling.triggered {
            self.reset();
            return false;
        }
        match self.pager.upgrade() {
            Some(pager) => self.finish_up(pager.as_ref()),
            None => {
                self.reset();
                false
            }
        }
    }

    fn finish_up(&mut self, pager: &dyn Pager) -> bool {
        let horizontal = pager.is_horizontal();
        let transform = pager.global_to_local();
        if fling::is_singular(&transform, horizontal) {
            self.context.session.warn(
                "Singular transform encountered during page switch. Animation impossible, resetting.",
            );
            self.execute_page_move(pager, 0.0);
            self.end_page_move(pager, false);
            self.reset();
            return false;
        }

        let velocity = self.fling.local_velocity(&transform).along(!horizontal);
        let minimum = fling::to_local_velocity_threshold(
            &transform,
            self.context.config.minimum_fling_velocity,
            horizontal,
        );
        let direction = if velocity == 0.0 {
            self.direction
        } else {
            direction_for(velocity, is_flipped(pager))
        };

        let fulfill = !((self.amount < 0.5 && velocity.abs() < minimum)
            || direction != self.direction);
        if !fulfill {
            tracing::debug!(velocity, amount = self.amount, ?direction, "snapping page back");
        }

        self.animate_remainder(fulfill);
        true
    }

    fn animate_remainder(&mut self, fulfill: bool) {
        let duration = self.context.config.default_pager_animation_duration;
        let start = self.amount;
        let remainder = if fulfill { 1.0 - start } else { -start };

        let this = self.this.clone();
        let action = Action::make_animation(&self.context.timers, duration, move |offset| {
            let alpha = if duration == 0 {
                1.0
            } else {
                (offset as f32 / duration as f32).clamp(0.0, 1.0)
            };
            let amount = start + alpha * remainder;
            with_gesture(&this, |gesture| {
                if let Some(gesture) = as_pager(gesture) {
                    gesture.last_animation_amount = amount;
                    if let Some(pager) = gesture.pager.upgrade() {
                        gesture.execute_page_move(pager.as_ref(), amount);
                    }
                }
            });
        });

        let this = self.this.clone();
        action.then(move |_| {
            let mut settled = None;
            with_gesture(&this, |gesture| {
                if let Some(gesture) = as_pager(gesture) {
                    settled = gesture.settle(fulfill);
                }
            });
            // The pager may move pages itself, so it is told with the gesture unlocked
            if let Some((context, pager)) = settled {
                await_page_move_end(&this, &context, pager, fulfill);
            }
        });
        self.action = Some(action);
    }

    /// End the page move and give up the resource, handing back what the
    /// pager notification needs
    fn settle(&mut self, fulfill: bool) -> Option<(MotionContext, Arc<dyn Pager>)> {
        let Some(pager) = self.pager.upgrade() else {
            self.reset();
            return None;
        };

        self.end_page_move(pager.as_ref(), fulfill);
        self.holder.release_resource();
        Some((self.context.clone(), pager))
    }
}

fn await_page_move_end(
    this: &GestureRef,
    context: &MotionContext,
    pager: Arc<dyn Pager>,
    fulfill: bool,
) {
    let action = Action::make(&context.timers, |action| {
        pager.on_page_move_end(fulfill, action);
    });

    let reset = this.clone();
    action.then(move |_| with_gesture(&reset, Gesture::reset));
    with_gesture(this, |gesture| {
        if let Some(gesture) = as_pager(gesture) {
            gesture.action = Some(action);
        }
    });
}

impl fmt::Debug for PagerFlingGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagerFlingGesture")
            .field("triggered", &self.fling.triggered)
            .field("current_page", &self.current_page)
            .field("target_page", &self.target_page)
            .field("direction", &self.direction)
            .field("amount", &self.amount)
            .finish()
    }
}
