//! Programmatic position changes
//!
//! Commands that move a component's scroll offset or page take the
//! component's position resource away from whoever holds it first, so an
//! in-flight gesture or scroll stops before the new value lands.

use std::sync::{Arc, Mutex};

use motive_animation::{Action, ClaimAction};
use motive_core::{ExecutionResource, Point};

use crate::auto_scroller::AutoScroller;
use crate::collaborators::{Pager, Scrollable};
use crate::context::MotionContext;

/// Jump to `value` along the scrolling axis, clamped to the scroll range
pub fn set_scroll_position(context: &MotionContext, scrollable: &dyn Scrollable, value: f32) {
    let resource = ExecutionResource::position(scrollable.component_id());
    context.arbitrator.release_resource(resource);

    let vertical = scrollable.is_vertical();
    let trimmed = scrollable.trim_scroll(Point::on_axis(value, vertical));
    scrollable.set_scroll_position(trimmed.along(vertical));
}

/// Scroll to `value` over the configured command duration
///
/// The returned action holds the position resource while it runs and
/// resolves once the scroll settles. Terminating it, or losing the
/// resource to a gesture, stops the scroll where it is.
pub fn scroll_to(context: &MotionContext, scrollable: &Arc<dyn Scrollable>, value: f32) -> Action {
    let resource = ExecutionResource::position(scrollable.component_id());
    context.arbitrator.release_resource(resource);

    let vertical = scrollable.is_vertical();
    let current = scrollable.scroll_position();
    let target = scrollable.trim_scroll(Point::on_axis(value, vertical));
    let offset = Point::on_axis((target - current).along(vertical), vertical);

    Action::make(&context.timers, |action| {
        if offset.along(vertical) == 0.0 {
            action.resolve();
            return;
        }

        context.arbitrator.claim_action(resource, action);
        let weak = action.downgrade_handle();
        let arbitrator = context.arbitrator.clone();
        let scroller = AutoScroller::to_target(
            context,
            scrollable,
            offset,
            context.config.scroll_command_duration,
            move || {
                if let Some(action) = weak.upgrade() {
                    arbitrator.release_if_owned(resource, action.owner_id());
                    action.resolve();
                }
            },
        );

        let slot = Arc::new(Mutex::new(scroller));
        let weak = action.downgrade_handle();
        let arbitrator = context.arbitrator.clone();
        action.add_terminate_callback(move || {
            slot.lock().unwrap().take();
            if let Some(action) = weak.upgrade() {
                arbitrator.release_if_owned(resource, action.owner_id());
            }
        });
        tracing::debug!(%resource, value, "scroll command started");
    })
}

/// Show page `index`. Returns false if the pager has no such page.
pub fn set_page(context: &MotionContext, pager: &dyn Pager, index: usize) -> bool {
    let resource = ExecutionResource::position(pager.component_id());
    context.arbitrator.release_resource(resource);

    let count = pager.page_count();
    if index >= count {
        tracing::warn!(index, count, "page out of range");
        return false;
    }
    pager.set_current_page(index);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::GestureHandle;
    use crate::testing::{test_context, FakePager, FakeScrollable};
    use motive_core::PointerEvent;

    #[test]
    fn test_set_scroll_position_clamps() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        set_scroll_position(&context, scrollable.as_ref(), 5000.0);
        assert_eq!(scrollable.position(), 1700.0);
        set_scroll_position(&context, scrollable.as_ref(), -5.0);
        assert_eq!(scrollable.position(), 0.0);
    }

    #[test]
    fn test_set_scroll_position_preempts_gesture() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        let dyn_scrollable: Arc<dyn Scrollable> = scrollable.clone();
        let gesture = GestureHandle::scroll(&context, &dyn_scrollable);

        gesture.on_down(&PointerEvent::down(0.0, 300.0), 0);
        gesture.on_move(&PointerEvent::moved(0.0, 200.0), 100);
        assert!(gesture.is_triggered());

        set_scroll_position(&context, scrollable.as_ref(), 500.0);
        assert!(!gesture.is_triggered());
        assert_eq!(scrollable.position(), 500.0);
        assert!(!context
            .arbitrator
            .is_claimed(ExecutionResource::position(scrollable.id())));
    }

    #[test]
    fn test_scroll_to_animates_and_resolves() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        let dyn_scrollable: Arc<dyn Scrollable> = scrollable.clone();
        let resource = ExecutionResource::position(scrollable.id());

        let action = scroll_to(&context, &dyn_scrollable, 400.0);
        assert!(action.is_pending());
        assert!(context.arbitrator.is_held_by(resource, action.owner_id()));

        context.timers.update_time(500);
        let midway = scrollable.position();
        assert!(midway > 0.0 && midway < 400.0);

        context.timers.update_time(context.config.scroll_command_duration);
        assert!((scrollable.position() - 400.0).abs() < 1e-3);
        assert!(action.is_resolved());
        assert!(!context.arbitrator.is_claimed(resource));
    }

    #[test]
    fn test_scroll_to_current_position_resolves_at_once() {
        let context = test_context();
        let scrollable: Arc<dyn Scrollable> = FakeScrollable::vertical(300.0, 2000.0);
        let action = scroll_to(&context, &scrollable, -100.0);
        assert!(action.is_resolved());
    }

    #[test]
    fn test_gesture_preempts_scroll_to() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        let dyn_scrollable: Arc<dyn Scrollable> = scrollable.clone();
        let gesture = GestureHandle::scroll(&context, &dyn_scrollable);

        let action = scroll_to(&context, &dyn_scrollable, 400.0);
        gesture.on_down(&PointerEvent::down(0.0, 300.0), 0);
        gesture.on_move(&PointerEvent::moved(0.0, 250.0), 100);
        assert!(gesture.is_triggered());
        assert!(action.is_terminated());
        assert_eq!(scrollable.position(), 50.0);

        context.timers.update_time(2000);
        assert_eq!(scrollable.position(), 50.0);
    }

    #[test]
    fn test_terminating_scroll_to_stops_it() {
        let context = test_context();
        let scrollable = FakeScrollable::vertical(300.0, 2000.0);
        let dyn_scrollable: Arc<dyn Scrollable> = scrollable.clone();

        let action = scroll_to(&context, &dyn_scrollable, 400.0);
        context.timers.update_time(100);
        action.terminate();
        let stopped_at = scrollable.position();
        assert_eq!(context.timers.size(), 0);

        context.timers.update_time(2000);
        assert_eq!(scrollable.position(), stopped_at);
    }

    #[test]
    fn test_set_page() {
        let context = test_context();
        let pager = FakePager::horizontal(3, 400.0);
        let dyn_pager: Arc<dyn Pager> = pager.clone();
        let gesture = GestureHandle::pager_fling(&context, &dyn_pager);

        gesture.on_down(&PointerEvent::down(300.0, 0.0), 0);
        gesture.on_move(&PointerEvent::moved(200.0, 0.0), 100);
        assert!(gesture.is_triggered());

        assert!(set_page(&context, pager.as_ref(), 2));
        assert!(!gesture.is_triggered());
        assert_eq!(pager.current_page(), 2);

        assert!(!set_page(&context, pager.as_ref(), 3));
        assert_eq!(pager.current_page(), 2);
    }
}
