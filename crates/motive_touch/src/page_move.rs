//! Page transitions
//!
//! While a page move is in progress the pager shows two pages at once: the
//! current one leaving and the target one arriving. A [`PageTransition`]
//! turns the move's progress (`0..=1`) into whatever visual state the pager
//! wants. [`PageMoveHandler`] is the default: both pages slide along the
//! paging axis, eased by the configured pager easing.

use motive_animation::Easing;
use motive_core::{Point, Transform2D};

use crate::collaborators::{PageDirection, Pager};
use crate::context::MotionContext;

/// Visual state of a page move in progress
pub trait PageTransition: Send {
    /// Apply progress `amount` in `0..=1`
    fn execute(&mut self, pager: &dyn Pager, amount: f32);

    /// Restore both pages to their resting state
    fn reset(&mut self, pager: &dyn Pager);
}

/// Default slide between two pages
#[derive(Debug)]
pub struct PageMoveHandler {
    current: usize,
    target: usize,
    vertical: bool,
    /// Resting offset of the leaving page at the end of the move
    current_exit: f32,
    /// Offset of the arriving page at the start of the move
    target_entry: f32,
    easing: Easing,
}

impl PageMoveHandler {
    /// Build the default transition, or `None` if either page is missing
    pub fn create(
        context: &MotionContext,
        pager: &dyn Pager,
        direction: PageDirection,
        current: usize,
        target: usize,
    ) -> Option<PageMoveHandler> {
        let count = pager.page_count();
        if current >= count || target >= count {
            context.session.error(&format!(
                "Page move from {} to {} outside the {} available pages",
                current, target, count
            ));
            return None;
        }

        let horizontal = pager.is_horizontal();
        let mut from_left = direction == PageDirection::Forward;
        if horizontal && pager.is_rtl() {
            from_left = !from_left;
        }

        let size = pager.size();
        let shift = if horizontal { size.x } else { size.y };
        let mut handler = PageMoveHandler {
            current,
            target,
            vertical: !horizontal,
            current_exit: if from_left { -shift } else { shift },
            target_entry: if from_left { shift } else { -shift },
            easing: context.easing(&context.config.default_pager_animation_easing),
        };
        handler.reset(pager);
        Some(handler)
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn target_page(&self) -> usize {
        self.target
    }

    fn translate(&self, offset: f32) -> Transform2D {
        let shift = Point::on_axis(offset, self.vertical);
        Transform2D::translate(shift.x, shift.y)
    }
}

impl PageTransition for PageMoveHandler {
    fn execute(&mut self, pager: &dyn Pager, amount: f32) {
        let eased = self.easing.calc(amount);
        pager.set_page_transform(self.current, self.translate(self.current_exit * eased));
        pager.set_page_transform(
            self.target,
            self.translate(self.target_entry * (1.0 - eased)),
        );
    }

    fn reset(&mut self, pager: &dyn Pager) {
        pager.set_page_transform(self.current, Transform2D::IDENTITY);
        pager.set_page_transform(self.target, Transform2D::IDENTITY);
    }
}
