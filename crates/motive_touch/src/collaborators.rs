//! Component-side interfaces consumed by gestures
//!
//! Gestures never own the component they drive. They hold these traits
//! weakly and treat a failed upgrade as "the component is gone".

use std::fmt;

use motive_animation::Action;
use motive_core::{ComponentId, Point, Transform2D};

use crate::page_move::PageTransition;

/// A component with a scroll offset along one axis
pub trait Scrollable: Send + Sync {
    fn component_id(&self) -> ComponentId;

    fn is_vertical(&self) -> bool;

    fn is_horizontal(&self) -> bool {
        !self.is_vertical()
    }

    fn is_rtl(&self) -> bool {
        false
    }

    fn scroll_position(&self) -> Point;

    /// Clamp a candidate scroll position to the scrollable range
    fn trim_scroll(&self, candidate: Point) -> Point;

    /// Write the scroll offset along the scrolling axis
    fn set_scroll_position(&self, value: f32);

    /// Offset to the nearest snap point, zero when already aligned
    fn snap_offset(&self) -> Point {
        Point::ZERO
    }

    fn should_force_snap(&self) -> bool {
        false
    }

    fn global_to_local(&self) -> Transform2D;

    /// Size of the viewport the component is shown in
    fn viewport(&self) -> Point;
}

/// Direction of a page change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageDirection {
    None,
    Forward,
    Back,
    Both,
}

impl PageDirection {
    /// True when motion in `direction` is allowed
    pub fn permits(self, direction: PageDirection) -> bool {
        self == direction || self == PageDirection::Both
    }
}

/// A component showing one page at a time
pub trait Pager: Send + Sync {
    fn component_id(&self) -> ComponentId;

    fn is_horizontal(&self) -> bool;

    fn is_rtl(&self) -> bool {
        false
    }

    fn global_to_local(&self) -> Transform2D;

    /// Inner bounds of the pager
    fn size(&self) -> Point;

    fn page_count(&self) -> usize;

    fn current_page(&self) -> usize;

    /// Directions navigation allows from the current page
    fn available_direction(&self) -> PageDirection;

    fn set_current_page(&self, index: usize);

    fn set_page_transform(&self, index: usize, transform: Transform2D);

    /// Custom transition for a page move; `None` uses the default slide
    fn page_move_handler(
        &self,
        _direction: PageDirection,
        _current: usize,
        _target: usize,
    ) -> Option<Box<dyn PageTransition>> {
        None
    }

    /// Called once a page move settles. `done` must be resolved when the
    /// pager has finished its own bookkeeping.
    fn on_page_move_end(&self, _fulfilled: bool, done: &Action) {
        done.resolve();
    }
}

/// Direction a swipe-away gesture travels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
    /// Right, or left under right-to-left layout
    Forward,
    /// Left, or right under right-to-left layout
    Backward,
}

impl SwipeDirection {
    pub fn is_horizontal(self) -> bool {
        !matches!(self, SwipeDirection::Up | SwipeDirection::Down)
    }

    /// Resolve `Forward`/`Backward` against the layout direction
    pub fn resolve(self, rtl: bool) -> SwipeDirection {
        match (self, rtl) {
            (SwipeDirection::Forward, false) | (SwipeDirection::Backward, true) => {
                SwipeDirection::Right
            }
            (SwipeDirection::Forward, true) | (SwipeDirection::Backward, false) => {
                SwipeDirection::Left
            }
            (direction, _) => direction,
        }
    }
}

impl fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
            SwipeDirection::Up => "up",
            SwipeDirection::Down => "down",
            SwipeDirection::Forward => "forward",
            SwipeDirection::Backward => "backward",
        };
        f.write_str(name)
    }
}

/// Visual style of a swipe-away
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SwipeAwayMode {
    /// The original slides out, uncovering the replacement underneath
    Reveal,
    /// Both move together
    #[default]
    Slide,
    /// The replacement slides in over the original
    Cover,
}

impl SwipeAwayMode {
    pub fn moves_original(self) -> bool {
        matches!(self, SwipeAwayMode::Reveal | SwipeAwayMode::Slide)
    }

    pub fn moves_replacement(self) -> bool {
        matches!(self, SwipeAwayMode::Cover | SwipeAwayMode::Slide)
    }
}

/// Which child of a swipe host a transform applies to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwipeChild {
    Original,
    Replacement,
}

/// A container whose child can be swiped away and replaced
pub trait SwipeHost: Send + Sync {
    fn component_id(&self) -> ComponentId;

    fn is_rtl(&self) -> bool {
        false
    }

    fn global_to_local(&self) -> Transform2D;

    fn size(&self) -> Point;

    /// Insert the replacement child, above or below the original
    fn inject_replacement(&self, above: bool);

    fn set_child_transform(&self, child: SwipeChild, transform: Transform2D);

    /// Drop the replacement after an abandoned swipe
    fn remove_replacement(&self);

    /// Drop the original after a completed swipe
    fn remove_original(&self);

    /// Progress notification with travel in `0..=1`
    fn on_swipe_move(&self, _position: f32, _direction: SwipeDirection) {}

    /// The swipe completed; `None` when completed without a pointer
    fn on_swipe_done(&self, direction: Option<SwipeDirection>);

    /// Called once a swipe is certain to complete
    fn disable_gestures(&self) {}

    /// Cancel any pointer handlers the host started for this touch
    fn cancel_pointer_handlers(&self, _local: Point) {}
}

/// A component that reacts to a press
pub trait TapTarget: Send + Sync {
    fn global_to_local(&self) -> Transform2D;

    fn on_press(&self);
}
