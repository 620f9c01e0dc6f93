//! Pointer events and the engine time base

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Engine time in milliseconds. The host supplies it; nothing in the engine
/// reads a wall clock.
pub type Millis = u64;

/// Identifier of a pointer (finger, mouse) as assigned by the host
pub type PointerId = u32;

/// Kind of pointer event delivered by the host dispatcher
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    Cancel,
    /// The pointer was captured by a different target
    TargetChanged,
}

/// A pointer event in global coordinates
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub position: Point,
    #[serde(default)]
    pub pointer_id: PointerId,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, position: Point) -> Self {
        Self {
            kind,
            position,
            pointer_id: 0,
        }
    }

    pub fn down(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Down, Point::new(x, y))
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Move, Point::new(x, y))
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Up, Point::new(x, y))
    }

    pub fn cancel(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Cancel, Point::new(x, y))
    }
}
