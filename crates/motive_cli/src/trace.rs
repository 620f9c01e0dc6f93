//! Recorded pointer traces
//!
//! A trace is a TOML file describing a vertical scrollable and the pointer
//! events delivered to it:
//!
//! ```toml
//! viewport = 300.0
//! content = 2000.0
//! tick = 16
//! settle = 3000
//!
//! [[events]]
//! time = 0
//! kind = "down"
//! x = 0.0
//! y = 100.0
//! ```

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use motive_core::{ComponentId, Millis, Point, PointerEvent, PointerEventKind, Transform2D};
use motive_touch::{GestureHandle, MotionContext, Scrollable};
use serde::{Deserialize, Serialize};

fn default_tick() -> Millis {
    16
}

fn default_settle() -> Millis {
    3000
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Trace {
    pub viewport: f32,
    pub content: f32,
    /// Interval between reported frames
    #[serde(default = "default_tick")]
    pub tick: Millis,
    /// Time to keep running after the last event
    #[serde(default = "default_settle")]
    pub settle: Millis,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct TraceEvent {
    pub time: Millis,
    pub kind: PointerEventKind,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl TraceEvent {
    fn pointer_event(&self) -> PointerEvent {
        PointerEvent::new(self.kind, Point::new(self.x, self.y))
    }
}

impl Trace {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut trace: Trace = toml::from_str(text).context("Failed to parse trace")?;
        if trace.tick == 0 {
            anyhow::bail!("Trace tick must be at least 1ms");
        }
        trace.events.sort_by_key(|event| event.time);
        Ok(trace)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid trace {}", path.display()))
    }
}

/// A vertical list that exists only in memory
pub struct VirtualScrollable {
    viewport: f32,
    content: f32,
    position: Mutex<f32>,
}

impl VirtualScrollable {
    pub fn new(viewport: f32, content: f32) -> Arc<Self> {
        Arc::new(Self {
            viewport,
            content,
            position: Mutex::new(0.0),
        })
    }

    pub fn position(&self) -> f32 {
        *self.position.lock().unwrap()
    }
}

impl Scrollable for VirtualScrollable {
    fn component_id(&self) -> ComponentId {
        1
    }

    fn is_vertical(&self) -> bool {
        true
    }

    fn scroll_position(&self) -> Point {
        Point::new(0.0, self.position())
    }

    fn trim_scroll(&self, candidate: Point) -> Point {
        let max = (self.content - self.viewport).max(0.0);
        Point::new(0.0, candidate.y.clamp(0.0, max))
    }

    fn set_scroll_position(&self, value: f32) {
        *self.position.lock().unwrap() = value;
    }

    fn global_to_local(&self) -> Transform2D {
        Transform2D::IDENTITY
    }

    fn viewport(&self) -> Point {
        Point::new(self.viewport, self.viewport)
    }
}

/// State of the scrollable at one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub time: Millis,
    pub position: f32,
    pub triggered: bool,
}

/// Run `trace` through a scroll gesture, sampling every `tick`
pub fn replay(context: &MotionContext, trace: &Trace) -> Vec<Frame> {
    let scrollable = VirtualScrollable::new(trace.viewport, trace.content);
    let dyn_scrollable: Arc<dyn Scrollable> = scrollable.clone();
    let gesture = GestureHandle::scroll(context, &dyn_scrollable);

    let last_event = trace.events.last().map_or(0, |event| event.time);
    let end = last_event.saturating_add(trace.settle);
    let mut events = trace.events.iter().peekable();
    let mut frames = Vec::new();
    let mut time = 0;

    loop {
        while let Some(event) = events.next_if(|event| event.time <= time) {
            context.timers.update_time(event.time);
            let consumed = gesture.handle_event(&event.pointer_event(), event.time);
            tracing::debug!(time = event.time, kind = ?event.kind, consumed, "event");
        }
        context.timers.update_time(time);
        frames.push(Frame {
            time,
            position: scrollable.position(),
            triggered: gesture.is_triggered(),
        });

        if time >= end {
            break;
        }
        time = (time + trace.tick).min(end);
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use motive_core::MotionConfig;

    const FLING: &str = r#"
        viewport = 300.0
        content = 2000.0
        tick = 100

        [[events]]
        time = 0
        kind = "down"
        y = 100.0

        [[events]]
        time = 200
        kind = "move"
        y = 50.0

        [[events]]
        time = 400
        kind = "move"
        y = 0.0

        [[events]]
        time = 400
        kind = "up"
        y = 0.0
    "#;

    #[test]
    fn test_parse_defaults() {
        let trace = Trace::from_toml_str("viewport = 100.0\ncontent = 50.0").unwrap();
        assert_eq!(trace.tick, 16);
        assert_eq!(trace.settle, 3000);
        assert!(trace.events.is_empty());
    }

    #[test]
    fn test_rejects_zero_tick() {
        assert!(Trace::from_toml_str("viewport = 1.0\ncontent = 1.0\ntick = 0").is_err());
    }

    #[test]
    fn test_replay_fling() {
        let context = MotionContext::new(MotionConfig::testing());
        let trace = Trace::from_toml_str(FLING).unwrap();
        let frames = replay(&context, &trace);

        let at = |time: Millis| frames.iter().find(|frame| frame.time == time).unwrap();
        assert_eq!(at(200).position, 50.0);
        assert!(at(200).triggered);
        assert_eq!(at(400).position, 100.0);

        let last = frames.last().unwrap();
        assert_eq!(last.time, 3400);
        assert!((last.position - 725.0).abs() < 1e-3);
        assert!(!last.triggered);
    }

    #[test]
    fn test_replay_without_events() {
        let context = MotionContext::default();
        let trace = Trace::from_toml_str("viewport = 100.0\ncontent = 500.0\nsettle = 32").unwrap();
        let frames = replay(&context, &trace);
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|frame| frame.position == 0.0));
    }
}
