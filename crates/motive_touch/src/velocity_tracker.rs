//! Pointer velocity estimation
//!
//! Velocity is accumulated pairwise: each new sample produces an
//! instantaneous velocity against the previous one, which is folded into a
//! running estimate with a recency-weighted filter. A single sample that
//! reverses direction is damped rather than trusted, so a jittery final touch
//! point does not flip a fling.
//!
//! Velocities are in local units per millisecond.

use motive_core::{Millis, Point, PointerEvent, PointerEventKind, RingBuffer};

/// Samples retained per tracker
pub const HISTORY_CAPACITY: usize = 20;

const RUNNING_WEIGHT: f32 = 0.4;
const SAMPLE_WEIGHT: f32 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementSample {
    pub time: Millis,
    pub position: Point,
}

fn accumulate(running: f32, sample: f32, previous_sample: f32) -> f32 {
    let reversed = running * sample < 0.0;
    if reversed && previous_sample * sample <= 0.0 {
        // Unconfirmed reversal
        running + sample
    } else {
        RUNNING_WEIGHT * running + SAMPLE_WEIGHT * sample
    }
}

#[derive(Debug)]
pub struct VelocityTracker {
    history: RingBuffer<MovementSample>,
    inactivity_timeout: Millis,
    velocity: Point,
    last_sample_velocity: Option<Point>,
}

impl VelocityTracker {
    pub fn new(inactivity_timeout: Millis) -> Self {
        Self {
            history: RingBuffer::new(HISTORY_CAPACITY),
            inactivity_timeout,
            velocity: Point::ZERO,
            last_sample_velocity: None,
        }
    }

    pub fn add_pointer_event(&mut self, event: &PointerEvent, timestamp: Millis) {
        match event.kind {
            PointerEventKind::Down => {
                let stale = self
                    .history
                    .back()
                    .is_some_and(|last| timestamp.saturating_sub(last.time) > self.inactivity_timeout);
                if stale {
                    self.reset();
                }
                self.add_sample(timestamp, event.position);
            }
            PointerEventKind::Move | PointerEventKind::Up => {
                self.add_sample(timestamp, event.position);
            }
            PointerEventKind::Cancel | PointerEventKind::TargetChanged => self.reset(),
        }
    }

    fn add_sample(&mut self, time: Millis, position: Point) {
        if let Some(previous) = self.history.back().copied() {
            let elapsed = time.saturating_sub(previous.time);
            if elapsed > 0 {
                let delta = position - previous.position;
                let sample = Point::new(delta.x / elapsed as f32, delta.y / elapsed as f32);
                self.velocity = match self.last_sample_velocity {
                    None => sample,
                    Some(last) => Point::new(
                        accumulate(self.velocity.x, sample.x, last.x),
                        accumulate(self.velocity.y, sample.y, last.y),
                    ),
                };
                self.last_sample_velocity = Some(sample);
            }
        }
        self.history.push(MovementSample { time, position });
    }

    /// Current estimate in units per millisecond
    pub fn estimated_velocity(&self) -> Point {
        self.velocity
    }

    pub fn history(&self) -> impl Iterator<Item = &MovementSample> {
        self.history.iter()
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.velocity = Point::ZERO;
        self.last_sample_velocity = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(tracker: &mut VelocityTracker, samples: &[(Millis, f32, f32)]) {
        for (i, (time, x, y)) in samples.iter().enumerate() {
            let event = if i == 0 {
                PointerEvent::down(*x, *y)
            } else {
                PointerEvent::moved(*x, *y)
            };
            tracker.add_pointer_event(&event, *time);
        }
    }

    #[test]
    fn test_two_samples() {
        let mut tracker = VelocityTracker::new(200);
        feed(&mut tracker, &[(100, 0.0, 0.0), (120, 10.0, 0.0)]);
        assert_eq!(tracker.estimated_velocity(), Point::new(0.5, 0.0));
    }

    #[test]
    fn test_filter_weights_recent_motion() {
        let mut tracker = VelocityTracker::new(200);
        feed(&mut tracker, &[(0, 0.0, 0.0), (10, 10.0, 0.0), (20, 30.0, 0.0)]);
        // 0.4 * 1 + 0.6 * 2
        assert!((tracker.estimated_velocity().x - 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_single_reversal_is_damped() {
        let mut tracker = VelocityTracker::new(200);
        feed(&mut tracker, &[(0, 0.0, 0.0), (10, 10.0, 0.0), (20, 5.0, 0.0)]);
        let vx = tracker.estimated_velocity().x;
        assert!(vx > 0.0 && vx < 1.0, "got {vx}");
        assert!((vx - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_confirmed_reversal_is_filtered() {
        let mut tracker = VelocityTracker::new(200);
        feed(
            &mut tracker,
            &[(0, 0.0, 0.0), (10, 10.0, 0.0), (20, 5.0, 0.0), (30, 0.0, 0.0)],
        );
        // 0.5 after the damped step, then 0.4 * 0.5 + 0.6 * -0.5
        assert!((tracker.estimated_velocity().x + 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_stale_down_resets_history() {
        let mut tracker = VelocityTracker::new(200);
        feed(&mut tracker, &[(0, 0.0, 0.0), (10, 50.0, 0.0)]);
        tracker.add_pointer_event(&PointerEvent::down(0.0, 0.0), 500);
        assert_eq!(tracker.history().count(), 1);
        assert_eq!(tracker.estimated_velocity(), Point::ZERO);
    }

    #[test]
    fn test_cancel_resets() {
        let mut tracker = VelocityTracker::new(200);
        feed(&mut tracker, &[(0, 0.0, 0.0), (10, 50.0, 0.0)]);
        tracker.add_pointer_event(&PointerEvent::cancel(50.0, 0.0), 20);
        assert_eq!(tracker.history().count(), 0);
        assert_eq!(tracker.estimated_velocity(), Point::ZERO);
    }

    #[test]
    fn test_same_timestamp_is_ignored_for_velocity() {
        let mut tracker = VelocityTracker::new(200);
        feed(&mut tracker, &[(0, 0.0, 100.0), (200, 0.0, 50.0), (400, 0.0, 0.0)]);
        tracker.add_pointer_event(&PointerEvent::up(0.0, 0.0), 400);
        assert!((tracker.estimated_velocity().y + 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut tracker = VelocityTracker::new(200);
        tracker.add_pointer_event(&PointerEvent::down(0.0, 0.0), 0);
        for i in 1..50 {
            tracker.add_pointer_event(&PointerEvent::moved(i as f32, 0.0), i);
        }
        assert_eq!(tracker.history().count(), HISTORY_CAPACITY);
        assert!((tracker.estimated_velocity().x - 1.0).abs() < 1e-6);
    }
}
