//! Curve evaluation

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use super::approximation::{SpatialApproximation, EASING_POINTS};
use super::cache;
use super::grammar::{CurveDefinition, Segment, SegmentKind};

const INVERSION_TOLERANCE: f64 = 0.00001;
const MAX_BISECTIONS: usize = 48;

/// `B(s)` of a cubic bezier from 0 to 1 with inner control values `a`, `b`
fn bezier(a: f64, b: f64, s: f64) -> f64 {
    s * (3.0 * (1.0 - s) * (a * (1.0 - s) + b * s) + s * s)
}

/// Memoized inversion of a timing bezier `(x1, y1, x2, y2)`
///
/// Maps a time `x` to the curve parameter `s` with `x(s) == x`, then returns
/// `y(s)`. The sampled table brackets the root; bisection refines it.
#[derive(Debug)]
struct CubicInverse {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    identity: bool,
    xs: [f64; EASING_POINTS],
}

impl CubicInverse {
    fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);
        let mut xs = [0.0; EASING_POINTS];
        for (i, x) in xs.iter_mut().enumerate() {
            *x = bezier(x1, x2, i as f64 / (EASING_POINTS - 1) as f64);
        }
        Self {
            x1,
            y1,
            x2,
            y2,
            identity: x1 == y1 && x2 == y2,
            xs,
        }
    }

    fn solve(&self, x: f32) -> f32 {
        if self.identity {
            return x;
        }
        let x = x as f64;
        let step = 1.0 / (EASING_POINTS - 1) as f64;
        let upper = self
            .xs
            .partition_point(|&sample| sample < x)
            .clamp(1, EASING_POINTS - 1);

        let mut lo = (upper - 1) as f64 * step;
        let mut hi = upper as f64 * step;
        let mut mid = (lo + hi) / 2.0;
        for _ in 0..MAX_BISECTIONS {
            mid = (lo + hi) / 2.0;
            let estimate = bezier(self.x1, self.x2, mid);
            if (estimate - x).abs() < INVERSION_TOLERANCE {
                break;
            }
            if estimate < x {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        bezier(self.y1, self.y2, mid) as f32
    }
}

/// Lazily built evaluation data of one segment
#[derive(Debug, Default)]
struct SegmentCache {
    inverse: OnceLock<CubicInverse>,
    approximation: OnceLock<Arc<SpatialApproximation>>,
}

/// An immutable, parsed easing curve
///
/// Curves are shared through [`super::Easing`]; evaluation state (the last
/// evaluated pair and per-segment tables) is interior and thread-safe.
pub struct EasingCurve {
    source: String,
    segments: Vec<Segment>,
    points: Vec<f32>,
    segment_caches: Vec<SegmentCache>,
    /// Last `(t, value)` pair packed as two f32 bit patterns
    last: AtomicU64,
}

/// Extent of a curve over its segments' end points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EasingBounds {
    pub min_time: f32,
    pub max_time: f32,
    pub min_value: f32,
    pub max_value: f32,
}

fn pack(t: f32, value: f32) -> u64 {
    ((t.to_bits() as u64) << 32) | value.to_bits() as u64
}

fn unpack(bits: u64) -> (f32, f32) {
    (f32::from_bits((bits >> 32) as u32), f32::from_bits(bits as u32))
}

impl EasingCurve {
    pub(crate) fn new(source: String, definition: CurveDefinition) -> Self {
        let segment_caches = definition
            .segments
            .iter()
            .map(|_| SegmentCache::default())
            .collect();
        Self {
            source,
            segments: definition.segments,
            points: definition.points,
            segment_caches,
            last: AtomicU64::new(pack(f32::NAN, f32::NAN)),
        }
    }

    /// Normalized text this curve was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn points(&self) -> &[f32] {
        &self.points
    }

    pub fn is_spatial(&self) -> bool {
        matches!(
            self.segments.first().map(|s| s.kind),
            Some(SegmentKind::SCurve | SegmentKind::SEnd)
        )
    }

    fn dof(&self) -> usize {
        if self.is_spatial() {
            self.points[0].abs() as usize
        } else {
            1
        }
    }

    fn axis(&self) -> usize {
        if self.is_spatial() {
            self.points[1] as usize
        } else {
            0
        }
    }

    fn start_time(&self, segment: &Segment) -> f32 {
        self.points[segment.offset]
    }

    /// Value at the start of `segment` on the evaluated axis
    fn start_value(&self, segment: &Segment) -> f32 {
        self.points[segment.offset + 1 + self.axis()]
    }

    /// Evaluate the curve at time `t`
    pub fn calc(&self, t: f32) -> f32 {
        // NaN never hits the cache; the empty cache holds NaN too
        if t.is_nan() {
            return self.evaluate(t);
        }
        let (last_t, last_value) = unpack(self.last.load(Ordering::Relaxed));
        if last_t.to_bits() == t.to_bits() {
            return last_value;
        }
        let value = self.evaluate(t);
        self.last.store(pack(t, value), Ordering::Relaxed);
        value
    }

    fn evaluate(&self, t: f32) -> f32 {
        let first = &self.segments[0];
        if t.is_nan() || t <= self.start_time(first) {
            return self.start_value(first);
        }

        let index = self
            .segments
            .partition_point(|segment| self.start_time(segment) <= t)
            - 1;
        let segment = &self.segments[index];
        match segment.kind {
            SegmentKind::End | SegmentKind::SEnd => self.start_value(segment),
            SegmentKind::Linear => self.linear(segment, t),
            SegmentKind::Curve => self.curve(index, segment, t),
            SegmentKind::SCurve => self.spatial(index, segment, t),
        }
    }

    fn linear(&self, segment: &Segment, t: f32) -> f32 {
        let p = &self.points[segment.offset..];
        let (t1, v1, t2, v2) = (p[0], p[1], p[2], p[3]);
        v1 + (v2 - v1) * (t - t1) / (t2 - t1)
    }

    fn curve(&self, index: usize, segment: &Segment, t: f32) -> f32 {
        let p = &self.points[segment.offset..];
        let (t1, v1, t2, v2) = (p[0], p[1], p[6], p[7]);
        let inverse = self.segment_caches[index]
            .inverse
            .get_or_init(|| CubicInverse::new(p[2], p[3], p[4], p[5]));
        v1 + (v2 - v1) * inverse.solve((t - t1) / (t2 - t1))
    }

    fn spatial(&self, index: usize, segment: &Segment, t: f32) -> f32 {
        let n = self.dof();
        let o = segment.offset;
        let p = &self.points;
        let next = o + 5 + 3 * n;
        let (t1, t2) = (p[o], p[next]);

        let cache = &self.segment_caches[index];
        let inverse = cache.inverse.get_or_init(|| {
            let c = o + 1 + 3 * n;
            CubicInverse::new(p[c], p[c + 1], p[c + 2], p[c + 3])
        });
        let percentage = inverse.solve((t - t1) / (t2 - t1));

        let approximation = cache.approximation.get_or_init(|| {
            SpatialApproximation::shared(
                &p[o + 1..o + 1 + n],
                &p[o + 1 + n..o + 1 + 2 * n],
                &p[o + 1 + 2 * n..o + 1 + 3 * n],
                &p[next + 1..next + 1 + n],
            )
        });
        approximation.position(percentage, self.axis())
    }

    /// Time and value range spanned by the segment end points
    pub fn bounds(&self) -> EasingBounds {
        let mut bounds = EasingBounds {
            min_time: f32::INFINITY,
            max_time: f32::NEG_INFINITY,
            min_value: f32::INFINITY,
            max_value: f32::NEG_INFINITY,
        };
        for segment in &self.segments {
            let time = self.start_time(segment);
            let value = self.start_value(segment);
            bounds.min_time = bounds.min_time.min(time);
            bounds.max_time = bounds.max_time.max(time);
            bounds.min_value = bounds.min_value.min(value);
            bounds.max_value = bounds.max_value.max(value);
        }
        bounds
    }
}

impl PartialEq for EasingCurve {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments && self.points == other.points
    }
}

impl fmt::Debug for EasingCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EasingCurve")
            .field("source", &self.source)
            .field("segments", &self.segments.len())
            .finish()
    }
}

impl Drop for EasingCurve {
    fn drop(&mut self) {
        cache::mark_dirty();
    }
}
