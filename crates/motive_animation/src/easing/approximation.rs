//! Arc-length approximation of spatial curve segments
//!
//! A spatial segment moves a point through `dof` dimensions along a cubic
//! with control points `start`, `start + tout`, `end + tin` and `end`. The
//! time curve yields the fraction of the path that has been travelled; this
//! table converts that fraction into a position by walking cumulative chord
//! lengths of a sampled polyline.
//!
//! Identical segments share one table through a process-wide weak cache.

use std::sync::{Arc, OnceLock};

use motive_core::WeakCache;

/// Number of polyline samples per segment
pub const EASING_POINTS: usize = 51;

type ApproximationKey = Vec<u32>;

fn approximation_cache() -> &'static WeakCache<ApproximationKey, SpatialApproximation> {
    static CACHE: OnceLock<WeakCache<ApproximationKey, SpatialApproximation>> = OnceLock::new();
    CACHE.get_or_init(WeakCache::new)
}

/// Sampled polyline of one spatial segment with cumulative lengths
#[derive(Debug)]
pub struct SpatialApproximation {
    dof: usize,
    /// `EASING_POINTS` rows of `dof` coordinates
    samples: Vec<f32>,
    /// Cumulative chord length at each sample
    lengths: Vec<f32>,
}

fn bernstein(p0: f32, p1: f32, p2: f32, p3: f32, s: f32) -> f32 {
    let u = 1.0 - s;
    u * u * u * p0 + 3.0 * u * u * s * p1 + 3.0 * u * s * s * p2 + s * s * s * p3
}

impl SpatialApproximation {
    pub fn new(start: &[f32], tout: &[f32], tin: &[f32], end: &[f32]) -> Self {
        let dof = start.len();
        debug_assert!(tout.len() == dof && tin.len() == dof && end.len() == dof);

        let mut samples = Vec::with_capacity(EASING_POINTS * dof);
        for i in 0..EASING_POINTS {
            let s = i as f32 / (EASING_POINTS - 1) as f32;
            for axis in 0..dof {
                samples.push(bernstein(
                    start[axis],
                    start[axis] + tout[axis],
                    end[axis] + tin[axis],
                    end[axis],
                    s,
                ));
            }
        }

        let mut lengths = Vec::with_capacity(EASING_POINTS);
        lengths.push(0.0f32);
        for i in 1..EASING_POINTS {
            let prev = &samples[(i - 1) * dof..i * dof];
            let next = &samples[i * dof..(i + 1) * dof];
            let chord = prev
                .iter()
                .zip(next)
                .map(|(a, b)| (b - a) * (b - a))
                .sum::<f32>()
                .sqrt();
            lengths.push(lengths[i - 1] + chord);
        }

        Self {
            dof,
            samples,
            lengths,
        }
    }

    /// Fetch a shared table for the given control values, building it once
    pub fn shared(start: &[f32], tout: &[f32], tin: &[f32], end: &[f32]) -> Arc<Self> {
        let key: ApproximationKey = start
            .iter()
            .chain(tout)
            .chain(tin)
            .chain(end)
            .map(|v| v.to_bits())
            .collect();

        let cache = approximation_cache();
        if let Some(existing) = cache.get(&key) {
            return existing;
        }
        let approximation = Arc::new(Self::new(start, tout, tin, end));
        cache.insert(key, &approximation);
        approximation
    }

    pub fn total_length(&self) -> f32 {
        self.lengths[EASING_POINTS - 1]
    }

    fn coordinate(&self, sample: usize, axis: usize) -> f32 {
        self.samples[sample * self.dof + axis]
    }

    /// Coordinate on `axis` after travelling `percentage` of the path
    pub fn position(&self, percentage: f32, axis: usize) -> f32 {
        let total = self.total_length();
        if total <= 0.0 {
            return self.coordinate(0, axis);
        }

        let target = percentage * total;
        let upper = self
            .lengths
            .partition_point(|&length| length < target)
            .clamp(1, EASING_POINTS - 1);
        let lower = upper - 1;
        let span = self.lengths[upper] - self.lengths[lower];
        let fraction = if span > 0.0 {
            (target - self.lengths[lower]) / span
        } else {
            0.0
        };

        let from = self.coordinate(lower, axis);
        let to = self.coordinate(upper, axis);
        from + (to - from) * fraction
    }
}

impl Drop for SpatialApproximation {
    fn drop(&mut self) {
        approximation_cache().mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_line_is_uniform() {
        let approximation =
            SpatialApproximation::new(&[0.0, 0.0], &[0.0, 0.0], &[0.0, 0.0], &[10.0, 0.0]);
        assert!((approximation.total_length() - 10.0).abs() < 1e-4);
        // The sampled polyline is uneven in parameter space but the table
        // maps distance back to a uniform position.
        assert!((approximation.position(0.5, 0) - 5.0).abs() < 1e-3);
        assert_eq!(approximation.position(0.5, 1), 0.0);
        assert_eq!(approximation.position(0.0, 0), 0.0);
        assert!((approximation.position(1.0, 0) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_quarter_arc() {
        let approximation =
            SpatialApproximation::new(&[0.0, 0.0], &[1.0, 0.0], &[0.0, -1.0], &[1.0, 1.0]);
        assert!((approximation.position(0.25, 0) - 0.450455).abs() < 0.001);
        assert!((approximation.position(0.5, 0) - 0.875).abs() < 0.001);
        assert!((approximation.position(0.5, 1) - 0.125).abs() < 0.001);
    }

    #[test]
    fn test_degenerate_segment() {
        let approximation =
            SpatialApproximation::new(&[2.0, 3.0], &[0.0, 0.0], &[0.0, 0.0], &[2.0, 3.0]);
        assert!((approximation.position(0.7, 1) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_identical_segments_share_table() {
        let a = SpatialApproximation::shared(&[0.5, 0.5], &[1.0, 0.0], &[0.0, 1.0], &[7.0, 7.0]);
        let b = SpatialApproximation::shared(&[0.5, 0.5], &[1.0, 0.0], &[0.0, 1.0], &[7.0, 7.0]);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
