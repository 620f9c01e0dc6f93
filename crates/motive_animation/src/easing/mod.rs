//! Easing curves
//!
//! An [`Easing`] maps normalized time to a motion parameter. Curves are
//! described by text and parsed once; identical descriptions (ignoring
//! whitespace) share a single instance.
//!
//! # Forms
//!
//! - `cubic-bezier(x1, y1, x2, y2)` - CSS-style timing function
//! - `path(t0, v0, t1, v1, ...)` - piecewise linear from (0,0) to (1,1)
//! - `line(t, v) ... curve(t, v, x1, y1, x2, y2) ... end(t, v)` - mixed segments
//! - `spatial(dof, index) scurve(...)+ send(...)` - one axis of a
//!   multi-dimensional path sharing a time curve
//! - `linear`, `ease`, `ease-in`, `ease-out`, `ease-in-out`
//!
//! # Example
//!
//! ```ignore
//! use motive_animation::Easing;
//!
//! let ramp = Easing::parse("line(0.5, 0) end(1, 1)");
//! assert_eq!(ramp.calc(0.75), 0.5);
//!
//! // Bad text never fails; it logs and falls back to linear
//! assert_eq!(Easing::parse("cubic-bezier(1,2)"), Easing::linear());
//! ```

mod approximation;
mod cache;
mod curve;
mod grammar;

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use motive_core::{Session, TracingSession};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use approximation::{SpatialApproximation, EASING_POINTS};
pub use cache::{cached_curve_count, reset_cache, ALIASES};
pub use curve::{EasingBounds, EasingCurve};
pub use grammar::{CurveDefinition, EasingError, Segment, SegmentKind};

/// Shared handle to a parsed easing curve
#[derive(Clone)]
pub struct Easing(Arc<EasingCurve>);

fn normalize(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

impl Easing {
    /// Parse curve text, logging a diagnostic and returning
    /// [`Easing::linear`] if it is invalid
    pub fn parse(text: &str) -> Easing {
        Self::parse_with_session(&TracingSession, text)
    }

    /// Like [`Easing::parse`], reporting failures to `session`
    pub fn parse_with_session(session: &dyn Session, text: &str) -> Easing {
        match Self::try_parse(text) {
            Ok(easing) => easing,
            Err(err) => {
                session.warn(&format!("Unable to parse easing curve '{}': {}", text, err));
                Self::linear()
            }
        }
    }

    /// Parse curve text, returning the grammar violation on failure
    pub fn try_parse(text: &str) -> Result<Easing, EasingError> {
        let key = normalize(text);
        let cache = cache::curve_cache();
        if let Some(curve) = cache.get(&key) {
            return Ok(Easing(curve));
        }

        let definition = grammar::parse_definition(&key)?;
        let curve = Arc::new(EasingCurve::new(key.clone(), definition));
        cache.insert(key, &curve);
        tracing::trace!(source = curve.source(), "parsed easing curve");
        Ok(Easing(curve))
    }

    /// The shared linear curve
    pub fn linear() -> Easing {
        Easing(cache::curve_cache().linear())
    }

    /// Shorthand for a `cubic-bezier` curve
    pub fn bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Easing {
        Self::parse(&format!("cubic-bezier({},{},{},{})", x1, y1, x2, y2))
    }

    /// True when both handles share one curve instance
    pub fn ptr_eq(&self, other: &Easing) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Easing {
    type Target = EasingCurve;

    fn deref(&self) -> &EasingCurve {
        &self.0
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::linear()
    }
}

impl PartialEq for Easing {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Easing({})", self.0.source())
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.source())
    }
}

impl Serialize for Easing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.source())
    }
}

impl<'de> Deserialize<'de> for Easing {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Easing::try_parse(&text).map_err(serde::de::Error::custom)
    }
}
