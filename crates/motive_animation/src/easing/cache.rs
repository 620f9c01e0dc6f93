//! Process-wide curve cache
//!
//! Parsed curves are shared by normalized text through a weak cache. The
//! named aliases and the linear singleton are pinned at first use and are
//! never evicted. [`reset_cache`] drops everything else for test isolation.

use std::sync::{Arc, OnceLock};

use motive_core::WeakCache;

use super::curve::EasingCurve;
use super::grammar::{parse_definition, CurveDefinition};

/// Bare-word aliases and the curve text they stand for
pub const ALIASES: [(&str, &str); 4] = [
    ("ease", "cubic-bezier(0.25,0.1,0.25,1)"),
    ("ease-in", "cubic-bezier(0.42,0,1,1)"),
    ("ease-out", "cubic-bezier(0,0,0.58,1)"),
    ("ease-in-out", "cubic-bezier(0.42,0,0.58,1)"),
];

pub(crate) struct CurveCache {
    curves: WeakCache<String, EasingCurve>,
    linear: Arc<EasingCurve>,
    pinned: Vec<(String, Arc<EasingCurve>)>,
}

impl CurveCache {
    fn new() -> Self {
        let linear = Arc::new(EasingCurve::new(
            "path()".to_string(),
            CurveDefinition::linear(),
        ));
        let mut pinned = vec![
            ("linear".to_string(), linear.clone()),
            ("path()".to_string(), linear.clone()),
        ];
        for (alias, text) in ALIASES {
            match parse_definition(text) {
                Ok(definition) => pinned.push((
                    alias.to_string(),
                    Arc::new(EasingCurve::new(text.to_string(), definition)),
                )),
                Err(err) => tracing::error!(alias, %err, "built-in easing failed to parse"),
            }
        }

        let cache = Self {
            curves: WeakCache::new(),
            linear,
            pinned,
        };
        cache.pin_builtins();
        cache
    }

    fn pin_builtins(&self) {
        for (key, curve) in &self.pinned {
            self.curves.pin(key.clone(), curve.clone());
        }
    }

    pub(crate) fn get(&self, key: &String) -> Option<Arc<EasingCurve>> {
        self.curves.get(key)
    }

    pub(crate) fn insert(&self, key: String, curve: &Arc<EasingCurve>) {
        self.curves.insert(key, curve);
    }

    pub(crate) fn linear(&self) -> Arc<EasingCurve> {
        self.linear.clone()
    }
}

static CACHE: OnceLock<CurveCache> = OnceLock::new();

pub(crate) fn curve_cache() -> &'static CurveCache {
    CACHE.get_or_init(CurveCache::new)
}

pub(crate) fn mark_dirty() {
    if let Some(cache) = CACHE.get() {
        cache.curves.mark_dirty();
    }
}

/// Drop every cached curve except the built-in aliases
pub fn reset_cache() {
    let cache = curve_cache();
    cache.curves.reset();
    cache.pin_builtins();
}

/// Number of live cached curves, built-ins included
pub fn cached_curve_count() -> usize {
    curve_cache().curves.live_count()
}
