//! Motion engine configuration
//!
//! Every timing, threshold and easing constant consumed by gestures and
//! scrollers lives in [`MotionConfig`]. Distances are in global (display
//! independent) units, velocities in units per second, durations in
//! milliseconds. Easing curves are kept as curve text and parsed on demand.
//!
//! # Example
//!
//! ```ignore
//! use motive_core::MotionConfig;
//!
//! let config = MotionConfig::from_toml_str(r#"
//!     pointer_slop_threshold = 10.0
//!     scroller_velocity_easing = "linear"
//! "#)?;
//! assert_eq!(config.tap_or_scroll_timeout, 100);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::events::Millis;

/// Convert an angle to the slope of a line at that angle
pub fn angle_to_slope(degrees: f32) -> f32 {
    degrees.to_radians().tan()
}

/// Engine-wide motion settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    // Pointer handling
    /// Time after a down before moves are considered a scroll rather than a tap
    pub tap_or_scroll_timeout: Millis,
    /// Gap between pointer events after which movement history is discarded
    pub pointer_inactivity_timeout: Millis,
    /// Distance a pointer must travel before a gesture triggers
    pub pointer_slop_threshold: f32,
    pub minimum_fling_velocity: f32,
    pub maximum_fling_velocity: f32,

    // Swipe away
    pub swipe_away_fulfill_distance_threshold: f32,
    pub swipe_away_animation_easing: String,
    pub swipe_velocity_threshold: f32,
    pub swipe_max_velocity: f32,
    /// Maximum perpendicular/primary displacement slope for a swipe
    pub swipe_angle_tolerance: f32,
    pub default_swipe_animation_duration: Millis,
    pub max_swipe_animation_duration: Millis,

    // Scrolling and paging
    pub scroll_command_duration: Millis,
    pub scroll_snap_duration: Millis,
    pub default_pager_animation_duration: Millis,
    pub default_pager_animation_easing: String,
    pub scroll_angle_slope_vertical: f32,
    pub scroll_angle_slope_horizontal: f32,
    pub scroll_fling_velocity_limit_easing_vertical: String,
    pub scroll_fling_velocity_limit_easing_horizontal: String,

    // Auto scroller
    pub scroller_velocity_easing: String,
    pub scroller_duration_easing: String,
    pub scroller_max_duration: Millis,
    /// Deceleration as a fraction of the initial speed per unit time
    pub scroller_deceleration: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            tap_or_scroll_timeout: 100,
            pointer_inactivity_timeout: 200,
            pointer_slop_threshold: 40.0,
            minimum_fling_velocity: 50.0,
            maximum_fling_velocity: 1200.0,

            swipe_away_fulfill_distance_threshold: 0.5,
            swipe_away_animation_easing: "cubic-bezier(0,0,0.58,1)".to_string(),
            swipe_velocity_threshold: 500.0,
            swipe_max_velocity: 2000.0,
            swipe_angle_tolerance: angle_to_slope(40.0),
            default_swipe_animation_duration: 200,
            max_swipe_animation_duration: 400,

            scroll_command_duration: 1000,
            scroll_snap_duration: 500,
            default_pager_animation_duration: 600,
            default_pager_animation_easing: "cubic-bezier(.42,0,.58,1)".to_string(),
            scroll_angle_slope_vertical: angle_to_slope(56.0),
            scroll_angle_slope_horizontal: angle_to_slope(33.0),
            scroll_fling_velocity_limit_easing_vertical: "cubic-bezier(.6,.4,.35,.6)".to_string(),
            scroll_fling_velocity_limit_easing_horizontal: "cubic-bezier(.42,.66,.5,1)"
                .to_string(),

            scroller_velocity_easing: "cubic-bezier(.25,1,.5,1)".to_string(),
            scroller_duration_easing: "cubic-bezier(.65,0,.35,1)".to_string(),
            scroller_max_duration: 3000,
            scroller_deceleration: 0.2,
        }
    }
}

impl MotionConfig {
    /// Parse a configuration from TOML; missing keys take their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: MotionConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the gesture math cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.scroller_deceleration.is_nan() || self.scroller_deceleration <= 0.0 {
            return Err(CoreError::InvalidValue {
                field: "scroller_deceleration",
                reason: format!("must be positive, got {}", self.scroller_deceleration),
            });
        }
        if self.pointer_slop_threshold < 0.0 {
            return Err(CoreError::InvalidValue {
                field: "pointer_slop_threshold",
                reason: format!("must not be negative, got {}", self.pointer_slop_threshold),
            });
        }
        if self.maximum_fling_velocity < self.minimum_fling_velocity {
            return Err(CoreError::InvalidValue {
                field: "maximum_fling_velocity",
                reason: "must be at least minimum_fling_velocity".to_string(),
            });
        }
        Ok(())
    }

    /// Settings tuned for unit tests: short timeouts and linear fling easing
    pub fn testing() -> Self {
        Self {
            tap_or_scroll_timeout: 5,
            pointer_inactivity_timeout: 250,
            pointer_slop_threshold: 10.0,
            scroller_velocity_easing: "linear".to_string(),
            scroll_fling_velocity_limit_easing_vertical: "cubic-bezier(0,1,0,1)".to_string(),
            scroll_fling_velocity_limit_easing_horizontal: "cubic-bezier(0,1,0,1)".to_string(),
            ..Self::default()
        }
    }
}
