//! Core error types

use thiserror::Error;

/// Errors raised while loading engine configuration
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration text is not valid TOML for [`crate::MotionConfig`]
    #[error("Invalid motion config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize motion config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// A configuration value is outside its valid range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
