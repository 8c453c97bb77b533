//! Error types for the globe.

use std::fmt;

/// Result type for globe operations.
pub type Result<T> = std::result::Result<T, GlobeError>;

/// Failures that prevent the globe from being built or kept on screen.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobeError {
    /// A configuration value is outside its valid range.
    InvalidConfig {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Description of what was wrong.
        detail: String,
    },
    /// No primary window exists to mount the renderer on.
    MissingWindow,
    /// The world-map texture could not be loaded.
    TextureLoad {
        /// Asset path that was requested.
        path: String,
        /// The loader's error message.
        message: String,
    },
}

impl fmt::Display for GlobeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobeError::InvalidConfig { field, detail } => {
                write!(f, "invalid globe config `{field}`: {detail}")
            }
            GlobeError::MissingWindow => {
                write!(f, "no primary window to attach the globe renderer to")
            }
            GlobeError::TextureLoad { path, message } => {
                write!(f, "failed to load texture {path}: {message}")
            }
        }
    }
}

impl std::error::Error for GlobeError {}

/// Why an event record cannot be placed on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRecord {
    /// The named coordinate is absent.
    MissingCoordinate(&'static str),
    /// The named coordinate is NaN or infinite.
    NonFiniteCoordinate(&'static str),
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCoordinate(field) => write!(f, "missing {field}"),
            Self::NonFiniteCoordinate(field) => write!(f, "{field} is not a finite number"),
        }
    }
}

impl std::error::Error for InvalidRecord {}
