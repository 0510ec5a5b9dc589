//! Error types for the time-lapse viewer.

use thiserror::Error;

/// Result type alias using ViewerError.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Primary error type for viewer operations.
#[derive(Debug, Error)]
pub enum ViewerError {
    // === Validation Errors ===
    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Frame index {index} out of range [0, {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    // === Fetch Errors ===
    #[error("Fetch failed for {locator}: {message}")]
    Fetch { locator: String, message: String },

    #[error("Vector payload failed for {locator}: {message}")]
    VectorFetch { locator: String, message: String },

    // === Data Errors ===
    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ViewerError {
    /// Whether the error invalidates the operation that triggered it
    /// (validation) or only the single resource it names (fetch).
    pub fn is_per_resource(&self) -> bool {
        matches!(
            self,
            ViewerError::Fetch { .. } | ViewerError::VectorFetch { .. }
        )
    }
}

// Conversion from common error types
impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::InvalidGeoJson(err.to_string())
    }
}

impl From<std::io::Error> for ViewerError {
    fn from(err: std::io::Error) -> Self {
        ViewerError::ConfigError(err.to_string())
    }
}
