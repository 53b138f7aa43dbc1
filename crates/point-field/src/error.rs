//! Error types for point cloud IO, range fitting and configuration.

/// Errors while reading or writing a persisted point cloud.
#[derive(Debug, thiserror::Error)]
pub enum CloudIoError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record on line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Errors raised by [`PointStore::fit_to_range`](crate::PointStore::fit_to_range).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RangeError {
    #[error("source range [{start}, {end}] has zero width")]
    Degenerate { start: f32, end: f32 },

    #[error("range bounds and remapped coordinates must be finite")]
    NonFinite,
}

/// Errors while loading or saving a [`DataManagerConfig`](crate::DataManagerConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}
