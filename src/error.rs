use thiserror::Error;

/// Errors that can occur while capturing or restoring a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to decode snapshot: {0}")]
    Decode(#[source] image::ImageError),

    /// The decoder went away before producing pixels
    #[error("Snapshot decode was interrupted")]
    Interrupted,
}

/// Errors reported by the share collaborator. None of these are fatal.
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Sharing is not supported on this platform")]
    Unsupported,

    #[error("Share was rejected: {0}")]
    Failed(String),

    #[error("Failed to write shared drawing: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while flattening the surface for export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to encode exported image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Errors that can occur while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}
