//! Error types.
//!
//! Every fallible operation returns [`DeformResult<T>`]. Configuration errors
//! stop a mesh from being built; setup errors stop a deformer from existing.

use thiserror::Error;

/// Unified error type for mesh building, compute setup and settings loading.
#[derive(Debug, Error)]
pub enum DeformError {
    /// A build or brush parameter is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No wgpu adapter could be found for headless compute.
    #[error("No suitable GPU adapter: {0}")]
    NoAdapter(String),

    /// The adapter refused to create a device.
    #[error("Failed to create GPU device: {0}")]
    DeviceRequest(String),

    /// A compute shader or pipeline failed validation.
    #[error("Compute pipeline '{label}' failed to build: {message}")]
    Pipeline { label: String, message: String },

    /// Mapping a staging buffer for readback failed.
    #[error("Buffer readback failed: {0}")]
    Readback(String),

    /// Settings file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings JSON was malformed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, DeformError>`.
pub type DeformResult<T> = Result<T, DeformError>;

impl DeformError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
