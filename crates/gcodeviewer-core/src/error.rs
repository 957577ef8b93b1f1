//! Error handling for GCodeViewer
//!
//! Provides error types for the layers of the viewer that can actually fail:
//! - Model errors (layer blob encoding/decoding, explicit layer lookups)
//! - Render errors (backend surface creation, image encoding)
//!
//! Rendering itself never fails: missing or partial data is treated as a
//! silent no-op, so these errors only surface from explicit operations.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Model error type
///
/// Represents errors related to the per-layer command model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Compressed layer blob could not be inflated
    #[error("Failed to inflate layer blob: {reason}")]
    Inflate {
        /// The reason inflation failed.
        reason: String,
    },

    /// Layer blob could not be deflated
    #[error("Failed to deflate layer: {reason}")]
    Deflate {
        /// The reason deflation failed.
        reason: String,
    },

    /// Inflated layer data is not a valid command sequence
    #[error("Invalid layer data: {0}")]
    InvalidLayerData(#[from] serde_json::Error),

    /// Requested layer does not exist
    #[error("Layer {index} out of range (model has {len} layers)")]
    LayerOutOfRange {
        /// The requested layer index.
        index: usize,
        /// Number of layers in the model.
        len: usize,
    },
}

/// Render error type
///
/// Represents errors from drawing backends.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Backend could not allocate a surface of the requested size
    #[error("Cannot create {width}x{height} surface")]
    SurfaceCreation {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// Rendered image could not be encoded
    #[error("Image encoding failed: {reason}")]
    Encoding {
        /// The reason encoding failed.
        reason: String,
    },
}

/// Main error type for GCodeViewer
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Model error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Render error
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a model error
    pub fn is_model_error(&self) -> bool {
        matches!(self, Error::Model(_))
    }

    /// Check if this is a render error
    pub fn is_render_error(&self) -> bool {
        matches!(self, Error::Render(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
