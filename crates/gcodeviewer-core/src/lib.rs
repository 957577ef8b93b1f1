//! # GCodeViewer Core
//!
//! Core types and utilities shared by the gcodeviewer crates.
//! Provides the error taxonomy, viewer-wide constants and the
//! callback aliases used for the renderer's notification hooks.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, ModelError, RenderError, Result};

pub use types::{shared, shared_vec, Hook, Shared, SharedVec, VetoHook};
