//! Error types for trailmap

use thiserror::Error;

/// Main error type for trailmap
#[derive(Error, Debug)]
pub enum TrailmapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Rendering and GPU-context errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No compatible graphics adapter found")]
    NoAdapter,

    #[error("Failed to acquire graphics device: {0}")]
    RequestDevice(String),

    #[error("Canvas size must be non-zero, got {width}x{height}")]
    InvalidCanvasSize { width: u32, height: u32 },

    #[error("Pointer coordinates must be finite, got ({x}, {y})")]
    NonFinitePointer { x: f32, y: f32 },

    #[error("Trail map has already been disposed")]
    Disposed,

    #[error("Texture readback failed: {0}")]
    Readback(String),
}

/// Result type alias for trailmap operations
pub type Result<T> = std::result::Result<T, TrailmapError>;
