//! Error types for the capture, composition, and export pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing, composing, or printing charts
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file does not exist
    #[error("Config not found: {0}")]
    ConfigNotFound(String),

    /// The configuration file cannot be read, parsed, or validated
    #[error("Invalid config: {0}")]
    ConfigInvalid(String),

    /// Failed to launch the browser or open a rendering context
    #[error("Browser initialization failed: {0}")]
    InitializationError(String),

    /// The chart page did not finish loading in time
    #[error("Page load did not settle within {0}ms")]
    LoadTimeout(u64),

    /// The chart widget's rendering frame never appeared
    #[error("Chart widget frame did not appear within {0}ms")]
    WidgetNotReady(u64),

    /// Failed to extract a snapshot from the widget frame
    #[error("Snapshot capture failed: {0}")]
    RenderError(String),

    /// A snapshot set cannot be laid out into a document
    #[error("Layout failed: {0}")]
    LayoutError(String),

    /// Failed to render or write an output document
    #[error("Export failed: {0}")]
    ExportError(String),

    /// Print discovery or submission failed; never fatal to the run
    #[error("Printing unavailable: {0}")]
    PrintUnavailable(String),
}
