//! Centralized error handling for RuGMST
//!
//! This module provides structured error types to replace the generic `Box<dyn Error>`
//! used throughout the codebase, enabling better error context and type safety.
//! Per-run pipeline failures are carried as values in batch outcomes rather than
//! aborting a whole batch.

use std::fmt;

/// Main error type for RuGMST operations
#[derive(Debug)]
pub enum GmstError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Dataset does not match any supported CMIP6 layout
    UnsupportedSchema { run: String, reason: String },

    /// Time coordinate could not be decoded into calendar months
    TimeDecode { message: String },

    /// A scenario run has no historical companion for its model
    NoMatchingHistoricalRun { run: String },

    /// A scenario run matched more than one historical companion
    AmbiguousHistoricalMatch { run: String, candidates: Vec<String> },

    /// Reference window holds no finite samples to rebase against
    EmptyReferenceWindow { label: String, window: String },

    /// Historical and scenario time axes do not join cleanly
    SpliceMismatch { message: String },

    /// Statistics computation errors
    StatisticsError(String),

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// Archive discovery or run-identity errors
    CatalogError(String),

    /// Generic error for anything without a dedicated variant
    Generic(String),
}

impl fmt::Display for GmstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GmstError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            GmstError::IoError(e) => write!(f, "I/O error: {}", e),
            GmstError::ArrayError(e) => write!(f, "Array error: {}", e),
            GmstError::UnsupportedSchema { run, reason } => {
                write!(f, "Unsupported dataset schema for run '{}': {}", run, reason)
            }
            GmstError::TimeDecode { message } => write!(f, "Time decoding error: {}", message),
            GmstError::NoMatchingHistoricalRun { run } => {
                write!(f, "No historical run matches the model of '{}'", run)
            }
            GmstError::AmbiguousHistoricalMatch { run, candidates } => write!(
                f,
                "Ambiguous historical match for '{}': candidates [{}]",
                run,
                candidates.join(", ")
            ),
            GmstError::EmptyReferenceWindow { label, window } => write!(
                f,
                "Reference window {} holds no finite samples for '{}'",
                window, label
            ),
            GmstError::SpliceMismatch { message } => write!(f, "Splice mismatch: {}", message),
            GmstError::StatisticsError(msg) => write!(f, "Statistics computation error: {}", msg),
            GmstError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            GmstError::CatalogError(msg) => write!(f, "Catalog error: {}", msg),
            GmstError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for GmstError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GmstError::NetCDFError(e) => Some(e),
            GmstError::IoError(e) => Some(e),
            GmstError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for GmstError {
    fn from(error: netcdf::Error) -> Self {
        GmstError::NetCDFError(error)
    }
}

impl From<std::io::Error> for GmstError {
    fn from(error: std::io::Error) -> Self {
        GmstError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for GmstError {
    fn from(error: ndarray::ShapeError) -> Self {
        GmstError::ArrayError(error)
    }
}

impl From<String> for GmstError {
    fn from(error: String) -> Self {
        GmstError::Generic(error)
    }
}

impl From<&str> for GmstError {
    fn from(error: &str) -> Self {
        GmstError::Generic(error.to_string())
    }
}

/// Result type alias for RuGMST operations
pub type Result<T> = std::result::Result<T, GmstError>;
