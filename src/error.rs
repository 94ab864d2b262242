//! Error types for the particle simulation.
//!
//! The physics step itself cannot fail. Everything here comes from the
//! configuration, parameter and export boundaries, or from a crashed worker.

use std::fmt;

/// Errors surfaced by the simulation core.
#[derive(Debug)]
pub enum SimError {
    /// Reading or writing a file failed.
    Io(std::io::Error),
    /// JSON could not be encoded or decoded.
    Json(serde_json::Error),
    /// A configuration value is outside its valid domain.
    InvalidConfig(String),
    /// No built-in preset has this name.
    UnknownPreset(String),
    /// No species pair has this name.
    UnknownParameter(String),
    /// A parameter import did not contain every species pair.
    MissingParameter(String),
    /// A NaN or infinite value was offered for a parameter.
    NonFiniteValue { name: String, value: f64 },
    /// The scheduler worker panicked; its simulation is gone.
    WorkerPanicked,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Io(e) => write!(f, "I/O error: {}", e),
            SimError::Json(e) => write!(f, "JSON error: {}", e),
            SimError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            SimError::UnknownPreset(name) => write!(f, "Unknown preset '{}'", name),
            SimError::UnknownParameter(name) => write!(f, "Unknown parameter '{}'", name),
            SimError::MissingParameter(name) => write!(f, "Missing parameter '{}'", name),
            SimError::NonFiniteValue { name, value } => {
                write!(f, "Parameter '{}' must be finite, got {}", name, value)
            }
            SimError::WorkerPanicked => write!(f, "Simulation worker thread panicked"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            SimError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Io(e)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
