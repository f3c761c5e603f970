//! Error handling for diagramkit
//!
//! Provides the error types shared by every layer of the editing engine:
//! - Lookup errors (diagram, shape or connector missing)
//! - Operation errors (unsupported updates, broken undo invariants)
//! - Persistence errors (the backing API failed)
//! - Configuration errors (loading and validating editor settings)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Lookup error type
///
/// Raised when the persistence API answers with "nothing there" or when the
/// cached aggregate does not contain the requested entity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotFoundError {
    /// The diagram is not loaded or does not exist
    #[error("Diagram {diagram_id} not found")]
    Diagram {
        /// The id of the missing diagram.
        diagram_id: String,
    },

    /// The shape does not exist in the diagram
    #[error("Shape {shape_id} not found in diagram {diagram_id}")]
    Shape {
        /// The diagram that was searched.
        diagram_id: String,
        /// The id of the missing shape.
        shape_id: String,
    },

    /// The connector does not exist in the diagram
    #[error("Connector {connector_id} not found in diagram {diagram_id}")]
    Connector {
        /// The diagram that was searched.
        diagram_id: String,
        /// The id of the missing connector.
        connector_id: String,
    },
}

/// Main error type for diagramkit
///
/// Cloneable so the store can keep the last error of each diagram around
/// while still handing it back to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A diagram, shape or connector is missing
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The requested change is not supported by the engine
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Why the operation was rejected.
        reason: String,
    },

    /// Undo was requested on a command whose forward state was never captured
    #[error("Cannot undo '{command}': forward state was never captured")]
    UndoInvariantViolation {
        /// Description of the offending command.
        command: String,
    },

    /// The persistence backend failed
    #[error("Persistence error: {reason}")]
    Persistence {
        /// The reason reported by the backend.
        reason: String,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Shorthand for [`Error::InvalidOperation`]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Error::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`NotFoundError::Diagram`]
    pub fn diagram_not_found(diagram_id: &str) -> Self {
        NotFoundError::Diagram {
            diagram_id: diagram_id.to_string(),
        }
        .into()
    }

    /// Shorthand for [`NotFoundError::Shape`]
    pub fn shape_not_found(diagram_id: &str, shape_id: &str) -> Self {
        NotFoundError::Shape {
            diagram_id: diagram_id.to_string(),
            shape_id: shape_id.to_string(),
        }
        .into()
    }

    /// Shorthand for [`NotFoundError::Connector`]
    pub fn connector_not_found(diagram_id: &str, connector_id: &str) -> Self {
        NotFoundError::Connector {
            diagram_id: diagram_id.to_string(),
            connector_id: connector_id.to_string(),
        }
        .into()
    }

    /// Check if this is a lookup error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is an undo invariant violation
    pub fn is_undo_invariant_violation(&self) -> bool {
        matches!(self, Error::UndoInvariantViolation { .. })
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or saving the editor configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file format is not supported.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A configuration value is out of its valid range.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}
