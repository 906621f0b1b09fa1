//! Error types for graphing instances onto XML.
//!
//! Recoverable schema irregularities are reported through
//! [`GraphResult`](crate::result::GraphResult) details; everything in this
//! module is fatal to the `write` call that raised it.

use thiserror::Error;

/// Errors raised while graphing an instance.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The caller passed an absent instance.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A type declares conflicting metadata for one of its properties.
    ///
    /// Only raised when strict metadata handling is enabled; otherwise the
    /// conflict is resolved and reported as a result detail.
    #[error("conflicting metadata on {type_name}.{property}: {message}")]
    MetadataResolution {
        type_name: String,
        property: String,
        message: String,
    },

    /// The instance could not serve a property its metadata declares.
    #[error("property {type_name}.{property} (slot {slot}) is not readable")]
    UnreadableProperty {
        type_name: String,
        property: String,
        slot: usize,
    },

    /// Error raised by quick-xml while emitting events
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error on the underlying sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The markup writer was driven out of sequence (e.g. an attribute after content).
    #[error("markup error: {0}")]
    Markup(String),

    /// A value encoder could not produce markup for a property.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl GraphError {
    /// Returns true if the error came from a collaborator (writer or encoder)
    /// rather than from the instance or its metadata.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            GraphError::Xml(_) | GraphError::Io(_) | GraphError::Markup(_) | GraphError::Encoding(_)
        )
    }
}

/// Result type alias for graphing operations
pub type Result<T> = std::result::Result<T, GraphError>;
