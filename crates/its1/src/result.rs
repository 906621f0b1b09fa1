//! Graph results and the diagnostics reported while graphing.
//!
//! The graph writer reports recoverable irregularities here instead of
//! failing the call. A result carrying error details is marked
//! [`ResultCode::AcceptedNonConformant`]: the markup was produced but may not
//! conform to the wire schema.

use serde::{Deserialize, Serialize};

/// Outcome of a graph operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResultCode {
    /// Markup was produced without irregularities.
    #[default]
    Accepted,
    /// Markup was produced but irregularities were reported.
    AcceptedNonConformant,
}

impl ResultCode {
    /// Returns true if the markup conforms.
    pub fn is_conformant(&self) -> bool {
        *self == ResultCode::Accepted
    }
}

/// Severity of a result detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailSeverity {
    Error,
    Warning,
    Information,
}

/// What kind of irregularity a detail describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetailKind {
    /// Conflicting role/sort-key declarations on a property.
    MetadataResolution,
    /// A value that cannot be represented in its property's role.
    UnsupportedValue,
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDetail {
    pub severity: DetailSeverity,
    pub kind: DetailKind,
    pub message: String,
    /// Dotted path of the offending property (`Type.property`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ResultDetail {
    /// Creates a new detail.
    pub fn new(severity: DetailSeverity, kind: DetailKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            location: None,
        }
    }

    /// Creates an error detail.
    pub fn error(kind: DetailKind, message: impl Into<String>) -> Self {
        Self::new(DetailSeverity::Error, kind, message)
    }

    /// Creates a warning detail.
    pub fn warning(kind: DetailKind, message: impl Into<String>) -> Self {
        Self::new(DetailSeverity::Warning, kind, message)
    }

    /// Sets the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Collects the outcome of one or more graph calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphResult {
    pub code: ResultCode,
    pub details: Vec<ResultDetail>,
}

impl GraphResult {
    /// Creates an accepted result with no details.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a detail. Error details downgrade the code to non-conformant.
    pub fn add_detail(&mut self, detail: ResultDetail) {
        if detail.severity == DetailSeverity::Error {
            self.code = ResultCode::AcceptedNonConformant;
        }
        self.details.push(detail);
    }

    /// Details of the given kind.
    pub fn details_of(&self, kind: DetailKind) -> impl Iterator<Item = &ResultDetail> {
        self.details.iter().filter(move |d| d.kind == kind)
    }

    /// Returns true if any error detail was reported.
    pub fn has_errors(&self) -> bool {
        self.details
            .iter()
            .any(|d| d.severity == DetailSeverity::Error)
    }
}
