//! Instance classification: null state and entry-point detection.

use crate::metadata::Graphable;

/// How an instance must be graphed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    /// The instance carries a null flavor and stands for an explicit absence.
    pub is_null: bool,
    /// The instance is a document root (its type is an interaction).
    pub is_root: bool,
}

/// Classifies an instance.
///
/// Instances without the null-flavor capability are never null.
pub fn classify(instance: &dyn Graphable) -> Classification {
    let is_null = instance
        .as_null_flavored()
        .and_then(|flavored| flavored.null_flavor())
        .is_some();
    let is_root = instance.metadata().structure_kind.is_entry_point();

    Classification { is_null, is_root }
}
