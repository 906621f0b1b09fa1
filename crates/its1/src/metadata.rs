//! Declared structural metadata and the `Graphable` contract.
//!
//! Every type that can be graphed carries a static [`TypeMetadata`] table,
//! either generated by `#[derive(Graphable)]` or written by hand. The table is
//! the only source the introspector reads; nothing is discovered at runtime.
//!
//! ```ignore
//! use helios_its1::Graphable;
//!
//! #[derive(Graphable)]
//! #[structure(name = "Patient", kind = "entity")]
//! struct Patient {
//!     #[property(role = "structural", sort_key = 1)]
//!     class_code: String,
//!     #[property(role = "non_structural", sort_key = 1)]
//!     name: Option<String>,
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::null_flavor::NullFlavor;
use crate::value::PropertyValue;

/// Kind of structure a type represents on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    /// A domain entity (RIM class) nested inside a message.
    Entity,
    /// A message type; valid as a document root.
    Interaction,
    /// A data type such as II or CD.
    DataType,
    /// Anything else.
    #[default]
    Other,
}

impl StructureKind {
    /// Returns true if instances of this kind may stand as the document root.
    pub fn is_entry_point(&self) -> bool {
        *self == StructureKind::Interaction
    }

    /// Parse from the name used in `#[structure(kind = "...")]`.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "entity" => Some(StructureKind::Entity),
            "interaction" => Some(StructureKind::Interaction),
            "datatype" | "data_type" => Some(StructureKind::DataType),
            "other" => Some(StructureKind::Other),
            _ => None,
        }
    }
}

/// Role a property plays in the wire schema.
///
/// The declaration order of the variants is the emission order of the groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyRole {
    /// Always part of the required shape; emitted first (as attributes).
    #[default]
    Structural,
    /// Optional or secondary content.
    NonStructural,
    /// Link to another graphable object; emitted last.
    TraversableAssociation,
}

impl PropertyRole {
    /// Parse from the name used in `#[property(role = "...")]`.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "structural" => Some(PropertyRole::Structural),
            "non_structural" | "nonstructural" => Some(PropertyRole::NonStructural),
            "traversable_association" | "traversableassociation" | "traversable" => {
                Some(PropertyRole::TraversableAssociation)
            }
            _ => None,
        }
    }

    /// Name of the role as used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyRole::Structural => "structural",
            PropertyRole::NonStructural => "non_structural",
            PropertyRole::TraversableAssociation => "traversable_association",
        }
    }
}

/// One role/sort-key declaration attached to a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyDeclaration {
    pub role: PropertyRole,
    pub sort_key: i32,
}

impl PropertyDeclaration {
    /// Effective declaration of a property carrying no metadata.
    pub const UNCLASSIFIED: PropertyDeclaration = PropertyDeclaration {
        role: PropertyRole::Structural,
        sort_key: 0,
    };

    pub const fn new(role: PropertyRole, sort_key: i32) -> Self {
        Self { role, sort_key }
    }
}

/// Declared metadata for one readable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyMetadata {
    /// Wire name of the property (attribute or element name).
    pub name: &'static str,
    /// Declarations in the order they were attached. Empty means unclassified;
    /// more than one is a grouped declaration.
    pub declarations: &'static [PropertyDeclaration],
}

/// Declared metadata for a graphable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMetadata {
    /// Fully qualified Rust type name; the cache key.
    pub type_name: &'static str,
    /// Markup tag emitted for the type.
    pub element_name: &'static str,
    pub structure_kind: StructureKind,
    /// Readable properties in declaration order. A property's index here is
    /// its accessor slot.
    pub properties: &'static [PropertyMetadata],
}

/// Optional capability: the instance can carry a reason for absence.
pub trait NullFlavored {
    /// The null flavor currently set on the instance, if any.
    fn null_flavor(&self) -> Option<NullFlavor>;
}

/// A type whose instances can be graphed onto XML.
///
/// Usually derived with `#[derive(Graphable)]`.
pub trait Graphable {
    /// Static metadata of the type, without an instance.
    fn type_metadata() -> &'static TypeMetadata
    where
        Self: Sized;

    /// Static metadata of the instance's concrete type.
    fn metadata(&self) -> &'static TypeMetadata;

    /// Reads the property declared at `slot` of [`TypeMetadata::properties`].
    ///
    /// Returns `None` if the slot does not exist on this type.
    fn read_property(&self, slot: usize) -> Option<PropertyValue<'_>>;

    /// The null-flavor capability, for types that have one.
    fn as_null_flavored(&self) -> Option<&dyn NullFlavored> {
        None
    }
}
