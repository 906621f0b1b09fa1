//! # Helios HL7 v3 XML ITS 1.0 Graphing
//!
//! This crate renders typed domain objects as namespace-qualified HL7 v3 XML
//! elements, driven entirely by structural metadata declared on each type.
//!
//! ## Architecture
//!
//! - **Metadata** ([`metadata`]): every graphable type carries a static
//!   [`TypeMetadata`] table naming its element, its structure kind and, per
//!   property, a role and sort key. `#[derive(Graphable)]` generates the table.
//! - **Introspection** ([`introspect`]): turns the table into an ordered
//!   [`TypeDescriptor`]: Structural, then NonStructural, then
//!   TraversableAssociation properties, ascending sort key within each group.
//!   Descriptors are cached process-wide.
//! - **Classification** ([`classify`]): null-flavored instances and
//!   interaction (root) instances.
//! - **Graph writer** ([`graph`]): opens root elements with their namespace
//!   declarations and feeds every property, in order, to a [`ValueEncoder`]
//!   writing through a [`MarkupWriter`].
//!
//! ## Wire Mapping
//!
//! With the default [`Its1Encoder`]:
//!
//! | Property role | XML |
//! |---------------|-----|
//! | Structural | attribute on the instance's element |
//! | NonStructural | child element (text or nested graph) |
//! | TraversableAssociation | child element (nested graph), written last |
//!
//! ## Examples
//!
//! ```ignore
//! use helios_its1::{Graphable, to_xml_string};
//!
//! #[derive(Graphable)]
//! #[structure(name = "PRPA_IN201305UV02", kind = "interaction")]
//! struct FindCandidatesQuery {
//!     #[property(role = "non_structural", sort_key = 1)]
//!     id: Option<String>,
//! }
//!
//! let xml = to_xml_string(&FindCandidatesQuery { id: Some("q1".into()) })?;
//! ```

// Lets generated code refer to `::helios_its1` from inside this crate's tests
extern crate self as helios_its1;

pub mod classify;
pub mod config;
pub mod encoder;
pub mod error;
pub mod graph;
pub mod introspect;
pub mod metadata;
pub mod null_flavor;
pub mod result;
pub mod value;
pub mod xml;

pub use classify::{Classification, classify};
pub use config::FormatterConfig;
pub use encoder::{EncodeContext, Its1Encoder, ValueEncoder};
pub use error::{GraphError, Result};
pub use graph::{GraphWriter, to_xml_string, to_xml_vec, to_xml_writer};
pub use introspect::{
    Accessor, ConflictKind, DescriptorCache, MetadataConflict, PropertyDescriptor,
    TypeDescriptor, describe, describe_metadata,
};
pub use metadata::{
    Graphable, NullFlavored, PropertyDeclaration, PropertyMetadata, PropertyRole, StructureKind,
    TypeMetadata,
};
pub use null_flavor::NullFlavor;
pub use result::{DetailKind, DetailSeverity, GraphResult, ResultCode, ResultDetail};
pub use value::{IntoPropertyValue, PropertyValue};
pub use xml::{MarkupWriter, XmlStreamWriter};

pub use helios_its1_macro::Graphable;
