//! Markup writing.
//!
//! The graph writer never touches a byte stream directly. It drives a
//! [`MarkupWriter`], a sequential, StAX-like sink: open an element, then add
//! attributes and namespace declarations to it, then write content, then
//! close it. Open/close calls must nest; the writer reports misuse as
//! [`GraphError::Markup`](crate::GraphError::Markup).
//!
//! [`XmlStreamWriter`] is the quick-xml backed implementation.
//!
//! ## Namespace Handling
//!
//! Prefixes used by an element are resolved against the declarations in
//! scope. An element whose prefix is unbound gets the binding declared on
//! itself when its start tag is flushed, so nested documents written without
//! a root element still resolve. Explicit declarations through
//! [`MarkupWriter::write_namespace`] that repeat an in-scope binding are
//! dropped.
//!
//! ```ignore
//! use helios_its1::xml::{MarkupWriter, XmlStreamWriter};
//!
//! let mut writer = XmlStreamWriter::new(Vec::new());
//! writer.start_element(Some("hl7"), "MCCI_IN000002UV01", "urn:hl7-org:v3")?;
//! writer.write_attribute("ITSVersion", "XML_1.0")?;
//! writer.end_element()?;
//! let bytes = writer.finish()?;
//! ```

mod utils;
pub mod writer;

pub use utils::qualified_name;
pub use writer::XmlStreamWriter;

use crate::error::Result;

/// Sequential markup sink consumed by the graph writer and value encoders.
pub trait MarkupWriter {
    /// Opens an element in `namespace`, qualified with `prefix`.
    fn start_element(&mut self, prefix: Option<&str>, local_name: &str, namespace: &str)
    -> Result<()>;

    /// Declares a namespace binding on the element just opened.
    fn write_namespace(&mut self, prefix: &str, namespace: &str) -> Result<()>;

    /// Writes an attribute on the element just opened.
    fn write_attribute(&mut self, name: &str, value: &str) -> Result<()>;

    /// Writes escaped character content inside the current element.
    fn write_text(&mut self, text: &str) -> Result<()>;

    /// Closes the innermost open element.
    fn end_element(&mut self) -> Result<()>;

    /// Number of currently open elements.
    fn depth(&self) -> usize;
}
