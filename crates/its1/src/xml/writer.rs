//! quick-xml backed [`MarkupWriter`].
//!
//! The start tag of the innermost element is buffered until content or a
//! child is written, so attributes and namespace declarations may follow
//! `start_element`. Elements closed while still buffered are written as
//! empty elements (`<id root="..."/>`).

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::config::FormatterConfig;
use crate::error::{GraphError, Result};
use crate::xml::MarkupWriter;
use crate::xml::utils;

/// Start tag waiting for its attributes.
#[derive(Debug)]
struct PendingStart {
    prefix: String,
    namespace: String,
    attributes: Vec<(String, String)>,
}

/// An element whose end tag has not been written.
#[derive(Debug)]
struct OpenElement {
    qualified_name: String,
    /// Namespace bindings declared on this element (prefix, uri).
    bindings: Vec<(String, String)>,
}

/// XML writer that streams quick-xml events to `W`.
pub struct XmlStreamWriter<W: Write> {
    writer: Writer<W>,
    pending: Option<PendingStart>,
    open: Vec<OpenElement>,
    write_declaration: bool,
    declaration_written: bool,
}

impl<W: Write> XmlStreamWriter<W> {
    /// Creates a compact writer that emits an XML declaration before the first element.
    pub fn new(writer: W) -> Self {
        Self::from_writer(Writer::new(writer))
    }

    /// Creates a writer indenting nested elements by `indent` spaces.
    pub fn with_indent(writer: W, indent: usize) -> Self {
        Self::from_writer(Writer::new_with_indent(writer, b' ', indent))
    }

    /// Creates a writer following the output options of `config`.
    pub fn with_config(writer: W, config: &FormatterConfig) -> Self {
        let mut xml = if config.indent > 0 {
            Self::with_indent(writer, config.indent)
        } else {
            Self::new(writer)
        };
        xml.write_declaration = config.xml_declaration;
        xml
    }

    fn from_writer(writer: Writer<W>) -> Self {
        Self {
            writer,
            pending: None,
            open: Vec::new(),
            write_declaration: true,
            declaration_written: false,
        }
    }

    /// Disables the XML declaration (for fragments).
    pub fn without_declaration(mut self) -> Self {
        self.write_declaration = false;
        self
    }

    /// Closes every element still open, flushes, and returns the sink.
    pub fn finish(mut self) -> Result<W> {
        while !self.open.is_empty() {
            self.end_element()?;
        }
        self.writer.get_mut().flush()?;
        Ok(self.writer.into_inner())
    }

    /// Namespace URI bound to `prefix` in the current scope.
    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.open.iter().rev().find_map(|element| {
            element
                .bindings
                .iter()
                .find(|(bound, _)| bound == prefix)
                .map(|(_, uri)| uri.as_str())
        })
    }

    fn write_xml_declaration(&mut self) -> Result<()> {
        if self.write_declaration && !self.declaration_written {
            self.writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }
        self.declaration_written = true;
        Ok(())
    }

    /// Builds the start tag of the innermost element, declaring its own
    /// prefix if nothing in scope binds it to the element's namespace.
    fn build_start(&mut self, pending: PendingStart) -> Result<BytesStart<'static>> {
        let resolved = match self.lookup(&pending.prefix) {
            Some(uri) => uri == pending.namespace,
            // No binding is needed for an unqualified element outside any namespace
            None => pending.prefix.is_empty() && pending.namespace.is_empty(),
        };

        let element = self
            .open
            .last_mut()
            .ok_or_else(|| GraphError::Markup("no element is open".to_string()))?;
        if !resolved {
            element
                .bindings
                .push((pending.prefix.clone(), pending.namespace.clone()));
        }

        let mut start = BytesStart::new(element.qualified_name.clone());
        for (name, value) in &pending.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }
        for (prefix, uri) in &element.bindings {
            let name = utils::xmlns_attribute(prefix);
            start.push_attribute((name.as_str(), uri.as_str()));
        }
        Ok(start)
    }

    /// Writes the buffered start tag, if any.
    fn flush_pending(&mut self) -> Result<()> {
        if let Some(pending) = self.pending.take() {
            let start = self.build_start(pending)?;
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    fn pending_mut(&mut self, what: &str) -> Result<&mut PendingStart> {
        self.pending.as_mut().ok_or_else(|| {
            GraphError::Markup(format!(
                "{} must directly follow start_element (no open start tag)",
                what
            ))
        })
    }
}

impl<W: Write> MarkupWriter for XmlStreamWriter<W> {
    fn start_element(
        &mut self,
        prefix: Option<&str>,
        local_name: &str,
        namespace: &str,
    ) -> Result<()> {
        self.flush_pending()?;
        self.write_xml_declaration()?;

        let prefix = prefix.unwrap_or_default();
        self.open.push(OpenElement {
            qualified_name: utils::qualified_name(Some(prefix), local_name),
            bindings: Vec::new(),
        });
        self.pending = Some(PendingStart {
            prefix: prefix.to_string(),
            namespace: namespace.to_string(),
            attributes: Vec::new(),
        });
        Ok(())
    }

    fn write_namespace(&mut self, prefix: &str, namespace: &str) -> Result<()> {
        self.pending_mut("namespace declaration")?;

        if self.lookup(prefix) == Some(namespace) {
            return Ok(());
        }

        let element = self
            .open
            .last_mut()
            .ok_or_else(|| GraphError::Markup("no element is open".to_string()))?;
        if element.bindings.iter().any(|(bound, _)| bound == prefix) {
            return Err(GraphError::Markup(format!(
                "prefix '{}' is already bound on <{}>",
                prefix, element.qualified_name
            )));
        }
        element
            .bindings
            .push((prefix.to_string(), namespace.to_string()));
        Ok(())
    }

    fn write_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        if utils::is_namespace_declaration(name) {
            return Err(GraphError::Markup(format!(
                "'{}' must be declared with write_namespace",
                name
            )));
        }
        let pending = self.pending_mut("attribute")?;
        pending.attributes.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        if self.open.is_empty() {
            return Err(GraphError::Markup(
                "text written outside of any element".to_string(),
            ));
        }
        self.flush_pending()?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn end_element(&mut self) -> Result<()> {
        if self.open.is_empty() {
            return Err(GraphError::Markup("no element to close".to_string()));
        }

        if let Some(pending) = self.pending.take() {
            let start = self.build_start(pending)?;
            self.writer.write_event(Event::Empty(start))?;
            self.open.pop();
        } else if let Some(element) = self.open.pop() {
            self.writer
                .write_event(Event::End(BytesEnd::new(element.qualified_name)))?;
        }
        Ok(())
    }

    fn depth(&self) -> usize {
        self.open.len()
    }
}
