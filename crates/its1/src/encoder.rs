//! Value encoding: one property of one instance onto the markup writer.
//!
//! The graph writer decides *which* properties are written and in *what*
//! order; a [`ValueEncoder`] decides *how* each value looks on the wire.

use tracing::trace;

use crate::config::FormatterConfig;
use crate::error::Result;
use crate::graph::GraphWriter;
use crate::introspect::PropertyDescriptor;
use crate::metadata::{Graphable, PropertyRole};
use crate::result::{DetailKind, GraphResult, ResultCode, ResultDetail};
use crate::value::PropertyValue;
use crate::xml::MarkupWriter;

/// Everything an encoder may use while encoding the properties of one instance.
pub struct EncodeContext<'a> {
    graph: &'a GraphWriter,
    writer: &'a mut dyn MarkupWriter,
    result: &'a mut GraphResult,
    owner: &'a dyn Graphable,
    owner_is_null: bool,
    nested_nonconformant: bool,
}

impl<'a> EncodeContext<'a> {
    pub(crate) fn new(
        graph: &'a GraphWriter,
        writer: &'a mut dyn MarkupWriter,
        result: &'a mut GraphResult,
        owner: &'a dyn Graphable,
        owner_is_null: bool,
    ) -> Self {
        Self {
            graph,
            writer,
            result,
            owner,
            owner_is_null,
            nested_nonconformant: false,
        }
    }

    /// The markup writer of the current stream.
    pub fn writer(&mut self) -> &mut dyn MarkupWriter {
        &mut *self.writer
    }

    /// The result context of the current write.
    pub fn result(&mut self) -> &mut GraphResult {
        &mut *self.result
    }

    /// The instance whose properties are being encoded.
    pub fn owner(&self) -> &'a dyn Graphable {
        self.owner
    }

    /// True if the owning instance carries a null flavor.
    pub fn owner_is_null(&self) -> bool {
        self.owner_is_null
    }

    /// Configuration of the graph writer.
    pub fn config(&self) -> &'a FormatterConfig {
        let graph: &'a GraphWriter = self.graph;
        graph.config()
    }

    /// Dotted location of a property of the owner, for diagnostics.
    pub fn location(&self, property: &PropertyDescriptor) -> String {
        format!("{}.{}", self.owner.metadata().element_name, property.name)
    }

    /// Graphs a nested instance into the current element.
    pub fn graph_nested(&mut self, node: &dyn Graphable) -> Result<ResultCode> {
        let owner = self.owner;
        let code =
            self.graph
                .write(&mut *self.writer, Some(node), Some(owner), &mut *self.result)?;
        if !code.is_conformant() {
            self.nested_nonconformant = true;
        }
        Ok(code)
    }

    /// True if a nested graph written through this context was non-conformant.
    pub(crate) fn nested_nonconformant(&self) -> bool {
        self.nested_nonconformant
    }
}

/// Produces the markup of a single property.
pub trait ValueEncoder {
    /// Encodes `value` of `property`. When [`EncodeContext::owner_is_null`]
    /// is set the encoder should emit an absence representation instead of
    /// the value.
    fn encode(
        &self,
        ctx: &mut EncodeContext<'_>,
        property: &PropertyDescriptor,
        value: PropertyValue<'_>,
    ) -> Result<()>;
}

/// XML ITS 1.0 encoder.
///
/// - Structural properties are attributes; repeated values are joined with spaces.
/// - NonStructural and TraversableAssociation properties are child elements in
///   the schema namespace, carrying either text or a nested graph.
/// - For a null owner only Structural properties (such as `nullFlavor`) are
///   written.
#[derive(Debug, Clone, Copy, Default)]
pub struct Its1Encoder;

impl Its1Encoder {
    fn encode_attribute(
        &self,
        ctx: &mut EncodeContext<'_>,
        property: &PropertyDescriptor,
        value: &PropertyValue<'_>,
    ) -> Result<()> {
        match value {
            PropertyValue::Absent => Ok(()),
            PropertyValue::Text(text) => ctx.writer().write_attribute(property.name, text),
            PropertyValue::List(items) => {
                let mut tokens: Vec<&str> = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        PropertyValue::Text(text) => tokens.push(&**text),
                        PropertyValue::Absent => {}
                        other => {
                            self.report_unsupported(ctx, property, other, "a repeated attribute");
                            return Ok(());
                        }
                    }
                }
                if tokens.is_empty() {
                    return Ok(());
                }
                let joined = tokens.join(" ");
                ctx.writer().write_attribute(property.name, &joined)
            }
            PropertyValue::Node(_) => {
                self.report_unsupported(ctx, property, value, "an attribute");
                Ok(())
            }
        }
    }

    fn encode_element(
        &self,
        ctx: &mut EncodeContext<'_>,
        property: &PropertyDescriptor,
        value: PropertyValue<'_>,
    ) -> Result<()> {
        let config = ctx.config();
        match value {
            PropertyValue::Absent => Ok(()),
            PropertyValue::Text(text) => {
                let writer = ctx.writer();
                writer.start_element(
                    config.schema_prefix(),
                    property.name,
                    &config.schema_namespace,
                )?;
                writer.write_text(&text)?;
                writer.end_element()
            }
            PropertyValue::Node(node) => {
                if node.metadata().structure_kind.is_entry_point() {
                    // Interactions open their own root element
                    ctx.graph_nested(node)?;
                    return Ok(());
                }
                ctx.writer().start_element(
                    config.schema_prefix(),
                    property.name,
                    &config.schema_namespace,
                )?;
                ctx.graph_nested(node)?;
                ctx.writer().end_element()
            }
            PropertyValue::List(items) => {
                for item in items {
                    self.encode_element(ctx, property, item)?;
                }
                Ok(())
            }
        }
    }

    fn report_unsupported(
        &self,
        ctx: &mut EncodeContext<'_>,
        property: &PropertyDescriptor,
        value: &PropertyValue<'_>,
        slot: &str,
    ) {
        let shape = match value {
            PropertyValue::Node(_) => "a nested object",
            PropertyValue::List(_) => "a nested list",
            PropertyValue::Text(_) | PropertyValue::Absent => "a value",
        };
        let location = ctx.location(property);
        ctx.result().add_detail(
            ResultDetail::warning(
                DetailKind::UnsupportedValue,
                format!(
                    "property '{}' holds {} that cannot be written as {}; skipped",
                    property.name, shape, slot
                ),
            )
            .with_location(location),
        );
    }
}

impl ValueEncoder for Its1Encoder {
    fn encode(
        &self,
        ctx: &mut EncodeContext<'_>,
        property: &PropertyDescriptor,
        value: PropertyValue<'_>,
    ) -> Result<()> {
        if ctx.owner_is_null() && property.role != PropertyRole::Structural {
            trace!(property = property.name, "Owner is null, value suppressed");
            return Ok(());
        }

        match property.role {
            PropertyRole::Structural => self.encode_attribute(ctx, property, &value),
            PropertyRole::NonStructural | PropertyRole::TraversableAssociation => {
                self.encode_element(ctx, property, value)
            }
        }
    }
}
