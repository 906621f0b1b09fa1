//! The graph writer: one instance onto one markup stream.
//!
//! Each [`GraphWriter::write`] call is self-contained:
//!
//! 1. reject an absent instance before anything is written,
//! 2. resolve the type descriptor and classify the instance,
//! 3. report (or, in strict mode, fail on) conflicting property metadata,
//! 4. open the root element if the instance is an interaction,
//! 5. hand every property, in descriptor order, to the value encoder,
//! 6. close the root element.
//!
//! The returned code is non-conformant when this type, or any type graphed
//! beneath it, has conflicting metadata, or when the call added error details.
//!
//! Opening the element of a nested, non-root instance is the job of whoever
//! writes the owning property (see [`Its1Encoder`]).

use std::io::Write;

use tracing::{debug, trace};

use crate::classify::classify;
use crate::config::FormatterConfig;
use crate::encoder::{EncodeContext, Its1Encoder, ValueEncoder};
use crate::error::{GraphError, Result};
use crate::introspect::{DescriptorCache, TypeDescriptor};
use crate::metadata::Graphable;
use crate::result::{DetailKind, DetailSeverity, GraphResult, ResultCode, ResultDetail};
use crate::xml::{MarkupWriter, XmlStreamWriter};

/// Attribute carrying the wire version on root elements.
pub const ITS_VERSION_ATTRIBUTE: &str = "ITSVersion";

/// Graphs instances onto markup writers.
///
/// Collaborators are fixed at construction; a writer holds no per-call state
/// and can be shared between threads.
pub struct GraphWriter {
    config: FormatterConfig,
    encoder: Box<dyn ValueEncoder + Send + Sync>,
    cache: &'static DescriptorCache,
}

impl Default for GraphWriter {
    fn default() -> Self {
        Self::with_config(FormatterConfig::default())
    }
}

impl GraphWriter {
    /// Creates a graph writer with a custom value encoder.
    pub fn new<E>(config: FormatterConfig, encoder: E) -> Self
    where
        E: ValueEncoder + Send + Sync + 'static,
    {
        Self {
            config,
            encoder: Box::new(encoder),
            cache: DescriptorCache::global(),
        }
    }

    /// Creates a graph writer using the XML ITS 1.0 encoder.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self::new(config, Its1Encoder)
    }

    /// The configuration of this writer.
    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// Graphs `instance` onto `writer`.
    ///
    /// `parent` is the instance owning the property being written, if any.
    /// Irregularities are added to `result`; the returned code reflects only
    /// this call (and the nested calls it made).
    pub fn write(
        &self,
        writer: &mut dyn MarkupWriter,
        instance: Option<&dyn Graphable>,
        parent: Option<&dyn Graphable>,
        result: &mut GraphResult,
    ) -> Result<ResultCode> {
        let instance = instance.ok_or_else(|| {
            GraphError::InvalidArgument("cannot graph an absent instance".to_string())
        })?;

        let descriptor = self.cache.describe(instance.metadata());
        let classification = classify(instance);
        let errors_before = count_errors(result);

        self.report_conflicts(&descriptor, result)?;

        if classification.is_root {
            self.open_root(writer, &descriptor)?;
        }
        debug!(
            element = descriptor.element_name,
            parent = parent.map(|p| p.metadata().element_name),
            is_root = classification.is_root,
            is_null = classification.is_null,
            "Graphing instance"
        );

        let nested_nonconformant = {
            let mut ctx =
                EncodeContext::new(self, writer, result, instance, classification.is_null);
            for property in descriptor.properties() {
                let slot = property.accessor.slot();
                let value =
                    instance
                        .read_property(slot)
                        .ok_or_else(|| GraphError::UnreadableProperty {
                            type_name: descriptor.type_name.to_string(),
                            property: property.name.to_string(),
                            slot,
                        })?;
                trace!(
                    element = descriptor.element_name,
                    property = property.name,
                    role = property.role.as_str(),
                    "Encoding property"
                );
                self.encoder.encode(&mut ctx, property, value)?;
            }
            ctx.nested_nonconformant()
        };

        if classification.is_root {
            writer.end_element()?;
        }

        // Conflicts already reported to this result still mark this call
        if !descriptor.conflicts().is_empty()
            || nested_nonconformant
            || count_errors(result) > errors_before
        {
            Ok(ResultCode::AcceptedNonConformant)
        } else {
            Ok(ResultCode::Accepted)
        }
    }

    /// Graphs a typed instance; shorthand for [`GraphWriter::write`] without a parent.
    pub fn write_instance<T: Graphable>(
        &self,
        writer: &mut dyn MarkupWriter,
        instance: &T,
        result: &mut GraphResult,
    ) -> Result<ResultCode> {
        self.write(writer, Some(instance as &dyn Graphable), None, result)
    }

    /// Reports the metadata irregularities of the instance's type without
    /// writing anything. `location` prefixes the reported locations.
    pub fn validate(&self, instance: &dyn Graphable, location: &str) -> Vec<ResultDetail> {
        let descriptor = self.cache.describe(instance.metadata());
        descriptor
            .conflicts()
            .iter()
            .map(|conflict| {
                let location = if location.is_empty() {
                    format!("{}.{}", descriptor.element_name, conflict.property)
                } else {
                    format!("{}.{}", location, conflict.property)
                };
                ResultDetail::error(DetailKind::MetadataResolution, conflict.message())
                    .with_location(location)
            })
            .collect()
    }

    /// Graphs `instance` into a string, returning the markup and its diagnostics.
    pub fn to_xml_string(&self, instance: &dyn Graphable) -> Result<(String, GraphResult)> {
        let (buffer, result) = self.to_xml_writer(instance, Vec::new())?;
        let xml = String::from_utf8(buffer).map_err(|e| GraphError::Encoding(e.to_string()))?;
        Ok((xml, result))
    }

    /// Graphs `instance` onto an `io::Write` sink and returns the sink.
    pub fn to_xml_writer<W: Write>(
        &self,
        instance: &dyn Graphable,
        sink: W,
    ) -> Result<(W, GraphResult)> {
        let mut writer = XmlStreamWriter::with_config(sink, &self.config);
        let mut result = GraphResult::new();
        self.write(&mut writer, Some(instance), None, &mut result)?;
        Ok((writer.finish()?, result))
    }

    fn report_conflicts(&self, descriptor: &TypeDescriptor, result: &mut GraphResult) -> Result<()> {
        for conflict in descriptor.conflicts() {
            if self.config.strict_metadata {
                return Err(GraphError::MetadataResolution {
                    type_name: conflict.type_name.to_string(),
                    property: conflict.property.to_string(),
                    message: conflict.message(),
                });
            }

            let detail = ResultDetail::error(DetailKind::MetadataResolution, conflict.message())
                .with_location(format!("{}.{}", descriptor.element_name, conflict.property));
            // Repeated instances of one type report a conflict once per result
            if !result.details.contains(&detail) {
                result.add_detail(detail);
            }
        }
        Ok(())
    }

    fn open_root(&self, writer: &mut dyn MarkupWriter, descriptor: &TypeDescriptor) -> Result<()> {
        let config = &self.config;
        debug!(element = descriptor.element_name, "Opening root element");

        writer.start_element(
            config.schema_prefix(),
            descriptor.element_name,
            &config.schema_namespace,
        )?;
        writer.write_attribute(ITS_VERSION_ATTRIBUTE, &config.its_version)?;
        writer.write_namespace(&config.schema_prefix, &config.schema_namespace)?;
        writer.write_namespace(&config.instance_prefix, &config.instance_namespace)?;
        Ok(())
    }
}

fn count_errors(result: &GraphResult) -> usize {
    result
        .details
        .iter()
        .filter(|d| d.severity == DetailSeverity::Error)
        .count()
}

/// Graphs `instance` to an XML string with default settings.
///
/// Conflicting property metadata fails the call, since the diagnostics of a
/// lenient write would be lost.
///
/// # Examples
///
/// ```ignore
/// use helios_its1::to_xml_string;
///
/// let xml = to_xml_string(&message)?;
/// ```
pub fn to_xml_string(instance: &dyn Graphable) -> Result<String> {
    let (xml, _) = strict_writer().to_xml_string(instance)?;
    Ok(xml)
}

/// Graphs `instance` to an XML byte vector with default settings.
pub fn to_xml_vec(instance: &dyn Graphable) -> Result<Vec<u8>> {
    let (buffer, _) = strict_writer().to_xml_writer(instance, Vec::new())?;
    Ok(buffer)
}

/// Graphs `instance` onto an `io::Write` sink with default settings.
pub fn to_xml_writer<W: Write>(instance: &dyn Graphable, sink: W) -> Result<()> {
    strict_writer().to_xml_writer(instance, sink)?;
    Ok(())
}

fn strict_writer() -> GraphWriter {
    GraphWriter::with_config(FormatterConfig {
        strict_metadata: true,
        ..FormatterConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        NullFlavored, PropertyDeclaration, PropertyMetadata, PropertyRole, StructureKind,
        TypeMetadata,
    };
    use crate::null_flavor::NullFlavor;
    use crate::value::{IntoPropertyValue, PropertyValue};

    const fn decl(role: PropertyRole, sort_key: i32) -> PropertyDeclaration {
        PropertyDeclaration::new(role, sort_key)
    }

    static MESSAGE: TypeMetadata = TypeMetadata {
        type_name: "graph::tests::Message",
        element_name: "MCCI_IN000002UV01",
        structure_kind: StructureKind::Interaction,
        properties: &[PropertyMetadata {
            name: "id",
            declarations: &[decl(PropertyRole::NonStructural, 1)],
        }],
    };

    struct Message {
        id: Option<String>,
    }

    impl Graphable for Message {
        fn type_metadata() -> &'static TypeMetadata {
            &MESSAGE
        }

        fn metadata(&self) -> &'static TypeMetadata {
            &MESSAGE
        }

        fn read_property(&self, slot: usize) -> Option<PropertyValue<'_>> {
            match slot {
                0 => Some(self.id.to_property_value()),
                _ => None,
            }
        }
    }

    static BROKEN: TypeMetadata = TypeMetadata {
        type_name: "graph::tests::Broken",
        element_name: "Broken",
        structure_kind: StructureKind::Entity,
        properties: &[PropertyMetadata {
            name: "ghost",
            declarations: &[],
        }],
    };

    struct Broken;

    impl Graphable for Broken {
        fn type_metadata() -> &'static TypeMetadata {
            &BROKEN
        }

        fn metadata(&self) -> &'static TypeMetadata {
            &BROKEN
        }

        fn read_property(&self, _slot: usize) -> Option<PropertyValue<'_>> {
            None
        }
    }

    static CONFLICTED: TypeMetadata = TypeMetadata {
        type_name: "graph::tests::Conflicted",
        element_name: "Conflicted",
        structure_kind: StructureKind::Entity,
        properties: &[
            PropertyMetadata {
                name: "classCode",
                declarations: &[decl(PropertyRole::Structural, 1)],
            },
            PropertyMetadata {
                name: "c",
                declarations: &[
                    decl(PropertyRole::Structural, 2),
                    decl(PropertyRole::TraversableAssociation, 2),
                ],
            },
        ],
    };

    struct Conflicted {
        null_flavor: Option<NullFlavor>,
    }

    impl NullFlavored for Conflicted {
        fn null_flavor(&self) -> Option<NullFlavor> {
            self.null_flavor
        }
    }

    impl Graphable for Conflicted {
        fn type_metadata() -> &'static TypeMetadata {
            &CONFLICTED
        }

        fn metadata(&self) -> &'static TypeMetadata {
            &CONFLICTED
        }

        fn read_property(&self, slot: usize) -> Option<PropertyValue<'_>> {
            match slot {
                0 => Some(PropertyValue::text("ENT")),
                1 => Some(PropertyValue::text("value-of-c")),
                _ => None,
            }
        }

        fn as_null_flavored(&self) -> Option<&dyn NullFlavored> {
            Some(self)
        }
    }

    fn fragment() -> XmlStreamWriter<Vec<u8>> {
        XmlStreamWriter::new(Vec::new()).without_declaration()
    }

    fn output(writer: XmlStreamWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_absent_instance_is_invalid_argument() {
        let graph = GraphWriter::default();
        let mut writer = fragment();
        let mut result = GraphResult::new();

        let err = graph.write(&mut writer, None, None, &mut result).unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument(_)));
        assert_eq!(writer.depth(), 0);
        assert_eq!(output(writer), "");
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_root_element_declares_namespaces() -> Result<()> {
        let graph = GraphWriter::default();
        let mut writer = fragment();
        let mut result = GraphResult::new();
        let message = Message {
            id: Some("m1".to_string()),
        };

        let code = graph.write_instance(&mut writer, &message, &mut result)?;
        assert_eq!(code, ResultCode::Accepted);
        assert_eq!(
            output(writer),
            concat!(
                r#"<hl7:MCCI_IN000002UV01 ITSVersion="XML_1.0" xmlns:hl7="urn:hl7-org:v3" "#,
                r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
                r#"<hl7:id>m1</hl7:id></hl7:MCCI_IN000002UV01>"#
            )
        );
        Ok(())
    }

    #[test]
    fn test_non_root_writes_into_current_element() -> Result<()> {
        let graph = GraphWriter::default();
        let mut writer = fragment();
        let mut result = GraphResult::new();

        writer.start_element(None, "subject", "")?;
        let instance = Conflicted { null_flavor: None };
        graph.write(&mut writer, Some(&instance), None, &mut result)?;
        writer.end_element()?;

        assert_eq!(output(writer), r#"<subject classCode="ENT" c="value-of-c"/>"#);
        Ok(())
    }

    #[test]
    fn test_conflict_is_reported_once_and_marks_result() -> Result<()> {
        let graph = GraphWriter::default();
        let mut writer = fragment();
        let mut result = GraphResult::new();
        let instance = Conflicted { null_flavor: None };

        writer.start_element(None, "a", "")?;
        let code = graph.write(&mut writer, Some(&instance), None, &mut result)?;
        writer.end_element()?;
        writer.start_element(None, "b", "")?;
        let repeated = graph.write(&mut writer, Some(&instance), None, &mut result)?;
        writer.end_element()?;

        assert_eq!(code, ResultCode::AcceptedNonConformant);
        assert_eq!(repeated, ResultCode::AcceptedNonConformant);
        assert_eq!(result.code, ResultCode::AcceptedNonConformant);
        let details: Vec<_> = result.details_of(DetailKind::MetadataResolution).collect();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].location.as_deref(), Some("Conflicted.c"));
        Ok(())
    }

    #[test]
    fn test_strict_conflict_fails_before_markup() {
        let graph = GraphWriter::with_config(FormatterConfig {
            strict_metadata: true,
            ..Default::default()
        });
        let mut writer = fragment();
        let mut result = GraphResult::new();
        let instance = Conflicted { null_flavor: None };

        let err = graph
            .write(&mut writer, Some(&instance), None, &mut result)
            .unwrap_err();
        match err {
            GraphError::MetadataResolution { property, .. } => assert_eq!(property, "c"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(output(writer), "");
    }

    #[test]
    fn test_unreadable_property_is_an_error() {
        let graph = GraphWriter::default();
        let mut writer = fragment();
        let mut result = GraphResult::new();

        let err = graph
            .write(&mut writer, Some(&Broken), None, &mut result)
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnreadableProperty { slot: 0, .. }
        ));
    }

    #[test]
    fn test_validate_reports_without_writing() {
        let graph = GraphWriter::default();
        let details = graph.validate(&Conflicted { null_flavor: None }, "subject");
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].location.as_deref(), Some("subject.c"));
        assert_eq!(details[0].kind, DetailKind::MetadataResolution);

        assert!(graph.validate(&Message { id: None }, "").is_empty());
    }

    #[test]
    fn test_to_xml_string_is_strict() {
        let err = to_xml_string(&Conflicted { null_flavor: None }).unwrap_err();
        assert!(matches!(err, GraphError::MetadataResolution { .. }));

        let xml = to_xml_string(&Message { id: None }).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.ends_with(
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"/>"#
        ));
    }

    #[test]
    fn test_collaborator_failure_propagates() {
        struct ClosedStream;

        impl MarkupWriter for ClosedStream {
            fn start_element(&mut self, _: Option<&str>, _: &str, _: &str) -> Result<()> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed").into())
            }
            fn write_namespace(&mut self, _: &str, _: &str) -> Result<()> {
                Ok(())
            }
            fn write_attribute(&mut self, _: &str, _: &str) -> Result<()> {
                Ok(())
            }
            fn write_text(&mut self, _: &str) -> Result<()> {
                Ok(())
            }
            fn end_element(&mut self) -> Result<()> {
                Ok(())
            }
            fn depth(&self) -> usize {
                0
            }
        }

        let graph = GraphWriter::default();
        let mut result = GraphResult::new();
        let err = graph
            .write(&mut ClosedStream, Some(&Message { id: None }), None, &mut result)
            .unwrap_err();
        assert!(err.is_collaborator_failure());
    }
}
