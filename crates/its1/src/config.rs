//! Formatter configuration.
//!
//! Namespace constants belong to the host; the graph writer only requires
//! that they are supplied. Values can be set programmatically or read from
//! the environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ITS1_SCHEMA_NAMESPACE` | urn:hl7-org:v3 | Primary schema namespace |
//! | `ITS1_SCHEMA_PREFIX` | hl7 | Prefix bound to the schema namespace |
//! | `ITS1_INSTANCE_NAMESPACE` | http://www.w3.org/2001/XMLSchema-instance | Instance namespace |
//! | `ITS1_INSTANCE_PREFIX` | xsi | Prefix bound to the instance namespace |
//! | `ITS1_VERSION` | XML_1.0 | Value of the root `ITSVersion` attribute |
//! | `ITS1_STRICT_METADATA` | false | Fail instead of reporting metadata conflicts |
//! | `ITS1_INDENT` | 0 | Indentation width (0 disables pretty printing) |
//! | `ITS1_XML_DECLARATION` | true | Write `<?xml ...?>` before the first element |
//!
//! # Example
//!
//! ```rust
//! use helios_its1::FormatterConfig;
//!
//! let config = FormatterConfig {
//!     indent: 2,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::Parser;

/// HL7 v3 schema namespace.
pub const HL7_NAMESPACE: &str = "urn:hl7-org:v3";

/// XML Schema instance namespace.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Configuration of the graph writer and the default encoder.
#[derive(Debug, Clone, Parser)]
#[command(name = "its1")]
#[command(about = "HL7 v3 XML ITS 1.0 graphing options")]
pub struct FormatterConfig {
    /// Primary schema namespace URI.
    #[arg(long, env = "ITS1_SCHEMA_NAMESPACE", default_value = HL7_NAMESPACE)]
    pub schema_namespace: String,

    /// Prefix bound to the schema namespace.
    #[arg(long, env = "ITS1_SCHEMA_PREFIX", default_value = "hl7")]
    pub schema_prefix: String,

    /// Auxiliary instance namespace URI declared on root elements.
    #[arg(long, env = "ITS1_INSTANCE_NAMESPACE", default_value = XSI_NAMESPACE)]
    pub instance_namespace: String,

    /// Prefix bound to the instance namespace.
    #[arg(long, env = "ITS1_INSTANCE_PREFIX", default_value = "xsi")]
    pub instance_prefix: String,

    /// Wire version marker written on root elements.
    #[arg(long, env = "ITS1_VERSION", default_value = "XML_1.0")]
    pub its_version: String,

    /// Fail the write on conflicting property metadata instead of reporting it.
    #[arg(long, env = "ITS1_STRICT_METADATA", default_value = "false", action = clap::ArgAction::Set)]
    pub strict_metadata: bool,

    /// Indentation width; 0 writes compact XML.
    #[arg(long, env = "ITS1_INDENT", default_value = "0")]
    pub indent: usize,

    /// Write the XML declaration before the first element.
    #[arg(long, env = "ITS1_XML_DECLARATION", default_value = "true", action = clap::ArgAction::Set)]
    pub xml_declaration: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            schema_namespace: HL7_NAMESPACE.to_string(),
            schema_prefix: "hl7".to_string(),
            instance_namespace: XSI_NAMESPACE.to_string(),
            instance_prefix: "xsi".to_string(),
            its_version: "XML_1.0".to_string(),
            strict_metadata: false,
            indent: 0,
            xml_declaration: true,
        }
    }
}

impl FormatterConfig {
    /// Creates configuration from environment variables.
    pub fn from_env() -> Self {
        // Only the environment is consulted, never the process arguments
        Self::try_parse_from(["its1"]).unwrap_or_default()
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.schema_namespace.is_empty() {
            errors.push("Schema namespace cannot be empty".to_string());
        }

        if self.instance_namespace.is_empty() {
            errors.push("Instance namespace cannot be empty".to_string());
        }

        // The default namespace is reserved for the schema namespace
        if self.instance_prefix.is_empty() {
            errors.push("Instance prefix cannot be empty".to_string());
        }

        for (label, prefix) in [
            ("Schema prefix", &self.schema_prefix),
            ("Instance prefix", &self.instance_prefix),
        ] {
            if prefix.contains(':') || prefix.chars().any(char::is_whitespace) {
                errors.push(format!("{} '{}' is not a valid XML prefix", label, prefix));
            }
            if prefix.eq_ignore_ascii_case("xmlns") {
                errors.push(format!("{} cannot be 'xmlns'", label));
            }
        }

        if !self.schema_prefix.is_empty() && self.schema_prefix == self.instance_prefix {
            errors.push("Schema and instance prefixes must differ".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// The schema prefix, or `None` when the schema namespace is the default namespace.
    pub fn schema_prefix(&self) -> Option<&str> {
        if self.schema_prefix.is_empty() {
            None
        } else {
            Some(&self.schema_prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FormatterConfig::default();
        assert_eq!(config.schema_namespace, "urn:hl7-org:v3");
        assert_eq!(config.schema_prefix(), Some("hl7"));
        assert_eq!(config.its_version, "XML_1.0");
        assert!(!config.strict_metadata);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_matches_default() {
        let parsed = FormatterConfig::try_parse_from(["its1"]).unwrap();
        let default = FormatterConfig::default();
        // Environment may override, only compare when unset
        if std::env::var("ITS1_SCHEMA_NAMESPACE").is_err() {
            assert_eq!(parsed.schema_namespace, default.schema_namespace);
        }
        if std::env::var("ITS1_INDENT").is_err() {
            assert_eq!(parsed.indent, default.indent);
        }
    }

    #[test]
    fn test_parse_arguments() {
        let config = FormatterConfig::try_parse_from([
            "its1",
            "--schema-prefix",
            "v3",
            "--strict-metadata",
            "true",
            "--indent",
            "4",
        ])
        .unwrap();
        assert_eq!(config.schema_prefix, "v3");
        assert!(config.strict_metadata);
        assert_eq!(config.indent, 4);
    }

    #[test]
    fn test_default_namespace_has_no_prefix() {
        let config = FormatterConfig {
            schema_prefix: String::new(),
            ..Default::default()
        };
        assert_eq!(config.schema_prefix(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_prefixes() {
        let config = FormatterConfig {
            schema_prefix: "xsi".to_string(),
            instance_namespace: String::new(),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);

        let config = FormatterConfig {
            instance_prefix: "a:b".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_instance_prefix() {
        let config = FormatterConfig {
            instance_prefix: String::new(),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors, vec!["Instance prefix cannot be empty".to_string()]);

        let config = FormatterConfig {
            schema_prefix: String::new(),
            instance_prefix: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
