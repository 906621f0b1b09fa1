//! HL7 v3 NullFlavor vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reason an otherwise expected value is absent.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NullFlavor {
    /// No information.
    NI,
    /// Invalid.
    INV,
    /// Derived.
    DER,
    /// Other.
    OTH,
    /// Positive infinity.
    PINF,
    /// Negative infinity.
    NINF,
    /// Unencoded.
    UNC,
    /// Masked.
    MSK,
    /// Not applicable.
    NA,
    /// Unknown.
    UNK,
    /// Asked but unknown.
    ASKU,
    /// Temporarily unavailable.
    NAV,
    /// Not asked.
    NASK,
    /// Sufficient quantity.
    QS,
    /// Trace.
    TRC,
    /// Not present.
    NP,
}

impl NullFlavor {
    /// Wire code of the null flavor.
    pub fn as_code(&self) -> &'static str {
        match self {
            NullFlavor::NI => "NI",
            NullFlavor::INV => "INV",
            NullFlavor::DER => "DER",
            NullFlavor::OTH => "OTH",
            NullFlavor::PINF => "PINF",
            NullFlavor::NINF => "NINF",
            NullFlavor::UNC => "UNC",
            NullFlavor::MSK => "MSK",
            NullFlavor::NA => "NA",
            NullFlavor::UNK => "UNK",
            NullFlavor::ASKU => "ASKU",
            NullFlavor::NAV => "NAV",
            NullFlavor::NASK => "NASK",
            NullFlavor::QS => "QS",
            NullFlavor::TRC => "TRC",
            NullFlavor::NP => "NP",
        }
    }

    /// Parse a wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        let flavor = match code {
            "NI" => NullFlavor::NI,
            "INV" => NullFlavor::INV,
            "DER" => NullFlavor::DER,
            "OTH" => NullFlavor::OTH,
            "PINF" => NullFlavor::PINF,
            "NINF" => NullFlavor::NINF,
            "UNC" => NullFlavor::UNC,
            "MSK" => NullFlavor::MSK,
            "NA" => NullFlavor::NA,
            "UNK" => NullFlavor::UNK,
            "ASKU" => NullFlavor::ASKU,
            "NAV" => NullFlavor::NAV,
            "NASK" => NullFlavor::NASK,
            "QS" => NullFlavor::QS,
            "TRC" => NullFlavor::TRC,
            "NP" => NullFlavor::NP,
            _ => return None,
        };
        Some(flavor)
    }
}

impl fmt::Display for NullFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for NullFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NullFlavor::from_code(s).ok_or_else(|| format!("unknown null flavor: {}", s))
    }
}
