//! Property values handed from an instance to the value encoder.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::metadata::Graphable;
use crate::null_flavor::NullFlavor;

/// The value of one property, borrowed from its owning instance.
pub enum PropertyValue<'a> {
    /// No value is set.
    Absent,
    /// A primitive already rendered in its wire form.
    Text(Cow<'a, str>),
    /// A nested graphable object.
    Node(&'a dyn Graphable),
    /// A repeated property.
    List(Vec<PropertyValue<'a>>),
}

impl<'a> PropertyValue<'a> {
    /// Returns true if nothing would be written for this value.
    pub fn is_absent(&self) -> bool {
        match self {
            PropertyValue::Absent => true,
            PropertyValue::List(items) => items.iter().all(PropertyValue::is_absent),
            _ => false,
        }
    }

    /// Returns the text of a primitive value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text.as_ref()),
            _ => None,
        }
    }

    /// Creates a text value from anything that borrows or owns a string.
    pub fn text(value: impl Into<Cow<'a, str>>) -> Self {
        PropertyValue::Text(value.into())
    }
}

impl fmt::Debug for PropertyValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Absent => f.write_str("Absent"),
            PropertyValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            PropertyValue::Node(node) => f
                .debug_tuple("Node")
                .field(&node.metadata().element_name)
                .finish(),
            PropertyValue::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

/// Conversion of a field into a [`PropertyValue`].
///
/// `#[derive(Graphable)]` implements this for the derived type (as a nested
/// node) and calls it for every field.
pub trait IntoPropertyValue {
    fn to_property_value(&self) -> PropertyValue<'_>;
}

impl IntoPropertyValue for String {
    fn to_property_value(&self) -> PropertyValue<'_> {
        PropertyValue::Text(Cow::Borrowed(self.as_str()))
    }
}

impl IntoPropertyValue for &str {
    fn to_property_value(&self) -> PropertyValue<'_> {
        PropertyValue::Text(Cow::Borrowed(*self))
    }
}

impl IntoPropertyValue for bool {
    fn to_property_value(&self) -> PropertyValue<'_> {
        PropertyValue::Text(Cow::Borrowed(if *self { "true" } else { "false" }))
    }
}

macro_rules! display_property_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoPropertyValue for $ty {
                fn to_property_value(&self) -> PropertyValue<'_> {
                    PropertyValue::Text(Cow::Owned(self.to_string()))
                }
            }
        )*
    };
}

display_property_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl IntoPropertyValue for NullFlavor {
    fn to_property_value(&self) -> PropertyValue<'_> {
        PropertyValue::Text(Cow::Borrowed(self.as_code()))
    }
}

/// HL7 TS date precision (`YYYYMMDD`).
impl IntoPropertyValue for NaiveDate {
    fn to_property_value(&self) -> PropertyValue<'_> {
        PropertyValue::Text(Cow::Owned(self.format("%Y%m%d").to_string()))
    }
}

/// HL7 TS second precision with zone offset (`YYYYMMDDHHMMSS+ZZZZ`).
impl<Tz> IntoPropertyValue for DateTime<Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    fn to_property_value(&self) -> PropertyValue<'_> {
        PropertyValue::Text(Cow::Owned(self.format("%Y%m%d%H%M%S%z").to_string()))
    }
}

impl<T: IntoPropertyValue> IntoPropertyValue for Option<T> {
    fn to_property_value(&self) -> PropertyValue<'_> {
        match self {
            Some(value) => value.to_property_value(),
            None => PropertyValue::Absent,
        }
    }
}

impl<T: IntoPropertyValue> IntoPropertyValue for Vec<T> {
    fn to_property_value(&self) -> PropertyValue<'_> {
        PropertyValue::List(self.iter().map(IntoPropertyValue::to_property_value).collect())
    }
}

impl<T: IntoPropertyValue + ?Sized> IntoPropertyValue for Box<T> {
    fn to_property_value(&self) -> PropertyValue<'_> {
        (**self).to_property_value()
    }
}
