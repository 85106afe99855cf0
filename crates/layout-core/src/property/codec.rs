//! Attribute codecs: conversion between typed property values and the
//! plain strings stored in document attributes.
//!
//! Each property type supplies one [`AttributeCodec`].  The engine never
//! inspects a value's variant itself; it only asks the property's codec to
//! format or parse it, so adding a property type never touches the
//! serializer.

use std::fmt;

use thiserror::Error;

use super::PropertyValue;

/// Errors raised when a value cannot be converted to or from text.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConversionError {
    /// The text cannot be parsed as the expected type.
    #[error("cannot parse {value:?} as {expected}")]
    Parse {
        value: String,
        expected: &'static str,
    },

    /// The value handed to the codec has the wrong variant.
    #[error("expected a {expected} value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The value is outside the codec's closed set of choices.
    #[error("{value:?} is not one of the allowed choices")]
    NotAllowed { value: String },
}

/// Converts one property type between its typed value and attribute text.
pub trait AttributeCodec: Send + Sync + fmt::Debug {
    /// Formats `value` as attribute text.
    fn to_text(&self, value: &PropertyValue) -> Result<String, ConversionError>;

    /// Parses attribute text into a value.
    fn from_text(&self, text: &str) -> Result<PropertyValue, ConversionError>;

    /// The type's natural default, used when a property declares none.
    fn default_value(&self) -> Option<PropertyValue> {
        None
    }
}

/// Parses `"true"` / `"false"` (ASCII case-insensitive).
pub fn parse_boolean(text: &str) -> Result<bool, ConversionError> {
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ConversionError::Parse {
            value: text.to_string(),
            expected: "boolean",
        })
    }
}

/// Parses a decimal 32-bit integer, ignoring surrounding whitespace.
pub fn parse_integer(text: &str) -> Result<i32, ConversionError> {
    text.trim().parse().map_err(|_| ConversionError::Parse {
        value: text.to_string(),
        expected: "integer",
    })
}

fn mismatch(expected: &'static str, found: &PropertyValue) -> ConversionError {
    ConversionError::TypeMismatch {
        expected,
        found: found.kind(),
    }
}

/// Free-form text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl AttributeCodec for TextCodec {
    fn to_text(&self, value: &PropertyValue) -> Result<String, ConversionError> {
        match value {
            PropertyValue::Text(text) => Ok(text.clone()),
            other => Err(mismatch("text", other)),
        }
    }

    fn from_text(&self, text: &str) -> Result<PropertyValue, ConversionError> {
        Ok(PropertyValue::Text(text.to_string()))
    }
}

/// `true` / `false`.  Defaults to `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl AttributeCodec for BooleanCodec {
    fn to_text(&self, value: &PropertyValue) -> Result<String, ConversionError> {
        match value {
            PropertyValue::Boolean(b) => Ok(b.to_string()),
            other => Err(mismatch("boolean", other)),
        }
    }

    fn from_text(&self, text: &str) -> Result<PropertyValue, ConversionError> {
        parse_boolean(text).map(PropertyValue::Boolean)
    }

    fn default_value(&self) -> Option<PropertyValue> {
        Some(PropertyValue::Boolean(false))
    }
}

/// 32-bit signed integers.  Defaults to `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCodec;

impl AttributeCodec for IntegerCodec {
    fn to_text(&self, value: &PropertyValue) -> Result<String, ConversionError> {
        match value {
            PropertyValue::Integer(i) => Ok(i.to_string()),
            other => Err(mismatch("integer", other)),
        }
    }

    fn from_text(&self, text: &str) -> Result<PropertyValue, ConversionError> {
        parse_integer(text).map(PropertyValue::Integer)
    }

    fn default_value(&self) -> Option<PropertyValue> {
        Some(PropertyValue::Integer(0))
    }
}

/// Finite 64-bit floats.  Defaults to `0.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleCodec;

impl AttributeCodec for DoubleCodec {
    fn to_text(&self, value: &PropertyValue) -> Result<String, ConversionError> {
        match value {
            PropertyValue::Double(d) if d.is_finite() => Ok(d.to_string()),
            PropertyValue::Double(d) => Err(ConversionError::Parse {
                value: d.to_string(),
                expected: "finite number",
            }),
            other => Err(mismatch("double", other)),
        }
    }

    fn from_text(&self, text: &str) -> Result<PropertyValue, ConversionError> {
        match text.trim().parse::<f64>() {
            Ok(d) if d.is_finite() => Ok(PropertyValue::Double(d)),
            _ => Err(ConversionError::Parse {
                value: text.to_string(),
                expected: "finite number",
            }),
        }
    }

    fn default_value(&self) -> Option<PropertyValue> {
        Some(PropertyValue::Double(0.0))
    }
}

/// Text restricted to a closed set of choices.  Defaults to the first choice.
#[derive(Debug, Clone)]
pub struct ChoiceCodec {
    choices: Vec<String>,
}

impl ChoiceCodec {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    fn check(&self, text: &str) -> Result<(), ConversionError> {
        if self.choices.iter().any(|c| c == text) {
            Ok(())
        } else {
            Err(ConversionError::NotAllowed {
                value: text.to_string(),
            })
        }
    }
}

impl AttributeCodec for ChoiceCodec {
    fn to_text(&self, value: &PropertyValue) -> Result<String, ConversionError> {
        match value {
            PropertyValue::Text(text) => {
                self.check(text)?;
                Ok(text.clone())
            }
            other => Err(mismatch("choice", other)),
        }
    }

    fn from_text(&self, text: &str) -> Result<PropertyValue, ConversionError> {
        self.check(text)?;
        Ok(PropertyValue::Text(text.to_string()))
    }

    fn default_value(&self) -> Option<PropertyValue> {
        self.choices.first().cloned().map(PropertyValue::Text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
