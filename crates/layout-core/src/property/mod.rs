//! Typed property values and the per-type property declarations.
//!
//! A [`PropertyDescriptor`] is one `(name, codec, default)` entry in an
//! element type's static property list.  The list is built once, when the
//! type is registered, so both serialize and deserialize simply iterate it.

pub mod codec;

use std::fmt;
use std::sync::Arc;

use codec::{
    AttributeCodec, BooleanCodec, ChoiceCodec, ConversionError, DoubleCodec, IntegerCodec,
    TextCodec,
};

use crate::document::{AttributeSlot, DocumentCursor};

/// A typed property value.  Null is modelled as `Option::None` by callers.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Boolean(bool),
    Integer(i32),
    Double(f64),
}

impl PropertyValue {
    /// Short lowercase name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

/// Declaration of one property of an element type.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    id: String,
    codec: Arc<dyn AttributeCodec>,
    default: Option<PropertyValue>,
    serializable: bool,
}

impl PropertyDescriptor {
    /// Declares property `id` converted by `codec`, defaulting to the codec's
    /// natural default.
    pub fn new(id: impl Into<String>, codec: impl AttributeCodec + 'static) -> Self {
        let default = codec.default_value();
        Self {
            id: id.into(),
            codec: Arc::new(codec),
            default,
            serializable: true,
        }
    }

    pub fn text(id: impl Into<String>) -> Self {
        Self::new(id, TextCodec)
    }

    pub fn boolean(id: impl Into<String>) -> Self {
        Self::new(id, BooleanCodec)
    }

    pub fn integer(id: impl Into<String>) -> Self {
        Self::new(id, IntegerCodec)
    }

    pub fn double(id: impl Into<String>) -> Self {
        Self::new(id, DoubleCodec)
    }

    pub fn choice<I, S>(id: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id, ChoiceCodec::new(choices))
    }

    /// Overrides the declared default.  `None` declares a null default.
    pub fn with_default(mut self, default: Option<PropertyValue>) -> Self {
        self.default = default;
        self
    }

    /// Marks the property as runtime-only: it is never written to a document.
    pub fn transient(mut self) -> Self {
        self.serializable = false;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn codec(&self) -> &dyn AttributeCodec {
        self.codec.as_ref()
    }

    pub fn default_value(&self) -> Option<&PropertyValue> {
        self.default.as_ref()
    }

    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    /// Reads this property from the cursor's current node.
    ///
    /// Absent yields the declared default; the explicit-null marker yields
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns the codec's [`ConversionError`] for unparseable text.
    pub fn read_from(&self, cursor: &DocumentCursor) -> Result<Option<PropertyValue>, ConversionError> {
        match cursor.attribute(&self.id) {
            AttributeSlot::Absent => Ok(self.default.clone()),
            AttributeSlot::Null => Ok(None),
            AttributeSlot::Value(text) => self.codec.from_text(text).map(Some),
        }
    }

    /// Writes `value` onto the cursor's current node unless it equals the
    /// declared default.  Returns `true` if an attribute was written.
    ///
    /// # Errors
    ///
    /// Returns the codec's [`ConversionError`] if the value has the wrong type.
    pub fn write_to(
        &self,
        cursor: &mut DocumentCursor,
        value: Option<&PropertyValue>,
    ) -> Result<bool, ConversionError> {
        if value == self.default.as_ref() {
            return Ok(false);
        }
        match value {
            Some(v) => {
                let text = self.codec.to_text(v)?;
                cursor.write_string(&self.id, Some(&text));
            }
            None => cursor.write_string(&self.id, None),
        }
        Ok(true)
    }
}
