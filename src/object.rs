//! PDF object types.
//!
//! [`Object`] is the closed set of values the document's object language is
//! made of. Scalars and composites are plain values; once a value is wrapped
//! by an [`IndirectObject`] it lives in its factory's arena and every alias
//! addressing it by (object number, generation) observes the same state.

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::factory::IndirectObject;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Numeric value (integers and reals share one representation)
    Numeric(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (without the leading /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (insertion-ordered name to value mapping)
    Dictionary(Dictionary),
    /// Stream (attribute dictionary + data)
    Stream(Stream),
    /// Reference by value into the owning factory's reference context
    Reference(ObjectRef),
    /// Handle to an object held by a factory
    Indirect(IndirectObject),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }

    /// Head of the free-object list, `0 65535 R` by convention.
    pub fn free_list_head() -> Self {
        Self { id: 0, gen: 65535 }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

/// PDF stream: an attribute dictionary plus a byte payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stream {
    /// Stream attribute dictionary
    pub dict: Dictionary,
    /// Raw stream data
    pub data: Bytes,
}

impl Stream {
    /// Create a stream with an empty attribute dictionary.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            dict: Dictionary::new(),
            data: data.into(),
        }
    }

    /// Create a stream with the given attribute dictionary.
    pub fn with_dict(dict: Dictionary, data: impl Into<Bytes>) -> Self {
        Self {
            dict,
            data: data.into(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drop the payload.
    pub fn clear(&mut self) {
        self.data = Bytes::new();
    }

    /// Append bytes to the payload.
    pub fn append(&mut self, chunk: &[u8]) {
        let mut buf = BytesMut::with_capacity(self.data.len() + chunk.len());
        buf.extend_from_slice(&self.data);
        buf.extend_from_slice(chunk);
        self.data = buf.freeze();
    }
}

/// Rectangle `[llx lly urx ury]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Lower-left x
    pub llx: f64,
    /// Lower-left y
    pub lly: f64,
    /// Upper-right x
    pub urx: f64,
    /// Upper-right y
    pub ury: f64,
}

impl Rect {
    /// Create a rectangle from its corners.
    pub fn new(llx: f64, lly: f64, urx: f64, ury: f64) -> Self {
        Self { llx, lly, urx, ury }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }

    /// Convert to a four-element array object.
    pub fn to_object(&self) -> Object {
        Object::Array(vec![
            Object::Numeric(self.llx),
            Object::Numeric(self.lly),
            Object::Numeric(self.urx),
            Object::Numeric(self.ury),
        ])
    }
}

impl TryFrom<&[Object]> for Rect {
    type Error = Error;

    fn try_from(items: &[Object]) -> Result<Self> {
        if items.len() != 4 {
            return Err(Error::MalformedValue(format!(
                "rectangle must have 4 elements, found {}",
                items.len()
            )));
        }

        let mut coords = [0.0; 4];
        for (slot, item) in coords.iter_mut().zip(items) {
            *slot = item.as_numeric().ok_or_else(|| {
                Error::MalformedValue(format!(
                    "rectangle coordinates must be numeric, found {}",
                    item.type_name()
                ))
            })?;
        }

        Ok(Self::new(coords[0], coords[1], coords[2], coords[3]))
    }
}

impl TryFrom<&Object> for Rect {
    type Error = Error;

    fn try_from(obj: &Object) -> Result<Self> {
        match obj {
            Object::Array(items) => Rect::try_from(items.as_slice()),
            other => Err(Error::MalformedValue(format!(
                "rectangle must be an array, found {}",
                other.type_name()
            ))),
        }
    }
}

impl Object {
    /// Create a Name object.
    pub fn name(s: impl Into<String>) -> Object {
        Object::Name(s.into())
    }

    /// Create a String object from text.
    pub fn string(s: impl AsRef<[u8]>) -> Object {
        Object::String(s.as_ref().to_vec())
    }

    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Numeric(_) => "Numeric",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream(_) => "Stream",
            Object::Reference(_) => "Reference",
            Object::Indirect(_) => "IndirectObject",
        }
    }

    /// Try to cast to a number.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Object::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to cast to an integer. Only integral numerics qualify.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Numeric(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream objects.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Mutable dictionary access. Works for both Dictionary and Stream objects.
    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&mut s.dict),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Mutable array access.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to stream.
    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to an indirect object handle.
    pub fn as_indirect(&self) -> Option<&IndirectObject> {
        match self {
            Object::Indirect(obj) => Some(obj),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Value of the `/Type` entry when this is a dictionary.
    pub fn dict_type(&self) -> Option<&str> {
        match self {
            Object::Dictionary(d) => d.type_name(),
            _ => None,
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Object::Null
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Boolean(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Object::Numeric(value)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Numeric(value as f64)
    }
}

impl From<i32> for Object {
    fn from(value: i32) -> Self {
        Object::Numeric(f64::from(value))
    }
}

impl From<u32> for Object {
    fn from(value: u32) -> Self {
        Object::Numeric(f64::from(value))
    }
}

impl From<Vec<Object>> for Object {
    fn from(value: Vec<Object>) -> Self {
        Object::Array(value)
    }
}

impl From<Dictionary> for Object {
    fn from(value: Dictionary) -> Self {
        Object::Dictionary(value)
    }
}

impl From<Stream> for Object {
    fn from(value: Stream) -> Self {
        Object::Stream(value)
    }
}

impl From<ObjectRef> for Object {
    fn from(value: ObjectRef) -> Self {
        Object::Reference(value)
    }
}

impl From<IndirectObject> for Object {
    fn from(value: IndirectObject) -> Self {
        Object::Indirect(value)
    }
}

impl From<Rect> for Object {
    fn from(value: Rect) -> Self {
        value.to_object()
    }
}
