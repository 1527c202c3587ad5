//! PDF object serialization.
//!
//! Renders objects to the byte form written into an incremental update.

use std::io::Write;

use crate::config::SerializerOptions;
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::factory::{FactoryId, ObjectFactory};
use crate::object::{Object, ObjectRef, Stream};

/// Root factory plus the factory that owns the value being rendered.
#[derive(Debug, Clone, Copy)]
struct Scope<'a> {
    root: &'a ObjectFactory,
    owner: FactoryId,
}

/// Serializer for PDF objects.
///
/// Converts objects to their byte representation. A serializer scoped to a
/// root factory renders references in the root's flat numbering space.
#[derive(Debug, Clone, Default)]
pub struct ObjectSerializer<'a> {
    options: SerializerOptions,
    scope: Option<Scope<'a>>,
}

impl<'a> ObjectSerializer<'a> {
    /// Create a new object serializer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a serializer with the given options.
    pub fn with_options(options: SerializerOptions) -> Self {
        Self {
            options,
            scope: None,
        }
    }

    /// Render references relative to `root`, for values owned by `owner`.
    pub fn scoped(mut self, root: &'a ObjectFactory, owner: FactoryId) -> Self {
        self.scope = Some(Scope { root, owner });
        self
    }

    /// Active options.
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_object(&mut buf, obj, 0)?;
        Ok(buf)
    }

    /// Serialize an object to a string (for debugging).
    pub fn serialize_to_string(&self, obj: &Object) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.serialize(obj)?).into_owned())
    }

    /// Serialize an indirect object definition.
    ///
    /// Format: `{id} {gen} obj \n{object}\nendobj\n`
    pub fn dump_indirect(&self, id: u32, gen: u16, obj: &Object) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        writeln!(buf, "{} {} obj ", id, gen)?;
        self.write_object(&mut buf, obj, 0)?;
        buf.extend_from_slice(b"\nendobj\n");
        Ok(buf)
    }

    /// Write an object to a buffer.
    fn write_object(&self, out: &mut Vec<u8>, obj: &Object, depth: usize) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(Error::RecursionLimitExceeded(self.options.max_depth));
        }

        match obj {
            Object::Null => out.extend_from_slice(b"null"),
            Object::Boolean(b) => write!(out, "{}", b)?,
            Object::Numeric(n) => self.write_numeric(out, *n)?,
            Object::String(s) => self.write_string(out, s),
            Object::Name(n) => self.write_name(out, n)?,
            Object::Array(arr) => self.write_array(out, arr, depth)?,
            Object::Dictionary(dict) => self.write_dictionary(out, dict, depth)?,
            Object::Stream(stream) => self.write_stream(out, stream, depth)?,
            Object::Reference(r) => {
                self.write_reference(out, *r, self.scope.map(|s| s.owner))?
            },
            Object::Indirect(handle) => {
                self.write_reference(out, handle.reference(), Some(handle.factory_id()))?
            },
        }
        Ok(())
    }

    /// Write a reference, shifted into the root's numbering when scoped.
    fn write_reference(
        &self,
        out: &mut Vec<u8>,
        reference: ObjectRef,
        owner: Option<FactoryId>,
    ) -> Result<()> {
        let id = match (self.scope, owner) {
            (Some(scope), Some(owner)) => {
                let shift = scope.root.shift_by_id(owner)?;
                reference.id.checked_add(shift).ok_or_else(|| {
                    Error::CorruptedGraph(format!(
                        "object number {} overflows when shifted by {}",
                        reference.id, shift
                    ))
                })?
            },
            _ => reference.id,
        };
        write!(out, "{} {} R", id, reference.gen)?;
        Ok(())
    }

    /// Write a number.
    ///
    /// Integral values print without a fractional part. Reals print in fixed
    /// point with the fewest digits that represent them, never in exponent
    /// form.
    fn write_numeric(&self, out: &mut Vec<u8>, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::MalformedValue(format!("numeric value {} is not finite", value)));
        }
        // -0 prints as 0
        let value = if value == 0.0 { 0.0 } else { value };

        let mut precision = 0;
        let mut scaled = value;
        while precision < self.options.max_real_precision && (scaled - scaled.round()).abs() > 1e-10
        {
            precision += 1;
            scaled *= 10.0;
        }
        write!(out, "{:.*}", precision, value)?;
        Ok(())
    }

    /// Write a literal string.
    ///
    /// Input is escaped in chunks of `string_chunk_size` bytes joined by a
    /// backslash-newline continuation.
    fn write_string(&self, out: &mut Vec<u8>, data: &[u8]) {
        out.push(b'(');
        for (i, chunk) in data.chunks(self.options.string_chunk_size.max(1)).enumerate() {
            if i > 0 {
                out.extend_from_slice(b"\\\n");
            }
            for &byte in chunk {
                match byte {
                    b'\n' => out.extend_from_slice(b"\\n"),
                    b'\r' => out.extend_from_slice(b"\\r"),
                    b'\t' => out.extend_from_slice(b"\\t"),
                    0x08 => out.extend_from_slice(b"\\b"),
                    0x0C => out.extend_from_slice(b"\\f"),
                    b'(' => out.extend_from_slice(b"\\("),
                    b')' => out.extend_from_slice(b"\\)"),
                    b'\\' => out.extend_from_slice(b"\\\\"),
                    _ => out.push(byte),
                }
            }
        }
        out.push(b')');
    }

    /// Write a PDF name.
    ///
    /// Names start with `/` and escape special characters with `#xx`.
    fn write_name(&self, out: &mut Vec<u8>, name: &str) -> Result<()> {
        out.push(b'/');
        for byte in name.bytes() {
            match byte {
                b'#' | b'/' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'%' => {
                    write!(out, "#{:02X}", byte)?
                },
                b'!'..=b'~' => out.push(byte),
                _ => write!(out, "#{:02X}", byte)?,
            }
        }
        Ok(())
    }

    /// Write a PDF array.
    fn write_array(&self, out: &mut Vec<u8>, arr: &[Object], depth: usize) -> Result<()> {
        let mut local = Vec::new();
        let mut last_nl = 0;
        local.push(b'[');
        for obj in arr {
            self.break_line(&mut local, &mut last_nl);
            self.write_object(&mut local, obj, depth + 1)?;
            local.push(b' ');
        }
        local.push(b']');
        out.extend_from_slice(&local);
        Ok(())
    }

    /// Write a PDF dictionary.
    fn write_dictionary(&self, out: &mut Vec<u8>, dict: &Dictionary, depth: usize) -> Result<()> {
        let mut local = Vec::new();
        let mut last_nl = 0;
        local.extend_from_slice(b"<<");
        for (key, value) in dict.iter() {
            self.break_line(&mut local, &mut last_nl);
            self.write_name(&mut local, key)?;
            local.push(b' ');
            self.write_object(&mut local, value, depth + 1)?;
            local.push(b' ');
        }
        local.extend_from_slice(b">>");
        out.extend_from_slice(&local);
        Ok(())
    }

    /// Write a PDF stream. `Length` always reflects the payload.
    fn write_stream(&self, out: &mut Vec<u8>, stream: &Stream, depth: usize) -> Result<()> {
        let mut dict = stream.dict.clone();
        dict.set("Length", Object::Numeric(stream.len() as f64));

        self.write_dictionary(out, &dict, depth)?;
        out.extend_from_slice(b"\nstream\n");
        out.extend_from_slice(&stream.data);
        out.extend_from_slice(b"\nendstream");
        Ok(())
    }

    /// Start a new line before the next entry once the current one is too
    /// long. Never breaks before the closing delimiter.
    fn break_line(&self, buf: &mut Vec<u8>, last_nl: &mut usize) {
        if buf.len() - *last_nl > self.options.line_break_threshold {
            buf.push(b'\n');
            *last_nl = buf.len();
        }
    }
}
