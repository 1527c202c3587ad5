//! Document trailers and the incremental-update chain.
//!
//! Each revision of a file ends with a trailer dictionary (`Root`, `Size`,
//! `Prev`, ...). A parsed trailer keeps the reference context that resolves
//! the objects of its revision and links to the trailer of the previous
//! revision, so the chain runs from the newest update to the original file.

use std::rc::Rc;

use bytes::Bytes;

use crate::context::ReferenceContext;
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use crate::writer::ObjectSerializer;
use crate::xref::ReferenceTable;

/// Trailer of one document revision.
#[derive(Debug, Clone)]
pub struct Trailer {
    dict: Dictionary,
    context: Option<ReferenceContext>,
    prev: Option<Box<Trailer>>,
}

impl Trailer {
    /// Trailer of a document built in memory.
    pub fn generated(dict: Dictionary) -> Self {
        Self {
            dict,
            context: None,
            prev: None,
        }
    }

    /// Trailer read from a file.
    pub fn parsed(dict: Dictionary, context: ReferenceContext, prev: Option<Trailer>) -> Self {
        Self {
            dict,
            context: Some(context),
            prev: prev.map(Box::new),
        }
    }

    /// Check whether the trailer was read from a file.
    pub fn is_parsed(&self) -> bool {
        self.context.is_some()
    }

    /// Trailer dictionary.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    /// Mutable trailer dictionary.
    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dict
    }

    /// Get a trailer entry.
    pub fn get(&self, key: &str) -> Option<&Object> {
        self.dict.get(key)
    }

    /// Set a trailer entry. Null removes it.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Object>) {
        self.dict.set(key, value);
    }

    /// `/Size` entry.
    pub fn size(&self) -> Option<u32> {
        self.get("Size")
            .and_then(Object::as_integer)
            .and_then(|n| u32::try_from(n).ok())
    }

    /// `/Root` entry.
    pub fn root(&self) -> Option<&Object> {
        self.get("Root")
    }

    /// Trailer of the previous revision.
    pub fn prev(&self) -> Option<&Trailer> {
        self.prev.as_deref()
    }

    /// Link the previous revision. Only parsed trailers form a chain.
    pub fn set_prev(&mut self, prev: Trailer) -> Result<()> {
        if !self.is_parsed() || !prev.is_parsed() {
            return Err(Error::InvalidArgument(
                "only parsed trailers can be chained".to_string(),
            ));
        }
        self.prev = Some(Box::new(prev));
        Ok(())
    }

    /// Trailers from this one back to the original revision.
    pub fn chain(&self) -> impl Iterator<Item = &Trailer> + '_ {
        std::iter::successors(Some(self), |t| t.prev())
    }

    /// Reference context of a parsed trailer.
    pub fn context(&self) -> Option<&ReferenceContext> {
        self.context.as_ref()
    }

    /// Reference table of a parsed trailer.
    pub fn ref_table(&self) -> Option<&Rc<ReferenceTable>> {
        self.context.as_ref().map(ReferenceContext::ref_table)
    }

    /// Length of the source file.
    pub fn pdf_length(&self) -> Option<usize> {
        self.context.as_ref().map(ReferenceContext::length)
    }

    /// Raw bytes of the source file.
    pub fn pdf_bytes(&self) -> Option<Bytes> {
        self.context.as_ref().map(ReferenceContext::bytes)
    }

    /// Object number at the head of the free-object list, 0 if there is none.
    ///
    /// Some producers omit the `0 65535` free-list head; such files are
    /// treated as having no free objects. Other lookup failures propagate.
    pub fn last_free_object(&self) -> Result<u32> {
        let table = match self.ref_table() {
            Some(table) => table,
            None => return Ok(0),
        };
        match table.next_free(ObjectRef::free_list_head()) {
            Err(Error::UnresolvedReference(r)) if r == ObjectRef::free_list_head() => {
                log::warn!("Free-list head {} not found, assuming no free objects", r);
                Ok(0)
            },
            other => other,
        }
    }

    /// Render as `trailer\n<< ... >>\n`.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = b"trailer\n".to_vec();
        out.extend(ObjectSerializer::new().serialize(&Object::Dictionary(self.dict.clone()))?);
        out.push(b'\n');
        Ok(out)
    }
}
