//! Reference resolution context of a parsed document.

use std::fmt;
use std::rc::Rc;

use bytes::Bytes;

use crate::data_source::DataSource;
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use crate::xref::{ReferenceTable, XRefEntry};

/// Object parser of a document.
///
/// Implemented by the tokenizer. The context hands it the reference table
/// entry of the object to load.
pub trait DataParser {
    /// Source the parser reads from.
    fn source(&self) -> &DataSource;

    /// Parse the object stored at `entry`.
    fn parse_object(&self, entry: &XRefEntry, reference: ObjectRef) -> Result<Object>;
}

struct ContextInner {
    parser: Box<dyn DataParser>,
    ref_table: Rc<ReferenceTable>,
}

/// Parser plus reference table; immutable once built.
///
/// Cloning shares the context.
#[derive(Clone)]
pub struct ReferenceContext {
    inner: Rc<ContextInner>,
}

impl ReferenceContext {
    /// Bind a parser to a reference table.
    pub fn new(parser: impl DataParser + 'static, ref_table: impl Into<Rc<ReferenceTable>>) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                parser: Box::new(parser),
                ref_table: ref_table.into(),
            }),
        }
    }

    /// The document parser.
    pub fn parser(&self) -> &dyn DataParser {
        self.inner.parser.as_ref()
    }

    /// The reference table.
    pub fn ref_table(&self) -> &Rc<ReferenceTable> {
        &self.inner.ref_table
    }

    /// Load the object `reference` points at.
    pub fn resolve(&self, reference: ObjectRef) -> Result<Object> {
        let entry = self
            .inner
            .ref_table
            .entry_for(reference)
            .filter(|entry| entry.in_use)
            .ok_or(Error::UnresolvedReference(reference))?;
        self.inner.parser.parse_object(entry, reference)
    }

    /// Length of the source document in bytes.
    pub fn length(&self) -> usize {
        self.inner.parser.source().len()
    }

    /// Raw bytes of the source document.
    pub fn bytes(&self) -> Bytes {
        self.inner.parser.source().read_all()
    }

    /// Check whether both handles share one context.
    pub fn ptr_eq(&self, other: &ReferenceContext) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ReferenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceContext")
            .field("source_len", &self.length())
            .field("ref_table_entries", &self.inner.ref_table.len())
            .finish()
    }
}
