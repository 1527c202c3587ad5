//! Cross-reference tables.
//!
//! A reference table maps `N G R` references of one document revision to the
//! place the object is stored, or to the next entry of the free-object list.
//! Tables of incrementally updated files chain to the table of the previous
//! revision; lookups that miss in a table continue in its parent.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::object::ObjectRef;

/// Cross-reference table entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntryType {
    /// Entry for a free object
    Free,
    /// Entry for an uncompressed object (traditional)
    Uncompressed,
    /// Entry for an object in an object stream
    Compressed,
}

/// Cross-reference table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XRefEntry {
    /// Type of entry
    pub entry_type: XRefEntryType,
    /// Byte offset (uncompressed), object stream number (compressed) or
    /// next free object number (free)
    pub offset: u64,
    /// Generation number (or index within the object stream)
    pub generation: u16,
    /// Whether the object is in use
    pub in_use: bool,
}

impl XRefEntry {
    /// Create a new uncompressed entry.
    pub fn uncompressed(offset: u64, generation: u16) -> Self {
        Self {
            entry_type: XRefEntryType::Uncompressed,
            offset,
            generation,
            in_use: true,
        }
    }

    /// Create a new compressed entry (object in object stream).
    pub fn compressed(stream_obj_num: u64, index_in_stream: u16) -> Self {
        Self {
            entry_type: XRefEntryType::Compressed,
            offset: stream_obj_num,
            generation: index_in_stream,
            in_use: true,
        }
    }

    /// Create a new free entry pointing at the next free object.
    pub fn free(next_free: u32, generation: u16) -> Self {
        Self {
            entry_type: XRefEntryType::Free,
            offset: u64::from(next_free),
            generation,
            in_use: false,
        }
    }

    fn matches(&self, reference: ObjectRef) -> bool {
        // Compressed entries always address generation 0.
        match self.entry_type {
            XRefEntryType::Compressed => reference.gen == 0,
            _ => self.generation == reference.gen,
        }
    }
}

/// Reference table of one document revision.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: HashMap<u32, XRefEntry>,
    parent: Option<Rc<ReferenceTable>>,
}

impl ReferenceTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table that falls back to `parent` (the previous
    /// revision).
    pub fn with_parent(parent: Rc<ReferenceTable>) -> Self {
        Self {
            entries: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Table of the previous revision.
    pub fn parent(&self) -> Option<&Rc<ReferenceTable>> {
        self.parent.as_ref()
    }

    /// Add an entry to this revision.
    pub fn add_entry(&mut self, object_number: u32, entry: XRefEntry) {
        self.entries.insert(object_number, entry);
    }

    /// Entry of this revision only.
    pub fn get(&self, object_number: u32) -> Option<&XRefEntry> {
        self.entries.get(&object_number)
    }

    /// Entry for `reference`, searching older revisions on a miss.
    pub fn entry_for(&self, reference: ObjectRef) -> Option<&XRefEntry> {
        match self.entries.get(&reference.id) {
            Some(entry) if entry.matches(reference) => Some(entry),
            _ => self.parent.as_deref().and_then(|p| p.entry_for(reference)),
        }
    }

    /// Storage location of an in-use object.
    pub fn offset(&self, reference: ObjectRef) -> Result<u64> {
        match self.entry_for(reference) {
            Some(entry) if entry.in_use => Ok(entry.offset),
            _ => Err(Error::UnresolvedReference(reference)),
        }
    }

    /// Next entry of the free-object list after the free object `reference`.
    pub fn next_free(&self, reference: ObjectRef) -> Result<u32> {
        match self.entry_for(reference) {
            Some(entry) if entry.in_use => {
                Err(Error::MalformedValue(format!("object {} is not free", reference)))
            },
            Some(entry) => u32::try_from(entry.offset).map_err(|_| {
                Error::MalformedValue(format!(
                    "free entry {} points past the object number range",
                    reference
                ))
            }),
            None => Err(Error::UnresolvedReference(reference)),
        }
    }

    /// Check whether this revision has an entry for `object_number`.
    pub fn contains(&self, object_number: u32) -> bool {
        self.entries.contains_key(&object_number)
    }

    /// Highest object number known to this table or any older revision.
    pub fn max_object_number(&self) -> Option<u32> {
        let own = self.entries.keys().copied().max();
        let inherited = self.parent.as_deref().and_then(ReferenceTable::max_object_number);
        own.max(inherited)
    }

    /// Merge entries from an older table.
    ///
    /// Entries in self override entries in other.
    pub fn merge_from(&mut self, other: ReferenceTable) {
        for (obj_num, entry) in other.entries {
            self.entries.entry(obj_num).or_insert(entry);
        }
        if self.parent.is_none() {
            self.parent = other.parent;
        }
    }

    /// Number of entries in this revision.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if this revision has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
