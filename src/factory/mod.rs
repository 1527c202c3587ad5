//! Object factory: allocation, change tracking and cross-factory numbering.
//!
//! Every document owns an [`ObjectFactory`]. The factory hands out object
//! numbers, keeps the arena that [`IndirectObject`] handles point into, and
//! records which objects were created, modified or removed since the document
//! was opened.
//!
//! Factories can be attached to each other. At save time the root factory
//! folds the objects of every attached factory into one contiguous
//! numbering space. A factory's native object numbers are moved into that
//! space by its *enumeration shift*:
//!
//! ```text
//! root (count 3)      objects 1..=2        shift 0
//! ├── fonts (count 4) objects 1..=3   ->   shift 2
//! └── pages (count 2) objects 1       ->   shift 2 + 3 = 5
//! ```
//!
//! Object number 0 is the free-list head in every factory, so each factory
//! contributes `count - 1` numbers to the flat space.

mod indirect;
mod update;

pub use indirect::IndirectObject;
pub use update::UpdateRecord;

use std::cell::RefCell;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;

use crate::config::SerializerOptions;
use crate::context::ReferenceContext;
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef, Stream};
use crate::writer::ObjectSerializer;

static NEXT_FACTORY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique factory identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactoryId(u64);

impl FactoryId {
    fn next() -> Self {
        Self(NEXT_FACTORY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw id. Only useful for diagnostics and tests; live factories
    /// always get their id from the global counter.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FactoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arena slot for one object.
pub(crate) struct Slot {
    pub(crate) gen: u16,
    pub(crate) value: Object,
}

/// Mutable state shared by a factory and the handles it issued.
pub(crate) struct FactoryState {
    /// Next object number to allocate
    object_count: u32,
    pub(crate) slots: HashMap<u32, Slot>,
    /// Dirty set, ordered by native object number
    pub(crate) modified: BTreeSet<u32>,
    removed: HashSet<u32>,
    attached: Vec<ObjectFactory>,
    /// `None` caches "target not reachable"
    shift_cache: HashMap<FactoryId, Option<u32>>,
    /// `"N G R"` -> object number
    registry: HashMap<String, u32>,
    context: Option<ReferenceContext>,
    options: SerializerOptions,
    pub(crate) closed: bool,
}

/// Per-document object factory.
///
/// Cloning an `ObjectFactory` clones the handle; both handles drive the same
/// factory.
///
/// # Example
///
/// ```
/// use pdf_incremental::{Dictionary, ObjectFactory};
///
/// # fn main() -> pdf_incremental::Result<()> {
/// let doc = ObjectFactory::new(1);
/// let catalog = doc.new_object(Dictionary::new())?;
/// assert_eq!(catalog.object_number(), 1);
///
/// let records = doc.list_modified_objects(None)?;
/// assert_eq!(records[&1].payload_str().as_deref(), Some("1 0 obj \n<<>>\nendobj\n"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ObjectFactory {
    id: FactoryId,
    inner: Rc<RefCell<FactoryState>>,
}

impl ObjectFactory {
    /// Create a factory whose next object number is `object_count`.
    ///
    /// Object number 0 is the free-list head, so a factory created with a
    /// count of 0 still allocates its first object as number 1.
    pub fn new(object_count: u32) -> Self {
        Self::build(object_count, None)
    }

    /// Create a factory for a parsed document, resolving references through
    /// `context`.
    pub fn with_context(object_count: u32, context: ReferenceContext) -> Self {
        Self::build(object_count, Some(context))
    }

    fn build(object_count: u32, context: Option<ReferenceContext>) -> Self {
        let id = FactoryId::next();
        log::trace!("Created factory {} with object count {}", id, object_count.max(1));
        Self {
            id,
            inner: Rc::new(RefCell::new(FactoryState {
                object_count: object_count.max(1),
                slots: HashMap::new(),
                modified: BTreeSet::new(),
                removed: HashSet::new(),
                attached: Vec::new(),
                shift_cache: HashMap::new(),
                registry: HashMap::new(),
                context,
                options: SerializerOptions::default(),
                closed: false,
            })),
        }
    }

    pub(crate) fn from_parts(id: FactoryId, inner: Rc<RefCell<FactoryState>>) -> Self {
        Self { id, inner }
    }

    /// Use `options` when this factory renders update payloads.
    pub fn with_options(self, options: SerializerOptions) -> Self {
        self.inner.borrow_mut().options = options;
        self
    }

    /// Factory id.
    pub fn id(&self) -> FactoryId {
        self.id
    }

    /// Serializer options used for update payloads.
    pub fn options(&self) -> SerializerOptions {
        self.inner.borrow().options
    }

    /// Reference context of a parsed document.
    pub fn context(&self) -> Option<ReferenceContext> {
        self.inner.borrow().context.clone()
    }

    /// Check whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Release every object, registration and attachment.
    ///
    /// Handles issued by this factory stop working afterwards. Calling
    /// `close` again is a no-op.
    pub fn close(&self) {
        let (slots, attached, context) = {
            let mut state = self.inner.borrow_mut();
            if state.closed {
                return;
            }
            state.closed = true;
            state.modified.clear();
            state.removed.clear();
            state.shift_cache.clear();
            state.registry.clear();
            (
                std::mem::take(&mut state.slots),
                std::mem::take(&mut state.attached),
                state.context.take(),
            )
        };
        log::debug!(
            "Closed factory {}: released {} objects, detached {} factories",
            self.id,
            slots.len(),
            attached.len()
        );
        // Values may hold the last handles to other factories; drop them
        // after the borrow ends.
        drop(slots);
        drop(attached);
        drop(context);
    }

    fn closed_error(&self) -> Error {
        Error::InvalidContext(format!("factory {} is closed", self.id))
    }

    fn check_owner(&self, obj: &IndirectObject) -> Result<()> {
        if obj.factory_id() != self.id {
            return Err(Error::ForeignObject {
                object: obj.reference(),
                owner: obj.factory_id(),
                factory: self.id,
            });
        }
        Ok(())
    }

    fn handle(&self, id: u32, gen: u16) -> IndirectObject {
        IndirectObject::new(id, gen, self.id, &self.inner)
    }

    /// Next object number of this factory alone.
    pub fn own_object_count(&self) -> u32 {
        self.inner.borrow().object_count
    }

    /// Object count of the whole attached tree.
    ///
    /// Own count plus `count - 1` for each attached factory, since object
    /// number 0 is shared.
    pub fn object_count(&self) -> u32 {
        let (own, attached) = {
            let state = self.inner.borrow();
            (state.object_count, state.attached.clone())
        };
        attached
            .iter()
            .fold(own, |count, child| count + (child.object_count() - 1))
    }

    /// Set the next object number (used by parsers once the highest object
    /// number is known).
    pub fn set_object_count(&self, object_count: u32) {
        self.inner.borrow_mut().object_count = object_count.max(1);
    }

    /// Attach `child` so its objects are saved with this factory.
    ///
    /// Attaching a factory to itself or attaching the same factory twice is a
    /// no-op. The check is shallow: callers must not attach an ancestor.
    pub fn attach(&self, child: &ObjectFactory) -> Result<()> {
        let mut state = self.inner.borrow_mut();
        if state.closed {
            return Err(self.closed_error());
        }
        if child.id == self.id || state.attached.iter().any(|f| f.id == child.id) {
            return Ok(());
        }
        state.attached.push(child.clone());
        // Ancestors may still cache the new subtree as unreachable; they are
        // refreshed when enumeration starts.
        state.shift_cache.clear();
        log::debug!("Attached factory {} to factory {}", child.id, self.id);
        Ok(())
    }

    /// Attached factories in insertion order.
    pub fn attached(&self) -> Vec<ObjectFactory> {
        self.inner.borrow().attached.clone()
    }

    /// Allocate a new object holding `value`.
    pub fn new_object(&self, value: impl Into<Object>) -> Result<IndirectObject> {
        let value = value.into();
        let id = {
            let mut state = self.inner.borrow_mut();
            if state.closed {
                return Err(self.closed_error());
            }
            let id = state.object_count;
            state.object_count = id.checked_add(1).ok_or_else(|| {
                Error::CorruptedGraph(format!("factory {} ran out of object numbers", self.id))
            })?;
            state.slots.insert(id, Slot { gen: 0, value });
            state.modified.insert(id);
            id
        };
        log::trace!("Allocated object {} 0 R in factory {}", id, self.id);
        Ok(self.handle(id, 0))
    }

    /// Allocate a new stream object with an empty attribute dictionary.
    pub fn new_stream_object(&self, data: impl Into<Bytes>) -> Result<IndirectObject> {
        self.new_object(Stream::new(data))
    }

    /// Add an object read from the document without marking it modified.
    ///
    /// The object is registered under its `N G R` string. An object that is
    /// already loaded keeps its current value.
    pub fn load_object(
        &self,
        reference: ObjectRef,
        value: impl Into<Object>,
    ) -> Result<IndirectObject> {
        let mut state = self.inner.borrow_mut();
        if state.closed {
            return Err(self.closed_error());
        }
        match state.slots.get(&reference.id).map(|slot| slot.gen) {
            Some(gen) if gen != reference.gen => {
                return Err(Error::CorruptedGraph(format!(
                    "object {} is already loaded with generation {} in factory {}",
                    reference.id, gen, self.id
                )));
            },
            Some(_) => {},
            None => {
                state.slots.insert(
                    reference.id,
                    Slot {
                        gen: reference.gen,
                        value: value.into(),
                    },
                );
            },
        }
        state.registry.insert(reference.to_string(), reference.id);
        if reference.id >= state.object_count {
            state.object_count = reference.id.saturating_add(1);
        }
        drop(state);

        log::trace!("Loaded object {} into factory {}", reference, self.id);
        Ok(self.handle(reference.id, reference.gen))
    }

    /// Mark `obj` modified. Only the owning factory may do this.
    pub fn mark_modified(&self, obj: &IndirectObject) -> Result<()> {
        self.check_owner(obj)?;
        let mut state = self.inner.borrow_mut();
        if state.closed {
            return Err(self.closed_error());
        }
        if !state.slots.contains_key(&obj.object_number()) {
            return Err(Error::UnresolvedReference(obj.reference()));
        }
        state.modified.insert(obj.object_number());
        Ok(())
    }

    /// Remove `obj`. It is written as a free entry with its generation
    /// bumped by one.
    pub fn remove(&self, obj: &IndirectObject) -> Result<()> {
        self.check_owner(obj)?;
        let mut state = self.inner.borrow_mut();
        if state.closed {
            return Err(self.closed_error());
        }
        if !state.slots.contains_key(&obj.object_number()) {
            return Err(Error::UnresolvedReference(obj.reference()));
        }
        state.modified.insert(obj.object_number());
        state.removed.insert(obj.object_number());
        log::debug!("Removed object {} from factory {}", obj.reference(), self.id);
        Ok(())
    }

    /// Check whether `obj` was removed from this factory.
    pub fn is_removed(&self, obj: &IndirectObject) -> bool {
        obj.factory_id() == self.id && self.inner.borrow().removed.contains(&obj.object_number())
    }

    /// Check whether this factory or any attached factory has changes.
    pub fn is_modified(&self) -> bool {
        let (dirty, attached) = {
            let state = self.inner.borrow();
            (!state.modified.is_empty(), state.attached.clone())
        };
        dirty || attached.iter().any(ObjectFactory::is_modified)
    }

    /// Shift that moves `target`'s native numbers into this factory's flat
    /// numbering space, or `None` if `target` is not reachable.
    ///
    /// Results are cached per target until
    /// [`clean_enumeration_shift_cache`](Self::clean_enumeration_shift_cache).
    pub fn calculate_shift(&self, target: &ObjectFactory) -> Option<u32> {
        self.shift_for(target.id)
    }

    pub(crate) fn shift_for(&self, target: FactoryId) -> Option<u32> {
        if target == self.id {
            return Some(0);
        }

        let (own, attached) = {
            let state = self.inner.borrow();
            if let Some(cached) = state.shift_cache.get(&target) {
                return *cached;
            }
            (state.object_count, state.attached.clone())
        };

        let mut shift = own - 1;
        let mut result = None;
        for child in &attached {
            if let Some(child_shift) = child.shift_for(target) {
                result = Some(shift + child_shift);
                break;
            }
            shift += child.object_count() - 1;
        }

        self.inner.borrow_mut().shift_cache.insert(target, result);
        result
    }

    pub(crate) fn shift_by_id(&self, target: FactoryId) -> Result<u32> {
        self.shift_for(target).ok_or_else(|| {
            Error::InvalidContext(format!(
                "factory {} is not attached to factory {}",
                target, self.id
            ))
        })
    }

    /// Enumeration shift of `target`; fails if `target` is not reachable.
    pub fn get_enumeration_shift(&self, target: &ObjectFactory) -> Result<u32> {
        self.shift_by_id(target.id)
    }

    /// Drop cached shifts here and in every attached factory.
    ///
    /// Call after every save: allocation during a save changes counts.
    pub fn clean_enumeration_shift_cache(&self) {
        let attached = {
            let mut state = self.inner.borrow_mut();
            state.shift_cache.clear();
            state.attached.clone()
        };
        for child in &attached {
            child.clean_enumeration_shift_cache();
        }
        log::debug!("Cleared enumeration shift cache of factory {}", self.id);
    }

    /// Update records for every modified object of this factory tree.
    ///
    /// Keys are object numbers in `root`'s flat numbering space (`root`
    /// defaults to this factory). Payloads are rendered relative to `root`.
    /// Shifts cached by `root` and its attached factories are dropped first,
    /// so counts and attachments changed since the last call are honored.
    /// Two records landing on the same number fail with
    /// [`Error::CorruptedGraph`].
    pub fn list_modified_objects(
        &self,
        root: Option<&ObjectFactory>,
    ) -> Result<BTreeMap<u32, UpdateRecord>> {
        let root = root.unwrap_or(self);
        root.clean_enumeration_shift_cache();
        let mut records = BTreeMap::new();
        let mut visited = HashSet::new();
        self.collect_modified(root, &mut records, &mut visited)?;
        log::debug!(
            "Enumerated {} modified objects from factory {} (root {})",
            records.len(),
            self.id,
            root.id
        );
        Ok(records)
    }

    fn collect_modified(
        &self,
        root: &ObjectFactory,
        records: &mut BTreeMap<u32, UpdateRecord>,
        visited: &mut HashSet<FactoryId>,
    ) -> Result<()> {
        // A factory attached under two parents is enumerated once.
        if !visited.insert(self.id) {
            return Ok(());
        }

        let (entries, attached) = {
            let state = self.inner.borrow();
            if state.closed {
                return Err(self.closed_error());
            }
            let mut entries = Vec::with_capacity(state.modified.len());
            for &num in &state.modified {
                let slot = state.slots.get(&num).ok_or_else(|| {
                    Error::CorruptedGraph(format!(
                        "modified object {} has no value in factory {}",
                        num, self.id
                    ))
                })?;
                let value = if state.removed.contains(&num) {
                    None
                } else {
                    Some(slot.value.clone())
                };
                entries.push((num, slot.gen, value));
            }
            (entries, state.attached.clone())
        };

        let shift = if root.id == self.id {
            0
        } else {
            root.get_enumeration_shift(self)?
        };
        let serializer = ObjectSerializer::with_options(root.options()).scoped(root, self.id);

        for (num, gen, value) in entries {
            let number = num.checked_add(shift).ok_or_else(|| {
                Error::CorruptedGraph(format!(
                    "object number {} overflows when shifted by {}",
                    num, shift
                ))
            })?;
            let record = match value {
                None => UpdateRecord::removed(number, gen.saturating_add(1)),
                Some(value) => {
                    UpdateRecord::live(number, gen, serializer.dump_indirect(number, gen, &value)?)
                },
            };
            match records.entry(number) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                },
                Entry::Occupied(_) => {
                    return Err(Error::CorruptedGraph(format!(
                        "object number {} enumerated twice (factory {}, native {})",
                        number, self.id, num
                    )));
                },
            }
        }

        for child in &attached {
            child.collect_modified(root, records, visited)?;
        }
        Ok(())
    }

    /// Register `obj` under `ref_string` for reverse lookup.
    pub fn register_object(&self, obj: &IndirectObject, ref_string: impl Into<String>) -> Result<()> {
        self.check_owner(obj)?;
        let mut state = self.inner.borrow_mut();
        if state.closed {
            return Err(self.closed_error());
        }
        state.registry.insert(ref_string.into(), obj.object_number());
        Ok(())
    }

    /// Look up an object registered under `ref_string`.
    pub fn fetch_object(&self, ref_string: &str) -> Option<IndirectObject> {
        let state = self.inner.borrow();
        if state.closed {
            return None;
        }
        let id = *state.registry.get(ref_string)?;
        let gen = state.slots.get(&id)?.gen;
        Some(self.handle(id, gen))
    }

    /// Resolve a reference of this document to an object handle.
    ///
    /// Objects already loaded are returned as is. Others are parsed through
    /// the reference context and loaded unmodified.
    pub fn resolve(&self, reference: ObjectRef) -> Result<IndirectObject> {
        if let Some(found) = self.fetch_object(&reference.to_string()) {
            if found.generation() == reference.gen {
                return Ok(found);
            }
        }

        let context = {
            let state = self.inner.borrow();
            if state.closed {
                return Err(self.closed_error());
            }
            state.context.clone()
        }
        .ok_or_else(|| {
            Error::InvalidContext(format!(
                "factory {} has no reference context to resolve {}",
                self.id, reference
            ))
        })?;

        let value = context.resolve(reference)?;
        self.load_object(reference, value)
    }
}

impl fmt::Debug for ObjectFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("ObjectFactory");
        out.field("id", &self.id);
        if let Ok(state) = self.inner.try_borrow() {
            let attached: Vec<FactoryId> = state.attached.iter().map(|c| c.id).collect();
            out.field("object_count", &state.object_count)
                .field("modified", &state.modified.len())
                .field("removed", &state.removed.len())
                .field("attached", &attached)
                .field("closed", &state.closed);
        }
        out.finish()
    }
}
