//! Handles to objects held by a factory.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use super::{FactoryId, FactoryState, ObjectFactory};
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};

/// Identity-bearing handle to an object in a factory's arena.
///
/// The handle stores the object number, the generation and a weak link to
/// the owning factory. Every clone of a handle addresses the same arena
/// slot, so a mutation through one alias is visible through all of them.
/// Once the factory is closed the handle can no longer read or write.
#[derive(Clone)]
pub struct IndirectObject {
    id: u32,
    gen: u16,
    factory_id: FactoryId,
    factory: Weak<RefCell<FactoryState>>,
}

impl IndirectObject {
    pub(crate) fn new(
        id: u32,
        gen: u16,
        factory_id: FactoryId,
        factory: &Rc<RefCell<FactoryState>>,
    ) -> Self {
        Self {
            id,
            gen,
            factory_id,
            factory: Rc::downgrade(factory),
        }
    }

    /// Native object number inside the owning factory.
    pub fn object_number(&self) -> u32 {
        self.id
    }

    /// Generation number.
    pub fn generation(&self) -> u16 {
        self.gen
    }

    /// Id of the owning factory.
    pub fn factory_id(&self) -> FactoryId {
        self.factory_id
    }

    /// Native `N G R` reference.
    pub fn reference(&self) -> ObjectRef {
        ObjectRef::new(self.id, self.gen)
    }

    /// Check whether `factory` owns this object.
    pub fn belongs_to(&self, factory: &ObjectFactory) -> bool {
        self.factory_id == factory.id()
    }

    /// Owning factory.
    pub fn factory(&self) -> Result<ObjectFactory> {
        let inner = self.live_state()?;
        Ok(ObjectFactory::from_parts(self.factory_id, inner))
    }

    /// Current value of the object.
    pub fn value(&self) -> Result<Object> {
        let inner = self.live_state()?;
        let state = inner.borrow();
        let value = state.slots.get(&self.id).map(|slot| slot.value.clone());
        value.ok_or(Error::UnresolvedReference(self.reference()))
    }

    /// Run `f` against the current value without copying it.
    pub fn with_value<R>(&self, f: impl FnOnce(&Object) -> R) -> Result<R> {
        let inner = self.live_state()?;
        let state = inner.borrow();
        let slot = state
            .slots
            .get(&self.id)
            .ok_or(Error::UnresolvedReference(self.reference()))?;
        Ok(f(&slot.value))
    }

    /// Replace the value and mark the object modified.
    pub fn set_value(&self, value: impl Into<Object>) -> Result<()> {
        let inner = self.live_state()?;
        let mut state = inner.borrow_mut();
        let slot = state
            .slots
            .get_mut(&self.id)
            .ok_or(Error::UnresolvedReference(self.reference()))?;
        slot.value = value.into();
        state.modified.insert(self.id);
        Ok(())
    }

    /// Mutate the value in place and mark the object modified.
    ///
    /// The value is moved out of the arena while `f` runs, so `f` may use
    /// the owning factory freely (allocate, resolve, clone into it).
    pub fn update<R>(&self, f: impl FnOnce(&mut Object) -> R) -> Result<R> {
        let inner = self.live_state()?;
        let mut value = {
            let mut state = inner.borrow_mut();
            let slot = state
                .slots
                .get_mut(&self.id)
                .ok_or(Error::UnresolvedReference(self.reference()))?;
            std::mem::take(&mut slot.value)
        };

        let result = f(&mut value);

        let mut state = inner.borrow_mut();
        if state.closed {
            return Err(Error::InvalidContext(format!(
                "factory {} was closed while {} was being updated",
                self.factory_id,
                self.reference()
            )));
        }
        if let Some(slot) = state.slots.get_mut(&self.id) {
            slot.value = value;
        }
        state.modified.insert(self.id);
        Ok(result)
    }

    fn live_state(&self) -> Result<Rc<RefCell<FactoryState>>> {
        let inner = self.factory.upgrade().ok_or_else(|| {
            Error::InvalidContext(format!("factory {} no longer exists", self.factory_id))
        })?;
        if inner.borrow().closed {
            return Err(Error::InvalidContext(format!("factory {} is closed", self.factory_id)));
        }
        Ok(inner)
    }
}

impl fmt::Debug for IndirectObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndirectObject")
            .field("id", &self.id)
            .field("gen", &self.gen)
            .field("factory", &self.factory_id)
            .finish()
    }
}

impl PartialEq for IndirectObject {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.gen == other.gen && self.factory_id == other.factory_id
    }
}

impl Eq for IndirectObject {}

impl Hash for IndirectObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.gen.hash(state);
        self.factory_id.hash(state);
    }
}
