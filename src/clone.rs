//! Cross-factory deep copy of object graphs.
//!
//! Cloning walks the reachable graph of a value and re-homes every indirect
//! object it meets into the target factory. A processed map keyed by source
//! identity is filled in before recursing, so objects shared by several
//! referrers are copied once and cycles terminate.
//!
//! Page-tree containers (`/Type /Pages`) never follow a clone; under
//! [`CloneMode::SkipPages`] page nodes (`/Type /Page`) are dropped as well.
//! Dropped nodes become `null`, and a dictionary entry whose value became
//! `null` is removed.

use std::collections::HashMap;

use crate::config::CloneOptions;
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::factory::{FactoryId, IndirectObject, ObjectFactory};
use crate::object::{Object, Stream};

/// Which structural subtrees a clone prunes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CloneMode {
    /// Copy everything except page-tree containers
    #[default]
    Normal,
    /// Also drop page nodes, so only auxiliary resources follow
    SkipPages,
}

/// Identity of a source object: owning factory plus `N G`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceKey {
    /// Owning factory
    pub factory: FactoryId,
    /// Native object number
    pub object: u32,
    /// Generation
    pub gen: u16,
}

impl SourceKey {
    /// Key of an indirect object handle.
    pub fn of(obj: &IndirectObject) -> Self {
        Self {
            factory: obj.factory_id(),
            object: obj.object_number(),
            gen: obj.generation(),
        }
    }
}

/// Source identity to the clone that replaced it.
pub type ProcessedMap = HashMap<SourceKey, Object>;

/// Deep-copies values into a target factory.
///
/// The processed map is borrowed so several clone calls can share it; two
/// calls that meet the same source object produce one target object.
#[derive(Debug)]
pub struct CloneEngine<'a> {
    target: &'a ObjectFactory,
    processed: &'a mut ProcessedMap,
    options: CloneOptions,
    created: usize,
}

impl<'a> CloneEngine<'a> {
    /// Create an engine cloning into `target`.
    pub fn new(
        target: &'a ObjectFactory,
        processed: &'a mut ProcessedMap,
        options: CloneOptions,
    ) -> Self {
        Self {
            target,
            processed,
            options,
            created: 0,
        }
    }

    /// Number of objects allocated in the target so far.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Clone `value`, owned by `source`, into the target factory.
    ///
    /// `source` resolves plain references found in `value`.
    pub fn clone_value(&mut self, value: &Object, source: &ObjectFactory) -> Result<Object> {
        let before = self.created;
        let result = self.clone_inner(value, source, 0)?;
        log::debug!(
            "Cloned {} from factory {} into factory {} ({} new objects)",
            value.type_name(),
            source.id(),
            self.target.id(),
            self.created - before
        );
        Ok(result)
    }

    fn clone_inner(&mut self, value: &Object, owner: &ObjectFactory, depth: usize) -> Result<Object> {
        if depth > self.options.max_depth {
            return Err(Error::RecursionLimitExceeded(self.options.max_depth));
        }

        match value {
            Object::Indirect(handle) => self.clone_indirect(handle, depth),
            Object::Reference(reference) => {
                let handle = owner.resolve(*reference)?;
                self.clone_indirect(&handle, depth)
            },
            Object::Dictionary(dict) => {
                if self.prunes(dict) {
                    return Ok(Object::Null);
                }
                Ok(Object::Dictionary(self.clone_dictionary(dict, owner, depth)?))
            },
            Object::Array(items) => {
                let mut cloned = Vec::with_capacity(items.len());
                for item in items {
                    cloned.push(self.clone_inner(item, owner, depth + 1)?);
                }
                Ok(Object::Array(cloned))
            },
            Object::Stream(stream) => Ok(Object::Stream(Stream::with_dict(
                self.clone_dictionary(&stream.dict, owner, depth)?,
                stream.data.clone(),
            ))),
            scalar => Ok(scalar.clone()),
        }
    }

    fn clone_dictionary(
        &mut self,
        dict: &Dictionary,
        owner: &ObjectFactory,
        depth: usize,
    ) -> Result<Dictionary> {
        let mut cloned = Dictionary::new();
        for (key, value) in dict.iter() {
            cloned.set(key, self.clone_inner(value, owner, depth + 1)?);
        }
        Ok(cloned)
    }

    fn clone_indirect(&mut self, handle: &IndirectObject, depth: usize) -> Result<Object> {
        let key = SourceKey::of(handle);
        if let Some(done) = self.processed.get(&key) {
            return Ok(done.clone());
        }

        let source = handle.factory()?;
        let value = handle.value()?;
        if let Object::Dictionary(dict) = &value {
            if self.prunes(dict) {
                self.processed.insert(key, Object::Null);
                return Ok(Object::Null);
            }
        }

        // Registered before recursing so cycles land on this clone.
        let clone = self.target.new_object(Object::Null)?;
        self.processed.insert(key, Object::Indirect(clone.clone()));
        self.created += 1;

        let copied = self.clone_inner(&value, &source, depth + 1)?;
        clone.set_value(copied)?;
        Ok(Object::Indirect(clone))
    }

    fn prunes(&self, dict: &Dictionary) -> bool {
        match dict.type_name() {
            Some("Pages") => true,
            Some("Page") => self.options.mode == CloneMode::SkipPages,
            _ => false,
        }
    }
}

/// Clone `value` (owned by `source`) into `target`.
///
/// Shorthand for a [`CloneEngine`] with default depth limits.
pub fn make_clone(
    value: &Object,
    source: &ObjectFactory,
    target: &ObjectFactory,
    processed: &mut ProcessedMap,
    mode: CloneMode,
) -> Result<Object> {
    CloneEngine::new(target, processed, CloneOptions::new(mode)).clone_value(value, source)
}
