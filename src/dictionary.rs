//! Insertion-ordered PDF dictionary.
//!
//! Keys are unique names. Setting a key to [`Object::Null`] removes it, so a
//! live dictionary never carries tombstone entries. Reading an absent key
//! yields `None`, which callers treat the same as a null value.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::object::Object;

/// PDF dictionary (name to value mapping, insertion order preserved).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(IndexMap<String, Object>);

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Build a dictionary from raw key/value pairs.
    ///
    /// Keys must be Name or String objects. Null values are skipped. Nothing
    /// is returned unless every entry is well formed.
    pub fn try_from_entries(entries: Vec<(Object, Object)>) -> Result<Self> {
        let mut map = IndexMap::with_capacity(entries.len());
        for (key, value) in entries {
            let key = match key {
                Object::Name(name) => name,
                Object::String(bytes) => String::from_utf8(bytes).map_err(|_| {
                    Error::MalformedValue("dictionary key is not valid UTF-8".to_string())
                })?,
                other => {
                    return Err(Error::MalformedValue(format!(
                        "dictionary keys must be names, found {}",
                        other.type_name()
                    )))
                },
            };
            if value.is_null() {
                map.shift_remove(&key);
            } else {
                map.insert(key, value);
            }
        }
        Ok(Self(map))
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&Object> {
        self.0.get(key)
    }

    /// Get a mutable value by key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Object> {
        self.0.get_mut(key)
    }

    /// Set a value. Setting [`Object::Null`] removes the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Object>) {
        let key = key.into();
        let value = value.into();
        if value.is_null() {
            self.0.shift_remove(&key);
        } else {
            self.0.insert(key, value);
        }
    }

    /// Add an entry keyed by a Name object.
    pub fn add(&mut self, name: &Object, value: impl Into<Object>) -> Result<()> {
        let key = name.as_name().ok_or_else(|| {
            Error::MalformedValue(format!(
                "dictionary keys must be names, found {}",
                name.type_name()
            ))
        })?;
        self.set(key, value);
        Ok(())
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.0.shift_remove(key)
    }

    /// Check if a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Object)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the `/Type` entry.
    pub fn type_name(&self) -> Option<&str> {
        self.get("Type").and_then(Object::as_name)
    }
}

impl FromIterator<(String, Object)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (String, Object)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (key, value) in iter {
            dict.set(key, value);
        }
        dict
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a String, &'a Object);
    type IntoIter = indexmap::map::Iter<'a, String, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
