//! Flat records
//!
//! A [`FlatRecord`] is the path-keyed representation of one flattened object.
//! Keys iterate in structural path order, which is also the order the flatten
//! engine emits them in. Records are transient: one is created per conversion
//! call and handed to a table row or a format adapter, never retained.

use std::collections::BTreeMap;

use crate::config::DotnotationConfig;
use crate::models::value::Value;
use crate::path::{DotPath, MalformedPathError};

/// Ordered mapping from dotnotation path to value for one object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatRecord {
    entries: BTreeMap<DotPath, Value>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning any previous value for the path.
    pub fn insert(&mut self, path: DotPath, value: Value) -> Option<Value> {
        self.entries.insert(path, value)
    }

    pub fn get(&self, path: &DotPath) -> Option<&Value> {
        self.entries.get(path)
    }

    pub fn remove(&mut self, path: &DotPath) -> Option<Value> {
        self.entries.remove(path)
    }

    pub fn contains(&self, path: &DotPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries in structural path order.
    pub fn iter(&self) -> impl Iterator<Item = (&DotPath, &Value)> {
        self.entries.iter()
    }

    /// Paths in structural order.
    pub fn paths(&self) -> impl Iterator<Item = &DotPath> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render to string-keyed pairs for format adapters.
    pub fn to_string_pairs(&self, config: &DotnotationConfig) -> Vec<(String, Value)> {
        self.entries
            .iter()
            .map(|(path, value)| (path.format(config), value.clone()))
            .collect()
    }

    /// Rebuild a record from string-keyed pairs produced by a format adapter.
    pub fn from_string_pairs<I>(
        pairs: I,
        config: &DotnotationConfig,
    ) -> Result<Self, MalformedPathError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut record = Self::new();
        for (key, value) in pairs {
            let path = DotPath::parse(&key, config)?;
            record.insert(path, value);
        }
        Ok(record)
    }
}

impl FromIterator<(DotPath, Value)> for FlatRecord {
    fn from_iter<T: IntoIterator<Item = (DotPath, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
