use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Opaque identifier handed out by a [`ListStore`] on creation. Ids are never
/// reused inside one store, so they survive deletes that shift positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record type that can live in a [`ListStore`].
pub trait Record: Clone {
    /// Partial update, every `None` field leaves the current value alone.
    type Patch;

    fn name(&self) -> &str;

    /// Check the required fields of the record.
    fn validate(&self) -> Result<()>;

    fn apply(&mut self, patch: Self::Patch);
}

/// Returns `Validation` when `value` is empty after trimming.
pub fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation { field });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry<T> {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: T,
}

/// Ordered in-memory collection of one record type.
///
/// Position is only the display order. Mutations can be addressed either by
/// position (`*_at`) or by the stable id (`*_by_id`); a position captured
/// before a create or delete must be looked up again afterwards.
#[derive(Debug, Clone)]
pub struct ListStore<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T> Default for ListStore<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T: Record> ListStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from seed records, validating each one like `create`.
    pub fn with_records(records: impl IntoIterator<Item = T>) -> Result<Self> {
        let mut store = Self::new();
        for record in records {
            store.create(record)?;
        }
        Ok(store)
    }

    /// Append `record`, it becomes visible at index `len()` before the call.
    pub fn create(&mut self, record: T) -> Result<RecordId> {
        record.validate()?;

        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, record });
        tracing::debug!("created record {id} at index {}", self.entries.len() - 1);
        Ok(id)
    }

    pub fn read_all(&self) -> &[Entry<T>] {
        &self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| &entry.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&Entry<T>> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Current position of `id` in display order.
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Merge `patch` into the record at `index`. The merged record is
    /// validated before it replaces the old one.
    pub fn update_at(&mut self, index: usize, patch: T::Patch) -> Result<&Entry<T>> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })?;

        let mut merged = entry.record.clone();
        merged.apply(patch);
        merged.validate()?;
        entry.record = merged;

        tracing::debug!("updated record {} at index {index}", entry.id);
        Ok(&*entry)
    }

    pub fn update_by_id(&mut self, id: RecordId, patch: T::Patch) -> Result<&Entry<T>> {
        let index = self.position(id).ok_or(StoreError::NotFound(id))?;
        self.update_at(index, patch)
    }

    /// Remove the record at `index`, later records shift down by one.
    pub fn delete_at(&mut self, index: usize) -> Result<Entry<T>> {
        if index >= self.entries.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }

        let entry = self.entries.remove(index);
        tracing::debug!("deleted record {} at index {index}", entry.id);
        Ok(entry)
    }

    pub fn delete_by_id(&mut self, id: RecordId) -> Result<Entry<T>> {
        let index = self.position(id).ok_or(StoreError::NotFound(id))?;
        self.delete_at(index)
    }

    /// Derived view, recomputed on every call.
    pub fn filtered_by<P>(&self, predicate: P) -> Vec<&Entry<T>>
    where
        P: Fn(&T) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| predicate(&entry.record))
            .collect()
    }
}
