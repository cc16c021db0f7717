//! The contract shared by every engine.

use std::collections::TryReserveError;
use thiserror::Error;

/// Why `put` rejected a binding. The table is unchanged in every case.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PutError {
    #[error("a binding with this key already exists")]
    DuplicateKey,
    #[error("out of memory while storing a binding")]
    OutOfMemory(#[from] TryReserveError),
}

/// A string-keyed map with unique keys and caller-supplied values.
///
/// Keys are copied on insert and compared by content. Values are moved in
/// and handed back untouched; no bound is placed on `V`.
pub trait SymTable<V> {
    /// Number of bindings.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a binding for a key that is not present yet.
    fn put(&mut self, key: &str, value: V) -> Result<(), PutError>;

    /// Swap the value of an existing binding, returning the old one.
    /// Returns `None` (and drops `value`) when `key` is absent.
    fn replace(&mut self, key: &str, value: V) -> Option<V>;

    fn contains(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Option<&V>;

    fn get_mut(&mut self, key: &str) -> Option<&mut V>;

    /// Remove the binding for `key` and return its value.
    fn remove(&mut self, key: &str) -> Option<V>;

    /// Call `visitor` once for every binding. Order is unspecified.
    fn for_each<F>(&self, visitor: F)
    where
        F: FnMut(&str, &V);

    fn for_each_mut<F>(&mut self, visitor: F)
    where
        F: FnMut(&str, &mut V);
}
