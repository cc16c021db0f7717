//! ListSymTable: every binding on one chain, no hashing, linear scans.

use crate::chain::{copy_key, ChainIter, Chains, Head};
use crate::table::{PutError, SymTable};
use std::fmt;

pub struct ListSymTable<V> {
    head: Head,
    chains: Chains<V>,
}

impl<V> ListSymTable<V> {
    pub fn new() -> Self {
        Self {
            head: None,
            chains: Chains::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.chains.find(self.head, key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let k = self.chains.find(self.head, key)?;
        Some(self.chains.value(k))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let k = self.chains.find(self.head, key)?;
        Some(self.chains.value_mut(k))
    }

    pub fn put(&mut self, key: &str, value: V) -> Result<(), PutError> {
        if self.contains(key) {
            return Err(PutError::DuplicateKey);
        }
        let owned = copy_key(key)?;
        self.chains.push_front(&mut self.head, owned, value);
        Ok(())
    }

    pub fn replace(&mut self, key: &str, value: V) -> Option<V> {
        self.get_mut(key).map(|v| std::mem::replace(v, value))
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.chains
            .unlink(&mut self.head, key)
            .map(|(_key, value)| value)
    }

    /// Most recently added binding first.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            it: self.chains.iter_chain(self.head),
        }
    }

    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &V),
    {
        for (k, v) in self.iter() {
            visitor(k, v);
        }
    }

    pub fn for_each_mut<F>(&mut self, mut visitor: F)
    where
        F: FnMut(&str, &mut V),
    {
        for (k, v) in self.chains.iter_mut() {
            visitor(k, v);
        }
    }
}

impl<V> Default for ListSymTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for ListSymTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V> SymTable<V> for ListSymTable<V> {
    fn len(&self) -> usize {
        ListSymTable::len(self)
    }
    fn put(&mut self, key: &str, value: V) -> Result<(), PutError> {
        ListSymTable::put(self, key, value)
    }
    fn replace(&mut self, key: &str, value: V) -> Option<V> {
        ListSymTable::replace(self, key, value)
    }
    fn contains(&self, key: &str) -> bool {
        ListSymTable::contains(self, key)
    }
    fn get(&self, key: &str) -> Option<&V> {
        ListSymTable::get(self, key)
    }
    fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        ListSymTable::get_mut(self, key)
    }
    fn remove(&mut self, key: &str) -> Option<V> {
        ListSymTable::remove(self, key)
    }
    fn for_each<F>(&self, visitor: F)
    where
        F: FnMut(&str, &V),
    {
        ListSymTable::for_each(self, visitor)
    }
    fn for_each_mut<F>(&mut self, visitor: F)
    where
        F: FnMut(&str, &mut V),
    {
        ListSymTable::for_each_mut(self, visitor)
    }
}

/// Iterator over bindings, newest first.
pub struct Iter<'a, V> {
    it: ChainIter<'a, V>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }
}
