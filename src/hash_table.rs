//! HashSymTable: chained buckets over a node arena, growing through a fixed
//! size sequence.

use crate::chain::{copy_key, ChainIter, Chains, ChainsIterMut, Head};
use crate::hash::{bucket_count_for, bucket_index, next_bucket_count, BUCKET_COUNTS};
use crate::table::{PutError, SymTable};
use log::{debug, trace, warn};
use std::collections::TryReserveError;
use std::fmt;

pub struct HashSymTable<V> {
    buckets: Vec<Head>,
    chains: Chains<V>, // node storage for every bucket's chain
}

fn alloc_buckets(count: usize) -> Result<Vec<Head>, TryReserveError> {
    let mut buckets = Vec::new();
    buckets.try_reserve_exact(count)?;
    buckets.resize(count, None);
    Ok(buckets)
}

impl<V> HashSymTable<V> {
    pub fn new() -> Self {
        Self::with_min_buckets(BUCKET_COUNTS[0])
    }

    /// Start at the smallest size step with at least `min` buckets.
    pub fn with_min_buckets(min: usize) -> Self {
        Self {
            buckets: vec![None; bucket_count_for(min)],
            chains: Chains::new(),
        }
    }

    /// Like `new`, but reports a failed bucket array allocation.
    pub fn try_new() -> Result<Self, PutError> {
        Ok(Self {
            buckets: alloc_buckets(BUCKET_COUNTS[0])?,
            chains: Chains::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }
    pub fn is_empty(&self) -> bool {
        self.chains.len() == 0
    }

    /// Current number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn head(&self, key: &str) -> Head {
        self.buckets[bucket_index(key, self.buckets.len())]
    }

    pub fn contains(&self, key: &str) -> bool {
        self.chains.find(self.head(key), key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let k = self.chains.find(self.head(key), key)?;
        Some(self.chains.value(k))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let k = self.chains.find(self.head(key), key)?;
        Some(self.chains.value_mut(k))
    }

    /// Insert a binding for a key not yet present.
    ///
    /// A full table (as many bindings as buckets) grows to the next size step
    /// first; if that step cannot be allocated the binding still goes into
    /// the current buckets.
    pub fn put(&mut self, key: &str, value: V) -> Result<(), PutError> {
        if self.contains(key) {
            return Err(PutError::DuplicateKey);
        }
        let owned = copy_key(key)?;
        if self.len() == self.bucket_count() {
            self.expand();
        }
        let slot = bucket_index(key, self.buckets.len());
        self.chains.push_front(&mut self.buckets[slot], owned, value);
        Ok(())
    }

    pub fn replace(&mut self, key: &str, value: V) -> Option<V> {
        self.get_mut(key).map(|v| std::mem::replace(v, value))
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let slot = bucket_index(key, self.buckets.len());
        self.chains
            .unlink(&mut self.buckets[slot], key)
            .map(|(_key, value)| value)
    }

    /// Visit every binding, bucket by bucket, each chain from its head.
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
        for (k, v) in self.iter_mut() {
            visitor(k, v);
        }
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: self.chains.iter_chain(None),
            chains: &self.chains,
            remaining: self.len(),
        }
    }

    /// Mutable traversal; follows storage order rather than bucket order.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            it: self.chains.iter_mut(),
        }
    }

    fn expand(&mut self) {
        let old_count = self.buckets.len();
        let Some(new_count) = next_bucket_count(old_count) else {
            trace!("at largest bucket count {old_count}, chains keep growing");
            return;
        };
        if let Err(e) = self.grow_to(new_count) {
            warn!("expansion to {new_count} buckets abandoned: {e}");
        }
    }

    /// Rehash every binding into `new_count` buckets. On allocation failure
    /// nothing changes.
    fn grow_to(&mut self, new_count: usize) -> Result<(), TryReserveError> {
        let old_count = self.buckets.len();
        let mut fresh = alloc_buckets(new_count)?;
        for head in self.buckets.iter_mut() {
            while let Some(node) = self.chains.pop_front(head) {
                let slot = bucket_index(self.chains.key(node), new_count);
                self.chains.relink_front(&mut fresh[slot], node);
            }
        }
        self.buckets = fresh;
        debug!(
            "expanded from {old_count} to {new_count} buckets holding {} bindings",
            self.len()
        );
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn chain_lengths(&self) -> Vec<usize> {
        self.buckets
            .iter()
            .map(|&h| self.chains.iter_chain(h).count())
            .collect()
    }

    /// Bindings stored in a bucket other than the one their hash selects.
    #[cfg(test)]
    pub(crate) fn misplaced_bindings(&self) -> usize {
        let count = self.buckets.len();
        self.buckets
            .iter()
            .enumerate()
            .map(|(slot, &h)| {
                self.chains
                    .iter_chain(h)
                    .filter(|(k, _)| bucket_index(k, count) != slot)
                    .count()
            })
            .sum()
    }
}

impl<V> Default for HashSymTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for HashSymTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Skip duplicates; treat allocation failure the way std collections do.
fn keep_first(res: Result<(), PutError>) {
    match res {
        Ok(()) | Err(PutError::DuplicateKey) => {}
        Err(e @ PutError::OutOfMemory(_)) => panic!("HashSymTable::extend: {e}"),
    }
}

/// Bulk insert; keys already present keep their first value.
impl<'k, V> Extend<(&'k str, V)> for HashSymTable<V> {
    fn extend<I: IntoIterator<Item = (&'k str, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            keep_first(self.put(k, v));
        }
    }
}

impl<'k, V> FromIterator<(&'k str, V)> for HashSymTable<V> {
    fn from_iter<I: IntoIterator<Item = (&'k str, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl<V> SymTable<V> for HashSymTable<V> {
    fn len(&self) -> usize {
        HashSymTable::len(self)
    }
    fn put(&mut self, key: &str, value: V) -> Result<(), PutError> {
        HashSymTable::put(self, key, value)
    }
    fn replace(&mut self, key: &str, value: V) -> Option<V> {
        HashSymTable::replace(self, key, value)
    }
    fn contains(&self, key: &str) -> bool {
        HashSymTable::contains(self, key)
    }
    fn get(&self, key: &str) -> Option<&V> {
        HashSymTable::get(self, key)
    }
    fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        HashSymTable::get_mut(self, key)
    }
    fn remove(&mut self, key: &str) -> Option<V> {
        HashSymTable::remove(self, key)
    }
    fn for_each<F>(&self, visitor: F)
    where
        F: FnMut(&str, &V),
    {
        HashSymTable::for_each(self, visitor)
    }
    fn for_each_mut<F>(&mut self, visitor: F)
    where
        F: FnMut(&str, &mut V),
    {
        HashSymTable::for_each_mut(self, visitor)
    }
}

/// Iterator over bindings in bucket order.
pub struct Iter<'a, V> {
    buckets: core::slice::Iter<'a, Head>,
    chain: ChainIter<'a, V>,
    chains: &'a Chains<V>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.chain.next() {
                self.remaining -= 1;
                return Some(item);
            }
            let &head = self.buckets.next()?;
            self.chain = self.chains.iter_chain(head);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// Iterator over bindings with mutable values.
pub struct IterMut<'a, V> {
    it: ChainsIterMut<'a, V>,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (&'a str, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    fn init_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Trace)
            .is_test(true)
            .try_init();
    }

    fn key(i: usize) -> String {
        format!("key-{i}")
    }

    /// Invariant: A fresh table is empty at the smallest bucket count.
    #[test]
    fn new_table_is_empty_at_smallest_step() {
        let t: HashSymTable<i32> = HashSymTable::new();
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        assert_eq!(t.bucket_count(), 509);

        let t: HashSymTable<i32> = HashSymTable::try_new().expect("allocates");
        assert_eq!(t.bucket_count(), 509);
        assert!(t.is_empty());
    }

    /// Invariant: Duplicate keys are rejected and the table remains unchanged.
    #[test]
    fn duplicate_put_rejected() {
        let mut t = HashSymTable::new();
        t.put("a", 1).unwrap();
        t.put("b", 2).unwrap();
        assert_eq!(t.put("a", 3), Err(PutError::DuplicateKey));
        assert_eq!(t.get("a"), Some(&1));
        assert_eq!(t.len(), 2);
    }

    /// Invariant: `size` equals the sum of chain lengths after puts and removes.
    #[test]
    fn size_matches_chain_lengths() {
        let mut t = HashSymTable::new();
        for i in 0..1500 {
            t.put(&key(i), i).unwrap();
        }
        assert_eq!(t.chain_lengths().iter().sum::<usize>(), t.len());
        for i in (0..1500).step_by(3) {
            assert_eq!(t.remove(&key(i)), Some(i));
        }
        assert_eq!(t.chain_lengths().iter().sum::<usize>(), t.len());
        assert_eq!(t.len(), 1000);
    }

    /// Invariant: The put that finds `len == bucket_count` grows the table to the
    /// next step; the put just before it does not.
    #[test]
    fn growth_triggers_exactly_when_full() {
        init_test_logger();
        let mut t = HashSymTable::new();
        for i in 0..509 {
            t.put(&key(i), i).unwrap();
        }
        assert_eq!(t.len(), 509);
        assert_eq!(t.bucket_count(), 509);

        t.put(&key(509), 509).unwrap();
        assert_eq!(t.bucket_count(), 1021);
        assert_eq!(t.len(), 510);
        for i in 0..510 {
            assert_eq!(t.get(&key(i)), Some(&i));
        }
    }

    /// Invariant: After a rehash every binding sits in the bucket its hash
    /// selects under the new bucket count.
    #[test]
    fn rehash_places_every_binding_in_its_bucket() {
        let mut t = HashSymTable::new();
        for i in 0..2000 {
            t.put(&key(i), ()).unwrap();
        }
        assert_eq!(t.bucket_count(), 2039);
        assert_eq!(t.misplaced_bindings(), 0);
    }

    /// Invariant: Duplicate puts on a full table neither grow it nor change len.
    #[test]
    fn duplicate_on_full_table_does_not_grow() {
        let mut t = HashSymTable::new();
        for i in 0..509 {
            t.put(&key(i), i).unwrap();
        }
        assert_eq!(t.put(&key(0), 0), Err(PutError::DuplicateKey));
        assert_eq!(t.bucket_count(), 509);
    }

    /// Invariant: Bucket count never shrinks on removal.
    #[test]
    fn removal_never_shrinks() {
        let mut t = HashSymTable::new();
        for i in 0..600 {
            t.put(&key(i), i).unwrap();
        }
        assert_eq!(t.bucket_count(), 1021);
        for i in 0..600 {
            t.remove(&key(i)).unwrap();
        }
        assert!(t.is_empty());
        assert_eq!(t.bucket_count(), 1021);
    }

    /// Invariant: At the largest step the table keeps accepting bindings and
    /// chains grow instead.
    #[test]
    fn largest_step_keeps_accepting() {
        let mut t = HashSymTable::with_min_buckets(65521);
        assert_eq!(t.bucket_count(), 65521);
        for i in 0..66_000 {
            t.put(&key(i), i).unwrap();
        }
        assert_eq!(t.bucket_count(), 65521);
        assert_eq!(t.len(), 66_000);
        assert_eq!(t.get(&key(65_999)), Some(&65_999));
    }

    /// Invariant: Colliding keys share a chain yet resolve independently.
    #[test]
    fn colliding_keys_resolve_by_content() {
        let mut t = HashSymTable::new();
        // Find two distinct keys landing in the same bucket.
        let first = key(0);
        let target = bucket_index(&first, 509);
        let second = (1..)
            .map(key)
            .find(|k| bucket_index(k, 509) == target)
            .unwrap();
        t.put(&first, 1).unwrap();
        t.put(&second, 2).unwrap();
        assert_eq!(t.chain_lengths()[target], 2);
        assert_eq!(t.get(&first), Some(&1));
        assert_eq!(t.get(&second), Some(&2));
        assert_eq!(t.remove(&first), Some(1));
        assert_eq!(t.get(&second), Some(&2));
        assert!(!t.contains(&first));
    }

    /// Invariant: `replace` swaps the value in place and leaves len untouched.
    #[test]
    fn replace_present_and_absent() {
        let mut t = HashSymTable::new();
        t.put("k", 1).unwrap();
        assert_eq!(t.replace("k", 2), Some(1));
        assert_eq!(t.get("k"), Some(&2));
        assert_eq!(t.len(), 1);
        assert_eq!(t.replace("missing", 9), None);
        assert!(!t.contains("missing"));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: Values are never cloned or inspected; the table holds the one
    /// value handed to it and gives it back.
    #[test]
    fn values_are_moved_not_copied() {
        let shared = Rc::new(Cell::new(0));
        let mut t = HashSymTable::new();
        t.put("v", Rc::clone(&shared)).unwrap();
        assert_eq!(Rc::strong_count(&shared), 2);
        t.get("v").unwrap().set(5);
        assert_eq!(shared.get(), 5);
        let back = t.remove("v").unwrap();
        assert!(Rc::ptr_eq(&back, &shared));
        drop(back);
        assert_eq!(Rc::strong_count(&shared), 1);
    }

    /// Invariant: Dropping the table releases every stored value exactly once.
    #[test]
    fn drop_releases_values() {
        let shared = Rc::new(());
        {
            let mut t = HashSymTable::new();
            for i in 0..700 {
                t.put(&key(i), Rc::clone(&shared)).unwrap();
            }
            assert_eq!(Rc::strong_count(&shared), 701);
        }
        assert_eq!(Rc::strong_count(&shared), 1);
    }

    /// Invariant: `for_each` and `iter` visit each binding exactly once;
    /// `for_each_mut` updates are seen by later lookups.
    #[test]
    fn traversal_visits_each_binding_once() {
        let mut t = HashSymTable::new();
        for i in 0..800 {
            t.put(&key(i), i).unwrap();
        }
        let mut seen = BTreeSet::new();
        let mut visits = 0;
        t.for_each(|k, _| {
            visits += 1;
            seen.insert(k.to_string());
        });
        assert_eq!(visits, t.len());
        assert_eq!(seen.len(), t.len());
        assert_eq!(t.iter().len(), 800);

        t.for_each_mut(|_, v| *v += 1);
        for i in 0..800 {
            assert_eq!(t.get(&key(i)), Some(&(i + 1)));
        }
    }

    /// Invariant: `Extend` keeps the first value for repeated keys.
    #[test]
    fn extend_ignores_later_duplicates() {
        let t: HashSymTable<i32> = [("a", 1), ("b", 2), ("a", 3)].into_iter().collect();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("a"), Some(&1));
        assert_eq!(format!("{t:?}").matches(':').count(), 2);
    }

    /// Invariant: A growth step whose bucket array cannot be allocated leaves
    /// the table as it was, and the next put still lands.
    #[test]
    fn failed_growth_keeps_table_intact() {
        init_test_logger();
        let mut t = HashSymTable::new();
        for i in 0..509 {
            t.put(&key(i), i).unwrap();
        }
        assert!(alloc_buckets(usize::MAX).is_err());
        assert!(t.grow_to(usize::MAX).is_err());
        assert_eq!(t.bucket_count(), 509);
        assert_eq!(t.misplaced_bindings(), 0);
        assert_eq!(t.chain_lengths().iter().sum::<usize>(), 509);
        for i in 0..509 {
            assert_eq!(t.get(&key(i)), Some(&i));
        }

        t.put(&key(509), 509).unwrap();
        assert_eq!(t.len(), 510);
        assert_eq!(t.get(&key(509)), Some(&509));
    }

    /// Invariant: `extend` skips duplicates but does not swallow allocation
    /// failure.
    #[test]
    fn extend_skips_duplicates_only() {
        keep_first(Ok(()));
        keep_first(Err(PutError::DuplicateKey));
        let oom = Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err();
        let res = std::panic::catch_unwind(|| keep_first(Err(PutError::OutOfMemory(oom))));
        assert!(res.is_err(), "out of memory must not be ignored");
    }

    /// Invariant: `with_min_buckets` rounds up to a size step.
    #[test]
    fn with_min_buckets_rounds_up() {
        let t: HashSymTable<()> = HashSymTable::with_min_buckets(3000);
        assert_eq!(t.bucket_count(), 4093);
    }

    /// Invariant: Empty and non-ASCII keys are ordinary keys.
    #[test]
    fn empty_and_unicode_keys() {
        let mut t = HashSymTable::new();
        t.put("", 0).unwrap();
        t.put("ключ", 1).unwrap();
        t.put("鍵", 2).unwrap();
        assert_eq!(t.get(""), Some(&0));
        assert_eq!(t.get("ключ"), Some(&1));
        assert_eq!(t.get("鍵"), Some(&2));
        assert_eq!(t.put("", 5), Err(PutError::DuplicateKey));
    }
}
