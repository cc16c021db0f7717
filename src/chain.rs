//! Chain storage shared by both engines.
//!
//! Bindings live as nodes in a generational slot arena. A chain is the
//! handle of its first node; every node carries the handle of the next one.
//! Moving a binding between chains only rewrites `next` links, so the node
//! (and the owned key inside it) never moves or gets copied.

use slotmap::{new_key_type, SlotMap};
use std::collections::TryReserveError;

new_key_type! {
    /// Handle addressing the node that stores one binding.
    pub(crate) struct NodeKey;
}

/// First node of a chain, `None` for an empty chain.
pub(crate) type Head = Option<NodeKey>;

#[derive(Debug)]
struct Node<V> {
    key: Box<str>,
    value: V,
    next: Head,
}

/// Make the table's own copy of a caller key, reporting allocation failure
/// instead of aborting.
pub(crate) fn copy_key(key: &str) -> Result<Box<str>, TryReserveError> {
    let mut owned = String::new();
    owned.try_reserve_exact(key.len())?;
    owned.push_str(key);
    Ok(owned.into_boxed_str())
}

#[derive(Debug)]
pub(crate) struct Chains<V> {
    nodes: SlotMap<NodeKey, Node<V>>,
}

impl<V> Chains<V> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Number of live nodes across every chain stored in this arena.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn find(&self, head: Head, key: &str) -> Option<NodeKey> {
        let mut cur = head;
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if &*node.key == key {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    pub(crate) fn key(&self, k: NodeKey) -> &str {
        &self.nodes[k].key
    }

    pub(crate) fn value(&self, k: NodeKey) -> &V {
        &self.nodes[k].value
    }

    pub(crate) fn value_mut(&mut self, k: NodeKey) -> &mut V {
        &mut self.nodes[k].value
    }

    /// Prepend a new binding to the chain starting at `head`.
    pub(crate) fn push_front(&mut self, head: &mut Head, key: Box<str>, value: V) -> NodeKey {
        let k = self.nodes.insert(Node {
            key,
            value,
            next: *head,
        });
        *head = Some(k);
        k
    }

    /// Unlink the binding for `key` from the chain and free its node.
    pub(crate) fn unlink(&mut self, head: &mut Head, key: &str) -> Option<(Box<str>, V)> {
        let mut prev: Head = None;
        let mut cur = *head;
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if &*node.key == key {
                let next = node.next;
                match prev {
                    None => *head = next,
                    Some(p) => self.nodes[p].next = next,
                }
                let node = self.nodes.remove(k)?;
                return Some((node.key, node.value));
            }
            prev = cur;
            cur = node.next;
        }
        None
    }

    /// Detach the first node of a chain. The node stays allocated and must be
    /// handed to `relink_front`.
    pub(crate) fn pop_front(&mut self, head: &mut Head) -> Option<NodeKey> {
        let k = (*head)?;
        *head = self.nodes[k].next.take();
        Some(k)
    }

    pub(crate) fn relink_front(&mut self, head: &mut Head, k: NodeKey) {
        debug_assert!(self.nodes[k].next.is_none(), "relinking an attached node");
        self.nodes[k].next = *head;
        *head = Some(k);
    }

    pub(crate) fn iter_chain(&self, head: Head) -> ChainIter<'_, V> {
        ChainIter {
            nodes: &self.nodes,
            cur: head,
        }
    }

    /// Arena-order traversal with mutable values; chain order is not kept.
    pub(crate) fn iter_mut(&mut self) -> ChainsIterMut<'_, V> {
        ChainsIterMut {
            it: self.nodes.iter_mut(),
        }
    }
}

/// Walks one chain from its head.
pub(crate) struct ChainIter<'a, V> {
    nodes: &'a SlotMap<NodeKey, Node<V>>,
    cur: Head,
}

impl<'a, V> Iterator for ChainIter<'a, V> {
    type Item = (&'a str, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        let node = &nodes[self.cur?];
        self.cur = node.next;
        Some((&node.key, &node.value))
    }
}

pub(crate) struct ChainsIterMut<'a, V> {
    it: slotmap::basic::IterMut<'a, NodeKey, Node<V>>,
}

impl<'a, V> Iterator for ChainsIterMut<'a, V> {
    type Item = (&'a str, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, n)| (&*n.key, &mut n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}
