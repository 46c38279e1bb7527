//! Doubly-linked list with unique values.
//!
//! Nodes are stored in a flat `Vec` indexed by `SlotId`, with `prev`/`next`
//! links forming an intrusive list. Removed slots go on a free list and are
//! reused. The value index maps every resident value to its slot, so head,
//! tail, neighbour, insert, remove and membership are all O(1).
//!
//! ```text
//! index: { a -> 2, b -> 0, c -> 1 }
//!
//! head=2          tail=1
//!  [2] a <-> [0] b <-> [1] c
//! ```
//!
//! A value may appear at most once. Inserting a value that is already
//! present, or inserting relative to a value that is absent, fails and
//! leaves the list untouched.

use crate::collections::id::SlotId;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    prev: SlotId,
    next: SlotId,
}

/// Doubly-linked list that holds each value at most once.
#[derive(Clone)]
pub struct UniqueNodeLinkedList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<SlotId>,
    index: HashMap<T, SlotId>,
    head: SlotId,
    tail: SlotId,
}

impl<T> Default for UniqueNodeLinkedList<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UniqueNodeLinkedList<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: SlotId::INVALID,
            tail: SlotId::INVALID,
        }
    }

    /// Number of values in the list.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// First value, or `None` when empty.
    pub fn head(&self) -> Option<&T> {
        self.node(self.head).map(|n| &n.value)
    }

    /// Last value, or `None` when empty.
    pub fn tail(&self) -> Option<&T> {
        self.node(self.tail).map(|n| &n.value)
    }

    /// Value preceding `value`, or `None` if `value` is absent or first.
    pub fn previous(&self, value: &T) -> Option<&T> {
        let slot = *self.index.get(value)?;
        let prev = self.node(slot)?.prev;
        self.node(prev).map(|n| &n.value)
    }

    /// Value following `value`, or `None` if `value` is absent or last.
    pub fn next(&self, value: &T) -> Option<&T> {
        let slot = *self.index.get(value)?;
        let next = self.node(slot)?.next;
        self.node(next).map(|n| &n.value)
    }

    #[inline]
    pub fn contains(&self, value: &T) -> bool {
        self.index.contains_key(value)
    }

    /// Append `value` at the tail. Returns `false` if it is already present.
    pub fn add(&mut self, value: T) -> bool {
        if self.contains(&value) {
            return false;
        }

        let old_tail = self.tail;
        let slot = self.alloc(Node {
            value: value.clone(),
            prev: old_tail,
            next: SlotId::INVALID,
        });

        match self.node_mut(old_tail) {
            Some(tail) => tail.next = slot,
            None => self.head = slot,
        }
        self.tail = slot;
        self.index.insert(value, slot);
        true
    }

    /// Insert `value` immediately before `existing`.
    ///
    /// Fails if `existing` is absent or `value` is already present.
    pub fn insert_before(&mut self, value: T, existing: &T) -> bool {
        if self.contains(&value) {
            return false;
        }
        let Some(&at) = self.index.get(existing) else {
            return false;
        };
        let Some(prev) = self.node(at).map(|n| n.prev) else {
            return false;
        };

        let slot = self.alloc(Node {
            value: value.clone(),
            prev,
            next: at,
        });

        if let Some(node) = self.node_mut(at) {
            node.prev = slot;
        }
        match self.node_mut(prev) {
            Some(node) => node.next = slot,
            None => self.head = slot,
        }
        self.index.insert(value, slot);
        true
    }

    /// Insert `value` immediately after `existing`.
    ///
    /// Fails if `existing` is absent or `value` is already present.
    pub fn insert_after(&mut self, value: T, existing: &T) -> bool {
        if self.contains(&value) {
            return false;
        }
        let Some(&at) = self.index.get(existing) else {
            return false;
        };
        let Some(next) = self.node(at).map(|n| n.next) else {
            return false;
        };

        let slot = self.alloc(Node {
            value: value.clone(),
            prev: at,
            next,
        });

        if let Some(node) = self.node_mut(at) {
            node.next = slot;
        }
        match self.node_mut(next) {
            Some(node) => node.prev = slot,
            None => self.tail = slot,
        }
        self.index.insert(value, slot);
        true
    }

    /// Insert `value` so that it ends up at position `index`.
    ///
    /// `index == len()` appends. Larger indices are rejected. O(n).
    pub fn insert_at_index(&mut self, value: T, index: usize) -> bool {
        if index > self.len() || self.contains(&value) {
            return false;
        }
        if index == self.len() {
            return self.add(value);
        }
        match self.iter().nth(index).cloned() {
            Some(existing) => self.insert_before(value, &existing),
            None => false,
        }
    }

    /// Remove `value`. Returns whether it was present.
    pub fn remove(&mut self, value: &T) -> bool {
        let Some(slot) = self.index.remove(value) else {
            return false;
        };
        let Some(node) = self.slots.get_mut(slot.index()).and_then(Option::take) else {
            return false;
        };

        match self.node_mut(node.prev) {
            Some(prev) => prev.next = node.next,
            None => self.head = node.next,
        }
        match self.node_mut(node.next) {
            Some(next) => next.prev = node.prev,
            None => self.tail = node.prev,
        }
        self.free.push(slot);
        true
    }

    /// Remove and return the value at position `index`. O(n).
    pub fn remove_at_index(&mut self, index: usize) -> Option<T> {
        let value = self.iter().nth(index).cloned()?;
        self.remove(&value);
        Some(value)
    }

    /// Drop every node and the value index.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = SlotId::INVALID;
        self.tail = SlotId::INVALID;
    }

    /// Snapshot of the values in list order.
    pub fn as_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// Iterate values from head to tail.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len(),
        }
    }

    /// Position of `value` in list order. O(n).
    pub fn position(&self, value: &T) -> Option<usize> {
        if !self.contains(value) {
            return None;
        }
        self.iter().position(|v| v == value)
    }

    #[inline]
    fn node(&self, slot: SlotId) -> Option<&Node<T>> {
        if slot.is_valid() {
            self.slots.get(slot.index()).and_then(Option::as_ref)
        } else {
            None
        }
    }

    #[inline]
    fn node_mut(&mut self, slot: SlotId) -> Option<&mut Node<T>> {
        if slot.is_valid() {
            self.slots.get_mut(slot.index()).and_then(Option::as_mut)
        } else {
            None
        }
    }

    fn alloc(&mut self, node: Node<T>) -> SlotId {
        if let Some(slot) = self.free.pop() {
            self.slots[slot.index()] = Some(node);
            slot
        } else {
            let slot = SlotId(self.slots.len() as u32);
            self.slots.push(Some(node));
            slot
        }
    }
}

/// Front-to-back iterator over a [`UniqueNodeLinkedList`].
pub struct Iter<'a, T> {
    list: &'a UniqueNodeLinkedList<T>,
    cursor: SlotId,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T>
where
    T: Clone + Eq + Hash,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        // `remaining` bounds the walk even if links were ever corrupted.
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.node(self.cursor)?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<'a, T> IntoIterator for &'a UniqueNodeLinkedList<T>
where
    T: Clone + Eq + Hash,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> fmt::Debug for UniqueNodeLinkedList<T>
where
    T: Clone + Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
