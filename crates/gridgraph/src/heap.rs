//! Indexed binary min-heap with decrease-key.
//!
//! Every value carries a caller-defined key. The heap keeps a key → position
//! map in sync with the array on every insert, extract, swap and decrease,
//! which is what lets [`IndexedMinHeap::decrease`] find its entry in O(1) and
//! restore order in O(log n).
//!
//! Positions are 1-based: the entry at position `i` has children `2i` and
//! `2i + 1` and parent `i / 2`. Position `i` lives at `items[i - 1]`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use thiserror::Error;

/// Misuse of the heap API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
    #[error("cannot extract from an empty heap")]
    Empty,
    #[error("old and new values have different keys")]
    KeyMismatch,
    #[error("key is not in the heap")]
    UnknownKey,
    #[error("key is already in the heap")]
    DuplicateKey,
    #[error("new value must not be larger than the current value")]
    NotSmaller,
}

/// Binary min-heap ordered by `cmp` and indexed by `key`
pub struct IndexedMinHeap<T, K, C, F> {
    items: Vec<T>,
    positions: HashMap<K, usize>,
    cmp: C,
    key: F,
}

impl<T, K, C, F> IndexedMinHeap<T, K, C, F>
where
    K: Eq + Hash,
    C: Fn(&T, &T) -> Ordering,
    F: Fn(&T) -> K,
{
    /// Create an empty heap.
    ///
    /// `cmp` returns `Less` when its first argument should be extracted
    /// first. `key` must map equal entries to equal keys.
    pub fn new(cmp: C, key: F) -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
            cmp,
            key,
        }
    }

    pub fn with_capacity(capacity: usize, cmp: C, key: F) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
            cmp,
            key,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether an entry with the same key as `value` is queued
    pub fn has(&self, value: &T) -> bool {
        self.positions.contains_key(&(self.key)(value))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// The current minimum, if any
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// The queued entry for `key`
    pub fn get(&self, key: &K) -> Option<&T> {
        self.positions.get(key).map(|&i| &self.items[i - 1])
    }

    pub fn insert(&mut self, value: T) -> Result<(), HeapError> {
        let key = (self.key)(&value);
        if self.positions.contains_key(&key) {
            return Err(HeapError::DuplicateKey);
        }
        self.items.push(value);
        let position = self.items.len();
        self.positions.insert(key, position);
        self.sift_up(position);
        Ok(())
    }

    /// Remove and return the minimum entry
    pub fn extract(&mut self) -> Result<T, HeapError> {
        if self.items.is_empty() {
            return Err(HeapError::Empty);
        }
        if self.items.len() == 1 {
            self.positions.clear();
            return self.items.pop().ok_or(HeapError::Empty);
        }

        // Move the last entry to the root, then fix down
        let answer = self.items.swap_remove(0);
        self.positions.remove(&(self.key)(&answer));
        let root_key = (self.key)(&self.items[0]);
        self.positions.insert(root_key, 1);
        self.sift_down(1);

        Ok(answer)
    }

    /// Replace `old` with the smaller-or-equal `new` in place.
    ///
    /// Both values must have the same key, that key must be queued, and the
    /// queued entry must not compare less than `new`.
    pub fn decrease(&mut self, old: &T, new: T) -> Result<(), HeapError> {
        let key = (self.key)(old);
        if key != (self.key)(&new) {
            return Err(HeapError::KeyMismatch);
        }
        let position = *self.positions.get(&key).ok_or(HeapError::UnknownKey)?;
        if (self.cmp)(&self.items[position - 1], &new) == Ordering::Less {
            return Err(HeapError::NotSmaller);
        }

        // The value only got smaller, so it can only move up
        self.items[position - 1] = new;
        self.sift_up(position);
        Ok(())
    }

    /// Drain the heap in ascending order
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.items.len());
        while let Ok(value) = self.extract() {
            out.push(value);
        }
        out
    }

    /// Check the heap property and the key map against the array
    pub fn is_valid(&self) -> bool {
        if self.positions.len() != self.items.len() {
            return false;
        }
        for position in 1..=self.items.len() {
            let value = &self.items[position - 1];
            if self.positions.get(&(self.key)(value)) != Some(&position) {
                return false;
            }
            if position > 1 && self.less(position, position / 2) {
                return false;
            }
        }
        true
    }

    fn less(&self, a: usize, b: usize) -> bool {
        (self.cmp)(&self.items[a - 1], &self.items[b - 1]) == Ordering::Less
    }

    fn sift_up(&mut self, mut position: usize) {
        while position > 1 {
            let parent = position / 2;
            if self.less(position, parent) {
                self.swap(position, parent);
                position = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut position: usize) {
        let len = self.items.len();
        while 2 * position <= len {
            let left = 2 * position;
            let right = left + 1;
            let child = if right > len || self.less(left, right) {
                left
            } else {
                right
            };
            if self.less(child, position) {
                self.swap(position, child);
                position = child;
            } else {
                break;
            }
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.items.swap(a - 1, b - 1);
        let key_a = (self.key)(&self.items[a - 1]);
        let key_b = (self.key)(&self.items[b - 1]);
        self.positions.insert(key_a, a);
        self.positions.insert(key_b, b);
    }
}
