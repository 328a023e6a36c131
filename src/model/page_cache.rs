//! Bounded least-recently-used page cache
//!
//! Entries live in an arena of nodes linked by indices; a key→slot map gives O(1)
//! lookup, touch and eviction. The head of the list is the most recently used entry.

use std::{collections::HashMap, hash::Hash};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("page cache capacity must be at least 1")]
    ZeroCapacity,
}

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct PageCache<K, V> {
    capacity: usize,
    nodes: Vec<Node<K, V>>,
    index: HashMap<K, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K, V> PageCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            nodes: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Look up `key` and mark it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let slot = *self.index.get(key)?;
        self.move_to_front(slot);
        Some(&self.nodes[slot].value)
    }

    /// Look up `key` without touching recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&slot| &self.nodes[slot].value)
    }

    /// Insert or overwrite `key`, evicting the least recently used entry when full
    ///
    /// Returns the evicted key, if any.
    pub fn set(&mut self, key: K, value: V) -> Option<K> {
        if let Some(&slot) = self.index.get(&key) {
            self.nodes[slot].value = value;
            self.move_to_front(slot);
            return None;
        }

        if self.nodes.len() < self.capacity {
            let slot = self.nodes.len();
            self.nodes.push(Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.index.insert(key, slot);
            self.push_front(slot);
            return None;
        }

        // Full: reuse the tail slot for the new entry.
        let slot = self.tail?;
        self.unlink(slot);
        let node = &mut self.nodes[slot];
        let evicted = std::mem::replace(&mut node.key, key.clone());
        node.value = value;
        self.index.remove(&evicted);
        self.index.insert(key, slot);
        self.push_front(slot);
        Some(evicted)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Keys from most to least recently used
    pub fn keys_by_recency(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            keys.push(&self.nodes[slot].key);
            cursor = self.nodes[slot].next;
        }
        keys
    }

    fn move_to_front(&mut self, slot: usize) {
        if self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.push_front(slot);
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = {
            let node = &self.nodes[slot];
            (node.prev, node.next)
        };
        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
        let node = &mut self.nodes[slot];
        node.prev = None;
        node.next = None;
    }

    fn push_front(&mut self, slot: usize) {
        let old_head = self.head;
        {
            let node = &mut self.nodes[slot];
            node.prev = None;
            node.next = old_head;
        }
        if let Some(old_head) = old_head {
            self.nodes[old_head].prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}
