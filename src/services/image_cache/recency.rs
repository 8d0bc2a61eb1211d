//! Recency ordering for the image cache
//!
//! A doubly-linked list stored in a `Vec` arena with index links. Freed
//! slots are recycled through a free list, so a [`NodeId`] stays valid
//! until its node is removed. Front is the most recently used entry, back
//! the least recently used.

/// Stable handle to a node in a [`RecencyList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node<T> {
    value: Option<T>,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
pub struct RecencyList<T> {
    nodes: Vec<Node<T>>,
    head: Option<usize>,
    tail: Option<usize>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyList<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            head: None,
            tail: None,
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a value as the most recently used entry
    pub fn push_front(&mut self, value: T) -> NodeId {
        let node = Node {
            value: Some(value),
            prev: None,
            next: None,
        };

        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        self.link_front(idx);
        self.len += 1;
        NodeId(idx)
    }

    /// Mark an entry as the most recently used
    pub fn move_to_front(&mut self, id: NodeId) {
        if !self.is_live(id) || self.head == Some(id.0) {
            return;
        }
        self.unlink(id.0);
        self.link_front(id.0);
    }

    /// Unlink and return the value behind `id`, freeing its slot
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        if !self.is_live(id) {
            return None;
        }
        self.unlink(id.0);
        self.free.push(id.0);
        self.len -= 1;
        self.nodes[id.0].value.take()
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id.0).and_then(|node| node.value.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(id.0).and_then(|node| node.value.as_mut())
    }

    /// Least recently used entry
    pub fn back(&self) -> Option<(NodeId, &T)> {
        let idx = self.tail?;
        self.nodes[idx].value.as_ref().map(|value| (NodeId(idx), value))
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterate from most to least recently used
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            current: self.head,
        }
    }

    fn is_live(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|node| node.value.is_some())
    }

    fn link_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;

        if let Some(head) = self.head {
            self.nodes[head].prev = Some(idx);
        }
        self.head = Some(idx);

        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }

        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }
}

pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    current: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        let node = &self.list.nodes[idx];
        self.current = node.next;
        node.value.as_ref()
    }
}
