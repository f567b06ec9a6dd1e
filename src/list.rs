use std::ops::Index;

use crate::error::Result;

/// Insertion-ordered, caller-owned result sequence.
///
/// Nodes are stored contiguously so that [`release_list`] releases the whole
/// chain in one pass from the list handle itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedList<T> {
    nodes: Vec<T>,
}

impl<T> OwnedList<T> {
    /// Build a list from an iterator, one fallible allocation per node.
    ///
    /// If any allocation fails the nodes built so far are dropped and the
    /// whole call fails with `AllocationFailed`.
    pub fn try_from_iter<I>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let mut builder = ListBuilder::new();
        for item in items {
            builder.push(item)?;
        }
        Ok(builder.finish())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.nodes.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.nodes.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.nodes
    }

    pub fn into_vec(self) -> Vec<T> {
        self.nodes
    }
}

impl<T> Index<usize> for OwnedList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.nodes[index]
    }
}

impl<'a, T> IntoIterator for &'a OwnedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl<T> IntoIterator for OwnedList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

/// Incremental list construction with fallible node allocation.
pub struct ListBuilder<T> {
    nodes: Vec<T>,
}

impl<T> ListBuilder<T> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(&mut self, node: T) -> Result<()> {
        self.nodes.try_reserve(1)?;
        self.nodes.push(node);
        Ok(())
    }

    pub fn finish(self) -> OwnedList<T> {
        OwnedList { nodes: self.nodes }
    }
}

impl<T> Default for ListBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Release a list and every payload it owns, returning the number of nodes released.
///
/// An absent list is a no-op and returns 0.
pub fn release_list<T>(list: Option<OwnedList<T>>) -> usize {
    match list {
        Some(list) => {
            let mut released = 0;
            for node in list.nodes {
                drop(node);
                released += 1;
            }
            released
        }
        None => 0,
    }
}

/// Release a driver name returned by `driver_name`. Absent names are ignored.
pub fn release_driver(name: Option<String>) {
    drop(name);
}
