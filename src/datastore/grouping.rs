//! Groups child rows (e.g. comments) under their parent rows (e.g. posts).
//!
//! Parents keep the order they were first seen in and are never duplicated. A parent with no
//! children ends up with an empty list, never a placeholder child.
use indexmap::IndexMap;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<P, C> {
    pub parent: P,
    pub children: Vec<C>,
}

#[derive(Debug)]
pub struct Grouper<K, P, C> {
    groups: IndexMap<K, Group<P, C>>,
}

impl<K: Hash + Eq, P, C> Default for Grouper<K, P, C> {
    fn default() -> Self {
        Self {
            groups: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq, P, C> Grouper<K, P, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parent. If the key was already seen, the first parent wins.
    pub fn push_parent(&mut self, key: K, parent: P) {
        self.groups.entry(key).or_insert_with(|| Group {
            parent,
            children: Vec::new(),
        });
    }

    /// Attach a child to an already-registered parent. Returns false, dropping the child, if no
    /// parent has that key.
    pub fn push_child(&mut self, key: &K, child: C) -> bool {
        match self.groups.get_mut(key) {
            Some(group) => {
                group.children.push(child);
                true
            }
            None => false,
        }
    }

    pub fn finish(self) -> Vec<Group<P, C>> {
        self.groups.into_iter().map(|(_, group)| group).collect()
    }
}
