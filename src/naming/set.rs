//! Insertion-ordered set of names

use std::collections::HashSet;

/// Set of strings that remembers insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedSet {
    members: HashSet<String>,
    order: Vec<String>,
}

impl OrderedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to the end if absent
    pub fn append(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.members.contains(&value) {
            return false;
        }
        self.members.insert(value.clone());
        self.order.push(value);
        true
    }

    /// Add to the front if absent; an existing member keeps its position
    pub fn prepend(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.members.contains(&value) {
            return false;
        }
        self.members.insert(value.clone());
        self.order.insert(0, value);
        true
    }

    /// Move to the front, adding it when absent
    pub fn promote(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.members.contains(&value) {
            self.order.retain(|v| v != &value);
        } else {
            self.members.insert(value.clone());
        }
        self.order.insert(0, value);
    }

    pub fn contains(&self, value: &str) -> bool {
        self.members.contains(value)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

impl<S: Into<String>> FromIterator<S> for OrderedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<S: Into<String>> Extend<S> for OrderedSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for value in iter {
            self.append(value);
        }
    }
}
