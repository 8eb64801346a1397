// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// The combined value of a two-way zip round.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pair<A, B> {
    left: A,
    right: B,
}

impl<A, B> Pair<A, B> {
    pub fn new(left: A, right: B) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &A {
        &self.left
    }

    pub fn right(&self) -> &B {
        &self.right
    }

    pub fn into_inner(self) -> (A, B) {
        (self.left, self.right)
    }
}

/// The combined value of an n-way zip round; item `i` came from source `i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tuple<T> {
    items: Vec<T>,
}

impl<T> Tuple<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// The item contributed by source `index`, if the tuple is that wide.
    pub fn nth(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> IntoIterator for Tuple<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
