//! Cursor-based ordered collection.

use super::types::{BoundsPolicy, EachOutcome};
use crate::error::{CollectionError, CollectionResult as Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::{trace, warn};

/// An ordered sequence with a traversal cursor.
///
/// The cursor always lies in `[0, len]`; `len` means the collection is
/// exhausted. Operations that would move it outside that range fail and
/// leave the collection untouched. Removals pull the cursor back to `len`
/// when it would otherwise point past the new end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "RawCollection<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct OrderedCollection<T> {
    items: Vec<T>,
    cursor: usize,
}

/// Unvalidated wire form.
#[derive(Deserialize)]
struct RawCollection<T> {
    items: Vec<T>,
    #[serde(default)]
    cursor: usize,
}

impl<T> TryFrom<RawCollection<T>> for OrderedCollection<T> {
    type Error = CollectionError;

    fn try_from(raw: RawCollection<T>) -> Result<Self> {
        if raw.cursor > raw.items.len() {
            return Err(CollectionError::InvalidArgument(format!(
                "cursor {} is past the end of {} items",
                raw.cursor,
                raw.items.len()
            )));
        }
        Ok(Self {
            items: raw.items,
            cursor: raw.cursor,
        })
    }
}

impl<T> OrderedCollection<T> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
        }
    }

    /// Wrap an existing sequence. The cursor starts at 0.
    pub fn from_items(items: Vec<T>) -> Self {
        Self { items, cursor: 0 }
    }

    // --- Traversal ---

    /// Rewind and return the first item.
    pub fn first(&mut self) -> Result<&T> {
        self.reset();
        self.next()
    }

    /// Move the cursor to the last item and return it.
    pub fn last(&mut self) -> Result<&T> {
        let len = self.items.len();
        if len == 0 {
            return Err(CollectionError::IndexOutOfBounds { index: -1, len });
        }
        self.cursor = len - 1;
        Ok(&self.items[self.cursor])
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.items.len()
    }

    /// Return the item under the cursor and advance.
    ///
    /// Fails with `EndOfSequence` once the collection is exhausted; the
    /// cursor then stays at `len`.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<&T> {
        let item = self
            .items
            .get(self.cursor)
            .ok_or(CollectionError::EndOfSequence)?;
        self.cursor += 1;
        Ok(item)
    }

    /// True if the slot before the cursor holds an item.
    pub fn has_previous(&self) -> bool {
        self.previous_index()
            .is_some_and(|idx| idx < self.items.len())
    }

    /// Return the item under the cursor and step back.
    ///
    /// On an exhausted collection there is no item under the cursor: this
    /// fails with `EndOfSequence` but still steps back to the last item, so
    /// a `has_previous()` loop after a forward walk makes progress. At
    /// cursor 0 it fails without moving. A full reverse walk is `last()`,
    /// `previous()` while `has_previous()`, then `current()`.
    pub fn previous(&mut self) -> Result<&T> {
        if self.cursor == 0 {
            return Err(CollectionError::EndOfSequence);
        }
        if self.cursor >= self.items.len() {
            self.cursor = self.items.len() - 1;
            return Err(CollectionError::EndOfSequence);
        }
        let idx = self.cursor;
        self.cursor -= 1;
        Ok(&self.items[idx])
    }

    /// The item under the cursor.
    pub fn current(&self) -> Result<&T> {
        self.items
            .get(self.cursor)
            .ok_or(CollectionError::EndOfSequence)
    }

    /// Cursor position.
    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn next_index(&self) -> usize {
        self.cursor + 1
    }

    /// `None` when the cursor is at 0.
    pub fn previous_index(&self) -> Option<usize> {
        self.cursor.checked_sub(1)
    }

    /// Rewind the cursor and return the backing items.
    pub fn reset(&mut self) -> &[T] {
        self.cursor = 0;
        &self.items
    }

    /// Visit every item in order with its index.
    ///
    /// The cursor is rewound first and left at `len` on completion. A
    /// callback error is logged and stops the walk; it is reported in the
    /// outcome and never propagated.
    pub fn each<F, E>(&mut self, mut callback: F) -> EachOutcome<E>
    where
        F: FnMut(&T, usize) -> std::result::Result<(), E>,
        E: Display,
    {
        self.reset();
        let mut visited = 0;

        while self.has_next() {
            let index = self.cursor;
            self.cursor += 1;
            visited += 1;

            if let Err(e) = callback(&self.items[index], index) {
                warn!(index, error = %e, "each callback failed, stopping iteration");
                return EachOutcome::aborted(e, visited);
            }
        }

        EachOutcome::completed(visited)
    }

    // --- Mutation ---

    /// Append to the end.
    pub fn add(&mut self, item: T) {
        self.items.push(item);
    }

    /// Insert so that `item` ends up at `idx`, shifting later items right.
    ///
    /// `idx` may be `len` (append).
    pub fn insert_at(&mut self, item: T, idx: usize) -> Result<&[T]> {
        self.check_bounds(idx, BoundsPolicy::Insert)?;
        self.items.insert(idx, item);
        Ok(&self.items)
    }

    /// Insert immediately before the existing element at `idx`.
    pub fn insert_before(&mut self, item: T, idx: usize) -> Result<&[T]> {
        self.check_bounds(idx, BoundsPolicy::Read)?;
        self.insert_at(item, idx)
    }

    /// Insert immediately after the existing element at `idx`.
    pub fn insert_after(&mut self, item: T, idx: usize) -> Result<&[T]> {
        self.check_bounds(idx, BoundsPolicy::Read)?;
        self.insert_at(item, idx + 1)
    }

    /// Remove the element at `idx`.
    pub fn remove_at(&mut self, idx: usize) -> Result<&[T]> {
        self.check_bounds(idx, BoundsPolicy::Read)?;
        self.items.remove(idx);
        self.normalize_cursor();
        Ok(&self.items)
    }

    /// Remove every element matching `predicate`.
    pub fn remove_by_value<P>(&mut self, mut predicate: P) -> &[T]
    where
        P: FnMut(&T) -> bool,
    {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        trace!(removed = before - self.items.len(), "remove_by_value");
        self.normalize_cursor();
        &self.items
    }

    /// Remove every element equal to `item`.
    pub fn remove_item(&mut self, item: &T) -> &[T]
    where
        T: PartialEq,
    {
        self.remove_by_value(|candidate| candidate == item)
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Result<T> {
        let item = self.items.pop().ok_or(CollectionError::EndOfSequence)?;
        self.normalize_cursor();
        Ok(item)
    }

    /// Remove and return the first element.
    pub fn shift(&mut self) -> Result<T> {
        if self.items.is_empty() {
            return Err(CollectionError::EndOfSequence);
        }
        let item = self.items.remove(0);
        self.normalize_cursor();
        Ok(item)
    }

    /// Drop every element and rewind.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
    }

    fn normalize_cursor(&mut self) {
        if self.cursor > self.items.len() {
            self.cursor = self.items.len();
        }
    }

    // --- Access ---

    pub fn get_item(&self, idx: usize) -> Result<&T> {
        self.check_bounds(idx, BoundsPolicy::Read)?;
        Ok(&self.items[idx])
    }

    pub fn get_items(&self) -> &[T] {
        &self.items
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate without touching the cursor.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    // --- Bounds ---

    /// `idx` addresses an existing element.
    pub fn is_valid_read_index(&self, idx: usize) -> bool {
        BoundsPolicy::Read.accepts(idx, self.items.len())
    }

    /// `idx` is a valid insertion point (may equal `len`).
    pub fn is_valid_insert_index(&self, idx: usize) -> bool {
        BoundsPolicy::Insert.accepts(idx, self.items.len())
    }

    pub fn is_in_bounds(&self, idx: usize, policy: BoundsPolicy) -> bool {
        policy.accepts(idx, self.items.len())
    }

    /// Fail with `IndexOutOfBounds` unless `idx` satisfies `policy`.
    pub fn check_bounds(&self, idx: usize, policy: BoundsPolicy) -> Result<()> {
        if self.is_in_bounds(idx, policy) {
            Ok(())
        } else {
            Err(CollectionError::out_of_bounds(idx, self.items.len()))
        }
    }
}

impl<T> Default for OrderedCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for OrderedCollection<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_items(items)
    }
}

impl<T> FromIterator<T> for OrderedCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().collect())
    }
}

impl<T> Extend<T> for OrderedCollection<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> IntoIterator for OrderedCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a OrderedCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Build from a dynamic value: `null` is empty, an array becomes the items,
/// anything else is rejected.
impl TryFrom<serde_json::Value> for OrderedCollection<serde_json::Value> {
    type Error = CollectionError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Self::new()),
            serde_json::Value::Array(items) => Ok(Self::from_items(items)),
            other => Err(CollectionError::InvalidArgument(format!(
                "expected an array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
