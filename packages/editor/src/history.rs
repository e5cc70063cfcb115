//! # Undo/Redo History
//!
//! Bounded undo/redo over configuration snapshots.
//!
//! ## Design
//!
//! - [`History`] is the raw pair of stacks. It never holds the current value;
//!   callers pass it in on `undo`/`redo` so it can be moved to the other side
//! - [`Timeline`] owns the current value as well, for hosts that want
//!   "commit the new value" semantics
//! - New commits clear the redo stack
//! - The undo stack is capped; the oldest snapshot is evicted first
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut timeline = Timeline::new(75);
//! timeline.commit(first);
//! timeline.commit(second);
//!
//! assert_eq!(timeline.undo(), Some(&first));
//! assert_eq!(timeline.redo(), Some(&second));
//! ```

use std::collections::VecDeque;

/// Default number of undo levels
pub const DEFAULT_CAPACITY: usize = 75;

/// Undo and redo stacks of snapshots
#[derive(Debug, Clone)]
pub struct History<T> {
    /// Most recent last
    undo_stack: VecDeque<T>,

    /// Most recent last
    redo_stack: Vec<T>,

    /// Maximum number of undo levels; 0 keeps none
    capacity: usize,
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity,
        }
    }

    /// Record a snapshot. Clears the redo stack.
    pub fn commit(&mut self, snapshot: T) {
        self.undo_stack.push_back(snapshot);
        self.evict();
        self.redo_stack.clear();
    }

    /// Step back. `current` moves to the redo stack and the most recent
    /// snapshot is returned. Returns `None` (and drops nothing) when there is
    /// nothing to undo.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Step forward again after an undo
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        self.evict();
        Some(next)
    }

    /// Clear all history
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Undo snapshots, oldest first
    pub fn undo_snapshots(&self) -> impl Iterator<Item = &T> {
        self.undo_stack.iter()
    }

    /// Redo snapshots, most recently undone last
    pub fn redo_snapshots(&self) -> impl Iterator<Item = &T> {
        self.redo_stack.iter()
    }

    fn evict(&mut self) {
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A current value plus the history behind it
#[derive(Debug, Clone)]
pub struct Timeline<T> {
    current: Option<T>,
    history: History<T>,
}

impl<T: Clone> Timeline<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            current: None,
            history: History::with_capacity(capacity),
        }
    }

    /// Start from `initial` with empty history
    pub fn starting_at(initial: T, capacity: usize) -> Self {
        Self {
            current: Some(initial),
            history: History::with_capacity(capacity),
        }
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Make `value` current; the previous value becomes undoable
    pub fn commit(&mut self, value: T) {
        if let Some(previous) = self.current.replace(value) {
            self.history.commit(previous);
        } else {
            self.history.redo_stack.clear();
        }
    }

    /// Step back. Returns the new current value, or `None` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> Option<&T> {
        let current = self.current.clone()?;
        let previous = self.history.undo(current)?;
        self.current = Some(previous);
        self.current.as_ref()
    }

    pub fn redo(&mut self) -> Option<&T> {
        let current = self.current.clone()?;
        let next = self.history.redo(current)?;
        self.current = Some(next);
        self.current.as_ref()
    }

    /// Forget the history but keep the current value
    pub fn reset(&mut self) {
        self.history.reset();
    }

    pub fn history(&self) -> &History<T> {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

impl<T: Clone> Default for Timeline<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
