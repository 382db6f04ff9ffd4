use crate::layer::Layer;
use crate::layer_stack::LayerStack;
use std::collections::VecDeque;

/// A captured copy of the layer sequence and active index.
///
/// Layer content is shared with the live stack rather than copied; this is
/// sound because content is only ever replaced, never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    layers: Vec<Layer>,
    active_index: usize,
}

impl Snapshot {
    pub fn new(layers: Vec<Layer>, active_index: usize) -> Self {
        Self {
            layers,
            active_index,
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub(crate) fn into_parts(self) -> (Vec<Layer>, usize) {
        (self.layers, self.active_index)
    }
}

/// Bounded linear undo/redo history of layer stack snapshots
#[derive(Debug, Clone)]
pub struct History {
    /// Oldest snapshot at the front
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_undo_count: usize,
}

impl History {
    /// Creates an empty history holding at most `max_undo_count` undo steps
    pub fn new(max_undo_count: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo_count,
        }
    }

    /// Records the current state of `stack` before a mutation
    pub fn snapshot(&mut self, stack: &LayerStack) {
        self.push(stack.snapshot());
    }

    /// Records a state captured before a mutation. Clears the redo stack.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.push_undo(snapshot);
        self.redo_stack.clear();
    }

    /// Restores the most recent undo snapshot, returning false if there is none
    pub fn undo(&mut self, stack: &mut LayerStack) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        self.redo_stack.push(stack.snapshot());
        stack.restore(previous);
        true
    }

    /// Re-applies the most recently undone snapshot, returning false if there is none
    pub fn redo(&mut self, stack: &mut LayerStack) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.push_undo(stack.snapshot());
        stack.restore(next);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_undo_count(&self) -> usize {
        self.max_undo_count
    }

    /// Clear the history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.max_undo_count {
            self.undo_stack.pop_front();
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_UNDO_COUNT)
    }
}
