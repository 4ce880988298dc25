//! Push/undo/redo manager for state the manager does not own.
//!
//! The caller records a state before changing it and hands over its current
//! state when navigating. Bounds and truncation match [`super::History`].

use std::collections::VecDeque;

use crate::history::engine::MAX_HISTORY;

#[derive(Debug, Clone)]
pub struct HistoryManager<T> {
    past: VecDeque<T>,
    future: VecDeque<T>,
    limit: usize,
}

impl<T> Default for HistoryManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HistoryManager<T> {
    pub fn new() -> Self {
        Self::with_limit(MAX_HISTORY)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Records `state` as a checkpoint and drops any redo branch.
    pub fn push(&mut self, state: T) {
        self.past.push_back(state);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Returns the state to restore, keeping `current` for redo.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.past.pop_back()?;
        self.future.push_front(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.future.pop_front()?;
        self.past.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn len(&self) -> (usize, usize) {
        (self.past.len(), self.future.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_against_external_state() {
        let mut m = HistoryManager::new();
        let mut state = vec!["a"];

        m.push(state.clone());
        state.push("b");
        m.push(state.clone());
        state.push("c");

        state = m.undo(state).unwrap();
        assert_eq!(state, vec!["a", "b"]);
        state = m.undo(state).unwrap();
        assert_eq!(state, vec!["a"]);
        assert!(m.undo(state.clone()).is_none());

        state = m.redo(state).unwrap();
        assert_eq!(state, vec!["a", "b"]);
        state = m.redo(state).unwrap();
        assert_eq!(state, vec!["a", "b", "c"]);
        assert!(m.redo(state).is_none());
    }

    #[test]
    fn test_empty_ends_are_noops() {
        let mut m: HistoryManager<u32> = HistoryManager::new();
        assert!(m.undo(1).is_none());
        assert!(m.redo(1).is_none());
        assert_eq!(m.len(), (0, 0));
    }

    #[test]
    fn test_push_truncates_future() {
        let mut m = HistoryManager::new();
        m.push(1);
        let restored = m.undo(2).unwrap();
        assert_eq!(restored, 1);
        assert!(m.can_redo());
        m.push(1);
        assert!(!m.can_redo());
    }

    #[test]
    fn test_bounded_like_engine() {
        let mut m = HistoryManager::new();
        for i in 0..(MAX_HISTORY + 7) {
            m.push(i);
        }
        assert_eq!(m.len().0, MAX_HISTORY);
        let mut current = 1000;
        let mut last = None;
        while let Some(prev) = m.undo(current) {
            current = prev;
            last = Some(prev);
        }
        assert_eq!(last, Some(7));
    }
}
