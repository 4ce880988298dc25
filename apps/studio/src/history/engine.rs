//! Bounded undo/redo over immutable snapshots.
//!
//! Snapshots are `Arc<T>`: a write of the very same `Arc` as `present` is a
//! no-op, which keeps redundant writes out of the undo stack without needing
//! `T: PartialEq`.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;

/// Maximum number of entries kept in `past`.
pub const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub past_len: usize,
    pub future_len: usize,
}

/// The `{past, present, future}` triple, owned by the engine.
#[derive(Debug)]
pub struct History<T> {
    past: VecDeque<Arc<T>>,
    present: Arc<T>,
    future: VecDeque<Arc<T>>,
    skip_next: bool,
    limit: usize,
}

impl<T> Clone for History<T> {
    fn clone(&self) -> Self {
        Self {
            past: self.past.clone(),
            present: Arc::clone(&self.present),
            future: self.future.clone(),
            skip_next: self.skip_next,
            limit: self.limit,
        }
    }
}

impl<T> History<T> {
    pub fn new(initial: Arc<T>) -> Self {
        Self::with_limit(initial, MAX_HISTORY)
    }

    pub fn with_limit(initial: Arc<T>, limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            future: VecDeque::new(),
            skip_next: false,
            limit: limit.max(1),
        }
    }

    pub fn present(&self) -> &Arc<T> {
        &self.present
    }

    /// Arms a one-shot flag: the next `set_state`, whoever issues it, is
    /// applied without a checkpoint.
    pub fn skip_next(&mut self) {
        self.skip_next = true;
    }

    /// Records `next` as the new present.
    ///
    /// With `skip_history` (or an armed [`History::skip_next`]) the present is
    /// replaced and `past`/`future` are left untouched. Either way the armed
    /// flag is consumed by this call.
    pub fn set_state(&mut self, next: Arc<T>, skip_history: bool) {
        let armed = std::mem::take(&mut self.skip_next);
        if skip_history || armed {
            self.present = next;
            return;
        }
        if Arc::ptr_eq(&next, &self.present) {
            return;
        }
        let previous = std::mem::replace(&mut self.present, next);
        self.past.push_back(previous);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        self.future.clear();
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        true
    }

    pub fn clear_history(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            past_len: self.past.len(),
            future_len: self.future.len(),
        }
    }

    pub fn past(&self) -> impl Iterator<Item = &Arc<T>> {
        self.past.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(v: u32) -> Arc<u32> {
        Arc::new(v)
    }

    #[test]
    fn test_initial_state() {
        let h = History::new(snap(0));
        assert_eq!(**h.present(), 0);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }

    #[test]
    fn test_undo_all_returns_initial() {
        let initial = snap(0);
        let mut h = History::new(Arc::clone(&initial));
        for i in 1..=10 {
            h.set_state(snap(i), false);
        }
        for _ in 0..10 {
            assert!(h.undo());
        }
        assert!(Arc::ptr_eq(h.present(), &initial));
        assert!(!h.can_undo());
        assert!(!h.undo());
    }

    #[test]
    fn test_redo_restores_same_snapshot() {
        let mut h = History::new(snap(0));
        let a = snap(1);
        h.set_state(Arc::clone(&a), false);
        h.undo();
        h.redo();
        assert!(Arc::ptr_eq(h.present(), &a));
    }

    #[test]
    fn test_same_arc_is_noop() {
        let mut h = History::new(snap(0));
        let present = Arc::clone(h.present());
        h.set_state(present, false);
        assert_eq!(h.status().past_len, 0);

        // Equal value but a different allocation is a real write.
        h.set_state(snap(0), false);
        assert_eq!(h.status().past_len, 1);
    }

    #[test]
    fn test_bounded_past_evicts_oldest() {
        let mut h = History::new(snap(0));
        for i in 1..=60 {
            h.set_state(snap(i), false);
        }
        assert_eq!(h.status().past_len, MAX_HISTORY);
        let oldest: Vec<u32> = h.past().take(2).map(|s| **s).collect();
        assert_eq!(oldest, vec![10, 11]);
        assert_eq!(**h.present(), 60);
    }

    #[test]
    fn test_skip_history_keeps_stacks() {
        let mut h = History::new(snap(0));
        h.set_state(snap(1), false);
        h.set_state(snap(2), false);
        h.undo();
        let before = h.status();

        h.set_state(snap(99), true);
        assert_eq!(**h.present(), 99);
        assert_eq!(h.status().past_len, before.past_len);
        assert_eq!(h.status().future_len, before.future_len);
    }

    #[test]
    fn test_new_write_after_undo_clears_future() {
        let mut h = History::new(snap(0));
        h.set_state(snap(1), false);
        h.set_state(snap(2), false);
        h.undo();
        assert!(h.can_redo());
        h.set_state(snap(3), false);
        assert!(!h.can_redo());
        assert!(!h.redo());
        assert_eq!(**h.present(), 3);
    }

    #[test]
    fn test_skip_flag_is_one_shot() {
        let mut h = History::new(snap(0));
        h.skip_next();
        h.set_state(snap(1), false);
        assert_eq!(h.status().past_len, 0);
        h.set_state(snap(2), false);
        assert_eq!(h.status().past_len, 1);
    }

    #[test]
    fn test_two_armed_skips_collapse_into_one() {
        // Arming twice before any write still skips exactly one write.
        let mut h = History::new(snap(0));
        h.skip_next();
        h.skip_next();
        h.set_state(snap(1), false);
        h.set_state(snap(2), false);
        assert_eq!(h.status().past_len, 1);
        assert!(h.undo());
        assert_eq!(**h.present(), 1);
    }

    #[test]
    fn test_explicit_skip_consumes_armed_flag() {
        let mut h = History::new(snap(0));
        h.skip_next();
        h.set_state(snap(1), true);
        h.set_state(snap(2), false);
        assert_eq!(h.status().past_len, 1);
    }

    #[test]
    fn test_clear_history_keeps_present() {
        let mut h = History::new(snap(0));
        h.set_state(snap(1), false);
        h.set_state(snap(2), false);
        h.undo();
        h.clear_history();
        assert_eq!(**h.present(), 1);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }
}
