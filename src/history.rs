//! Back/forward navigation history for a single view.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Default bound on the back stack.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Per-view back and forward stacks.
///
/// The back stack is bounded and evicts its oldest entry on overflow. The
/// forward stack is unbounded but is cleared by any navigation that does not
/// come from the history itself.
#[derive(Debug, Clone)]
pub struct NavigationHistory {
    back: VecDeque<PathBuf>,
    forward: Vec<PathBuf>,
    max_depth: usize,
}

impl NavigationHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            back: VecDeque::with_capacity(max_depth.min(64)),
            forward: Vec::new(),
            max_depth,
        }
    }

    /// Record a user navigation away from `previous`.
    ///
    /// Pushes onto the back stack and discards the forward stack.
    pub fn record(&mut self, previous: &Path) {
        self.push_back(previous);
        self.forward.clear();
    }

    /// Push onto the back stack without touching the forward stack.
    pub fn push_back(&mut self, previous: &Path) {
        if self.max_depth == 0 {
            return;
        }
        while self.back.len() >= self.max_depth {
            self.back.pop_front();
        }
        self.back.push_back(previous.to_path_buf());
    }

    pub fn push_forward(&mut self, path: &Path) {
        self.forward.push(path.to_path_buf());
    }

    pub fn pop_back(&mut self) -> Option<PathBuf> {
        self.back.pop_back()
    }

    pub fn pop_forward(&mut self) -> Option<PathBuf> {
        self.forward.pop()
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    /// Back stack, most recent first.
    pub fn back_entries(&self) -> Vec<PathBuf> {
        self.back.iter().rev().cloned().collect()
    }

    /// Forward stack in the order `forward` would visit it.
    pub fn forward_entries(&self) -> Vec<PathBuf> {
        self.forward.iter().rev().cloned().collect()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}
