//! Bounded undo history.
//!
//! Each entry stores an independent copy of the task taken before the
//! mutation, plus the position needed to put it back. The log itself never
//! touches the task list; [`crate::store::TaskStore::undo`] interprets the
//! popped entry.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::models::Task;

/// Number of mutations that can be undone.
pub const MAX_HISTORY: usize = 10;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Add,
    Delete,
    Complete,
    Edit,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::Add => "addition",
            ActionKind::Delete => "deletion",
            ActionKind::Complete => "completion",
            ActionKind::Edit => "edit",
        };
        f.write_str(s)
    }
}

/// A reversible mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The task that was added; undo removes it by id.
    Add { task: Task },
    /// The removed task and its 0-based index.
    Delete { task: Task, position: usize },
    /// The task before completion; undo finds it by id.
    Complete { task: Task },
    /// The task before the edit and its 0-based index.
    Edit { task: Task, position: usize },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Add { .. } => ActionKind::Add,
            Action::Delete { .. } => ActionKind::Delete,
            Action::Complete { .. } => ActionKind::Complete,
            Action::Edit { .. } => ActionKind::Edit,
        }
    }

    pub fn snapshot(&self) -> &Task {
        match self {
            Action::Add { task }
            | Action::Delete { task, .. }
            | Action::Complete { task }
            | Action::Edit { task, .. } => task,
        }
    }
}

/// FIFO-bounded list of the most recent actions.
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: VecDeque<Action>,
    capacity: usize,
}

impl Default for ActionLog {
    fn default() -> Self {
        ActionLog::with_capacity(MAX_HISTORY)
    }
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ActionLog {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends `action`, dropping the oldest entry once over capacity.
    pub fn record(&mut self, action: Action) {
        self.entries.push_back(action);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Removes and returns the most recent action.
    pub fn pop_last(&mut self) -> Option<Action> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    fn task(id: u64) -> Task {
        Task {
            id,
            description: format!("task {}", id),
            completed: false,
            priority: Priority::Low,
            due_date: "2024-01-01".parse().unwrap(),
            category: "General".into(),
            recurrence: None,
        }
    }

    #[test]
    fn evicts_oldest_first() {
        let mut log = ActionLog::new();
        for id in 1..=11 {
            log.record(Action::Add { task: task(id) });
        }
        assert_eq!(log.len(), MAX_HISTORY);

        let mut popped = Vec::new();
        while let Some(action) = log.pop_last() {
            popped.push(action.snapshot().id);
        }
        assert_eq!(popped, (2..=11).rev().collect::<Vec<_>>());
    }

    #[test]
    fn pop_on_empty_is_none() {
        let mut log = ActionLog::new();
        assert!(log.pop_last().is_none());
    }

    #[test]
    fn kind_matches_variant() {
        let action = Action::Edit { task: task(3), position: 0 };
        assert_eq!(action.kind(), ActionKind::Edit);
        assert_eq!(action.snapshot().id, 3);
    }
}
