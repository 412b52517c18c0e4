//! The active user's task list with bounded undo.
//!
//! Tasks are kept in insertion order. Public operations take 1-based task
//! numbers as shown to the user; history entries store 0-based positions.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::dates::{Clock, SystemClock};
use crate::error::TaskError;
use crate::history::{Action, ActionKind, ActionLog};
use crate::models::{validate_category, validate_description, NewTask, Priority, Task, TaskEdit};
use crate::recurrence::next_occurrence;

/// A task together with its 1-based position in the list.
pub type Numbered<'a> = (usize, &'a Task);

/// Status classes used by [`SearchCriterion::Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Completed,
    /// Not completed and not overdue.
    Pending,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriterion {
    /// Case-insensitive substring of the description.
    Description(String),
    /// Exact, case-sensitive category.
    Category(String),
    Priority(Priority),
    Status(StatusFilter),
}

/// Result of [`TaskStore::mark_complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub completed: Task,
    /// Successor created for a recurring task.
    pub next: Option<Task>,
}

/// Result of [`TaskStore::undo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoOutcome {
    pub kind: ActionKind,
    /// The snapshot stored with the undone action.
    pub task: Task,
    /// `false` when the recorded position or id no longer exists and the
    /// undo had nothing to act on.
    pub applied: bool,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    pub total: usize,
    pub completed: usize,
    /// Not completed and not overdue.
    pub pending: usize,
    pub overdue: usize,
    pub by_priority: PriorityCounts,
    pub by_category: BTreeMap<String, usize>,
}

impl Statistics {
    /// Share of completed tasks, rounded down. Zero for an empty list.
    pub fn completion_percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.completed * 100 / self.total
        }
    }
}

/// Overdue and due-soon tasks, each with its 1-based position.
#[derive(Debug, Clone, Default)]
pub struct Reminders<'a> {
    pub overdue: Vec<Numbered<'a>>,
    pub due_soon: Vec<Numbered<'a>>,
}

impl Reminders<'_> {
    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.due_soon.is_empty()
    }
}

/// Owns the task list and the undo history of one user.
#[derive(Debug)]
pub struct TaskStore<C = SystemClock> {
    tasks: Vec<Task>,
    history: ActionLog,
    next_id: u64,
    clock: C,
}

impl TaskStore<SystemClock> {
    pub fn new() -> Self {
        TaskStore::with_clock(SystemClock, 1)
    }
}

impl Default for TaskStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TaskStore<C> {
    /// Creates an empty store whose first task gets `next_id`.
    pub fn with_clock(clock: C, next_id: u64) -> Self {
        TaskStore {
            tasks: Vec::new(),
            history: ActionLog::new(),
            next_id: next_id.max(1),
            clock,
        }
    }

    /// Creates a store holding previously saved tasks. The id counter is
    /// moved past every loaded id so ids are never handed out twice.
    pub fn from_tasks(clock: C, tasks: Vec<Task>, next_id: u64) -> Self {
        let after_loaded = tasks.iter().map(|t| t.id).max().map_or(1, |max| max.saturating_add(1));
        TaskStore {
            tasks,
            history: ActionLog::new(),
            next_id: next_id.max(after_loaded),
            clock,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Id the next created task will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn history(&self) -> &ActionLog {
        &self.history
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Task at 1-based `index`.
    pub fn get(&self, index: usize) -> Result<&Task, TaskError> {
        let i = self.check_index(index)?;
        Ok(&self.tasks[i])
    }

    /// 1-based position of the task with `id`.
    pub fn position_of(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id).map(|i| i + 1)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_index(&self, index: usize) -> Result<usize, TaskError> {
        if index == 0 || index > self.tasks.len() {
            return Err(TaskError::IndexOutOfRange {
                index,
                len: self.tasks.len(),
            });
        }
        Ok(index - 1)
    }

    /// Appends a new task and records it for undo.
    pub fn add(&mut self, new: NewTask) -> Result<Task, TaskError> {
        let description = validate_description(&new.description)?;
        let category = validate_category(new.category.as_deref())?;

        let task = Task {
            id: self.allocate_id(),
            description,
            completed: false,
            priority: new.priority,
            due_date: new.due_date,
            category,
            recurrence: new.recurrence,
        };
        self.tasks.push(task.clone());
        self.history.record(Action::Add { task: task.clone() });
        debug!(id = task.id, "task added");
        Ok(task)
    }

    /// Changes one field of the task at 1-based `index`.
    pub fn edit(&mut self, index: usize, edit: TaskEdit) -> Result<Task, TaskError> {
        let i = self.check_index(index)?;
        let edit = match edit {
            TaskEdit::Description(d) => TaskEdit::Description(validate_description(&d)?),
            TaskEdit::Category(c) => TaskEdit::Category(validate_category(Some(&c))?),
            other => other,
        };

        let snapshot = self.tasks[i].clone();
        let task = &mut self.tasks[i];
        match edit {
            TaskEdit::Description(d) => task.description = d,
            TaskEdit::Priority(p) => task.priority = p,
            TaskEdit::DueDate(d) => task.due_date = d,
            TaskEdit::Category(c) => task.category = c,
        }
        let edited = task.clone();
        self.history.record(Action::Edit {
            task: snapshot,
            position: i,
        });
        debug!(id = edited.id, "task edited");
        Ok(edited)
    }

    /// Removes the task at 1-based `index`.
    pub fn delete(&mut self, index: usize) -> Result<Task, TaskError> {
        let i = self.check_index(index)?;
        let task = self.tasks.remove(i);
        self.history.record(Action::Delete {
            task: task.clone(),
            position: i,
        });
        debug!(id = task.id, "task deleted");
        Ok(task)
    }

    /// Marks the task at 1-based `index` completed. A recurring task also
    /// gets its next occurrence appended to the list.
    pub fn mark_complete(&mut self, index: usize) -> Result<Completion, TaskError> {
        let i = self.check_index(index)?;
        let snapshot = self.tasks[i].clone();
        self.tasks[i].completed = true;
        self.history.record(Action::Complete { task: snapshot });

        let next = if self.tasks[i].is_recurring() {
            let id = self.allocate_id();
            let next = next_occurrence(&self.tasks[i], self.clock.today(), id)?;
            self.tasks.push(next.clone());
            debug!(id = next.id, "next occurrence created");
            Some(next)
        } else {
            None
        };

        let completed = self.tasks[i].clone();
        debug!(id = completed.id, "task completed");
        Ok(Completion { completed, next })
    }

    /// Reverts the most recent recorded mutation.
    ///
    /// Undoing a completion only clears the flag; a successor created for a
    /// recurring task stays in the list.
    pub fn undo(&mut self) -> Result<UndoOutcome, TaskError> {
        let action = self.history.pop_last().ok_or(TaskError::EmptyHistory)?;
        let kind = action.kind();

        let (task, applied) = match action {
            Action::Add { task } => {
                let applied = match self.tasks.iter().position(|t| t.id == task.id) {
                    Some(i) => {
                        self.tasks.remove(i);
                        true
                    }
                    None => false,
                };
                (task, applied)
            }
            Action::Delete { task, position } => {
                if position <= self.tasks.len() {
                    self.tasks.insert(position, task.clone());
                    (task, true)
                } else {
                    (task, false)
                }
            }
            Action::Complete { task } => {
                let applied = match self.tasks.iter_mut().find(|t| t.id == task.id) {
                    Some(live) => {
                        live.completed = false;
                        true
                    }
                    None => false,
                };
                (task, applied)
            }
            Action::Edit { task, position } => {
                if position < self.tasks.len() {
                    self.tasks[position] = task.clone();
                    (task, true)
                } else {
                    (task, false)
                }
            }
        };

        debug!(id = task.id, %kind, applied, "undo");
        Ok(UndoOutcome { kind, task, applied })
    }

    /// Tasks matching `criterion`, in list order.
    pub fn search(&self, criterion: &SearchCriterion) -> Vec<Numbered<'_>> {
        let today = self.clock.today();
        let needle = match criterion {
            SearchCriterion::Description(text) => text.to_lowercase(),
            _ => String::new(),
        };

        self.numbered()
            .filter(|(_, t)| match criterion {
                SearchCriterion::Description(_) => t.description.to_lowercase().contains(&needle),
                SearchCriterion::Category(c) => t.category == *c,
                SearchCriterion::Priority(p) => t.priority == *p,
                SearchCriterion::Status(StatusFilter::Completed) => t.completed,
                SearchCriterion::Status(StatusFilter::Pending) => !t.completed && !t.is_overdue(today),
                SearchCriterion::Status(StatusFilter::Overdue) => t.is_overdue(today),
            })
            .collect()
    }

    /// Copy of the list ordered by due date; ties keep list order.
    pub fn sorted_by_due_date(&self) -> Vec<Task> {
        let mut sorted = self.tasks.clone();
        sorted.sort_by_key(|t| t.due_date);
        sorted
    }

    /// Copy of the list ordered High, Medium, Low; ties keep list order.
    pub fn sorted_by_priority(&self) -> Vec<Task> {
        let mut sorted = self.tasks.clone();
        sorted.sort_by_key(|t| t.priority);
        sorted
    }

    pub fn statistics(&self) -> Statistics {
        let today = self.clock.today();
        let mut stats = Statistics {
            total: self.tasks.len(),
            ..Statistics::default()
        };

        for t in &self.tasks {
            if t.completed {
                stats.completed += 1;
            } else if t.is_overdue(today) {
                stats.overdue += 1;
            } else {
                stats.pending += 1;
            }

            match t.priority {
                Priority::High => stats.by_priority.high += 1,
                Priority::Medium => stats.by_priority.medium += 1,
                Priority::Low => stats.by_priority.low += 1,
            }

            *stats.by_category.entry(t.category.clone()).or_insert(0) += 1;
        }
        stats
    }

    /// Overdue tasks and tasks due within `horizon_days`.
    pub fn reminders(&self, horizon_days: i64) -> Reminders<'_> {
        let today = self.clock.today();
        let mut reminders = Reminders::default();
        for (n, t) in self.numbered() {
            if t.is_overdue(today) {
                reminders.overdue.push((n, t));
            } else if t.is_due_soon(today, horizon_days) {
                reminders.due_soon.push((n, t));
            }
        }
        reminders
    }

    fn numbered(&self) -> impl Iterator<Item = Numbered<'_>> {
        self.tasks.iter().enumerate().map(|(i, t)| (i + 1, t))
    }
}
