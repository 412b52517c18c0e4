use thiserror::Error;

/// Errors produced by task operations.
///
/// All of them are recoverable: the caller reports the problem and the
/// session carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// A date, priority, description or category was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A 1-based task number outside `[1, len]`.
    #[error("task number {index} is out of range (1..={len})")]
    IndexOutOfRange { index: usize, len: usize },
    /// Undo was requested with an empty history.
    #[error("nothing to undo")]
    EmptyHistory,
    /// A next occurrence was requested for a task without recurrence.
    #[error("task {0} is not recurring")]
    NoRecurrence(u64),
}

impl TaskError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        TaskError::InvalidInput(msg.into())
    }
}
