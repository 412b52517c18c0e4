use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::{self, DueDate};
use crate::error::TaskError;

/// Category used when none is given.
pub const DEFAULT_CATEGORY: &str = "General";

/// Task priority. The numeric value is also the sort key: High sorts first.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Numeric code used in task records.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Priority> {
        match code {
            1 => Some(Priority::High),
            2 => Some(Priority::Medium),
            3 => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    /// Accepts `1`-`3` or `high`/`medium`/`low` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Priority::from_code(code)
                .ok_or_else(|| TaskError::invalid(format!("priority must be 1, 2 or 3, got {}", code)));
        }
        match s.to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(TaskError::invalid(format!("unknown priority '{}'", s))),
        }
    }
}

/// Recurrence period of a task.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    /// Name used in task records.
    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "1" => Ok(Recurrence::Daily),
            "weekly" | "2" => Ok(Recurrence::Weekly),
            "monthly" | "3" => Ok(Recurrence::Monthly),
            other => Err(TaskError::invalid(format!(
                "unknown recurrence '{}'. Supported: daily, weekly, monthly",
                other
            ))),
        }
    }
}

/// Represents a single task of the active user.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Unique identifier, never reassigned.
    pub id: u64,
    pub description: String,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: DueDate,
    pub category: String,
    /// Recurrence period; `None` means the task does not repeat.
    pub recurrence: Option<Recurrence>,
}

impl Task {
    /// Not completed and due before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && dates::is_overdue(self.due_date, today)
    }

    /// Not completed, not overdue and due within `horizon_days` of `today`.
    pub fn is_due_soon(&self, today: NaiveDate, horizon_days: i64) -> bool {
        !self.completed && dates::is_due_soon(self.due_date, today, horizon_days)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }
}

/// Everything needed to create a task; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub description: String,
    pub priority: Priority,
    pub due_date: DueDate,
    /// Empty or `None` falls back to [`DEFAULT_CATEGORY`].
    pub category: Option<String>,
    pub recurrence: Option<Recurrence>,
}

impl NewTask {
    pub fn new(description: impl Into<String>, priority: Priority, due_date: DueDate) -> Self {
        NewTask {
            description: description.into(),
            priority,
            due_date,
            category: None,
            recurrence: None,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn recurring(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }
}

/// A single-field change applied by [`crate::store::TaskStore::edit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEdit {
    Description(String),
    Priority(Priority),
    DueDate(DueDate),
    Category(String),
}

/// Rejects descriptions that are blank or would break a task record.
pub fn validate_description(text: &str) -> Result<String, TaskError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TaskError::invalid("description cannot be empty"));
    }
    check_record_safe("description", text)?;
    Ok(text.to_string())
}

/// Normalises a category: blank becomes [`DEFAULT_CATEGORY`].
pub fn validate_category(text: Option<&str>) -> Result<String, TaskError> {
    match text.map(str::trim) {
        None | Some("") => Ok(DEFAULT_CATEGORY.to_string()),
        Some(c) => {
            check_record_safe("category", c)?;
            Ok(c.to_string())
        }
    }
}

fn check_record_safe(field: &str, text: &str) -> Result<(), TaskError> {
    if text.contains(['|', '\n', '\r']) {
        return Err(TaskError::invalid(format!(
            "{} cannot contain '|' or line breaks",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_codes_and_names() {
        assert_eq!("1".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!("Medium".parse::<Priority>().unwrap(), Priority::Medium);
        assert!("4".parse::<Priority>().is_err());
        assert!("urgent".parse::<Priority>().is_err());
        assert!(Priority::High < Priority::Low);
    }

    #[test]
    fn recurrence_parses_names_and_menu_numbers() {
        assert_eq!("Weekly".parse::<Recurrence>().unwrap(), Recurrence::Weekly);
        assert_eq!("3".parse::<Recurrence>().unwrap(), Recurrence::Monthly);
        assert!("yearly".parse::<Recurrence>().is_err());
    }

    #[test]
    fn category_defaults_and_rejects_pipes() {
        assert_eq!(validate_category(None).unwrap(), "General");
        assert_eq!(validate_category(Some("  ")).unwrap(), "General");
        assert_eq!(validate_category(Some("Work")).unwrap(), "Work");
        assert!(validate_category(Some("a|b")).is_err());
        assert!(validate_description("   ").is_err());
        assert!(validate_description("line\nbreak").is_err());
    }
}
