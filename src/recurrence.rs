use chrono::NaiveDate;

use crate::dates::{self, DueDate};
use crate::error::TaskError;
use crate::models::{Recurrence, Task};

/// Builds the next occurrence of a recurring task.
///
/// The successor copies every descriptive field, starts pending and gets
/// `id`. Its due date is one period after `today`, not after the completed
/// task's due date.
pub fn next_occurrence(task: &Task, today: NaiveDate, id: u64) -> Result<Task, TaskError> {
    let recurrence = task.recurrence.ok_or(TaskError::NoRecurrence(task.id))?;
    let start = DueDate::from(today);
    let due_date = match recurrence {
        Recurrence::Daily => dates::add_days(start, 1),
        Recurrence::Weekly => dates::add_weeks(start, 1),
        Recurrence::Monthly => dates::add_months(start, 1),
    };

    Ok(Task {
        id,
        completed: false,
        due_date,
        ..task.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    fn task(recurrence: Option<Recurrence>) -> Task {
        Task {
            id: 7,
            description: "Water plants".into(),
            completed: true,
            priority: Priority::Medium,
            due_date: "2024-01-10".parse().unwrap(),
            category: "Home".into(),
            recurrence,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn daily_advances_from_today() {
        let next = next_occurrence(&task(Some(Recurrence::Daily)), today(), 8).unwrap();
        assert_eq!(next.id, 8);
        assert!(!next.completed);
        assert_eq!(next.due_date.to_string(), "2024-06-02");
        assert_eq!(next.description, "Water plants");
        assert_eq!(next.category, "Home");
        assert_eq!(next.recurrence, Some(Recurrence::Daily));
    }

    #[test]
    fn weekly_and_monthly_periods() {
        let weekly = next_occurrence(&task(Some(Recurrence::Weekly)), today(), 8).unwrap();
        assert_eq!(weekly.due_date.to_string(), "2024-06-08");
        let monthly = next_occurrence(&task(Some(Recurrence::Monthly)), today(), 8).unwrap();
        assert_eq!(monthly.due_date.to_string(), "2024-07-01");
    }

    #[test]
    fn non_recurring_is_rejected() {
        assert_eq!(
            next_occurrence(&task(None), today(), 8),
            Err(TaskError::NoRecurrence(7))
        );
    }
}
