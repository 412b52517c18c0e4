use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::dates::Clock;
use crate::models::{NewTask, Priority, Task, TaskEdit};
use crate::session::Session;
use crate::store::{Reminders, SearchCriterion, Statistics};

/// Ordering for [`cmd_list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    /// List order, as numbered for edit/remove/complete.
    Inserted,
    DueDate,
    Priority,
}

/// Short status label shown next to a task.
pub fn status_label(task: &Task, today: NaiveDate, horizon: i64) -> &'static str {
    if task.completed {
        "Done"
    } else if task.is_overdue(today) {
        "OVERDUE"
    } else if task.is_due_soon(today, horizon) {
        "Due soon"
    } else {
        "Pending"
    }
}

fn status_color(label: &str) -> Color {
    match label {
        "Done" => Color::Green,
        "OVERDUE" => Color::Red,
        "Due soon" => Color::Yellow,
        _ => Color::Reset,
    }
}

/// Renders tasks with their 1-based numbers.
pub fn task_table<'a>(
    rows: impl IntoIterator<Item = (usize, &'a Task)>,
    today: NaiveDate,
    horizon: i64,
) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Done").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Recurs").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for (n, t) in rows {
        let status = status_label(t, today, horizon);
        let priority_color = match t.priority {
            Priority::High => Color::Red,
            Priority::Medium => Color::Yellow,
            Priority::Low => Color::Green,
        };
        table.add_row(vec![
            Cell::new(n),
            Cell::new(t.id),
            Cell::new(if t.completed { "✓" } else { "" }),
            Cell::new(&t.description),
            Cell::new(t.priority).fg(priority_color),
            Cell::new(t.due_date),
            Cell::new(&t.category),
            Cell::new(t.recurrence.map(|r| r.to_string()).unwrap_or_default()),
            Cell::new(status).fg(status_color(status)),
        ]);
    }
    table
}

/// Creates an account.
pub fn cmd_register<C: Clock + Clone>(session: &mut Session<C>, username: &str, password: &str) -> Result<()> {
    session
        .register(username, password)
        .with_context(|| format!("could not register '{}'", username))?;
    println!("Registration successful! You can now log in as '{}'.", username);
    Ok(())
}

pub fn cmd_add<C: Clock + Clone>(session: &mut Session<C>, new: NewTask) -> Result<()> {
    let task = session.store_mut()?.add(new).context("could not add task")?;
    println!("Task added (#{}, id = {}).", session.store()?.len(), task.id);
    Ok(())
}

/// Lists tasks, optionally as JSON.
pub fn cmd_list<C: Clock + Clone>(session: &Session<C>, order: ListOrder, json: bool, horizon: i64) -> Result<()> {
    let store = session.store()?;
    let tasks = match order {
        ListOrder::Inserted => store.tasks().to_vec(),
        ListOrder::DueDate => store.sorted_by_due_date(),
        ListOrder::Priority => store.sorted_by_priority(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("No tasks to display.");
        return Ok(());
    }

    let rows = tasks
        .iter()
        .map(|t| (store.position_of(t.id).unwrap_or_default(), t));
    println!("To-Do List for {}:", session.current_user().unwrap_or_default());
    println!("{}", task_table(rows, store.today(), horizon));
    Ok(())
}

/// Applies a single-field edit to task number `index`.
pub fn cmd_edit<C: Clock + Clone>(session: &mut Session<C>, index: usize, edit: TaskEdit) -> Result<()> {
    let task = session
        .store_mut()?
        .edit(index, edit)
        .with_context(|| format!("could not edit task #{}", index))?;
    println!("Task #{} updated: {}", index, task.description);
    Ok(())
}

pub fn cmd_remove<C: Clock + Clone>(session: &mut Session<C>, index: usize) -> Result<()> {
    let task = session
        .store_mut()?
        .delete(index)
        .with_context(|| format!("could not delete task #{}", index))?;
    println!("Task '{}' deleted.", task.description);
    Ok(())
}

pub fn cmd_complete<C: Clock + Clone>(session: &mut Session<C>, index: usize) -> Result<()> {
    let done = session
        .store_mut()?
        .mark_complete(index)
        .with_context(|| format!("could not complete task #{}", index))?;
    println!("Task '{}' marked as completed!", done.completed.description);
    if let Some(next) = done.next {
        println!("Next occurrence created, due {}.", next.due_date);
    }
    Ok(())
}

pub fn cmd_search<C: Clock + Clone>(session: &Session<C>, criterion: &SearchCriterion, horizon: i64) -> Result<()> {
    let store = session.store()?;
    let results = store.search(criterion);
    if results.is_empty() {
        println!("No matching tasks found.");
        return Ok(());
    }
    println!("Search Results:");
    println!("{}", task_table(results, store.today(), horizon));
    Ok(())
}

pub fn stats_table(stats: &Statistics) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Count"]);
    table.add_row(vec![Cell::new("Total"), Cell::new(stats.total)]);
    table.add_row(vec![
        Cell::new("Completed"),
        Cell::new(format!("{} ({}%)", stats.completed, stats.completion_percent())).fg(Color::Green),
    ]);
    table.add_row(vec![Cell::new("Pending"), Cell::new(stats.pending)]);
    table.add_row(vec![Cell::new("Overdue"), Cell::new(stats.overdue).fg(Color::Red)]);
    table.add_row(vec![Cell::new("High priority"), Cell::new(stats.by_priority.high)]);
    table.add_row(vec![Cell::new("Medium priority"), Cell::new(stats.by_priority.medium)]);
    table.add_row(vec![Cell::new("Low priority"), Cell::new(stats.by_priority.low)]);
    for (category, count) in &stats.by_category {
        table.add_row(vec![Cell::new(format!("Category: {}", category)), Cell::new(count)]);
    }
    table
}

pub fn cmd_stats<C: Clock + Clone>(session: &Session<C>, json: bool) -> Result<()> {
    let stats = session.store()?.statistics();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else if stats.total == 0 {
        println!("No tasks to analyze.");
    } else {
        println!("{}", stats_table(&stats));
    }
    Ok(())
}

/// Prints overdue tasks and tasks due within `horizon` days.
pub fn cmd_reminders<C: Clock + Clone>(session: &Session<C>, horizon: i64) -> Result<()> {
    let store = session.store()?;
    let reminders = store.reminders(horizon);
    print_reminders(&reminders, store.today(), horizon);
    Ok(())
}

fn print_reminders(reminders: &Reminders<'_>, today: NaiveDate, horizon: i64) {
    if reminders.is_empty() {
        println!("No urgent tasks. Great job!");
        return;
    }
    if !reminders.overdue.is_empty() {
        println!("OVERDUE TASKS:");
        println!("{}", task_table(reminders.overdue.iter().copied(), today, horizon));
    }
    if !reminders.due_soon.is_empty() {
        println!("DUE SOON (next {} days):", horizon);
        println!("{}", task_table(reminders.due_soon.iter().copied(), today, horizon));
    }
}
