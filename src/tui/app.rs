use ratatui::widgets::TableState;

use crate::commands::ListOrder;
use crate::dates::{Clock, DueDate};
use crate::models::{NewTask, Priority, Recurrence, Task, TaskEdit};
use crate::session::{Session, SessionError};
use crate::store::{SearchCriterion, TaskStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
    Searching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    None,
    Description,
    Priority,
    Due,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    Statistics,
    Reminders,
}

/// State for the multi-step "Add Task" wizard.
#[derive(Debug, Default)]
pub struct AddState {
    pub description: String,
    pub priority: Option<Priority>,
    pub due: Option<DueDate>,
    pub category: Option<String>,
    pub step: usize, // 0: Description, 1: Priority, 2: Due, 3: Category, 4: Recurrence
}

pub struct App<'s, C: Clock + Clone> {
    pub session: &'s mut Session<C>,
    pub horizon: i64,
    /// Tasks currently shown, after sorting and filtering.
    pub rows: Vec<Task>,
    pub state: TableState,
    pub order: ListOrder,
    pub filter: Option<String>,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<u64>,
    pub add_state: AddState,
    pub popup: Option<Popup>,
    /// Feedback line shown under the table.
    pub message: Option<String>,
}

impl<'s, C: Clock + Clone> App<'s, C> {
    pub fn new(session: &'s mut Session<C>, horizon: i64) -> Self {
        let mut app = App {
            session,
            horizon,
            rows: Vec::new(),
            state: TableState::default(),
            order: ListOrder::Inserted,
            filter: None,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            popup: None,
            message: None,
        };
        app.reload();
        app
    }

    pub fn store(&self) -> Option<&TaskStore<C>> {
        self.session.store().ok()
    }

    /// Rebuilds the visible rows from the store, keeping the selection in range.
    pub fn reload(&mut self) {
        let Ok(store) = self.session.store() else {
            self.rows.clear();
            return;
        };
        let mut rows = match self.order {
            ListOrder::Inserted => store.tasks().to_vec(),
            ListOrder::DueDate => store.sorted_by_due_date(),
            ListOrder::Priority => store.sorted_by_priority(),
        };
        if let Some(text) = &self.filter {
            let ids: Vec<u64> = store
                .search(&SearchCriterion::Description(text.clone()))
                .into_iter()
                .map(|(_, t)| t.id)
                .collect();
            rows.retain(|t| ids.contains(&t.id));
        }
        self.rows = rows;

        match self.state.selected() {
            _ if self.rows.is_empty() => self.state.select(None),
            Some(i) if i >= self.rows.len() => self.state.select(Some(self.rows.len() - 1)),
            None => self.state.select(Some(0)),
            _ => {}
        }
    }

    /// Selects the next row, wrapping around.
    pub fn next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous row, wrapping around.
    pub fn previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn selected_task(&self) -> Option<&Task> {
        self.state.selected().and_then(|i| self.rows.get(i))
    }

    /// 1-based list number of the selected row.
    fn selected_number(&self) -> Option<usize> {
        let id = self.selected_task()?.id;
        self.store()?.position_of(id)
    }

    fn report<T>(&mut self, result: Result<T, SessionError>, ok: impl FnOnce(T) -> String) {
        self.message = Some(match result {
            Ok(value) => ok(value),
            Err(e) => format!("Error: {}", e),
        });
        self.reload();
    }

    pub fn complete_selected(&mut self) {
        let Some(n) = self.selected_number() else { return };
        let result = self
            .session
            .store_mut()
            .and_then(|s| s.mark_complete(n).map_err(SessionError::from));
        self.report(result, |done| match done.next {
            Some(next) => format!("Completed. Next occurrence due {}.", next.due_date),
            None => format!("Completed '{}'.", done.completed.description),
        });
    }

    pub fn delete_selected(&mut self) {
        let Some(n) = self.selected_number() else { return };
        let result = self
            .session
            .store_mut()
            .and_then(|s| s.delete(n).map_err(SessionError::from));
        self.report(result, |t| format!("Deleted '{}'.", t.description));
    }

    pub fn undo(&mut self) {
        let result = self
            .session
            .store_mut()
            .and_then(|s| s.undo().map_err(SessionError::from));
        self.report(result, |outcome| {
            if outcome.applied {
                format!("Task {} undone.", outcome.kind)
            } else {
                format!("Task {} could not be undone.", outcome.kind)
            }
        });
    }

    /// Cycles list order: as entered, by due date, by priority.
    pub fn cycle_order(&mut self) {
        self.order = match self.order {
            ListOrder::Inserted => ListOrder::DueDate,
            ListOrder::DueDate => ListOrder::Priority,
            ListOrder::Priority => ListOrder::Inserted,
        };
        self.reload();
    }

    pub fn toggle_popup(&mut self, popup: Popup) {
        self.popup = if self.popup == Some(popup) { None } else { Some(popup) };
    }

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Searching;
        self.input_buffer = self.filter.clone().unwrap_or_default();
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
        self.popup = None;
        self.reload();
    }

    /// Initiates the "Add Task" wizard.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    /// Initiates editing of a single field of the selected task.
    pub fn start_edit(&mut self, field: InputField) {
        let Some(t) = self.selected_task() else { return };
        let prefill = match field {
            InputField::Description => t.description.clone(),
            InputField::Priority => t.priority.code().to_string(),
            InputField::Due => t.due_date.to_string(),
            InputField::Category => t.category.clone(),
            InputField::None => String::new(),
        };
        let id = t.id;
        self.target_id = Some(id);
        self.input_field = field;
        self.input_buffer = prefill;
        self.input_mode = InputMode::Editing;
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    /// Handles Enter based on the current mode.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            InputMode::Searching => {
                let text = self.input_buffer.trim().to_string();
                self.filter = if text.is_empty() { None } else { Some(text) };
                self.cancel_input();
                self.reload();
            }
            InputMode::Normal => {}
        }
    }

    fn handle_adding_input(&mut self) {
        let input = self.input_buffer.trim().to_string();
        match self.add_state.step {
            0 => {
                if input.is_empty() {
                    self.message = Some("Description cannot be empty.".into());
                    return;
                }
                self.add_state.description = input;
            }
            1 => {
                let parsed = if input.is_empty() { Ok(Priority::Medium) } else { input.parse() };
                match parsed {
                    Ok(p) => self.add_state.priority = Some(p),
                    Err(e) => {
                        self.message = Some(e.to_string());
                        return;
                    }
                }
            }
            2 => match input.parse::<DueDate>() {
                Ok(d) => self.add_state.due = Some(d),
                Err(e) => {
                    self.message = Some(e.to_string());
                    return;
                }
            },
            3 => self.add_state.category = Some(input),
            _ => {
                let recurrence = if input.is_empty() {
                    None
                } else {
                    match input.parse::<Recurrence>() {
                        Ok(r) => Some(r),
                        Err(e) => {
                            self.message = Some(e.to_string());
                            return;
                        }
                    }
                };
                self.finish_add(recurrence);
                return;
            }
        }
        self.message = None;
        self.add_state.step += 1;
        self.input_buffer.clear();
    }

    fn finish_add(&mut self, recurrence: Option<Recurrence>) {
        let state = std::mem::take(&mut self.add_state);
        let (Some(priority), Some(due)) = (state.priority, state.due) else {
            self.cancel_input();
            return;
        };
        let new = NewTask {
            description: state.description,
            priority,
            due_date: due,
            category: state.category,
            recurrence,
        };
        let result = self
            .session
            .store_mut()
            .and_then(|s| s.add(new).map_err(SessionError::from));
        self.cancel_input();
        self.report(result, |t| format!("Task added (id = {}).", t.id));
    }

    fn handle_editing_input(&mut self) {
        let Some(id) = self.target_id else {
            self.cancel_input();
            return;
        };
        let input = self.input_buffer.clone();
        let edit = match self.input_field {
            InputField::Description => Ok(TaskEdit::Description(input)),
            InputField::Priority => input.parse().map(TaskEdit::Priority),
            InputField::Due => input.trim().parse().map(TaskEdit::DueDate),
            InputField::Category => Ok(TaskEdit::Category(input)),
            InputField::None => {
                self.cancel_input();
                return;
            }
        };
        let edit = match edit {
            Ok(edit) => edit,
            Err(e) => {
                // Stay in the prompt so the value can be corrected.
                self.message = Some(e.to_string());
                return;
            }
        };

        self.cancel_input();
        let Some(n) = self.store().and_then(|s| s.position_of(id)) else {
            self.message = Some("Task no longer exists.".into());
            return;
        };
        let result = self
            .session
            .store_mut()
            .and_then(|s| s.edit(n, edit).map_err(SessionError::from));
        self.report(result, |t| format!("Task '{}' updated.", t.description));
    }
}
