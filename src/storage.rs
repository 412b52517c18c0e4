//! Flat-file persistence.
//!
//! Tasks are stored one per line as
//! `id|description|completed|priority|due|category|recurring|recurrence`,
//! in `<data_dir>/<username>_tasks.txt`. Accounts are stored as
//! `username|secret` lines in `<data_dir>/users.txt`. The next task id to
//! hand out is kept in `<data_dir>/next_id.txt` so ids are never reused
//! across runs.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::dates::DueDate;
use crate::models::{Priority, Recurrence, Task};

const USERS_FILE: &str = "users.txt";
const NEXT_ID_FILE: &str = "next_id.txt";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Why a stored line could not be turned into a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected at least {expected} fields, found {found}")]
    MissingFields { expected: usize, found: usize },
    #[error("bad {field} value '{value}'")]
    BadField { field: &'static str, value: String },
}

fn bad(field: &'static str, value: &str) -> RecordError {
    RecordError::BadField {
        field,
        value: value.to_string(),
    }
}

/// Formats a task as a record line (without the trailing newline).
pub fn encode_task(task: &Task) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}|{}|{}",
        task.id,
        task.description,
        u8::from(task.completed),
        task.priority.code(),
        task.due_date,
        task.category,
        u8::from(task.is_recurring()),
        task.recurrence.map(Recurrence::as_str).unwrap_or_default(),
    )
}

/// Parses a task record. The first six fields are required; a missing
/// recurring flag or type means the task does not repeat.
pub fn decode_task(line: &str) -> Result<Task, RecordError> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < 6 {
        return Err(RecordError::MissingFields {
            expected: 6,
            found: fields.len(),
        });
    }

    let id = fields[0].trim().parse::<u64>().map_err(|_| bad("id", fields[0]))?;
    // Anything but "1" reads as not completed.
    let completed = fields[2] == "1";
    let priority = fields[3]
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(Priority::from_code)
        .ok_or_else(|| bad("priority", fields[3]))?;
    let due_date = fields[4].parse::<DueDate>().map_err(|_| bad("due date", fields[4]))?;

    let recurrence = match (fields.get(6).copied(), fields.get(7).copied()) {
        (Some("1"), Some(kind)) => {
            Some(kind.parse::<Recurrence>().map_err(|_| bad("recurrence", kind))?)
        }
        _ => None,
    };

    Ok(Task {
        id,
        description: fields[1].to_string(),
        completed,
        priority,
        due_date,
        category: fields[5].to_string(),
        recurrence,
    })
}

/// An account record as stored in `users.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub secret: String,
}

pub fn encode_user(user: &UserRecord) -> String {
    format!("{}|{}", user.username, user.secret)
}

pub fn decode_user(line: &str) -> Result<UserRecord, RecordError> {
    let mut parts = line.splitn(2, '|');
    let username = parts.next().unwrap_or_default();
    let secret = parts.next().ok_or(RecordError::MissingFields {
        expected: 2,
        found: 1,
    })?;
    if username.is_empty() {
        return Err(bad("username", username));
    }
    Ok(UserRecord {
        username: username.to_string(),
        secret: secret.to_string(),
    })
}

/// Reads and writes record files under one data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn users_path(&self) -> PathBuf {
        self.dir.join(USERS_FILE)
    }

    pub fn tasks_path(&self, username: &str) -> PathBuf {
        self.dir.join(format!("{}_tasks.txt", username))
    }

    /// Loads a user's tasks. A missing file is an empty list; unreadable
    /// lines are skipped with a warning.
    pub fn load_tasks(&self, username: &str) -> Result<Vec<Task>, StorageError> {
        let path = self.tasks_path(username);
        let tasks = read_records(&path, decode_task)?;
        info!(user = username, count = tasks.len(), "tasks loaded");
        Ok(tasks)
    }

    /// Overwrites the user's task file with `tasks`.
    pub fn save_tasks(&self, username: &str, tasks: &[Task]) -> Result<(), StorageError> {
        let path = self.tasks_path(username);
        write_records(&path, tasks.iter().map(encode_task))?;
        info!(user = username, count = tasks.len(), "tasks saved");
        Ok(())
    }

    pub fn next_id_path(&self) -> PathBuf {
        self.dir.join(NEXT_ID_FILE)
    }

    /// Reads the stored id counter. A missing or unreadable counter is
    /// `None`; callers fall back to scanning the task files.
    pub fn load_next_id(&self) -> Result<Option<u64>, StorageError> {
        let path = self.next_id_path();
        let content = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Read { path, source }),
        };
        match content.trim().parse::<u64>() {
            Ok(n) => Ok(Some(n)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring bad id counter");
                Ok(None)
            }
        }
    }

    pub fn save_next_id(&self, next_id: u64) -> Result<(), StorageError> {
        write_records(&self.next_id_path(), std::iter::once(next_id.to_string()))
    }

    pub fn load_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        read_records(&self.users_path(), decode_user)
    }

    pub fn save_users<'a>(
        &self,
        users: impl IntoIterator<Item = &'a UserRecord>,
    ) -> Result<(), StorageError> {
        write_records(&self.users_path(), users.into_iter().map(encode_user))
    }
}

fn read_records<T>(
    path: &Path,
    decode: impl Fn(&str) -> Result<T, RecordError>,
) -> Result<Vec<T>, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut records = Vec::new();
    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match decode(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(path = %path.display(), line = n + 1, error = %e, "skipping record"),
        }
    }
    Ok(records)
}

fn write_records(path: &Path, lines: impl Iterator<Item = String>) -> Result<(), StorageError> {
    let write_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut content = String::new();
    for line in lines {
        content.push_str(&line);
        content.push('\n');
    }
    fs::write(path, content).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task {
            id: 4,
            description: "Pay rent".into(),
            completed: true,
            priority: Priority::High,
            due_date: "2024-07-01".parse().unwrap(),
            category: "Bills".into(),
            recurrence: Some(Recurrence::Monthly),
        }
    }

    #[test]
    fn encodes_all_eight_fields() {
        assert_eq!(encode_task(&sample()), "4|Pay rent|1|1|2024-07-01|Bills|1|monthly");

        let mut plain = sample();
        plain.recurrence = None;
        plain.completed = false;
        assert_eq!(encode_task(&plain), "4|Pay rent|0|1|2024-07-01|Bills|0|");
    }

    #[test]
    fn decodes_six_field_records_as_non_recurring() {
        let task = decode_task("9|Call mom|0|2|2024-05-05|Family").unwrap();
        assert_eq!(task.id, 9);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.recurrence, None);
        assert!(!task.completed);
    }

    #[test]
    fn decodes_what_it_encodes() {
        assert_eq!(decode_task(&encode_task(&sample())).unwrap(), sample());
    }

    #[test]
    fn recurring_flag_zero_ignores_type() {
        let task = decode_task("1|x|0|3|2024-01-01|General|0|daily").unwrap();
        assert_eq!(task.recurrence, None);
    }

    #[test]
    fn unknown_completed_flag_reads_as_pending() {
        let task = decode_task("3|x|yes|2|2024-01-01|General").unwrap();
        assert!(!task.completed);
        assert_eq!(task.id, 3);
    }

    #[test]
    fn id_counter_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileStore::new(dir.path());
        assert_eq!(files.load_next_id().unwrap(), None);
        files.save_next_id(42).unwrap();
        assert_eq!(files.load_next_id().unwrap(), Some(42));
        fs::write(files.next_id_path(), "garbage\n").unwrap();
        assert_eq!(files.load_next_id().unwrap(), None);
    }

    #[test]
    fn rejects_malformed_records() {
        assert!(matches!(
            decode_task("1|x|0|3|2024-01-01"),
            Err(RecordError::MissingFields { found: 5, .. })
        ));
        assert!(decode_task("1|x|0|7|2024-01-01|General").is_err());
        assert!(decode_task("1|x|0|1|2024-02-30|General").is_err());
        assert!(decode_task("one|x|0|1|2024-01-01|General").is_err());
        assert!(decode_task("1|x|0|1|2024-01-01|General|1|yearly").is_err());
    }

    #[test]
    fn user_records() {
        let user = decode_user("alice|s3cret|with|pipes").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.secret, "s3cret|with|pipes");
        assert_eq!(encode_user(&user), "alice|s3cret|with|pipes");
        assert!(decode_user("nobody").is_err());
    }
}
