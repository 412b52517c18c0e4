//! Login state: which user's tasks are loaded.
//!
//! Only one user is active at a time. Switching users always writes the
//! current list to disk and drops it, history included, before the next
//! user's tasks are read.

use thiserror::Error;
use tracing::info;

use crate::accounts::{AccountError, UserDirectory};
use crate::dates::{Clock, SystemClock};
use crate::error::TaskError;
use crate::storage::{FileStore, StorageError};
use crate::store::TaskStore;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Task(#[from] TaskError),
}

#[derive(Debug)]
struct ActiveUser<C> {
    username: String,
    store: TaskStore<C>,
}

#[derive(Debug)]
pub struct Session<C = SystemClock> {
    files: FileStore,
    users: UserDirectory,
    clock: C,
    /// Shared by every user and persisted on logout, so ids are never
    /// handed out twice.
    next_id: u64,
    active: Option<ActiveUser<C>>,
}

impl<C: Clock + Clone> Session<C> {
    /// Reads the account list and the id counter from `files`. The counter
    /// is also moved past every id found in the users' task files.
    pub fn open(files: FileStore, clock: C) -> Result<Self, SessionError> {
        let users = UserDirectory::from_records(files.load_users()?);
        let mut next_id = files.load_next_id()?.unwrap_or(1).max(1);
        for user in users.records() {
            let highest = files.load_tasks(&user.username)?.iter().map(|t| t.id).max();
            if let Some(id) = highest {
                next_id = next_id.max(id.saturating_add(1));
            }
        }
        info!(dir = %files.dir().display(), users = users.len(), next_id, "session opened");
        Ok(Session {
            files,
            users,
            clock,
            next_id,
            active: None,
        })
    }

    /// The id the next new task will get.
    pub fn next_id(&self) -> u64 {
        match &self.active {
            Some(active) => self.next_id.max(active.store.next_id()),
            None => self.next_id,
        }
    }

    /// Creates an account and writes the account list immediately.
    pub fn register(&mut self, username: &str, secret: &str) -> Result<(), SessionError> {
        self.users.register(username, secret)?;
        self.files.save_users(self.users.records())?;
        info!(user = username, "user registered");
        Ok(())
    }

    /// Logs out any active user, then loads `username`'s tasks.
    pub fn login(&mut self, username: &str, secret: &str) -> Result<(), SessionError> {
        self.logout()?;
        self.users.authenticate(username, secret)?;

        let tasks = self.files.load_tasks(username)?;
        let store = TaskStore::from_tasks(self.clock.clone(), tasks, self.next_id);
        self.active = Some(ActiveUser {
            username: username.to_string(),
            store,
        });
        info!(user = username, "logged in");
        Ok(())
    }

    /// Writes the active user's tasks and the id counter without logging
    /// out.
    pub fn flush(&mut self) -> Result<(), SessionError> {
        self.next_id = self.next_id();
        if let Some(active) = &self.active {
            self.files.save_tasks(&active.username, active.store.tasks())?;
        }
        self.files.save_next_id(self.next_id)?;
        Ok(())
    }

    /// Persists and clears the active user's tasks and history. Does
    /// nothing when nobody is logged in.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        if self.active.is_none() {
            return Ok(());
        }
        self.flush()?;
        if let Some(active) = self.active.take() {
            info!(user = %active.username, "logged out");
        }
        Ok(())
    }

    pub fn current_user(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.username.as_str())
    }

    pub fn is_logged_in(&self) -> bool {
        self.active.is_some()
    }

    pub fn store(&self) -> Result<&TaskStore<C>, SessionError> {
        self.active
            .as_ref()
            .map(|a| &a.store)
            .ok_or(SessionError::NotLoggedIn)
    }

    pub fn store_mut(&mut self) -> Result<&mut TaskStore<C>, SessionError> {
        self.active
            .as_mut()
            .map(|a| &mut a.store)
            .ok_or(SessionError::NotLoggedIn)
    }
}
