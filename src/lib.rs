//! Task tracking for per-user task lists with priorities, due dates,
//! categories, recurrence and a bounded undo history.
//!
//! The core is [`store::TaskStore`]; [`session::Session`] decides which
//! user's list is loaded and writes it back on logout.

pub mod accounts;
pub mod commands;
pub mod config;
pub mod dates;
pub mod error;
pub mod history;
pub mod logging;
pub mod models;
pub mod recurrence;
pub mod session;
pub mod storage;
pub mod store;
pub mod tui;

pub use error::TaskError;
