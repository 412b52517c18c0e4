use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use todoust::commands::*;
use todoust::dates::FixedClock;
use todoust::models::{NewTask, Priority, Recurrence, TaskEdit};
use todoust::session::{Session, SessionError};
use todoust::storage::FileStore;
use todoust::store::{SearchCriterion, StatusFilter};

fn clock() -> FixedClock {
    FixedClock::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
}

fn with_test_session<F>(f: F)
where
    F: FnOnce(&Path, &mut Session<FixedClock>),
{
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(FileStore::new(dir.path()), clock()).unwrap();
    session.register("alice", "pw").unwrap();
    session.login("alice", "pw").unwrap();
    f(dir.path(), &mut session);
}

fn new_task(desc: &str, date: &str) -> NewTask {
    NewTask::new(desc, Priority::Medium, date.parse().unwrap())
}

#[test]
fn test_add_and_list() {
    with_test_session(|_dir, session| {
        cmd_add(session, new_task("Test Task", "2025-12-01").category("Project")).unwrap();

        let tasks = session.store().unwrap().tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "Test Task");
        assert_eq!(tasks[0].category, "Project");

        cmd_list(session, ListOrder::DueDate, false, 3).unwrap();
        cmd_list(session, ListOrder::Priority, true, 3).unwrap();
    });
}

#[test]
fn test_complete_recurring_task() {
    with_test_session(|_dir, session| {
        cmd_add(session, new_task("Recurring Task", "2024-01-10").recurring(Recurrence::Weekly)).unwrap();
        cmd_complete(session, 1).unwrap();

        let tasks = session.store().unwrap().tasks();
        assert_eq!(tasks.len(), 2);
        let completed = tasks.iter().find(|t| t.completed).unwrap();
        let new_task = tasks.iter().find(|t| !t.completed).unwrap();
        assert_eq!(completed.description, new_task.description);
        assert_ne!(completed.id, new_task.id);
        assert_eq!(new_task.due_date.to_string(), "2024-06-08");
    });
}

#[test]
fn test_edit_remove_and_errors() {
    with_test_session(|_dir, session| {
        cmd_add(session, new_task("Draft", "2024-06-20")).unwrap();
        cmd_edit(session, 1, TaskEdit::Priority(Priority::High)).unwrap();
        assert_eq!(session.store().unwrap().tasks()[0].priority, Priority::High);

        assert!(cmd_edit(session, 2, TaskEdit::Category("x".into())).is_err());
        assert!(cmd_complete(session, 9).is_err());

        cmd_remove(session, 1).unwrap();
        assert!(session.store().unwrap().is_empty());
        assert!(cmd_remove(session, 1).is_err());
    });
}

#[test]
fn test_search_stats_and_reminders_run() {
    with_test_session(|_dir, session| {
        cmd_add(session, new_task("buy milk", "2024-05-01")).unwrap();
        cmd_add(session, new_task("pay rent", "2024-06-02")).unwrap();
        cmd_search(session, &SearchCriterion::Description("BUY".into()), 3).unwrap();
        cmd_search(session, &SearchCriterion::Status(StatusFilter::Completed), 3).unwrap();
        cmd_stats(session, false).unwrap();
        cmd_stats(session, true).unwrap();
        cmd_reminders(session, 3).unwrap();
    });
}

#[test]
fn test_logout_persists_records() {
    with_test_session(|dir, session| {
        cmd_add(session, new_task("Pay rent", "2024-07-01").category("Bills").recurring(Recurrence::Monthly)).unwrap();
        cmd_add(session, new_task("Call mom", "2024-06-05")).unwrap();
        cmd_complete(session, 2).unwrap();
        session.logout().unwrap();

        let content = fs::read_to_string(dir.join("alice_tasks.txt")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "1|Pay rent|0|2|2024-07-01|Bills|1|monthly",
                "2|Call mom|1|2|2024-06-05|General|0|",
            ]
        );
        let users = fs::read_to_string(dir.join("users.txt")).unwrap();
        assert_eq!(users, "alice|pw\n");
    });
}

#[test]
fn test_login_reloads_tasks_with_empty_history() {
    with_test_session(|dir, session| {
        cmd_add(session, new_task("Persisted", "2024-06-10")).unwrap();
        session.logout().unwrap();
        assert!(!session.is_logged_in());
        assert!(matches!(session.store(), Err(SessionError::NotLoggedIn)));

        let mut reopened = Session::open(FileStore::new(dir), clock()).unwrap();
        reopened.login("alice", "pw").unwrap();
        let store = reopened.store().unwrap();
        assert_eq!(store.tasks()[0].description, "Persisted");
        assert_eq!(store.tasks()[0].id, 1);
        assert!(store.history().is_empty());
        assert!(reopened.store_mut().unwrap().undo().is_err());
    });
}

#[test]
fn test_switching_users_never_mixes_state() {
    with_test_session(|_dir, session| {
        cmd_add(session, new_task("Alice's task", "2024-06-10")).unwrap();
        session.register("bob", "hunter2").unwrap();
        session.login("bob", "hunter2").unwrap();

        assert_eq!(session.current_user(), Some("bob"));
        let store = session.store().unwrap();
        assert!(store.is_empty());
        assert!(store.history().is_empty());

        // Ids keep increasing across users within one session.
        let bob_task = session.store_mut().unwrap().add(new_task("Bob's task", "2024-06-10")).unwrap();
        assert_eq!(bob_task.id, 2);

        session.login("alice", "pw").unwrap();
        let tasks = session.store().unwrap().tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "Alice's task");
    });
}

#[test]
fn test_ids_stay_unique_across_restarts() {
    with_test_session(|dir, session| {
        cmd_add(session, new_task("Alice's task", "2024-06-10")).unwrap();
        session.register("bob", "hunter2").unwrap();
        session.logout().unwrap();
        assert_eq!(fs::read_to_string(dir.join("next_id.txt")).unwrap(), "2\n");

        let mut reopened = Session::open(FileStore::new(dir), clock()).unwrap();
        reopened.login("bob", "hunter2").unwrap();
        let bob_task = reopened.store_mut().unwrap().add(new_task("Bob's task", "2024-06-10")).unwrap();
        assert_eq!(bob_task.id, 2);
    });
}

#[test]
fn test_deleted_ids_are_not_reused_after_restart() {
    with_test_session(|dir, session| {
        cmd_add(session, new_task("a", "2024-06-10")).unwrap();
        cmd_add(session, new_task("b", "2024-06-10")).unwrap();
        cmd_remove(session, 2).unwrap();
        session.logout().unwrap();

        let mut reopened = Session::open(FileStore::new(dir), clock()).unwrap();
        assert_eq!(reopened.next_id(), 3);
        reopened.login("alice", "pw").unwrap();
        let c = reopened.store_mut().unwrap().add(new_task("c", "2024-06-10")).unwrap();
        assert_eq!(c.id, 3);
    });
}

#[test]
fn test_missing_counter_falls_back_to_task_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("users.txt"), "carol|pw\ndave|pw\n").unwrap();
    fs::write(dir.path().join("carol_tasks.txt"), "7|Old|0|1|2024-06-10|General\n").unwrap();

    let mut session = Session::open(FileStore::new(dir.path()), clock()).unwrap();
    assert_eq!(session.next_id(), 8);
    session.login("dave", "pw").unwrap();
    let task = session.store_mut().unwrap().add(new_task("New", "2024-06-10")).unwrap();
    assert_eq!(task.id, 8);

    session.flush().unwrap();
    assert!(session.is_logged_in());
    assert_eq!(fs::read_to_string(dir.path().join("next_id.txt")).unwrap(), "9\n");
    assert_eq!(
        fs::read_to_string(dir.path().join("dave_tasks.txt")).unwrap(),
        "8|New|0|2|2024-06-10|General|0|\n"
    );
}

#[test]
fn test_register_and_login_failures() {
    with_test_session(|_dir, session| {
        assert!(matches!(session.register("alice", "again"), Err(SessionError::Account(_))));
        assert!(matches!(session.register("../evil", "pw"), Err(SessionError::Account(_))));
        assert!(matches!(session.login("alice", "wrong"), Err(SessionError::Account(_))));
        // A failed login still logged the previous user out.
        assert!(!session.is_logged_in());
        assert!(cmd_add(session, new_task("Nobody", "2024-06-10")).is_err());
    });
}

#[test]
fn test_malformed_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("users.txt"), "carol|pw\n").unwrap();
    fs::write(
        dir.path().join("carol_tasks.txt"),
        "3|Good|0|1|2024-06-10|General\nbroken line\n4|Bad prio|0|9|2024-06-10|General\n",
    )
    .unwrap();

    let mut session = Session::open(FileStore::new(dir.path()), clock()).unwrap();
    session.login("carol", "pw").unwrap();
    let store = session.store().unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.tasks()[0].id, 3);
    assert_eq!(store.next_id(), 4);
}
