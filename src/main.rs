//! # Todoust
//!
//! A terminal to-do list with per-user task lists. Tasks carry a priority,
//! a due date, a category and an optional daily/weekly/monthly recurrence.
//!
//! ## Usage
//!
//! ```bash
//! todoust register alice --password secret
//! export TODOUST_USER=alice TODOUST_PASSWORD=secret
//!
//! todoust add "Buy milk" --priority high --due 2025-12-01 --category Errands
//! todoust add "Standup" --due 2025-12-01 --recur daily
//! todoust list --sort due
//! todoust edit 1 --category Home
//! todoust complete 2
//! todoust search --text milk
//! todoust stats
//! todoust reminders
//!
//! # Interactive view with undo
//! todoust ui
//! ```
//!
//! ## Data Storage
//!
//! Accounts live in `users.txt` and each user's tasks in
//! `<username>_tasks.txt` inside the data directory
//! (`~/.local/share/todoust` on Linux). Override it with `--data-dir` or
//! `TODOUST_DATA`.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};

use todoust::commands::*;
use todoust::config::{self, Config};
use todoust::dates::{DueDate, SystemClock};
use todoust::logging;
use todoust::models::{NewTask, Priority, Recurrence, TaskEdit};
use todoust::session::Session;
use todoust::storage::FileStore;
use todoust::store::{SearchCriterion, StatusFilter};
use todoust::tui::run_tui;

#[derive(Parser)]
#[command(name = "todoust", version)]
#[command(about = "Terminal to-do list with undo, reminders and recurring tasks", long_about = None)]
struct Cli {
    /// Account to use
    #[arg(long, global = true, env = config::USER_ENV)]
    user: Option<String>,
    /// Account password
    #[arg(long, global = true, env = config::PASSWORD_ENV, hide_env_values = true)]
    password: Option<String>,
    /// Directory holding users.txt and the task files
    #[arg(long, global = true, env = config::DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,
    /// Days ahead that count as "due soon"
    #[arg(
        long,
        global = true,
        env = config::DUE_SOON_ENV,
        value_parser = clap::value_parser!(i64).range(0..=config::MAX_DUE_SOON_DAYS)
    )]
    due_soon_days: Option<i64>,
    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, global = true, env = config::LOG_ENV)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        username: String,
    },
    /// Add a new task
    Add {
        /// Task description (quoted if it has spaces)
        description: String,
        /// Priority: 1/high, 2/medium, 3/low
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        /// Due date in YYYY-MM-DD
        #[arg(short, long)]
        due: DueDate,
        /// Category (defaults to General)
        #[arg(short, long)]
        category: Option<String>,
        /// Recurrence (daily, weekly, monthly)
        #[arg(short, long)]
        recur: Option<Recurrence>,
    },
    /// List tasks
    List {
        /// Order of the listing
        #[arg(short, long, value_enum, default_value_t = SortArg::Entered)]
        sort: SortArg,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Change one field of a task
    Edit {
        /// Task number as shown by `list`
        index: usize,
        #[command(flatten)]
        change: EditArgs,
    },
    /// Delete a task
    Remove {
        index: usize,
    },
    /// Mark a task as complete
    Complete {
        index: usize,
    },
    /// Search tasks by one criterion
    Search(SearchArgs),
    /// Show task statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Show overdue tasks and tasks due soon
    Reminders,
    /// Open interactive TUI
    Ui,
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct EditArgs {
    /// New description
    #[arg(short, long)]
    description: Option<String>,
    /// New priority
    #[arg(short, long)]
    priority: Option<Priority>,
    /// New due date
    #[arg(long)]
    due: Option<DueDate>,
    /// New category
    #[arg(short, long)]
    category: Option<String>,
}

impl EditArgs {
    fn into_edit(self) -> Option<TaskEdit> {
        if let Some(d) = self.description {
            Some(TaskEdit::Description(d))
        } else if let Some(p) = self.priority {
            Some(TaskEdit::Priority(p))
        } else if let Some(d) = self.due {
            Some(TaskEdit::DueDate(d))
        } else {
            self.category.map(TaskEdit::Category)
        }
    }
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SearchArgs {
    /// Text contained in the description (case-insensitive)
    #[arg(short, long)]
    text: Option<String>,
    /// Exact category
    #[arg(short, long)]
    category: Option<String>,
    /// Priority
    #[arg(short, long)]
    priority: Option<Priority>,
    /// Status
    #[arg(short, long, value_enum)]
    status: Option<StatusArg>,
}

impl SearchArgs {
    fn into_criterion(self) -> Option<SearchCriterion> {
        if let Some(t) = self.text {
            Some(SearchCriterion::Description(t))
        } else if let Some(c) = self.category {
            Some(SearchCriterion::Category(c))
        } else if let Some(p) = self.priority {
            Some(SearchCriterion::Priority(p))
        } else {
            self.status.map(|s| SearchCriterion::Status(s.into()))
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Entered,
    Due,
    Priority,
}

impl From<SortArg> for ListOrder {
    fn from(s: SortArg) -> Self {
        match s {
            SortArg::Entered => ListOrder::Inserted,
            SortArg::Due => ListOrder::DueDate,
            SortArg::Priority => ListOrder::Priority,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Completed,
    Pending,
    Overdue,
}

impl From<StatusArg> for StatusFilter {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::Completed => StatusFilter::Completed,
            StatusArg::Pending => StatusFilter::Pending,
            StatusArg::Overdue => StatusFilter::Overdue,
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Ui);
    let cfg = Config::resolve(cli.data_dir, cli.due_soon_days, cli.log_level);

    if let Commands::Completions { shell } = command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "todoust", &mut io::stdout());
        return Ok(());
    }

    // The UI owns the terminal, so its logs go to a file.
    let _guard = match command {
        Commands::Ui => logging::init_file(&cfg.log_level, &cfg.data_dir),
        _ => {
            logging::init_stderr(&cfg.log_level);
            None
        }
    };

    let mut session = Session::open(FileStore::new(&cfg.data_dir), SystemClock)
        .context("failed to open the data directory")?;

    let Some(password) = cli.password else {
        bail!("a password is required (--password or {})", config::PASSWORD_ENV);
    };

    if let Commands::Register { username } = &command {
        return cmd_register(&mut session, username, &password);
    }

    let Some(user) = cli.user else {
        bail!("no user given (--user or {})", config::USER_ENV);
    };
    session.login(&user, &password).context("login failed")?;

    let result = dispatch(&mut session, command, &cfg);
    // Always write the list back, even if the command failed.
    session.logout().context("failed to save tasks")?;
    result
}

fn dispatch(session: &mut Session<SystemClock>, command: Commands, cfg: &Config) -> Result<()> {
    let horizon = cfg.due_soon_days;
    match command {
        Commands::Add { description, priority, due, category, recur } => {
            let new = NewTask {
                description,
                priority,
                due_date: due,
                category,
                recurrence: recur,
            };
            cmd_add(session, new)
        }
        Commands::List { sort, json } => cmd_list(session, sort.into(), json, horizon),
        Commands::Edit { index, change } => match change.into_edit() {
            Some(edit) => cmd_edit(session, index, edit),
            None => bail!("nothing to edit"),
        },
        Commands::Remove { index } => cmd_remove(session, index),
        Commands::Complete { index } => cmd_complete(session, index),
        Commands::Search(args) => match args.into_criterion() {
            Some(criterion) => cmd_search(session, &criterion, horizon),
            None => bail!("no search criterion given"),
        },
        Commands::Stats { json } => cmd_stats(session, json),
        Commands::Reminders => cmd_reminders(session, horizon),
        Commands::Ui => {
            if let Err(e) = run_tui(session, horizon) {
                eprintln!("Error running TUI: {}", e);
            }
            Ok(())
        }
        Commands::Register { .. } | Commands::Completions { .. } => Ok(()),
    }
}
