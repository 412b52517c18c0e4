use std::path::PathBuf;

use crate::dates::DEFAULT_DUE_SOON_DAYS;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TODOUST_DATA";
pub const USER_ENV: &str = "TODOUST_USER";
pub const PASSWORD_ENV: &str = "TODOUST_PASSWORD";
pub const DUE_SOON_ENV: &str = "TODOUST_DUE_SOON_DAYS";
pub const LOG_ENV: &str = "TODOUST_LOG";

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Upper bound for the due-soon window, about ten years.
pub const MAX_DUE_SOON_DAYS: i64 = 3650;

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    /// Look-ahead window for "due soon" reminders.
    pub due_soon_days: i64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Fills unset values with defaults. Flags and environment variables are
    /// already merged by clap before this point.
    pub fn resolve(data_dir: Option<PathBuf>, due_soon_days: Option<i64>, log_level: Option<String>) -> Self {
        let defaults = Config::default();
        Config {
            data_dir: data_dir.unwrap_or(defaults.data_dir),
            due_soon_days: due_soon_days.map_or(defaults.due_soon_days, |d| d.clamp(0, MAX_DUE_SOON_DAYS)),
            log_level: log_level.unwrap_or(defaults.log_level),
        }
    }
}

/// `~/.local/share/todoust` on Linux (the platform data dir elsewhere),
/// or the current directory if none is known.
pub fn default_data_dir() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("todoust");
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_win() {
        let cfg = Config::resolve(Some(PathBuf::from("/tmp/x")), Some(5), Some("debug".into()));
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/x"));
        assert_eq!(cfg.due_soon_days, 5);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn defaults_fill_gaps() {
        let cfg = Config::resolve(None, Some(-2), None);
        assert_eq!(cfg.due_soon_days, 0);
        assert_eq!(cfg.log_level, DEFAULT_LOG_LEVEL);
        assert!(cfg.data_dir.ends_with("todoust"));
    }

    #[test]
    fn due_soon_window_is_capped() {
        let cfg = Config::resolve(None, Some(100_000_000), None);
        assert_eq!(cfg.due_soon_days, MAX_DUE_SOON_DAYS);
    }
}
