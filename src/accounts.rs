use std::collections::BTreeMap;

use thiserror::Error;

use crate::storage::UserRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("invalid username '{0}': use letters, digits, '-', '_' or '.'")]
    InvalidUsername(String),
    #[error("password cannot be empty or contain line breaks")]
    InvalidSecret,
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Known accounts, keyed by username.
///
/// Secrets are compared verbatim; nothing is hashed.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: BTreeMap<String, UserRecord>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<UserRecord>) -> Self {
        let users = records
            .into_iter()
            .map(|r| (r.username.clone(), r))
            .collect();
        UserDirectory { users }
    }

    pub fn records(&self) -> impl Iterator<Item = &UserRecord> {
        self.users.values()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn register(&mut self, username: &str, secret: &str) -> Result<(), AccountError> {
        validate_username(username)?;
        if secret.is_empty() || secret.contains(['\n', '\r']) {
            return Err(AccountError::InvalidSecret);
        }
        if self.contains(username) {
            return Err(AccountError::UsernameTaken(username.to_string()));
        }
        self.users.insert(
            username.to_string(),
            UserRecord {
                username: username.to_string(),
                secret: secret.to_string(),
            },
        );
        Ok(())
    }

    pub fn authenticate(&self, username: &str, secret: &str) -> Result<(), AccountError> {
        match self.users.get(username) {
            Some(user) if user.secret == secret => Ok(()),
            _ => Err(AccountError::InvalidCredentials),
        }
    }
}

/// Usernames become file names, so only a conservative character set is
/// accepted.
pub fn validate_username(username: &str) -> Result<(), AccountError> {
    let ok = !username.is_empty()
        && !username.starts_with('.')
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(AccountError::InvalidUsername(username.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_authenticate() {
        let mut dir = UserDirectory::new();
        dir.register("alice", "pw").unwrap();
        assert!(dir.authenticate("alice", "pw").is_ok());
        assert_eq!(dir.authenticate("alice", "nope"), Err(AccountError::InvalidCredentials));
        assert_eq!(dir.authenticate("bob", "pw"), Err(AccountError::InvalidCredentials));
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let mut dir = UserDirectory::new();
        dir.register("alice", "pw").unwrap();
        assert_eq!(
            dir.register("alice", "other"),
            Err(AccountError::UsernameTaken("alice".into()))
        );
    }

    #[test]
    fn usernames_must_be_file_safe() {
        assert!(validate_username("a.b-c_9").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("../etc").is_err());
        assert!(validate_username("a|b").is_err());
        assert!(validate_username(".hidden").is_err());
    }
}
