use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub phone: String,
    pub name: String,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: &str, phone: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            phone: phone.to_string(),
            name: name.to_string(),
            is_online: true,
            last_seen: None,
        }
    }

    /// Case-insensitive substring match on name, username and phone.
    /// `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.username.to_lowercase().contains(needle)
            || self.phone.to_lowercase().contains(needle)
    }

    pub fn set_presence(&mut self, is_online: bool, now: DateTime<Utc>) {
        self.is_online = is_online;
        self.last_seen = if is_online { None } else { Some(now) };
    }
}

/// How the directory treats an insert whose id, username or phone is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Last write wins: the old record with the same id is dropped.
    #[default]
    Replace,
    /// Inserts colliding on id, username or phone are refused.
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(DuplicatePolicy::Replace),
            "reject" => Ok(DuplicatePolicy::Reject),
            other => Err(AppError::Config(format!(
                "unknown duplicate user policy '{}', expected 'replace' or 'reject'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::Replace => write!(f, "replace"),
            DuplicatePolicy::Reject => write!(f, "reject"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_query_is_case_insensitive() {
        let user = User::new("alice_dev", "+71234567890", "Alice");
        assert!(user.matches_query("ali"));
        assert!(user.matches_query("_dev"));
        assert!(user.matches_query("4567"));
        assert!(!user.matches_query("bob"));
    }

    #[test]
    fn test_set_presence_tracks_last_seen() {
        let mut user = User::new("bob_designer", "+79990000000", "Bob");
        let now = Utc::now();

        user.set_presence(false, now);
        assert!(!user.is_online);
        assert_eq!(user.last_seen, Some(now));

        user.set_presence(true, now);
        assert!(user.is_online);
        assert_eq!(user.last_seen, None);
    }

    #[test]
    fn test_duplicate_policy_parse_and_display() {
        assert_eq!("replace".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Replace);
        assert_eq!(" Reject ".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Reject);
        assert!("merge".parse::<DuplicatePolicy>().is_err());
        assert_eq!(DuplicatePolicy::Reject.to_string(), "reject");
    }
}
