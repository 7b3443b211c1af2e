use crate::core::models::option::Opt;
use crate::core::tally::TallyRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Poll {
    pub id: i64,
    pub public_id: String,
    pub question: String,
    pub max_selections: u32,
    pub created_at: Option<DateTime<Utc>>,
}

impl Poll {
    pub fn is_single_select(&self) -> bool {
        self.max_selections <= 1
    }
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub public_id: String,
    pub question: String,
    pub max_selections: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollCreate {
    pub question: String,
    #[serde(default = "default_max_selections")]
    pub max_selections: u32,
    pub options: Vec<String>,
}

fn default_max_selections() -> u32 {
    1
}

/// Addresses a poll either by its store row id or by the token in its share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollKey {
    Id(i64),
    Public(String),
}

impl PollKey {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(id) => PollKey::Id(id),
            Err(_) => PollKey::Public(raw.to_owned()),
        }
    }

    pub fn matches(&self, poll: &Poll) -> bool {
        match self {
            PollKey::Id(id) => poll.id == *id,
            PollKey::Public(public_id) => &poll.public_id == public_id,
        }
    }
}

impl fmt::Display for PollKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollKey::Id(id) => write!(f, "{}", id),
            PollKey::Public(public_id) => f.write_str(public_id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PollDetail {
    pub poll: Poll,
    pub options: Vec<Opt>,
    pub responses: usize,
    pub results: Vec<TallyRow>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_key() {
        assert_eq!(PollKey::parse("42"), PollKey::Id(42));
        assert_eq!(
            PollKey::parse(" 6f1c2a9e-3c4b-4a55-9d4e-0b8f6f2f1a10 "),
            PollKey::Public("6f1c2a9e-3c4b-4a55-9d4e-0b8f6f2f1a10".into())
        );
    }

    #[test]
    fn test_key_matches() {
        let poll = Poll {
            id: 7,
            public_id: "abc".into(),
            question: "Lunch?".into(),
            max_selections: 1,
            created_at: None,
        };
        assert!(PollKey::Id(7).matches(&poll));
        assert!(PollKey::Public("abc".into()).matches(&poll));
        assert!(!PollKey::Public("7".into()).matches(&poll));
        assert!(!PollKey::Id(8).matches(&poll));
    }
}
