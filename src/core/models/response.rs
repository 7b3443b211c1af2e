use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Submit {
    pub option_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Response {
    pub id: i64,
    pub poll_id: i64,
    pub selected: Vec<i64>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Response {
    pub fn selects(&self, option_id: i64) -> bool {
        self.selected.contains(&option_id)
    }
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub poll_id: i64,
    pub selected: Vec<i64>,
    pub submitted_at: DateTime<Utc>,
}
