use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Opt {
    pub id: i64,
    pub poll_id: i64,
    pub text: String,
    pub count: u64,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub poll_id: i64,
    pub text: String,
}

pub fn index(opts: &[Opt]) -> HashMap<i64, &Opt> {
    opts.iter().map(|o| (o.id, o)).collect()
}
