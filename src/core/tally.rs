use crate::core::models::option::Opt;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TallyRow {
    pub option_id: i64,
    pub option: String,
    pub votes: u64,
    pub percentage: f64,
    pub label: String,
}

pub fn tally(opts: &[Opt]) -> Vec<TallyRow> {
    let total: u64 = opts.iter().map(|o| o.count).sum();
    opts.iter()
        .map(|o| {
            let percentage = if total > 0 { o.count as f64 / total as f64 * 100.0 } else { 0.0 };
            TallyRow {
                option_id: o.id,
                option: o.text.clone(),
                votes: o.count,
                percentage,
                label: format!("{:.1}%", percentage),
            }
        })
        .collect()
}
