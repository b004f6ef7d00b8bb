use serde::Serialize;

use crate::domain::CategoryCount;

/// Ranks shown verbatim before the tail collapses into "Others".
pub const MAX_RANKED: usize = 20;

pub const OTHERS_CATEGORY: &str = "Others";

#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub category: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult {
    pub series: Vec<RankedEntry>,
    pub total: u64,
}

/// Derives the display series from raw category counts: percentage per
/// entry, stable descending order, top 20 verbatim, the remainder summed
/// into one "Others" entry. Truncation regroups counts, never drops them,
/// so `total` always equals the input sum.
pub fn aggregate(dataset: &[CategoryCount]) -> AggregationResult {
    let total: u64 = dataset.iter().map(|entry| entry.count).sum();

    let mut ranked: Vec<RankedEntry> = dataset
        .iter()
        .map(|entry| RankedEntry {
            category: entry.category.clone(),
            count: entry.count,
            percentage: percentage_of(entry.count, total),
        })
        .collect();
    // Stable sort: ties keep their original relative order, including the
    // all-zero-percentage case when total is 0.
    ranked.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

    let mut series: Vec<RankedEntry> = ranked;
    if series.len() > MAX_RANKED {
        let tail = series.split_off(MAX_RANKED);
        let tail_sum: u64 = tail.iter().map(|entry| entry.count).sum();
        series.push(RankedEntry {
            category: OTHERS_CATEGORY.to_string(),
            count: tail_sum,
            percentage: percentage_of(tail_sum, total),
        });
    }

    AggregationResult { series, total }
}

fn percentage_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}
