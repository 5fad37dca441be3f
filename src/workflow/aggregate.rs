// src/workflow/aggregate.rs

use std::collections::BTreeMap;

use super::row::{Scope, TargetRow};

/// Sum of `weight_value` over persisted rows of `objective_code` in `scope`;
/// `None` when there are none.
pub fn total_weight(rows: &[TargetRow], scope: &Scope, objective_code: &str) -> Option<f64> {
    let mut matched = rows
        .iter()
        .filter(|r| r.status.is_persisted() && &r.scope == scope)
        .filter(|r| r.objective_code.as_deref() == Some(objective_code))
        .peekable();
    matched.peek()?;
    Some(matched.map(|r| r.weight_value).sum())
}

/// Persisted totals for every objective that has rows in `scope`.
pub fn totals_by_objective(rows: &[TargetRow], scope: &Scope) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for row in rows.iter().filter(|r| r.status.is_persisted() && &r.scope == scope) {
        if let Some(code) = &row.objective_code {
            *totals.entry(code.clone()).or_insert(0.0) += row.weight_value;
        }
    }
    totals
}

pub fn format_weight(total: f64) -> String {
    format!("{total:.2}")
}
