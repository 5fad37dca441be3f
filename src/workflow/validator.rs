// src/workflow/validator.rs
//
// Row checks, first failure wins:
//   1. objective, action and success indicator are selected
//   2. the objective is known
//   3. Excellent is filled in
//   4. populated tiers run best to worst: numbers strictly decrease,
//      dates strictly increase

use chrono::NaiveDate;

use crate::models::{Objective, SuccessIndicator, WeightType};

use super::error::{FieldError, RowField};
use super::row::{RowView, Tier};

/// A tier value read according to the row's weight type.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum TierValue {
    Number(f64),
    Date(NaiveDate),
}

impl TierValue {
    pub fn parse(weight_type: WeightType, raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        match weight_type {
            WeightType::Date => parse_day(raw).map(TierValue::Date),
            WeightType::Number | WeightType::Percentage => {
                let digits = raw.strip_suffix('%').unwrap_or(raw).trim();
                match digits.parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(TierValue::Number(n)),
                    _ => Err(format!("'{raw}' is not a number")),
                }
            }
        }
    }

    /// `later` is a worse tier than `self`.
    fn precedes(&self, later: &TierValue) -> bool {
        match (self, later) {
            (TierValue::Number(a), TierValue::Number(b)) => a > b,
            (TierValue::Date(a), TierValue::Date(b)) => a < b,
            _ => false,
        }
    }
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .map_err(|e| format!("invalid date '{}': {}", s, e))
}

/// Rule 1 only; needs no master data.
pub fn check_selection(row: &RowView<'_>) -> Result<(), FieldError> {
    if row.objective_code.is_none() {
        return Err(FieldError::new(RowField::Objective, "Please select an objective"));
    }
    if row.action_code.is_none() {
        return Err(FieldError::new(RowField::Action, "Please select an action"));
    }
    if row.success_indicator_code.is_none() {
        return Err(FieldError::new(
            RowField::SuccessIndicator,
            "Please select a success indicator",
        ));
    }
    Ok(())
}

/// Rules 3 and 4.
pub fn check_tiers(weight_type: WeightType, tiers: &crate::models::Tiers) -> Result<(), FieldError> {
    if Tier::Excellent.get(tiers).is_none() {
        return Err(FieldError::new(
            RowField::Tier(Tier::Excellent),
            "Excellent target is required",
        ));
    }

    let mut populated = Vec::with_capacity(Tier::ALL.len());
    for tier in Tier::ALL {
        if let Some(raw) = tier.get(tiers) {
            let value = TierValue::parse(weight_type, raw)
                .map_err(|e| FieldError::new(RowField::Tier(tier), format!("{}: {e}", tier.label())))?;
            populated.push((tier, raw, value));
        }
    }

    for pair in populated.windows(2) {
        let (earlier, earlier_raw, earlier_value) = &pair[0];
        let (later, later_raw, later_value) = &pair[1];
        if !earlier_value.precedes(later_value) {
            let relation = match weight_type {
                WeightType::Date => "after",
                WeightType::Number | WeightType::Percentage => "less than",
            };
            return Err(FieldError::new(
                RowField::Tier(*later),
                format!(
                    "{} ({}) must be {} {} ({})",
                    later.label(),
                    later_raw.trim(),
                    relation,
                    earlier.label(),
                    earlier_raw.trim()
                ),
            ));
        }
    }
    Ok(())
}

pub fn validate(row: &RowView<'_>, objectives: &[Objective]) -> Result<(), FieldError> {
    check_selection(row)?;

    let objective_code = row.objective_code.unwrap_or_default();
    if !objectives.iter().any(|o| o.objective_code == objective_code) {
        return Err(FieldError::new(
            RowField::Objective,
            format!("Objective {objective_code} is not available"),
        ));
    }

    check_tiers(row.weight_type, row.tiers)
}

/// A saved row carries its indicator's weight type and per-unit weight as
/// stored in master data; anything else is refused.
pub fn check_indicator_weight(
    weight_type: WeightType,
    weight_value: f64,
    indicator: &SuccessIndicator,
) -> Result<(), FieldError> {
    let expected = indicator.weight_type.parse::<WeightType>().map_err(|raw| {
        FieldError::new(
            RowField::SuccessIndicator,
            format!("Success indicator {} has unknown weight type '{raw}'", indicator.success_indicator_code),
        )
    })?;
    if weight_type != expected {
        return Err(FieldError::new(
            RowField::SuccessIndicator,
            format!(
                "Weight type {} does not match success indicator {} ({})",
                weight_type.as_str(),
                indicator.success_indicator_code,
                expected.as_str()
            ),
        ));
    }
    if (weight_value - indicator.weight_per_unit).abs() > 1e-9 {
        return Err(FieldError::new(
            RowField::SuccessIndicator,
            format!(
                "Weight {weight_value} does not match success indicator {} ({})",
                indicator.success_indicator_code, indicator.weight_per_unit
            ),
        ));
    }
    Ok(())
}
