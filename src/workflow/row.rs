// src/workflow/row.rs

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{SaveTargetBody, TargetKey, TargetRecord, Tiers, WeightType};

use super::error::{FieldError, Result, RowField, WorkflowError};
use super::status::TargetStatus;
use super::validator::check_selection;

// ───────────────────────────────────────
// Tiers
// ───────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl Tier {
    /// Best to worst.
    pub const ALL: [Tier; 5] = [Tier::Excellent, Tier::VeryGood, Tier::Good, Tier::Fair, Tier::Poor];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Excellent => "Excellent",
            Tier::VeryGood => "Very Good",
            Tier::Good => "Good",
            Tier::Fair => "Fair",
            Tier::Poor => "Poor",
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            Tier::Excellent => "excellent",
            Tier::VeryGood => "veryGood",
            Tier::Good => "good",
            Tier::Fair => "fair",
            Tier::Poor => "poor",
        }
    }

    pub fn get(self, tiers: &Tiers) -> Option<&str> {
        let slot = match self {
            Tier::Excellent => &tiers.excellent,
            Tier::VeryGood => &tiers.very_good,
            Tier::Good => &tiers.good,
            Tier::Fair => &tiers.fair,
            Tier::Poor => &tiers.poor,
        };
        slot.as_deref().filter(|v| !is_blank(v))
    }

    pub fn set(self, tiers: &mut Tiers, value: Option<String>) {
        let slot = match self {
            Tier::Excellent => &mut tiers.excellent,
            Tier::VeryGood => &mut tiers.very_good,
            Tier::Good => &mut tiers.good,
            Tier::Fair => &mut tiers.fair,
            Tier::Poor => &mut tiers.poor,
        };
        *slot = value;
    }
}

/// The single emptiness test for every tier: `"0"` is present, `""` is not.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

// ───────────────────────────────────────
// Scope & identity
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub financial_year: String,
    pub centre_code: String,
}

impl Scope {
    pub fn new(financial_year: impl Into<String>, centre_code: impl Into<String>) -> Self {
        Self { financial_year: financial_year.into(), centre_code: centre_code.into() }
    }

    /// Fails with a field-scoped error when the centre or year is missing.
    pub fn require_complete(&self) -> Result<()> {
        if is_blank(&self.centre_code) {
            return Err(WorkflowError::no_centre());
        }
        if is_blank(&self.financial_year) {
            return Err(WorkflowError::Scope(FieldError::new(
                RowField::FinancialYear,
                "Please select a financial year",
            )));
        }
        Ok(())
    }
}

/// In-memory handle of a row; stable across edits, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(Uuid);

impl RowId {
    pub fn new() -> Self {
        RowId(Uuid::new_v4())
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ───────────────────────────────────────
// Target row
// ───────────────────────────────────────

/// Field values captured when a saved row is reopened.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSnapshot {
    pub weight_type: WeightType,
    pub weight_value: f64,
    pub tiers: Tiers,
}

/// Borrowed view of the fields the validator looks at.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    pub objective_code: Option<&'a str>,
    pub action_code: Option<&'a str>,
    pub success_indicator_code: Option<&'a str>,
    pub weight_type: WeightType,
    pub tiers: &'a Tiers,
}

#[derive(Debug, Clone)]
pub struct TargetRow {
    pub id: RowId,
    pub scope: Scope,
    pub objective_code: Option<String>,
    pub action_code: Option<String>,
    pub success_indicator_code: Option<String>,
    pub weight_type: WeightType,
    pub weight_value: f64,
    pub tiers: Tiers,
    pub status: TargetStatus,
    pub approval_remarks: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub is_editing: bool,
    pub has_changes: bool,
    pub original_values: Option<RowSnapshot>,
    pub error: Option<FieldError>,
}

impl TargetRow {
    pub fn draft(scope: Scope, objective_code: Option<String>) -> Self {
        Self {
            id: RowId::new(),
            scope,
            objective_code,
            action_code: None,
            success_indicator_code: None,
            weight_type: WeightType::default(),
            weight_value: 0.0,
            tiers: Tiers::default(),
            status: TargetStatus::Draft,
            approval_remarks: None,
            approved_by: None,
            approved_at: None,
            is_editing: true,
            has_changes: false,
            original_values: None,
            error: None,
        }
    }

    pub fn from_record(record: &TargetRecord) -> Result<Self> {
        let weight_type = record
            .weight_type
            .parse::<WeightType>()
            .map_err(WorkflowError::UnknownWeightType)?;
        Ok(Self {
            id: RowId::new(),
            scope: Scope::new(&record.financial_year, &record.centre_code),
            objective_code: Some(record.objective_code.clone()),
            action_code: Some(record.action_code.clone()),
            success_indicator_code: Some(record.success_indicator_code.clone()),
            weight_type,
            weight_value: record.weight_value,
            tiers: record.tiers(),
            status: TargetStatus::from_code(&record.status_code)?,
            approval_remarks: record.approval_remarks.clone(),
            approved_by: record.approved_by.clone(),
            approved_at: record.approved_at,
            is_editing: false,
            has_changes: false,
            original_values: None,
            error: None,
        })
    }

    /// Copies persisted state from `record` without touching the row's identity or id.
    pub fn apply_record(&mut self, record: &TargetRecord) -> Result<()> {
        self.status = TargetStatus::from_code(&record.status_code)?;
        self.weight_value = record.weight_value;
        self.tiers = record.tiers();
        self.approval_remarks = record.approval_remarks.clone();
        self.approved_by = record.approved_by.clone();
        self.approved_at = record.approved_at;
        Ok(())
    }

    /// Editable means a new draft or a saved row reopened for editing.
    pub fn is_editable(&self) -> bool {
        self.status == TargetStatus::Draft || (self.status == TargetStatus::Saved && self.is_editing)
    }

    /// Composite identity; `None` until all three selections are made.
    pub fn key(&self) -> Option<TargetKey> {
        Some(TargetKey {
            financial_year: self.scope.financial_year.clone(),
            centre_code: self.scope.centre_code.clone(),
            objective_code: self.objective_code.clone()?,
            action_code: self.action_code.clone()?,
            success_indicator_code: self.success_indicator_code.clone()?,
        })
    }

    /// Like `key`, but reports the first missing selection.
    pub fn require_key(&self) -> Result<TargetKey> {
        check_selection(&self.view()).map_err(WorkflowError::Selection)?;
        self.key().ok_or_else(|| {
            WorkflowError::Selection(FieldError::new(RowField::Objective, "Please select an objective"))
        })
    }

    pub fn view(&self) -> RowView<'_> {
        RowView {
            objective_code: self.objective_code.as_deref(),
            action_code: self.action_code.as_deref(),
            success_indicator_code: self.success_indicator_code.as_deref(),
            weight_type: self.weight_type,
            tiers: &self.tiers,
        }
    }

    pub fn save_body(&self, actor: &str) -> Option<SaveTargetBody> {
        Some(SaveTargetBody {
            key: self.key()?,
            weight_type: self.weight_type,
            weight_value: self.weight_value,
            tiers: self.tiers.normalized(),
            actor: actor.to_string(),
        })
    }

    pub fn snapshot(&self) -> RowSnapshot {
        RowSnapshot {
            weight_type: self.weight_type,
            weight_value: self.weight_value,
            tiers: self.tiers.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: RowSnapshot) {
        self.weight_type = snapshot.weight_type;
        self.weight_value = snapshot.weight_value;
        self.tiers = snapshot.tiers;
    }

    /// Drops the selections below the objective.
    pub(crate) fn clear_below_objective(&mut self) {
        self.action_code = None;
        self.clear_below_action();
    }

    pub(crate) fn clear_below_action(&mut self) {
        self.success_indicator_code = None;
        self.weight_type = WeightType::default();
        self.weight_value = 0.0;
    }
}

impl<'a> RowView<'a> {
    /// View over a save payload, for server-side checks.
    pub fn of_body(body: &'a SaveTargetBody) -> Self {
        let code = |s: &'a str| Some(s).filter(|s| !is_blank(s));
        RowView {
            objective_code: code(&body.key.objective_code),
            action_code: code(&body.key.action_code),
            success_indicator_code: code(&body.key.success_indicator_code),
            weight_type: body.weight_type,
            tiers: &body.tiers,
        }
    }
}
