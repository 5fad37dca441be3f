// src/models/mod.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ───────────────────────────────────────
// Master data (read-only here)
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Objective {
    pub objective_code: String,
    pub description: String,
    pub mandatory: bool,
    pub multiple_entries: bool,   // more than one target row per centre/FY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Action {
    pub objective_code: String,
    pub action_code: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SuccessIndicator {
    pub objective_code: String,
    pub action_code: String,
    pub success_indicator_code: String,
    pub description: String,
    pub weight_type: String,      // NUMBER | PERCENTAGE | DATE
    pub weight_per_unit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Centre {
    pub centre_code: String,
    pub description: String,
}

/// Aggregate weight metadata of one objective's success indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WeightMeta {
    pub objective_code: String,
    pub weight_type: Option<String>, // NULL when the indicators disagree
    pub weight_per_unit: f64,
    pub indicator_count: i64,
}

// ───────────────────────────────────────
// Target rows
// ───────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WeightType {
    #[default]
    Number,
    Percentage,
    Date,
}

impl WeightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightType::Number => "NUMBER",
            WeightType::Percentage => "PERCENTAGE",
            WeightType::Date => "DATE",
        }
    }
}

impl std::str::FromStr for WeightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NUMBER" => Ok(WeightType::Number),
            "PERCENTAGE" => Ok(WeightType::Percentage),
            "DATE" => Ok(WeightType::Date),
            other => Err(other.to_string()),
        }
    }
}

/// Composite identity of a target row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct TargetKey {
    pub financial_year: String,
    pub centre_code: String,
    pub objective_code: String,
    pub action_code: String,
    pub success_indicator_code: String,
}

/// The five performance tiers as entered; a blank string counts as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tiers {
    pub excellent: Option<String>,
    pub very_good: Option<String>,
    pub good: Option<String>,
    pub fair: Option<String>,
    pub poor: Option<String>,
}

impl Tiers {
    /// Trims every value and turns blanks into `None`.
    pub fn normalized(&self) -> Tiers {
        let norm = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Tiers {
            excellent: norm(&self.excellent),
            very_good: norm(&self.very_good),
            good: norm(&self.good),
            fair: norm(&self.fair),
            poor: norm(&self.poor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TargetRecord {
    pub financial_year: String,
    pub centre_code: String,
    pub objective_code: String,
    pub action_code: String,
    pub success_indicator_code: String,
    pub weight_type: String,
    pub weight_value: f64,
    pub excellent: String,
    pub very_good: Option<String>,
    pub good: Option<String>,
    pub fair: Option<String>,
    pub poor: Option<String>,
    pub status_code: String,      // T01 saved | T02 submitted | T03 rejected | T04 approved
    pub approval_remarks: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
}

impl TargetRecord {
    pub fn key(&self) -> TargetKey {
        TargetKey {
            financial_year: self.financial_year.clone(),
            centre_code: self.centre_code.clone(),
            objective_code: self.objective_code.clone(),
            action_code: self.action_code.clone(),
            success_indicator_code: self.success_indicator_code.clone(),
        }
    }

    pub fn tiers(&self) -> Tiers {
        Tiers {
            excellent: Some(self.excellent.clone()),
            very_good: self.very_good.clone(),
            good: self.good.clone(),
            fair: self.fair.clone(),
            poor: self.poor.clone(),
        }
    }
}

// ───────────────────────────────────────
// DTOs helpful for endpoints
// ───────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveTargetBody {
    #[serde(flatten)]
    pub key: TargetKey,
    pub weight_type: WeightType,
    pub weight_value: f64,
    #[serde(flatten)]
    pub tiers: Tiers,
    pub actor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeQuery {
    #[serde(rename = "financialyear")]
    pub financial_year: String,
    #[serde(rename = "centrecode")]
    pub centre_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted { pub deleted: bool }

/// Rows changed by a bulk approval; rejected and already approved rows are only counted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveAllResult {
    pub approved: Vec<TargetKey>,
    pub skipped_rejected: i64,
    pub already_approved: i64,
    pub approved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResult {
    pub submitted: Vec<TargetKey>,
}
