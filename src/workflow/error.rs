// src/workflow/error.rs

use std::fmt;

use thiserror::Error;

use crate::models::TargetKey;

use super::row::{RowId, Tier};
use super::status::{StatusEvent, TargetStatus};

pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Form field an error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    FinancialYear,
    Centre,
    Objective,
    Action,
    SuccessIndicator,
    Tier(Tier),
    Remarks,
}

impl fmt::Display for RowField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowField::FinancialYear => f.write_str("financialYear"),
            RowField::Centre => f.write_str("centre"),
            RowField::Objective => f.write_str("objective"),
            RowField::Action => f.write_str("action"),
            RowField::SuccessIndicator => f.write_str("successIndicator"),
            RowField::Tier(tier) => f.write_str(tier.field_name()),
            RowField::Remarks => f.write_str("remarks"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: RowField,
    pub message: String,
}

impl FieldError {
    pub fn new(field: RowField, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Missing or unknown master-data selection.
    #[error("Invalid selection: {0}")]
    Selection(FieldError),

    /// Row contents rejected by the validator.
    #[error("Validation failed: {0}")]
    Validation(FieldError),

    /// No centre (or financial year) chosen for an operation that needs one.
    #[error("Scope required: {0}")]
    Scope(FieldError),

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Cannot {event} a {from} target")]
    IllegalTransition { from: TargetStatus, event: StatusEvent },

    #[error("Objective {0} allows only one target per centre and financial year")]
    DuplicateObjective(String),

    #[error("Target row {0} is not open for editing")]
    NotEditable(RowId),

    #[error("Target row {0} not found")]
    RowNotFound(RowId),

    #[error("{0} target row(s) in scope are unsaved or still being edited")]
    UnsavedRows(usize),

    /// The server answered a single-row request with a different row.
    #[error("Requested target {} / {} but the server returned {} / {}",
        .requested.objective_code, .requested.success_indicator_code,
        .returned.objective_code, .returned.success_indicator_code)]
    UnexpectedRecord { requested: Box<TargetKey>, returned: Box<TargetKey> },

    #[error("Unknown status code '{0}'")]
    UnknownStatus(String),

    #[error("Unknown weight type '{0}'")]
    UnknownWeightType(String),
}

impl WorkflowError {
    /// The inline, field-scoped part of the error, if it has one.
    pub fn field_error(&self) -> Option<&FieldError> {
        match self {
            WorkflowError::Selection(e) | WorkflowError::Validation(e) | WorkflowError::Scope(e) => {
                Some(e)
            }
            _ => None,
        }
    }

    pub(crate) fn no_centre() -> Self {
        WorkflowError::Scope(FieldError::new(RowField::Centre, "Please select a centre"))
    }
}

impl From<reqwest::Error> for WorkflowError {
    fn from(e: reqwest::Error) -> Self {
        WorkflowError::Network(e.to_string())
    }
}
