// src/workflow/status.rs

use std::fmt;

use super::error::{Result, WorkflowError};

/// Lifecycle status of a target row. Only `Draft` has no stored code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetStatus {
    Draft,
    Saved,
    Submitted,
    Rejected,
    Approved,
}

/// Something that may happen to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Persist,
    Reopen,
    Delete,
    Submit,
    Approve,
    Reject,
}

impl TargetStatus {
    pub fn code(&self) -> Option<&'static str> {
        match self {
            TargetStatus::Draft => None,
            TargetStatus::Saved => Some("T01"),
            TargetStatus::Submitted => Some("T02"),
            TargetStatus::Rejected => Some("T03"),
            TargetStatus::Approved => Some("T04"),
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim() {
            "T01" => Ok(TargetStatus::Saved),
            "T02" => Ok(TargetStatus::Submitted),
            "T03" => Ok(TargetStatus::Rejected),
            "T04" => Ok(TargetStatus::Approved),
            other => Err(WorkflowError::UnknownStatus(other.to_string())),
        }
    }

    /// Whether the row exists in the persistence layer.
    pub fn is_persisted(&self) -> bool {
        !matches!(self, TargetStatus::Draft)
    }

    /// Status held after `event`. For `Reopen` and `Delete` that is the
    /// current status: they are permitted or not, they do not move the row.
    pub fn next(self, event: StatusEvent) -> Result<TargetStatus> {
        use StatusEvent::*;
        use TargetStatus::*;

        match (self, event) {
            (Draft, Persist) | (Saved, Persist) => Ok(Saved),
            (Saved, Reopen) => Ok(Saved),
            (Draft, Delete) | (Saved, Delete) => Ok(self),
            (Saved, Submit) => Ok(Submitted),
            (Submitted, Approve) => Ok(Approved),
            (Submitted, Reject) => Ok(Rejected),
            (from, event) => Err(WorkflowError::IllegalTransition { from, event }),
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TargetStatus::Draft => "draft",
            TargetStatus::Saved => "saved",
            TargetStatus::Submitted => "submitted",
            TargetStatus::Rejected => "rejected",
            TargetStatus::Approved => "approved",
        };
        f.write_str(label)
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatusEvent::Persist => "save",
            StatusEvent::Reopen => "edit",
            StatusEvent::Delete => "delete",
            StatusEvent::Submit => "submit",
            StatusEvent::Approve => "approve",
            StatusEvent::Reject => "reject",
        };
        f.write_str(label)
    }
}
