// src/workflow/confirm.rs

use async_trait::async_trait;

use crate::models::TargetKey;

/// A destructive step waiting on the operator's yes/no.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    ReopenRow { key: TargetKey },
    DeleteRow { objective_code: Option<String>, success_indicator_code: Option<String> },
    ApproveRow { key: TargetKey },
    RejectRow { key: TargetKey, remarks: String },
    ApproveAll { pending: usize, rejected: usize },
    SubmitScope { financial_year: String, centre_code: String, rows: usize },
}

impl Confirmation {
    pub fn message(&self) -> String {
        match self {
            Confirmation::ReopenRow { key } => format!(
                "Edit the saved target for {} / {}?",
                key.objective_code, key.success_indicator_code
            ),
            Confirmation::DeleteRow { objective_code, success_indicator_code } => format!(
                "Delete the target for {} / {}? This cannot be undone.",
                objective_code.as_deref().unwrap_or("-"),
                success_indicator_code.as_deref().unwrap_or("-")
            ),
            Confirmation::ApproveRow { key } => format!(
                "Approve the target for {} / {}?",
                key.action_code, key.success_indicator_code
            ),
            Confirmation::RejectRow { key, remarks } => format!(
                "Reject the target for {} / {} with remarks \"{}\"?",
                key.action_code, key.success_indicator_code, remarks
            ),
            Confirmation::ApproveAll { pending, rejected } if *rejected > 0 => format!(
                "{rejected} rejected target(s) are excluded and will not be re-approved. \
                 Approve the remaining {pending} pending target(s)?"
            ),
            Confirmation::ApproveAll { pending, .. } => {
                format!("Approve all {pending} pending target(s)?")
            }
            Confirmation::SubmitScope { financial_year, centre_code, rows } => format!(
                "Submit {rows} saved target(s) for centre {centre_code}, {financial_year}, for approval?"
            ),
        }
    }
}

/// Asks the operator. `false` abandons the operation without an error.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, request: &Confirmation) -> bool;
}

/// Answers every request the same way; for batch and non-interactive callers.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, _request: &Confirmation) -> bool {
        self.0
    }
}

/// Result of an operation that may be declined or may have nothing to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Declined,
    Unchanged,
}
