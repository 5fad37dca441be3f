// src/workflow/approval.rs

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::models::{TargetKey, TargetRecord};

use super::confirm::{Confirmation, Confirmer, Outcome};
use super::error::{FieldError, Result, RowField, WorkflowError};
use super::gateway::TargetsGateway;
use super::loading::LoadingState;
use super::row::{is_blank, RowId, Scope, TargetRow};
use super::status::{StatusEvent, TargetStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalSummary {
    pub pending: usize,
    pub rejected: usize,
    pub approved: usize,
}

pub fn classify(rows: &[TargetRow]) -> ApprovalSummary {
    rows.iter().fold(ApprovalSummary::default(), |mut acc, row| {
        match row.status {
            TargetStatus::Submitted => acc.pending += 1,
            TargetStatus::Rejected => acc.rejected += 1,
            TargetStatus::Approved => acc.approved += 1,
            TargetStatus::Draft | TargetStatus::Saved => {}
        }
        acc
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum BulkApproval {
    NothingToApprove,
    AllAlreadyApproved { approved: usize },
    Declined,
    /// Keys the server reported as changed; rejected rows are never among them.
    Approved { approved: Vec<TargetKey>, excluded_rejected: usize },
}

/// Approve/reject over the submitted rows of one scope.
pub struct ApprovalOrchestrator {
    gateway: Arc<dyn TargetsGateway>,
    confirmer: Arc<dyn Confirmer>,
    actor: String,
    scope: Option<Scope>,
    rows: Vec<TargetRow>,
    loading: LoadingState,
}

impl ApprovalOrchestrator {
    pub fn new(
        gateway: Arc<dyn TargetsGateway>,
        confirmer: Arc<dyn Confirmer>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            confirmer,
            actor: actor.into(),
            scope: None,
            rows: Vec::new(),
            loading: LoadingState::default(),
        }
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn rows(&self) -> &[TargetRow] {
        &self.rows
    }

    pub fn loading(&self) -> LoadingState {
        self.loading.clone()
    }

    pub fn summary(&self) -> ApprovalSummary {
        classify(&self.rows)
    }

    fn row(&self, id: RowId) -> Result<&TargetRow> {
        self.rows
            .iter()
            .find(|r| r.id == id)
            .ok_or(WorkflowError::RowNotFound(id))
    }

    fn row_mut(&mut self, id: RowId) -> Result<&mut TargetRow> {
        self.rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(WorkflowError::RowNotFound(id))
    }

    /// Applies the server's answer to a single-row decision, unless it is
    /// about some other row.
    fn apply_decision(&mut self, id: RowId, requested: &TargetKey, record: &TargetRecord) -> Result<()> {
        let returned = record.key();
        if returned != *requested {
            warn!(
                requested = %requested.objective_code,
                returned = %returned.objective_code,
                success_indicator_code = %requested.success_indicator_code,
                "decision answered for a different target"
            );
            return Err(WorkflowError::UnexpectedRecord {
                requested: Box::new(requested.clone()),
                returned: Box::new(returned),
            });
        }
        self.row_mut(id)?.apply_record(record)
    }

    /// Loads the rows of the scope that have already been submitted.
    pub async fn load_scope(&mut self, financial_year: &str, centre_code: &str) -> Result<()> {
        let scope = Scope::new(financial_year.trim(), centre_code.trim());
        scope.require_complete()?;

        let records = {
            let _busy = self.loading.begin();
            self.gateway.fetch_targets(&scope).await?
        };
        let rows = records
            .iter()
            .map(TargetRow::from_record)
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|r| {
                matches!(
                    r.status,
                    TargetStatus::Submitted | TargetStatus::Rejected | TargetStatus::Approved
                )
            })
            .collect();

        self.rows = rows;
        self.scope = Some(scope);
        Ok(())
    }

    pub async fn approve_row(&mut self, id: RowId) -> Result<Outcome> {
        let row = self.row(id)?;
        if row.status == TargetStatus::Approved {
            return Ok(Outcome::Unchanged);
        }
        row.status.next(StatusEvent::Approve)?;
        let key = row.require_key()?;

        if !self
            .confirmer
            .confirm(&Confirmation::ApproveRow { key: key.clone() })
            .await
        {
            return Ok(Outcome::Declined);
        }

        let record = {
            let _busy = self.loading.begin();
            self.gateway.approve_target(&key, &self.actor).await.map_err(|e| {
                warn!(success_indicator_code = %key.success_indicator_code, error = %e, "approve failed");
                e
            })?
        };
        self.apply_decision(id, &key, &record)?;
        info!(
            action_code = %key.action_code,
            success_indicator_code = %key.success_indicator_code,
            approved_by = %self.actor,
            "target approved"
        );
        Ok(Outcome::Applied)
    }

    pub async fn reject_row(&mut self, id: RowId, remarks: &str) -> Result<Outcome> {
        let row = self.row(id)?;
        if row.status == TargetStatus::Rejected {
            return Ok(Outcome::Unchanged);
        }
        row.status.next(StatusEvent::Reject)?;
        if is_blank(remarks) {
            return Err(WorkflowError::Validation(FieldError::new(
                RowField::Remarks,
                "Remarks are required to reject a target",
            )));
        }
        let key = row.require_key()?;
        let remarks = remarks.trim().to_string();

        let request = Confirmation::RejectRow { key: key.clone(), remarks: remarks.clone() };
        if !self.confirmer.confirm(&request).await {
            return Ok(Outcome::Declined);
        }

        let record = {
            let _busy = self.loading.begin();
            self.gateway
                .reject_target(&key, &remarks, &self.actor)
                .await
                .map_err(|e| {
                    warn!(success_indicator_code = %key.success_indicator_code, error = %e, "reject failed");
                    e
                })?
        };
        self.apply_decision(id, &key, &record)?;
        info!(
            action_code = %key.action_code,
            success_indicator_code = %key.success_indicator_code,
            approved_by = %self.actor,
            "target rejected"
        );
        Ok(Outcome::Applied)
    }

    /// Approves every pending row in scope. Rejected and approved rows are
    /// left as they are; only rows the server reports as changed are updated.
    pub async fn approve_all(&mut self) -> Result<BulkApproval> {
        let scope = self.scope.clone().ok_or_else(WorkflowError::no_centre)?;
        let summary = self.summary();

        if summary.pending == 0 {
            return Ok(if summary.approved > 0 {
                BulkApproval::AllAlreadyApproved { approved: summary.approved }
            } else {
                BulkApproval::NothingToApprove
            });
        }

        let request = Confirmation::ApproveAll {
            pending: summary.pending,
            rejected: summary.rejected,
        };
        if !self.confirmer.confirm(&request).await {
            return Ok(BulkApproval::Declined);
        }

        let result = {
            let _busy = self.loading.begin();
            self.gateway.approve_all(&scope, &self.actor).await?
        };

        let changed: HashSet<&TargetKey> = result.approved.iter().collect();
        let actor = self.actor.clone();
        let mut approved = Vec::with_capacity(result.approved.len());
        for row in self.rows.iter_mut().filter(|r| r.status == TargetStatus::Submitted) {
            let Some(key) = row.key() else { continue };
            if changed.contains(&key) {
                row.status = row.status.next(StatusEvent::Approve)?;
                row.approved_by = Some(actor.clone());
                row.approved_at = Some(result.approved_at);
                approved.push(key);
            }
        }

        if approved.len() != summary.pending || approved.len() != result.approved.len() {
            warn!(
                pending = summary.pending,
                reported = result.approved.len(),
                applied = approved.len(),
                "bulk approval differs from the loaded rows"
            );
        }
        info!(
            centre_code = %scope.centre_code,
            financial_year = %scope.financial_year,
            approved = approved.len(),
            excluded_rejected = summary.rejected,
            "bulk approval done"
        );
        Ok(BulkApproval::Approved { approved, excluded_rejected: summary.rejected })
    }
}
