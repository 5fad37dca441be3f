// src/routes/approvals.rs

use axum::{extract::{Path, Query, State}, Json};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{query_as, query_scalar, Postgres};
use crate::AppState;
use crate::models::{ApproveAllResult, TargetKey, TargetRecord};
use crate::workflow::{row::is_blank, FieldError, RowField, Scope, TargetStatus};
use super::{bad_request, conflict, internal_error, status_code, targets::workflow_error, ApiError};

#[derive(Deserialize)]
pub struct DecisionPath {
    pub financial_year: String,
    pub centre_code: String,
    pub action_code: String,
    pub success_indicator_code: String,
}

#[derive(Deserialize)]
pub struct ApproveQ {
    #[serde(rename = "objectivecode")] pub objective_code: Option<String>,
    #[serde(rename = "approvedby")] pub approved_by: Option<String>,
}

#[derive(Deserialize)]
pub struct RejectQ {
    pub remarks: Option<String>,
    #[serde(rename = "objectivecode")] pub objective_code: Option<String>,
    #[serde(rename = "approvedby")] pub approved_by: Option<String>,
}

#[derive(Deserialize)]
pub struct ApproveAllQ {
    #[serde(rename = "financialyear")] pub financial_year: String,
    #[serde(rename = "centrecode")] pub centre_code: String,
    #[serde(rename = "approvedby")] pub approved_by: Option<String>,
}

/// Moves one T02 row to `to`, stamping the approver; 409 when the row is not
/// pending. Action codes repeat across objectives, so without an objective
/// code the path must name exactly one pending row.
async fn decide(
    state: &AppState,
    p: &DecisionPath,
    objective_code: Option<&str>,
    to: TargetStatus,
    remarks: Option<&str>,
    approved_by: Option<&str>,
) -> Result<TargetRecord, ApiError> {
    let objective_code = objective_code.map(str::trim).filter(|c| !is_blank(c));
    let mut tx = state.pool.begin().await.map_err(internal_error)?;

    let pending: i64 = query_scalar(
        r#"SELECT COUNT(*) FROM public.targets
           WHERE financial_year = $1 AND centre_code = $2
             AND action_code = $3 AND success_indicator_code = $4
             AND ($5::TEXT IS NULL OR objective_code = $5)
             AND status_code = $6"#)
        .bind(&p.financial_year).bind(&p.centre_code)
        .bind(&p.action_code).bind(&p.success_indicator_code)
        .bind(objective_code)
        .bind(status_code(TargetStatus::Submitted))
        .fetch_one(&mut *tx).await.map_err(internal_error)?;
    if pending > 1 {
        return Err(conflict(format!(
            "{pending} pending targets match action {} / indicator {}; pass objectivecode",
            p.action_code, p.success_indicator_code
        )));
    }

    let row = query_as::<_, TargetRecord>(
        r#"
        UPDATE public.targets SET
          status_code      = $6,
          approval_remarks = COALESCE($7, approval_remarks),
          approved_by      = $8,
          approved_at      = now(),
          updated_at       = now()
        WHERE financial_year = $1 AND centre_code = $2
          AND action_code = $3 AND success_indicator_code = $4
          AND ($5::TEXT IS NULL OR objective_code = $5)
          AND status_code = $9
        RETURNING *
        "#)
        .bind(&p.financial_year).bind(&p.centre_code)
        .bind(&p.action_code).bind(&p.success_indicator_code)
        .bind(objective_code)
        .bind(status_code(to)).bind(remarks).bind(approved_by)
        .bind(status_code(TargetStatus::Submitted))
        .fetch_optional(&mut *tx).await.map_err(internal_error)?;

    let row = row.ok_or_else(|| conflict("target is not awaiting approval"))?;
    tx.commit().await.map_err(internal_error)?;
    tracing::info!(
        objective = %row.objective_code,
        si = %p.success_indicator_code,
        centre = %p.centre_code,
        status = %to,
        "target decision recorded"
    );
    Ok(row)
}

pub async fn approve_target(
    State(state): State<AppState>,
    Path(p): Path<DecisionPath>,
    Query(q): Query<ApproveQ>,
) -> Result<Json<TargetRecord>, ApiError> {
    let row = decide(
        &state,
        &p,
        q.objective_code.as_deref(),
        TargetStatus::Approved,
        None,
        q.approved_by.as_deref(),
    )
    .await?;
    Ok(Json(row))
}

pub async fn reject_target(
    State(state): State<AppState>,
    Path(p): Path<DecisionPath>,
    Query(q): Query<RejectQ>,
) -> Result<Json<TargetRecord>, ApiError> {
    let remarks = q.remarks.as_deref().map(str::trim).unwrap_or_default();
    if is_blank(remarks) {
        return Err(bad_request(&FieldError::new(
            RowField::Remarks,
            "Remarks are required to reject a target",
        )));
    }
    let row = decide(
        &state,
        &p,
        q.objective_code.as_deref(),
        TargetStatus::Rejected,
        Some(remarks),
        q.approved_by.as_deref(),
    )
    .await?;
    Ok(Json(row))
}

/// Approves every pending row in scope; rejected and approved rows are only counted.
pub async fn approve_all(
    State(state): State<AppState>,
    Query(q): Query<ApproveAllQ>,
) -> Result<Json<ApproveAllResult>, ApiError> {
    Scope::new(&q.financial_year, &q.centre_code)
        .require_complete()
        .map_err(workflow_error)?;

    let approved_at = Utc::now();
    let mut tx = state.pool.begin().await.map_err(internal_error)?;

    let count_with = |status: TargetStatus| {
        query_scalar::<Postgres, i64>(
            r#"SELECT COUNT(*) FROM public.targets
               WHERE financial_year = $1 AND centre_code = $2 AND status_code = $3"#)
            .bind(q.financial_year.clone()).bind(q.centre_code.clone())
            .bind(status_code(status))
    };
    let skipped_rejected = count_with(TargetStatus::Rejected)
        .fetch_one(&mut *tx).await.map_err(internal_error)?;
    let already_approved = count_with(TargetStatus::Approved)
        .fetch_one(&mut *tx).await.map_err(internal_error)?;

    let approved = query_as::<_, TargetKey>(
        r#"
        UPDATE public.targets SET
          status_code = $3, approved_by = $4, approved_at = $5, updated_at = now()
        WHERE financial_year = $1 AND centre_code = $2 AND status_code = $6
        RETURNING financial_year, centre_code, objective_code, action_code, success_indicator_code
        "#)
        .bind(&q.financial_year).bind(&q.centre_code)
        .bind(status_code(TargetStatus::Approved)).bind(q.approved_by.as_deref())
        .bind(approved_at).bind(status_code(TargetStatus::Submitted))
        .fetch_all(&mut *tx).await.map_err(internal_error)?;
    tx.commit().await.map_err(internal_error)?;

    tracing::info!(
        financial_year = %q.financial_year,
        centre = %q.centre_code,
        approved = approved.len(),
        skipped_rejected,
        already_approved,
        "bulk approval"
    );
    Ok(Json(ApproveAllResult { approved, skipped_rejected, already_approved, approved_at }))
}
