// src/routes/targets.rs

use axum::{extract::{Query, State}, Json};
use serde::Deserialize;
use sqlx::{query, query_as, query_scalar};
use crate::AppState;
use crate::models::{
    Deleted, Objective, SaveTargetBody, ScopeQuery, SubmitResult, SuccessIndicator, TargetKey,
    TargetRecord,
};
use crate::workflow::{
    row::RowView, validator, FieldError, RowField, Scope, TargetStatus, WorkflowError,
};
use super::{bad_request, conflict, internal_error, not_found_or_internal, status_code, ApiError};

#[derive(Deserialize)]
pub struct SubmitQ {
    #[serde(rename = "financialyear")] pub financial_year: String,
    #[serde(rename = "centrecode")] pub centre_code: String,
    #[serde(rename = "submittedby")] pub submitted_by: Option<String>,
}

/// Field-scoped workflow errors become 400s, anything else a 500.
pub(crate) fn workflow_error(e: WorkflowError) -> ApiError {
    match e.field_error() {
        Some(fe) => bad_request(fe),
        None => internal_error(e),
    }
}

pub async fn list_targets(
    State(state): State<AppState>,
    Query(q): Query<ScopeQuery>,
) -> Result<Json<Vec<TargetRecord>>, ApiError> {
    Scope::new(&q.financial_year, &q.centre_code)
        .require_complete()
        .map_err(workflow_error)?;

    let rows = query_as::<_, TargetRecord>(
        r#"SELECT * FROM public.targets
           WHERE financial_year = $1 AND centre_code = $2
           ORDER BY objective_code, action_code, success_indicator_code"#)
        .bind(q.financial_year).bind(q.centre_code)
        .fetch_all(&state.pool).await.map_err(internal_error)?;
    Ok(Json(rows))
}

/// Create-or-update on the composite identity. Rows past T01 are never overwritten.
pub async fn save_target(
    State(state): State<AppState>,
    Json(body): Json<SaveTargetBody>,
) -> Result<Json<TargetRecord>, ApiError> {
    let view = RowView::of_body(&body);
    validator::check_selection(&view).map_err(|e| bad_request(&e))?;
    Scope::new(&body.key.financial_year, &body.key.centre_code)
        .require_complete()
        .map_err(workflow_error)?;

    let objectives = query_as::<_, Objective>(
        r#"SELECT objective_code, description, mandatory, multiple_entries FROM public.objectives"#)
        .fetch_all(&state.pool).await.map_err(internal_error)?;
    let key = &body.key;
    let indicator = query_as::<_, SuccessIndicator>(
        r#"SELECT objective_code, action_code, success_indicator_code, description,
                  weight_type, weight_per_unit
           FROM public.success_indicators
           WHERE objective_code = $1 AND action_code = $2 AND success_indicator_code = $3"#)
        .bind(&key.objective_code).bind(&key.action_code).bind(&key.success_indicator_code)
        .fetch_optional(&state.pool).await.map_err(internal_error)?
        .ok_or_else(|| bad_request(&FieldError::new(
            RowField::SuccessIndicator,
            format!(
                "Success indicator {} is not available for action {}",
                key.success_indicator_code, key.action_code
            ),
        )))?;

    // Tier ordering is checked under the indicator's own weight type.
    validator::check_indicator_weight(body.weight_type, body.weight_value, &indicator)
        .map_err(|e| bad_request(&e))?;
    validator::validate(&view, &objectives).map_err(|e| bad_request(&e))?;

    let single_entry = objectives
        .iter()
        .any(|o| o.objective_code == key.objective_code && !o.multiple_entries);
    if single_entry {
        let others: i64 = query_scalar(
            r#"SELECT COUNT(*) FROM public.targets
               WHERE financial_year = $1 AND centre_code = $2 AND objective_code = $3
                 AND NOT (action_code = $4 AND success_indicator_code = $5)"#)
            .bind(&key.financial_year).bind(&key.centre_code).bind(&key.objective_code)
            .bind(&key.action_code).bind(&key.success_indicator_code)
            .fetch_one(&state.pool).await.map_err(internal_error)?;
        if others > 0 {
            return Err(conflict(
                WorkflowError::DuplicateObjective(key.objective_code.clone()).to_string(),
            ));
        }
    }

    let tiers = body.tiers.normalized();
    let saved = status_code(TargetStatus::Saved);
    let row = query_as::<_, TargetRecord>(
        r#"
        INSERT INTO public.targets (financial_year, centre_code, objective_code, action_code,
            success_indicator_code, weight_type, weight_value, excellent, very_good, good, fair, poor,
            status_code, created_by)
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
        ON CONFLICT ON CONSTRAINT targets_identity
        DO UPDATE SET weight_type  = EXCLUDED.weight_type,
                      weight_value = EXCLUDED.weight_value,
                      excellent    = EXCLUDED.excellent,
                      very_good    = EXCLUDED.very_good,
                      good         = EXCLUDED.good,
                      fair         = EXCLUDED.fair,
                      poor         = EXCLUDED.poor,
                      updated_at   = now()
        WHERE public.targets.status_code = $13
        RETURNING *
        "#)
        .bind(&key.financial_year).bind(&key.centre_code).bind(&key.objective_code)
        .bind(&key.action_code).bind(&key.success_indicator_code)
        .bind(&indicator.weight_type).bind(indicator.weight_per_unit)
        .bind(tiers.excellent.unwrap_or_default())
        .bind(tiers.very_good).bind(tiers.good).bind(tiers.fair).bind(tiers.poor)
        .bind(saved).bind(&body.actor)
        .fetch_optional(&state.pool).await.map_err(internal_error)?;

    match row {
        Some(row) => {
            tracing::info!(objective = %key.objective_code, si = %key.success_indicator_code, "target saved");
            Ok(Json(row))
        }
        None => Err(conflict("target is no longer editable")),
    }
}

/// Only saved (T01) rows can be deleted.
pub async fn delete_target(
    State(state): State<AppState>,
    Json(key): Json<TargetKey>,
) -> Result<Json<Deleted>, ApiError> {
    let res = query(
        r#"DELETE FROM public.targets
           WHERE financial_year = $1 AND centre_code = $2 AND objective_code = $3
             AND action_code = $4 AND success_indicator_code = $5 AND status_code = $6"#)
        .bind(&key.financial_year).bind(&key.centre_code).bind(&key.objective_code)
        .bind(&key.action_code).bind(&key.success_indicator_code)
        .bind(status_code(TargetStatus::Saved))
        .execute(&state.pool).await.map_err(internal_error)?;
    if res.rows_affected() > 0 {
        tracing::info!(objective = %key.objective_code, si = %key.success_indicator_code, "target deleted");
        return Ok(Json(Deleted { deleted: true }));
    }

    let current: String = query_scalar(
        r#"SELECT status_code FROM public.targets
           WHERE financial_year = $1 AND centre_code = $2 AND objective_code = $3
             AND action_code = $4 AND success_indicator_code = $5"#)
        .bind(&key.financial_year).bind(&key.centre_code).bind(&key.objective_code)
        .bind(&key.action_code).bind(&key.success_indicator_code)
        .fetch_one(&state.pool).await.map_err(not_found_or_internal)?;
    Err(conflict(format!("target with status {current} cannot be deleted")))
}

/// Moves every saved row in the scope to submitted.
pub async fn submit_scope(
    State(state): State<AppState>,
    Query(q): Query<SubmitQ>,
) -> Result<Json<SubmitResult>, ApiError> {
    Scope::new(&q.financial_year, &q.centre_code)
        .require_complete()
        .map_err(workflow_error)?;

    let submitted = query_as::<_, TargetKey>(
        r#"
        UPDATE public.targets SET status_code = $3, updated_at = now()
        WHERE financial_year = $1 AND centre_code = $2 AND status_code = $4
        RETURNING financial_year, centre_code, objective_code, action_code, success_indicator_code
        "#)
        .bind(&q.financial_year).bind(&q.centre_code)
        .bind(status_code(TargetStatus::Submitted))
        .bind(status_code(TargetStatus::Saved))
        .fetch_all(&state.pool).await.map_err(internal_error)?;

    tracing::info!(
        financial_year = %q.financial_year,
        centre = %q.centre_code,
        by = q.submitted_by.as_deref().unwrap_or("-"),
        count = submitted.len(),
        "targets submitted"
    );
    Ok(Json(SubmitResult { submitted }))
}
