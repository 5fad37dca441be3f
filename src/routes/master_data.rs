// src/routes/master_data.rs

use axum::{extract::{Path, State}, Json};
use sqlx::query_as;
use crate::AppState;
use crate::models::{Action, Centre, Objective, SuccessIndicator, WeightMeta};
use super::{internal_error, ApiError};

pub async fn list_objectives(
    State(state): State<AppState>,
) -> Result<Json<Vec<Objective>>, ApiError> {
    let rows = query_as::<_, Objective>(
        r#"SELECT objective_code, description, mandatory, multiple_entries
           FROM public.objectives ORDER BY objective_code"#)
        .fetch_all(&state.pool).await.map_err(internal_error)?;
    Ok(Json(rows))
}

pub async fn list_centres(
    State(state): State<AppState>,
) -> Result<Json<Vec<Centre>>, ApiError> {
    let rows = query_as::<_, Centre>(
        r#"SELECT centre_code, description FROM public.centres ORDER BY centre_code"#)
        .fetch_all(&state.pool).await.map_err(internal_error)?;
    Ok(Json(rows))
}

pub async fn list_actions(
    State(state): State<AppState>,
    Path(objective_code): Path<String>,
) -> Result<Json<Vec<Action>>, ApiError> {
    let rows = query_as::<_, Action>(
        r#"SELECT objective_code, action_code, description
           FROM public.actions WHERE objective_code = $1
           ORDER BY action_code"#)
        .bind(objective_code)
        .fetch_all(&state.pool).await.map_err(internal_error)?;
    Ok(Json(rows))
}

pub async fn list_success_indicators(
    State(state): State<AppState>,
    Path((objective_code, action_code)): Path<(String, String)>,
) -> Result<Json<Vec<SuccessIndicator>>, ApiError> {
    let rows = query_as::<_, SuccessIndicator>(
        r#"SELECT objective_code, action_code, success_indicator_code, description,
                  weight_type, weight_per_unit
           FROM public.success_indicators
           WHERE objective_code = $1 AND action_code = $2
           ORDER BY success_indicator_code"#)
        .bind(objective_code).bind(action_code)
        .fetch_all(&state.pool).await.map_err(internal_error)?;
    Ok(Json(rows))
}

/// Weight type is NULL unless every indicator of the objective shares one.
pub async fn get_weight(
    State(state): State<AppState>,
    Path(objective_code): Path<String>,
) -> Result<Json<WeightMeta>, ApiError> {
    let row = query_as::<_, WeightMeta>(
        r#"
        SELECT $1::TEXT AS objective_code,
               CASE WHEN COUNT(DISTINCT weight_type) = 1 THEN MIN(weight_type) END AS weight_type,
               COALESCE(SUM(weight_per_unit), 0)::DOUBLE PRECISION AS weight_per_unit,
               COUNT(*) AS indicator_count
        FROM public.success_indicators
        WHERE objective_code = $1
        "#)
        .bind(objective_code)
        .fetch_one(&state.pool).await.map_err(internal_error)?;
    Ok(Json(row))
}
