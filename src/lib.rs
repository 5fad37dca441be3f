// src/lib.rs

use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::{Pool, Postgres};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod workflow;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Postgres>,
}

/// Root router with every endpoint, CORS and request tracing.
pub fn app(state: AppState) -> Router {
    // Very permissive CORS for local dev (tighten for prod)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // health
        .route("/health", get(routes::health::health))
        // master data
        .route("/objectives", get(routes::master_data::list_objectives))
        .route("/centres", get(routes::master_data::list_centres))
        .route("/actions/:objective_code", get(routes::master_data::list_actions))
        .route(
            "/successindicator/getWeight/:objective_code",
            get(routes::master_data::get_weight),
        )
        .route(
            "/successindicator/:objective_code/:action_code",
            get(routes::master_data::list_success_indicators),
        )
        // target rows
        .route(
            "/targets",
            get(routes::targets::list_targets).post(routes::targets::save_target),
        )
        .route("/targets/delete", post(routes::targets::delete_target))
        .route("/targets/submit", put(routes::targets::submit_scope))
        // approval
        .route(
            "/targets/approve/:financial_year/:centre_code/:action_code/:success_indicator_code",
            put(routes::approvals::approve_target),
        )
        .route(
            "/targets/reject/:financial_year/:centre_code/:action_code/:success_indicator_code",
            put(routes::approvals::reject_target),
        )
        .route("/targets/approveall", put(routes::approvals::approve_all))
        // state & middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
