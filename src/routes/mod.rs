//! Router assembly: common routes, resource routes, and request layers.

mod common;

pub use common::common_routes;

use crate::handlers::{
    create_company, create_job, delete_company, delete_job, list_companies, list_jobs,
    read_company, read_job, update_company, update_job,
};
use crate::state::AppState;
use axum::{
    body::Body,
    http::{HeaderName, Request},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Reads are open; create, update and delete require an admin token.
pub fn company_routes(state: AppState) -> Router {
    Router::new()
        .route("/companies", get(list_companies).post(create_company))
        .route(
            "/companies/:handle",
            get(read_company).patch(update_company).delete(delete_company),
        )
        .with_state(state)
}

/// Reads are open; create, update and delete require an admin token.
pub fn job_routes(state: AppState) -> Router {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id", get(read_job).patch(update_job).delete(delete_job))
        .with_state(state)
}

/// Full application router with tracing, request ids and a body size limit.
pub fn app(state: AppState, max_body_bytes: usize) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(company_routes(state.clone()))
        .merge(job_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    let id = req
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!("request", method = %req.method(), uri = %req.uri(), request_id = %id)
                }))
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(RequestBodyLimitLayer::new(max_body_bytes)),
        )
}
