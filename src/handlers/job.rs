//! Job handlers: list, create, read, update, delete.

use crate::auth::AdminUser;
use crate::error::AppError;
use crate::models::{JobFilter, JobUpdate, NewJob};
use crate::response::{success_deleted, success_many, success_one, success_one_ok};
use crate::service::{body_to_map, job_new_rules, job_update_rules, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fields a job update may never carry.
const IMMUTABLE_JOB_FIELDS: &[&str] = &["id", "companyHandle", "handle"];

fn parse_id(id_str: &str) -> Result<i32, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest("invalid id".into()))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let filter = JobFilter::from_query(&params)?;
    let rows = state.jobs.find_all(Some(&filter)).await?;
    Ok(success_many(rows))
}

pub async fn create_job(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let body = body_to_map(body)?;
    RequestValidator::validate(&body, &job_new_rules())?;
    let data: NewJob = RequestValidator::parse(body)?;
    let job = state.jobs.create(&data).await?;
    tracing::info!(id = job.id, by = %admin.subject, "job created");
    Ok(success_one(job))
}

pub async fn read_job(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let job = state.jobs.get(id).await?;
    Ok(success_one_ok(job))
}

pub async fn update_job(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let body = body_to_map(body)?;
    RequestValidator::reject_immutable(&body, IMMUTABLE_JOB_FIELDS)?;
    RequestValidator::validate_partial(&body, &job_update_rules())?;
    let data: JobUpdate = RequestValidator::parse(body)?;
    let job = state.jobs.update(id, &data).await?;
    tracing::info!(id, by = %admin.subject, "job updated");
    Ok(success_one_ok(job))
}

pub async fn delete_job(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    state.jobs.remove(id).await?;
    tracing::info!(id, by = %admin.subject, "job deleted");
    Ok(success_deleted(id))
}
