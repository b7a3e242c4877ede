//! Company handlers: list, create, read, update, delete.

use crate::auth::AdminUser;
use crate::error::AppError;
use crate::models::{CompanyFilter, CompanyUpdate, NewCompany};
use crate::response::{success_deleted, success_many, success_one, success_one_ok};
use crate::service::{body_to_map, company_new_rules, company_update_rules, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::BTreeMap;

pub async fn list_companies(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let filter = CompanyFilter::from_query(&params)?;
    let rows = state.companies.find_all(Some(&filter)).await?;
    Ok(success_many(rows))
}

pub async fn create_company(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let body = body_to_map(body)?;
    RequestValidator::validate(&body, &company_new_rules())?;
    let data: NewCompany = RequestValidator::parse(body)?;
    let company = state.companies.create(&data).await?;
    tracing::info!(handle = %company.handle, by = %admin.subject, "company created");
    Ok(success_one(company))
}

pub async fn read_company(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let company = state.companies.get(&handle).await?;
    Ok(success_one_ok(company))
}

pub async fn update_company(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let body = body_to_map(body)?;
    RequestValidator::reject_immutable(&body, &["handle"])?;
    RequestValidator::validate_partial(&body, &company_update_rules())?;
    let data: CompanyUpdate = RequestValidator::parse(body)?;
    let company = state.companies.update(&handle, &data).await?;
    tracing::info!(handle = %handle, by = %admin.subject, "company updated");
    Ok(success_one_ok(company))
}

pub async fn delete_company(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.companies.remove(&handle).await?;
    tracing::info!(handle = %handle, by = %admin.subject, "company deleted");
    Ok(success_deleted(handle))
}
