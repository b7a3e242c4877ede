//! Companies: types, filter shape, and PostgreSQL persistence.

use super::{log_query, nullable, parse_int_param, unknown_filter, Job, JOB_COLUMNS};
use crate::error::AppError;
use crate::sql::{
    build_set_fragment, build_where_fragment, Criterion, FieldNameMap, FilterCriteria, SqlValue,
    UpdatePayload,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::BTreeMap;

pub const COMPANY_FIELDS: FieldNameMap<'static> =
    FieldNameMap::new(&[("numEmployees", "num_employees"), ("logoUrl", "logo_url")]);

pub(crate) const COMPANY_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// A company with the jobs it posts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub num_employees: Option<i32>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl NewCompany {
    pub fn check(&self) -> Result<(), AppError> {
        if self.handle.is_empty() || self.name.is_empty() {
            return Err(AppError::Validation("handle and name must not be empty".into()));
        }
        if self.num_employees.is_some_and(|n| n < 0) {
            return Err(AppError::Validation("numEmployees must be at least 0".into()));
        }
        Ok(())
    }
}

/// Partial update. The handle is immutable and not part of this shape.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub num_employees: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub logo_url: Option<Option<String>>,
}

impl CompanyUpdate {
    pub fn check(&self) -> Result<(), AppError> {
        if self.num_employees.flatten().is_some_and(|n| n < 0) {
            return Err(AppError::Validation("numEmployees must be at least 0".into()));
        }
        Ok(())
    }

    /// Fields present in this update, keyed by API name, in declared order.
    pub fn to_payload(&self) -> UpdatePayload {
        let mut payload = UpdatePayload::new();
        if let Some(name) = &self.name {
            payload.set("name", name.clone());
        }
        if let Some(description) = &self.description {
            payload.set("description", description.clone());
        }
        if let Some(n) = self.num_employees {
            payload.set("numEmployees", n);
        }
        if let Some(url) = &self.logo_url {
            payload.set("logoUrl", url.clone());
        }
        payload
    }
}

/// Query-string filter for listing companies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompanyFilter {
    pub name: Option<String>,
    pub min_employees: Option<i64>,
    pub max_employees: Option<i64>,
}

impl CompanyFilter {
    /// Parse `name`, `minEmployees`, `maxEmployees`. Any other key is rejected.
    pub fn from_query(params: &BTreeMap<String, String>) -> Result<Self, AppError> {
        let mut filter = CompanyFilter::default();
        for (k, v) in params {
            match k.as_str() {
                "name" => filter.name = Some(v.clone()),
                "minEmployees" => filter.min_employees = Some(parse_int_param(k, v)?),
                "maxEmployees" => filter.max_employees = Some(parse_int_param(k, v)?),
                _ => return Err(unknown_filter(k)),
            }
        }
        Ok(filter)
    }
}

impl FilterCriteria for CompanyFilter {
    fn criteria(&self) -> Vec<Criterion> {
        let mut out = Vec::new();
        if let Some(name) = &self.name {
            out.push(Criterion::Contains { column: "name", text: name.clone() });
        }
        if let Some(n) = self.min_employees {
            out.push(Criterion::AtLeast { column: "num_employees", value: SqlValue::from(n) });
        }
        if let Some(n) = self.max_employees {
            out.push(Criterion::AtMost { column: "num_employees", value: SqlValue::from(n) });
        }
        out
    }
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn create(&self, data: &NewCompany) -> Result<Company, AppError>;
    async fn find_all(&self, filter: Option<&CompanyFilter>) -> Result<Vec<Company>, AppError>;
    async fn get(&self, handle: &str) -> Result<CompanyDetail, AppError>;
    async fn update(&self, handle: &str, data: &CompanyUpdate) -> Result<Company, AppError>;
    async fn remove(&self, handle: &str) -> Result<(), AppError>;
}

pub fn company_not_found(handle: &str) -> AppError {
    AppError::NotFound(format!("no company: {}", handle))
}

/// Names the unique column a create collided on.
fn duplicate_company(constraint: Option<&str>, data: &NewCompany) -> AppError {
    match constraint {
        Some("companies_name_key") => AppError::Conflict(format!("duplicate company name: {}", data.name)),
        _ => AppError::Conflict(format!("duplicate company: {}", data.handle)),
    }
}

/// Companies stored in PostgreSQL.
#[derive(Clone)]
pub struct PgCompanyRepository {
    pool: PgPool,
}

impl PgCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        PgCompanyRepository { pool }
    }
}

#[async_trait]
impl CompanyRepository for PgCompanyRepository {
    async fn create(&self, data: &NewCompany) -> Result<Company, AppError> {
        data.check()?;
        let sql = format!(
            "INSERT INTO companies ({cols}) VALUES ($1, $2, $3, $4, $5) RETURNING {cols}",
            cols = COMPANY_COLUMNS
        );
        tracing::debug!(sql = %sql, handle = %data.handle, "query");
        sqlx::query_as::<_, Company>(&sql)
            .bind(&data.handle)
            .bind(&data.name)
            .bind(&data.description)
            .bind(data.num_employees)
            .bind(&data.logo_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let constraint = e
                    .as_database_error()
                    .and_then(|d| d.constraint())
                    .map(str::to_string);
                match AppError::from_db(e) {
                    AppError::Conflict(_) => duplicate_company(constraint.as_deref(), data),
                    other => other,
                }
            })
    }

    async fn find_all(&self, filter: Option<&CompanyFilter>) -> Result<Vec<Company>, AppError> {
        let frag = build_where_fragment(filter)?;
        let mut sql = format!("SELECT {} FROM companies", COMPANY_COLUMNS);
        if !frag.where_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&frag.where_clause);
        }
        sql.push_str(" ORDER BY name, handle");
        log_query(&sql, &frag.values);
        let mut query = sqlx::query_as::<_, Company>(&sql);
        for v in &frag.values {
            query = query.bind(v.clone());
        }
        query.fetch_all(&self.pool).await.map_err(AppError::from_db)
    }

    async fn get(&self, handle: &str) -> Result<CompanyDetail, AppError> {
        let sql = format!("SELECT {} FROM companies WHERE handle = $1", COMPANY_COLUMNS);
        tracing::debug!(sql = %sql, handle = %handle, "query");
        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(handle)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| company_not_found(handle))?;

        let jobs_sql = format!("SELECT {} FROM jobs WHERE company_handle = $1 ORDER BY id", JOB_COLUMNS);
        tracing::debug!(sql = %jobs_sql, handle = %handle, "query");
        let jobs = sqlx::query_as::<_, Job>(&jobs_sql)
            .bind(handle)
            .fetch_all(&self.pool)
            .await?;
        Ok(CompanyDetail { company, jobs })
    }

    async fn update(&self, handle: &str, data: &CompanyUpdate) -> Result<Company, AppError> {
        data.check()?;
        let set = build_set_fragment(&data.to_payload(), &COMPANY_FIELDS)?;
        let sql = format!(
            "UPDATE companies SET {} WHERE handle = ${} RETURNING {}",
            set.column_assignments,
            set.values.len() + 1,
            COMPANY_COLUMNS
        );
        log_query(&sql, &set.values);
        let mut query = sqlx::query_as::<_, Company>(&sql);
        for v in &set.values {
            query = query.bind(v.clone());
        }
        query
            .bind(handle)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)?
            .ok_or_else(|| company_not_found(handle))
    }

    async fn remove(&self, handle: &str) -> Result<(), AppError> {
        let sql = "DELETE FROM companies WHERE handle = $1 RETURNING handle";
        tracing::debug!(sql = %sql, handle = %handle, "query");
        sqlx::query_scalar::<_, String>(sql)
            .bind(handle)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| company_not_found(handle))?;
        Ok(())
    }
}
