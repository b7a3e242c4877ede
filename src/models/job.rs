//! Jobs: types, filter shape, and PostgreSQL persistence.

use super::{
    company_not_found, log_query, nullable, parse_bool_param, parse_int_param, unknown_filter,
    Company, COMPANY_COLUMNS,
};
use crate::error::AppError;
use crate::sql::{
    build_set_fragment, build_where_fragment, Criterion, FieldNameMap, FilterCriteria, SqlValue,
    UpdatePayload,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::BTreeMap;

/// Updatable job fields share their column names.
pub const JOB_FIELDS: FieldNameMap<'static> = FieldNameMap::empty();

/// Equity is NUMERIC in storage; read it back as float8.
pub(crate) const JOB_COLUMNS: &str = "id, title, salary, equity::float8 AS equity, company_handle";

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

/// A job with its company, loaded by a second query.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JobDetail {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company: Company,
}

fn check_salary(salary: Option<i32>) -> Result<(), AppError> {
    if salary.is_some_and(|s| s < 0) {
        return Err(AppError::Validation("salary must be at least 0".into()));
    }
    Ok(())
}

fn check_equity(equity: Option<f64>) -> Result<(), AppError> {
    match equity {
        Some(e) if !(0.0..1.0).contains(&e) => Err(AppError::Validation(
            "equity must be at least 0 and less than 1".into(),
        )),
        _ => Ok(()),
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<f64>,
    pub company_handle: String,
}

impl NewJob {
    pub fn check(&self) -> Result<(), AppError> {
        if self.title.is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        check_salary(self.salary)?;
        check_equity(self.equity)
    }
}

/// Partial update. Neither the id nor the owning company can change.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub equity: Option<Option<f64>>,
}

impl JobUpdate {
    pub fn check(&self) -> Result<(), AppError> {
        check_salary(self.salary.flatten())?;
        check_equity(self.equity.flatten())
    }

    pub fn to_payload(&self) -> UpdatePayload {
        let mut payload = UpdatePayload::new();
        if let Some(title) = &self.title {
            payload.set("title", title.clone());
        }
        if let Some(salary) = self.salary {
            payload.set("salary", salary);
        }
        if let Some(equity) = self.equity {
            payload.set("equity", equity);
        }
        payload
    }
}

/// Query-string filter for listing jobs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobFilter {
    pub title: Option<String>,
    pub min_salary: Option<i64>,
    pub has_equity: Option<bool>,
}

impl JobFilter {
    /// Parse `title`, `minSalary`, `hasEquity`. Any other key is rejected.
    pub fn from_query(params: &BTreeMap<String, String>) -> Result<Self, AppError> {
        let mut filter = JobFilter::default();
        for (k, v) in params {
            match k.as_str() {
                "title" => filter.title = Some(v.clone()),
                "minSalary" => filter.min_salary = Some(parse_int_param(k, v)?),
                "hasEquity" => filter.has_equity = Some(parse_bool_param(k, v)?),
                _ => return Err(unknown_filter(k)),
            }
        }
        Ok(filter)
    }
}

impl FilterCriteria for JobFilter {
    fn criteria(&self) -> Vec<Criterion> {
        let mut out = Vec::new();
        if let Some(title) = &self.title {
            out.push(Criterion::Contains { column: "title", text: title.clone() });
        }
        if let Some(n) = self.min_salary {
            out.push(Criterion::AtLeast { column: "salary", value: SqlValue::from(n) });
        }
        if let Some(enabled) = self.has_equity {
            out.push(Criterion::Flag { predicate: "equity > 0", enabled });
        }
        out
    }
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, data: &NewJob) -> Result<Job, AppError>;
    async fn find_all(&self, filter: Option<&JobFilter>) -> Result<Vec<Job>, AppError>;
    async fn get(&self, id: i32) -> Result<JobDetail, AppError>;
    async fn update(&self, id: i32, data: &JobUpdate) -> Result<Job, AppError>;
    async fn remove(&self, id: i32) -> Result<(), AppError>;
}

pub fn job_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("no job: {}", id))
}

/// Jobs stored in PostgreSQL.
#[derive(Clone)]
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        PgJobRepository { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn create(&self, data: &NewJob) -> Result<Job, AppError> {
        data.check()?;
        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) VALUES ($1, $2, $3, $4) RETURNING {}",
            JOB_COLUMNS
        );
        tracing::debug!(sql = %sql, company_handle = %data.company_handle, "query");
        sqlx::query_as::<_, Job>(&sql)
            .bind(&data.title)
            .bind(data.salary)
            .bind(data.equity)
            .bind(&data.company_handle)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let missing_company =
                    e.as_database_error().and_then(|d| d.code()).as_deref() == Some("23503");
                if missing_company {
                    AppError::Validation(format!("company not found: {}", data.company_handle))
                } else {
                    AppError::from_db(e)
                }
            })
    }

    async fn find_all(&self, filter: Option<&JobFilter>) -> Result<Vec<Job>, AppError> {
        let frag = build_where_fragment(filter)?;
        let mut sql = format!("SELECT {} FROM jobs", JOB_COLUMNS);
        if !frag.where_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&frag.where_clause);
        }
        sql.push_str(" ORDER BY title, id");
        log_query(&sql, &frag.values);
        let mut query = sqlx::query_as::<_, Job>(&sql);
        for v in &frag.values {
            query = query.bind(v.clone());
        }
        query.fetch_all(&self.pool).await.map_err(AppError::from_db)
    }

    async fn get(&self, id: i32) -> Result<JobDetail, AppError> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        tracing::debug!(sql = %sql, id, "query");
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| job_not_found(id))?;

        let company_sql = format!("SELECT {} FROM companies WHERE handle = $1", COMPANY_COLUMNS);
        tracing::debug!(sql = %company_sql, handle = %job.company_handle, "query");
        let company = sqlx::query_as::<_, Company>(&company_sql)
            .bind(&job.company_handle)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| company_not_found(&job.company_handle))?;

        Ok(JobDetail {
            id: job.id,
            title: job.title,
            salary: job.salary,
            equity: job.equity,
            company,
        })
    }

    async fn update(&self, id: i32, data: &JobUpdate) -> Result<Job, AppError> {
        data.check()?;
        let set = build_set_fragment(&data.to_payload(), &JOB_FIELDS)?;
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING {}",
            set.column_assignments,
            set.values.len() + 1,
            JOB_COLUMNS
        );
        log_query(&sql, &set.values);
        let mut query = sqlx::query_as::<_, Job>(&sql);
        for v in &set.values {
            query = query.bind(v.clone());
        }
        query
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)?
            .ok_or_else(|| job_not_found(id))
    }

    async fn remove(&self, id: i32) -> Result<(), AppError> {
        let sql = "DELETE FROM jobs WHERE id = $1 RETURNING id";
        tracing::debug!(sql = %sql, id, "query");
        sqlx::query_scalar::<_, i32>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| job_not_found(id))?;
        Ok(())
    }
}
