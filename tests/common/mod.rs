#![allow(dead_code)]

//! In-memory repositories and request helpers for router tests.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, Method, Request, StatusCode,
    },
    Router,
};
use jobly::models::{company_not_found, job_not_found, COMPANY_FIELDS, JOB_FIELDS};
use jobly::{
    app, build_set_fragment, build_where_fragment, AppError, AppState, Claims, Company,
    CompanyDetail, CompanyFilter, CompanyRepository, CompanyUpdate, Job, JobDetail, JobFilter,
    JobRepository, JobUpdate, NewCompany, NewJob, StaticTokens,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const USER_TOKEN: &str = "user-token";

/// Companies and jobs kept in memory, mirroring the PostgreSQL repositories' contracts.
#[derive(Default)]
pub struct MemoryDb {
    companies: Mutex<Vec<Company>>,
    jobs: Mutex<Vec<Job>>,
    next_job_id: Mutex<i32>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl CompanyRepository for MemoryDb {
    async fn create(&self, data: &NewCompany) -> Result<Company, AppError> {
        data.check()?;
        let mut companies = self.companies.lock().unwrap();
        if companies.iter().any(|c| c.handle == data.handle) {
            return Err(AppError::Conflict(format!("duplicate company: {}", data.handle)));
        }
        if companies.iter().any(|c| c.name == data.name) {
            return Err(AppError::Conflict(format!("duplicate company name: {}", data.name)));
        }
        let company = Company {
            handle: data.handle.clone(),
            name: data.name.clone(),
            description: data.description.clone(),
            num_employees: data.num_employees,
            logo_url: data.logo_url.clone(),
        };
        companies.push(company.clone());
        Ok(company)
    }

    async fn find_all(&self, filter: Option<&CompanyFilter>) -> Result<Vec<Company>, AppError> {
        build_where_fragment(filter)?;
        let f = filter.cloned().unwrap_or_default();
        let mut rows: Vec<Company> = self
            .companies
            .lock()
            .unwrap()
            .iter()
            .filter(|c| f.name.as_deref().map_or(true, |n| contains_ci(&c.name, n)))
            .filter(|c| {
                f.min_employees
                    .map_or(true, |min| c.num_employees.is_some_and(|n| i64::from(n) >= min))
            })
            .filter(|c| {
                f.max_employees
                    .map_or(true, |max| c.num_employees.is_some_and(|n| i64::from(n) <= max))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.handle.cmp(&b.handle)));
        Ok(rows)
    }

    async fn get(&self, handle: &str) -> Result<CompanyDetail, AppError> {
        let company = self
            .companies
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.handle == handle)
            .cloned()
            .ok_or_else(|| company_not_found(handle))?;
        let mut jobs: Vec<Job> = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.company_handle == handle)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.id);
        Ok(CompanyDetail { company, jobs })
    }

    async fn update(&self, handle: &str, data: &CompanyUpdate) -> Result<Company, AppError> {
        data.check()?;
        build_set_fragment(&data.to_payload(), &COMPANY_FIELDS)?;
        let mut companies = self.companies.lock().unwrap();
        let company = companies
            .iter_mut()
            .find(|c| c.handle == handle)
            .ok_or_else(|| company_not_found(handle))?;
        if let Some(name) = &data.name {
            company.name = name.clone();
        }
        if let Some(description) = &data.description {
            company.description = description.clone();
        }
        if let Some(n) = data.num_employees {
            company.num_employees = n;
        }
        if let Some(url) = &data.logo_url {
            company.logo_url = url.clone();
        }
        Ok(company.clone())
    }

    async fn remove(&self, handle: &str) -> Result<(), AppError> {
        let mut companies = self.companies.lock().unwrap();
        let before = companies.len();
        companies.retain(|c| c.handle != handle);
        if companies.len() == before {
            return Err(company_not_found(handle));
        }
        self.jobs.lock().unwrap().retain(|j| j.company_handle != handle);
        Ok(())
    }
}

#[async_trait]
impl JobRepository for MemoryDb {
    async fn create(&self, data: &NewJob) -> Result<Job, AppError> {
        data.check()?;
        if !self
            .companies
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.handle == data.company_handle)
        {
            return Err(AppError::Validation(format!(
                "company not found: {}",
                data.company_handle
            )));
        }
        let mut next = self.next_job_id.lock().unwrap();
        *next += 1;
        let job = Job {
            id: *next,
            title: data.title.clone(),
            salary: data.salary,
            equity: data.equity,
            company_handle: data.company_handle.clone(),
        };
        self.jobs.lock().unwrap().push(job.clone());
        Ok(job)
    }

    async fn find_all(&self, filter: Option<&JobFilter>) -> Result<Vec<Job>, AppError> {
        build_where_fragment(filter)?;
        let f = filter.cloned().unwrap_or_default();
        let mut rows: Vec<Job> = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| f.title.as_deref().map_or(true, |t| contains_ci(&j.title, t)))
            .filter(|j| {
                f.min_salary
                    .map_or(true, |min| j.salary.is_some_and(|s| i64::from(s) >= min))
            })
            .filter(|j| f.has_equity != Some(true) || j.equity.is_some_and(|e| e > 0.0))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn get(&self, id: i32) -> Result<JobDetail, AppError> {
        let job = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .ok_or_else(|| job_not_found(id))?;
        let company = self
            .companies
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.handle == job.company_handle)
            .cloned()
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
        build_set_fragment(&data.to_payload(), &JOB_FIELDS)?;
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| job_not_found(id))?;
        if let Some(title) = &data.title {
            job.title = title.clone();
        }
        if let Some(salary) = data.salary {
            job.salary = salary;
        }
        if let Some(equity) = data.equity {
            job.equity = equity;
        }
        Ok(job.clone())
    }

    async fn remove(&self, id: i32) -> Result<(), AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        if jobs.len() == before {
            return Err(job_not_found(id));
        }
        Ok(())
    }
}

fn new_company(handle: &str, name: &str, employees: i32) -> NewCompany {
    NewCompany {
        handle: handle.into(),
        name: name.into(),
        description: format!("Desc{}", employees),
        num_employees: Some(employees),
        logo_url: Some(format!("http://{}.img", handle)),
    }
}

fn new_job(title: &str, salary: Option<i32>, equity: Option<f64>) -> NewJob {
    NewJob {
        title: title.into(),
        salary,
        equity,
        company_handle: "c1".into(),
    }
}

/// Three companies (c1..c3, 1..3 employees) and four jobs at c1 with ids 1..4.
pub async fn seeded_db() -> Arc<MemoryDb> {
    let db = Arc::new(MemoryDb::default());
    for (handle, name, n) in [("c1", "C1", 1), ("c2", "C2", 2), ("c3", "C3", 3)] {
        CompanyRepository::create(&*db, &new_company(handle, name, n)).await.unwrap();
    }
    for job in [
        new_job("Job1", Some(100), Some(0.1)),
        new_job("Job2", Some(200), Some(0.2)),
        new_job("Job3", Some(300), Some(0.0)),
        new_job("Job4", None, None),
    ] {
        JobRepository::create(&*db, &job).await.unwrap();
    }
    db
}

pub fn tokens() -> StaticTokens {
    StaticTokens::new()
        .with_token(ADMIN_TOKEN, Claims { subject: "admin".into(), is_admin: true })
        .with_token(USER_TOKEN, Claims { subject: "u1".into(), is_admin: false })
}

pub async fn test_app() -> Router {
    let db = seeded_db().await;
    let state = AppState {
        pool: None,
        companies: db.clone(),
        jobs: db,
        tokens: Arc::new(tokens()),
    };
    app(state, 64 * 1024)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", t));
    }
    let req = match body {
        Some(b) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse { status, headers, body }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None, None).await
}
