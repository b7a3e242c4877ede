//! Jobly: companies and jobs REST backend library.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod response;
pub mod sql;
pub mod state;
pub mod service;
pub mod handlers;
pub mod routes;

pub use auth::{AdminUser, Claims, CurrentUser, StaticTokens, TokenVerifier};
pub use config::AppConfig;
pub use error::{AppError, ConfigError};
pub use models::{
    Company, CompanyDetail, CompanyFilter, CompanyRepository, CompanyUpdate, Job, JobDetail, JobFilter,
    JobRepository, JobUpdate, NewCompany, NewJob, PgCompanyRepository, PgJobRepository,
};
pub use response::{success_many, success_one, success_one_ok};
pub use routes::{app, common_routes, company_routes, job_routes};
pub use sql::{build_set_fragment, build_where_fragment, FieldNameMap, SetFragment, SqlValue, UpdatePayload, WhereFragment};
pub use state::AppState;
