//! Shared application state for all routes: injected persistence services and token verifier.

use crate::auth::TokenVerifier;
use crate::models::{CompanyRepository, JobRepository, PgCompanyRepository, PgJobRepository};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Used by readiness checks; `None` when repositories are not database-backed.
    pub pool: Option<PgPool>,
    pub companies: Arc<dyn CompanyRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub tokens: Arc<dyn TokenVerifier>,
}

impl AppState {
    /// State backed by PostgreSQL repositories sharing one pool.
    pub fn postgres(pool: PgPool, tokens: Arc<dyn TokenVerifier>) -> Self {
        AppState {
            companies: Arc::new(PgCompanyRepository::new(pool.clone())),
            jobs: Arc::new(PgJobRepository::new(pool.clone())),
            pool: Some(pool),
            tokens,
        }
    }
}
