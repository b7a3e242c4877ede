//! Bearer-token authentication and role gating.
//!
//! Token verification is pluggable through [`TokenVerifier`]; the crate ships [`StaticTokens`],
//! a fixed token table read from configuration.

use crate::error::{AppError, ConfigError};
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::collections::HashMap;

/// Identity carried by a verified token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claims {
    pub subject: String,
    pub is_admin: bool,
}

/// Resolves a bearer token to its claims. `None` means the token is not valid.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<Claims>;
}

/// Fixed table of opaque tokens.
#[derive(Clone, Debug, Default)]
pub struct StaticTokens {
    by_token: HashMap<String, Claims>,
}

impl StaticTokens {
    pub fn new() -> Self {
        StaticTokens {
            by_token: HashMap::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, claims: Claims) -> Self {
        self.by_token.insert(token.into(), claims);
        self
    }

    /// Parse `token=subject:role` entries separated by commas. Role is `admin` or `user`.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let mut tokens = StaticTokens::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (token, rest) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::TokenEntry(entry.to_string()))?;
            let (subject, role) = rest
                .split_once(':')
                .ok_or_else(|| ConfigError::TokenEntry(entry.to_string()))?;
            let is_admin = match role.trim() {
                "admin" => true,
                "user" => false,
                _ => return Err(ConfigError::TokenEntry(entry.to_string())),
            };
            if token.trim().is_empty() || subject.trim().is_empty() {
                return Err(ConfigError::TokenEntry(entry.to_string()));
            }
            tokens = tokens.with_token(
                token.trim(),
                Claims {
                    subject: subject.trim().to_string(),
                    is_admin,
                },
            );
        }
        Ok(tokens)
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}

impl TokenVerifier for StaticTokens {
    fn verify(&self, token: &str) -> Option<Claims> {
        self.by_token.get(token).cloned()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Claims of the caller, if a valid bearer token was sent. Never rejects.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Option<Claims>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_token(parts).and_then(|t| state.tokens.verify(t));
        Ok(CurrentUser(claims))
    }
}

/// A caller holding the admin role. Missing or invalid tokens and non-admin callers are rejected.
#[derive(Clone, Debug)]
pub struct AdminUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(claims) = CurrentUser::from_request_parts(parts, state)
            .await
            .unwrap_or(CurrentUser(None));
        let claims = claims.ok_or_else(|| AppError::Unauthorized("valid bearer token required".into()))?;
        if !claims.is_admin {
            tracing::warn!(subject = %claims.subject, "admin role required");
            return Err(AppError::Forbidden("admin role required".into()));
        }
        Ok(AdminUser(claims))
    }
}
