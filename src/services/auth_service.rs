//! Domain service for API token verification and issuance.

use serde::Serialize;
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No authorization header")]
    MissingCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// The caller a token resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: i32,
    pub username: String,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Resolves a bearer token to its owner.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] when no user holds the token.
    async fn verify_token(&self, token: &str) -> Result<Principal, AuthError>;

    /// Creates `username` if needed and gives it a fresh token, which
    /// replaces any previous one.
    async fn issue_token(&self, username: &str) -> Result<String, AuthError>;
}
