//! `SeaORM` implementation of the `AuthService` trait.

use crate::db::Store;
use crate::services::auth_service::{AuthError, AuthService, Principal};

pub struct SeaOrmAuthService {
    store: Store,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl AuthService for SeaOrmAuthService {
    async fn verify_token(&self, token: &str) -> Result<Principal, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let user = self
            .store
            .verify_api_key(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(Principal {
            user_id: user.id,
            username: user.username,
        })
    }

    async fn issue_token(&self, username: &str) -> Result<String, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("Username cannot be empty".to_string()));
        }

        Ok(self.store.issue_user_api_key(username).await?)
    }
}
