use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::users;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub api_key: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            api_key: model.api_key,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Verify API key and return the associated user
    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        if api_key.is_empty() {
            return Ok(None);
        }

        let user = users::Entity::find()
            .filter(users::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await
            .context("Failed to query user by API key")?;

        Ok(user.map(User::from))
    }

    /// Creates the user if needed, otherwise rotates its key. Returns the new key.
    pub async fn issue_api_key(&self, username: &str) -> Result<String> {
        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for API key issue")?;

        let new_api_key = generate_api_key();
        let now = chrono::Utc::now().to_rfc3339();

        if let Some(user) = existing {
            let mut active: users::ActiveModel = user.into();
            active.api_key = Set(new_api_key.clone());
            active.updated_at = Set(now);
            active.update(&self.conn).await?;
        } else {
            let active = users::ActiveModel {
                username: Set(username.to_string()),
                api_key: Set(new_api_key.clone()),
                created_at: Set(now.clone()),
                updated_at: Set(now),
                ..Default::default()
            };
            active.insert(&self.conn).await?;
        }

        Ok(new_api_key)
    }
}

/// Generate a random API key (64 character hex string)
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::db::migrator::DEFAULT_API_KEY;

    #[tokio::test]
    async fn test_seeded_admin_key_verifies() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let repo = UserRepository::new(store.conn);

        let user = repo.verify_api_key(DEFAULT_API_KEY).await.unwrap().unwrap();
        assert_eq!(user.username, "admin");
        assert!(repo.verify_api_key("").await.unwrap().is_none());
        assert!(repo.verify_api_key("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_issue_rotates_existing_and_creates_new() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let repo = UserRepository::new(store.conn);

        let rotated = repo.issue_api_key("admin").await.unwrap();
        assert_eq!(rotated.len(), 64);
        assert!(repo.verify_api_key(DEFAULT_API_KEY).await.unwrap().is_none());
        assert_eq!(
            repo.verify_api_key(&rotated).await.unwrap().unwrap().username,
            "admin"
        );

        let fresh = repo.issue_api_key("field-agent").await.unwrap();
        assert_ne!(fresh, rotated);
        assert!(repo.get_by_username("field-agent").await.unwrap().is_some());
    }
}
