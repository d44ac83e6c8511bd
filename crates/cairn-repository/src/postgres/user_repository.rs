//! PostgreSQL user repository implementation.

use crate::{traits::UserRepository, DatabasePoolInterface};
use cairn_core::{CairnResult, Email, NewUser, User, UserId, UserPatch};
use async_trait::async_trait;
use shaku::Component;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

/// PostgreSQL user repository implementation.
#[derive(Component, Clone)]
#[shaku(interface = UserRepository)]
pub struct PgUserRepository {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgUserRepository {
    /// Creates a new PostgreSQL user repository.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user.
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            name: row.name,
            // Stored rows are trusted as-is.
            email: Email::new_unchecked(row.email),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_all(&self) -> CairnResult<Vec<User>> {
        debug!("Loading all users");

        let rows = sqlx::query_as::<_, UserRow>("SELECT id, name, email FROM users ORDER BY id")
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> CairnResult<Vec<User>> {
        debug!("Loading {} users by id", ids.len());

        let ids: Vec<i64> = ids.iter().map(|id| id.into_inner()).collect();
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email FROM users WHERE id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_by_id(&self, id: UserId) -> CairnResult<Option<User>> {
        debug!("Finding user by id: {}", id);

        let row = sqlx::query_as::<_, UserRow>("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(row.map(User::from))
    }

    async fn create(&self, user: NewUser) -> CairnResult<User> {
        debug!("Inserting user: {}", user.email);

        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id, name, email",
        )
        .bind(&user.name)
        .bind(user.email.as_str())
        .fetch_one(self.pool.inner())
        .await?;

        Ok(row.into())
    }

    async fn merge_and_persist(&self, id: UserId, patch: UserPatch) -> CairnResult<Option<User>> {
        debug!("Merging update into user: {}", id);

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email)
            WHERE id = $1
            RETURNING id, name, email
            "#,
        )
        .bind(id.into_inner())
        .bind(patch.name)
        .bind(patch.email.as_ref().map(Email::as_str))
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(User::from))
    }
}
