use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

const USER_COLUMNS: &str = "id, nombre, email, password_hash, confirmado, token, created_at";

/// Persistence for user accounts and their single-use token.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<User>>;

    /// Insert an unconfirmed user. Returns `None` when the email is already taken.
    async fn create(&self, new_user: NewUser) -> anyhow::Result<Option<User>>;

    /// Consume a confirmation token: clears it and marks the account confirmed.
    async fn confirm(&self, token: &str) -> anyhow::Result<Option<User>>;

    /// Issue a new single-use token for a password reset.
    async fn set_token(&self, user_id: Uuid, token: &str) -> anyhow::Result<()>;

    /// Consume a reset token, replacing the password hash.
    async fn reset_password(&self, token: &str, password_hash: &str)
        -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .context("find user by token")?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (nombre, email, password_hash, token)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.nombre)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.token)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn confirm(&self, token: &str) -> anyhow::Result<Option<User>> {
        // Single statement so two clicks on the same link cannot both succeed.
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET token = NULL, confirmado = TRUE
             WHERE token = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .context("confirm user")?;
        Ok(user)
    }

    async fn set_token(&self, user_id: Uuid, token: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET token = $2 WHERE id = $1")
            .bind(user_id)
            .bind(token)
            .execute(&self.db)
            .await
            .context("set user token")?;
        Ok(())
    }

    async fn reset_password(
        &self,
        token: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET token = NULL, password_hash = $2
             WHERE token = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(token)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await
        .context("reset user password")?;
        Ok(user)
    }
}
