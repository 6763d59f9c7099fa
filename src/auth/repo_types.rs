use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub nombre: String,
    pub email: String, // unique, normalized
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub confirmado: bool,
    #[serde(skip_serializing)]
    pub token: Option<String>, // pending confirmation or reset
    pub created_at: OffsetDateTime,
}

/// Values needed to insert a fresh, unconfirmed user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub nombre: String,
    pub email: String,
    pub password_hash: String,
    pub token: String,
}
