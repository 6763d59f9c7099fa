use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Property listing owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Property {
    pub id: Uuid,
    pub usuario_id: Uuid,
    pub titulo: String,
    pub descripcion: String,
    pub precio: i64,
    pub imagen: Option<String>, // object key in the image bucket
    pub publicado: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewProperty {
    pub usuario_id: Uuid,
    pub titulo: String,
    pub descripcion: String,
    pub precio: i64,
}
