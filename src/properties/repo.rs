use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewProperty, Property};

const PROPERTY_COLUMNS: &str =
    "id, usuario_id, titulo, descripcion, precio, imagen, publicado, created_at";

#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn list_by_user(&self, usuario_id: Uuid) -> anyhow::Result<Vec<Property>>;

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Property>>;

    async fn create(&self, new_property: NewProperty) -> anyhow::Result<Property>;

    /// Attach the uploaded image and publish the listing.
    async fn publish_with_image(&self, id: Uuid, imagen: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgPropertyStore {
    db: PgPool,
}

impl PgPropertyStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PropertyStore for PgPropertyStore {
    async fn list_by_user(&self, usuario_id: Uuid) -> anyhow::Result<Vec<Property>> {
        let rows = sqlx::query_as::<_, Property>(&format!(
            r#"
            SELECT {PROPERTY_COLUMNS}
              FROM propiedades
             WHERE usuario_id = $1
             ORDER BY created_at DESC
            "#
        ))
        .bind(usuario_id)
        .fetch_all(&self.db)
        .await
        .context("list properties by user")?;
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Property>> {
        let row = sqlx::query_as::<_, Property>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM propiedades WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find property")?;
        Ok(row)
    }

    async fn create(&self, new_property: NewProperty) -> anyhow::Result<Property> {
        let row = sqlx::query_as::<_, Property>(&format!(
            r#"
            INSERT INTO propiedades (usuario_id, titulo, descripcion, precio)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(new_property.usuario_id)
        .bind(&new_property.titulo)
        .bind(&new_property.descripcion)
        .bind(new_property.precio)
        .fetch_one(&self.db)
        .await
        .context("insert property")?;
        Ok(row)
    }

    async fn publish_with_image(&self, id: Uuid, imagen: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE propiedades SET imagen = $2, publicado = TRUE WHERE id = $1")
            .bind(id)
            .bind(imagen)
            .execute(&self.db)
            .await
            .context("publish property")?;
        Ok(())
    }
}
