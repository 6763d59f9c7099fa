use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::Property;

/// Submitted "new listing" form; also echoed back when rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyForm {
    pub titulo: String,
    pub descripcion: String,
    pub precio: String,
}

/// Property as shown on the listing pages.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyView {
    pub id: Uuid,
    pub titulo: String,
    pub descripcion: String,
    pub precio: i64,
    pub publicado: bool,
    pub imagen_url: Option<String>,
}

impl PropertyView {
    pub fn new(property: Property, imagen_url: Option<String>) -> Self {
        Self {
            id: property.id,
            titulo: property.titulo,
            descripcion: property.descripcion,
            precio: property.precio,
            publicado: property.publicado,
            imagen_url,
        }
    }
}
