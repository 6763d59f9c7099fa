use anyhow::Context;
use bytes::Bytes;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    dto::{PropertyForm, PropertyView},
    repo_types::{NewProperty, Property},
};
use crate::{
    state::AppState,
    validation::{is_present, Errors, FieldError},
};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_DESCRIPTION_CHARS: usize = 200;
const PRESIGN_TTL_SECS: u64 = 30 * 60;

pub const MSG_TITLE: &str = "El Titulo del Anuncio es Obligatorio";
pub const MSG_DESCRIPTION: &str = "La Descripción no puede ir vacia";
pub const MSG_DESCRIPTION_LONG: &str = "La Descripción es muy larga";
pub const MSG_PRICE: &str = "Indica un precio válido";
pub const MSG_IMAGE_MISSING: &str = "Sube una imagen de la propiedad";
pub const MSG_IMAGE_TYPE: &str = "Solo se permiten imágenes .png, .jpg o .jpeg";
pub const MSG_IMAGE_SIZE: &str = "La imagen no puede pesar más de 5MB";
pub const MSG_IMAGE_COUNT: &str = "El límite es 1 archivo";

#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    #[error("invalid form")]
    Validation(Vec<FieldError>),
    /// Missing, already published, or owned by someone else.
    #[error("property not editable")]
    NotEditable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// One uploaded file from the `imagen` multipart field.
pub struct ImageUpload {
    pub body: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

pub fn validate_property(form: &PropertyForm) -> Result<i64, Vec<FieldError>> {
    let precio = form.precio.trim().parse::<i64>().ok().filter(|p| *p > 0);
    let mut errors = Errors::default();
    errors
        .check(is_present(&form.titulo), "titulo", MSG_TITLE)
        .check(is_present(&form.descripcion), "descripcion", MSG_DESCRIPTION)
        .check(
            form.descripcion.chars().count() <= MAX_DESCRIPTION_CHARS,
            "descripcion",
            MSG_DESCRIPTION_LONG,
        )
        .check(precio.is_some(), "precio", MSG_PRICE);
    let errors = errors.into_vec();
    match precio {
        Some(precio) if errors.is_empty() => Ok(precio),
        _ => Err(errors),
    }
}

pub async fn create_property(
    state: &AppState,
    usuario_id: Uuid,
    form: &PropertyForm,
) -> Result<Property, PropertyError> {
    let precio = validate_property(form).map_err(PropertyError::Validation)?;
    let property = state
        .properties
        .create(NewProperty {
            usuario_id,
            titulo: form.titulo.trim().to_string(),
            descripcion: form.descripcion.trim().to_string(),
            precio,
        })
        .await?;
    info!(property_id = %property.id, %usuario_id, "property created");
    Ok(property)
}

pub async fn list_for_user(state: &AppState, usuario_id: Uuid) -> anyhow::Result<Vec<PropertyView>> {
    let rows = state.properties.list_by_user(usuario_id).await?;
    let mut out = Vec::with_capacity(rows.len());
    for property in rows {
        let url = match property.imagen.as_deref() {
            Some(key) => Some(state.storage.presign_get(key, PRESIGN_TTL_SECS).await?),
            None => None,
        };
        out.push(PropertyView::new(property, url));
    }
    Ok(out)
}

/// The caller's unpublished property, ready for its image.
pub async fn editable_property(
    state: &AppState,
    usuario_id: Uuid,
    id: Uuid,
) -> Result<Property, PropertyError> {
    match state.properties.find(id).await? {
        Some(p) if p.usuario_id == usuario_id && !p.publicado => Ok(p),
        Some(_) => {
            warn!(property_id = %id, %usuario_id, "property not editable by user");
            Err(PropertyError::NotEditable)
        }
        None => Err(PropertyError::NotEditable),
    }
}

/// Store the image and publish the listing. Returns the object key.
pub async fn attach_image(
    state: &AppState,
    usuario_id: Uuid,
    id: Uuid,
    upload: ImageUpload,
) -> Result<String, PropertyError> {
    let property = editable_property(state, usuario_id, id).await?;

    let Some(ext) = image_extension(upload.content_type.as_deref(), upload.file_name.as_deref())
    else {
        return Err(PropertyError::Validation(vec![FieldError::new(
            "imagen",
            MSG_IMAGE_TYPE,
        )]));
    };
    if upload.body.len() > MAX_IMAGE_BYTES {
        return Err(PropertyError::Validation(vec![FieldError::new(
            "imagen",
            MSG_IMAGE_SIZE,
        )]));
    }

    let content_type = if ext == "png" { "image/png" } else { "image/jpeg" };
    let key = format!("propiedades/{}/{}.{}", usuario_id, property.id, ext);
    state
        .storage
        .put_object(&key, upload.body, content_type)
        .await?;

    if let Err(e) = state.properties.publish_with_image(property.id, &key).await {
        if let Err(cleanup) = state.storage.delete_object(&key).await {
            error!(error = %cleanup, key = %key, "orphaned image after failed publish");
        }
        return Err(PropertyError::Internal(e.context("publish after upload")));
    }
    info!(property_id = %property.id, key = %key, "property published");
    Ok(key)
}

fn image_extension(content_type: Option<&str>, file_name: Option<&str>) -> Option<&'static str> {
    let from_mime = match content_type {
        Some("image/jpeg") | Some("image/jpg") => Some("jpg"),
        Some("image/png") => Some("png"),
        _ => None,
    };
    from_mime.or_else(|| {
        let name = file_name?.to_ascii_lowercase();
        let (_, ext) = name.rsplit_once('.')?;
        match ext {
            "jpg" | "jpeg" => Some("jpg"),
            "png" => Some("png"),
            _ => None,
        }
    })
}

/// Exactly one file must arrive in the `imagen` field.
pub fn require_single_image(mut uploads: Vec<ImageUpload>) -> Result<ImageUpload, PropertyError> {
    match uploads.len() {
        0 => Err(PropertyError::Validation(vec![FieldError::new(
            "imagen",
            MSG_IMAGE_MISSING,
        )])),
        1 => uploads
            .pop()
            .context("single upload")
            .map_err(PropertyError::Internal),
        _ => Err(PropertyError::Validation(vec![FieldError::new(
            "imagen",
            MSG_IMAGE_COUNT,
        )])),
    }
}
