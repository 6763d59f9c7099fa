use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{PropertyForm, PropertyView},
    services::{self, ImageUpload, PropertyError, MAX_IMAGE_BYTES},
};
use crate::{
    auth::jwt::AuthUser, error::AppError, state::AppState, validation::FieldError, views::Page,
};

const ADMIN: &str = "propiedades/admin.html";
const CREATE: &str = "propiedades/crear.html";
const ADD_IMAGE: &str = "propiedades/agregar-imagen.html";

pub fn property_routes() -> Router<AppState> {
    Router::new()
        .route("/mis-propiedades", get(admin))
        .route("/propiedades/crear", get(create_page).post(create))
        .route(
            "/propiedades/agregar-imagen/:id",
            get(add_image_page)
                .post(add_image)
                // room for multipart framing around a full-size image
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn admin(State(state): State<AppState>, user: AuthUser) -> Result<Response, AppError> {
    let mut page = Page::new("Mis Propiedades");
    page.nombre_sesion = Some(user.nombre);
    page.propiedades = services::list_for_user(&state, user.id).await?;
    Ok(state.views.render(ADMIN, &page))
}

pub async fn create_page(State(state): State<AppState>, user: AuthUser) -> Response {
    let mut page = Page::new("Crear Propiedad");
    page.nombre_sesion = Some(user.nombre);
    state.views.render(CREATE, &page)
}

#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<PropertyForm>,
) -> Result<Response, AppError> {
    match services::create_property(&state, user.id, &form).await {
        Ok(property) => Ok(
            Redirect::to(&format!("/propiedades/agregar-imagen/{}", property.id)).into_response(),
        ),
        Err(PropertyError::Validation(errores)) => {
            let mut page = Page::new("Crear Propiedad").errors(errores);
            page.nombre_sesion = Some(user.nombre);
            page.datos = Some(form);
            Ok(state.views.render(CREATE, &page))
        }
        Err(err) => Err(AppError::Internal(err.into())),
    }
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add_image_page(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    image_page(&state, user, id, Vec::new()).await
}

async fn image_page(
    state: &AppState,
    user: AuthUser,
    id: Uuid,
    errores: Vec<FieldError>,
) -> Result<Response, AppError> {
    match services::editable_property(state, user.id, id).await {
        Ok(property) => {
            let mut page =
                Page::new(format!("Agregar Imagen: {}", property.titulo)).errors(errores);
            page.nombre_sesion = Some(user.nombre);
            page.propiedad = Some(PropertyView::new(property, None));
            Ok(state.views.render(ADD_IMAGE, &page))
        }
        Err(PropertyError::Internal(e)) => Err(AppError::Internal(e)),
        Err(_) => Ok(Redirect::to("/mis-propiedades").into_response()),
    }
}

#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn add_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut uploads = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "unreadable multipart body");
                return Ok((StatusCode::BAD_REQUEST, e.body_text()).into_response());
            }
        };
        if field.name() != Some("imagen") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let body = match field.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "image upload aborted");
                return Ok((e.status(), e.body_text()).into_response());
            }
        };
        uploads.push(ImageUpload {
            body,
            content_type,
            file_name,
        });
    }

    let result = match services::require_single_image(uploads) {
        Ok(upload) => services::attach_image(&state, user.id, id, upload).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => Ok(Redirect::to("/mis-propiedades").into_response()),
        Err(PropertyError::Validation(errores)) => image_page(&state, user, id, errores).await,
        Err(PropertyError::NotEditable) => Ok(Redirect::to("/mis-propiedades").into_response()),
        Err(PropertyError::Internal(e)) => Err(AppError::Internal(e)),
    }
}
