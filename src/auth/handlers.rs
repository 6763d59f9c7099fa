use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::instrument;

use crate::{
    auth::{
        dto::{FormEcho, ForgotPasswordForm, LoginForm, NewPasswordForm, RegisterForm},
        jwt::SESSION_COOKIE,
        services::{self, AuthError},
    },
    error::AppError,
    state::AppState,
    views::Page,
};

const LOGIN: &str = "auth/login.html";
const REGISTER: &str = "auth/registro.html";
const CONFIRM: &str = "auth/confirmar-cuenta.html";
const FORGOT: &str = "auth/olvide-password.html";
const RESET: &str = "auth/reset-password.html";
const MESSAGE: &str = "templates/mensaje.html";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/cerrar-sesion", post(logout))
        .route("/registro", get(register_page).post(register))
        .route("/confirmar/:token", get(confirm))
        .route(
            "/olvide-password",
            get(forgot_password_page).post(forgot_password),
        )
        .route(
            "/olvide-password/:token",
            get(check_reset_token).post(new_password),
        )
}

/// Re-render `template` with the failure, or escalate internal errors.
fn render_failure(
    state: &AppState,
    template: &str,
    page: Page,
    err: AuthError,
) -> Result<Response, AppError> {
    match err {
        AuthError::Validation(errores) => Ok(state.views.render(template, &page.errors(errores))),
        AuthError::Rejected(message) => {
            Ok(state.views.render(template, &page.error_message(message)))
        }
        AuthError::Internal(e) => Err(AppError::Internal(e)),
    }
}

pub async fn login_page(State(state): State<AppState>) -> Response {
    state.views.render(LOGIN, &Page::new("Iniciar sesión"))
}

#[instrument(skip(state, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match services::authenticate(&state, &form).await {
        Ok((_, token)) => {
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .secure(state.config.cookie_secure);
            Ok((jar.add(cookie), Redirect::to("/mis-propiedades")).into_response())
        }
        Err(err) => render_failure(&state, LOGIN, Page::new("Iniciar sesión"), err),
    }
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> Response {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/auth/login")).into_response()
}

pub async fn register_page(State(state): State<AppState>) -> Response {
    state.views.render(REGISTER, &Page::new("Crear Cuenta"))
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    match services::register(&state, &form).await {
        Ok(_) => Ok(state.views.render(
            MESSAGE,
            &Page::new("Cuenta Creada Correctamente")
                .message("Hemos enviado un correo electrónico para confirmar tu cuenta"),
        )),
        Err(err) => {
            let mut page = Page::new("Crear Cuenta");
            page.usuario = Some(FormEcho::from(&form));
            render_failure(&state, REGISTER, page, err)
        }
    }
}

#[instrument(skip(state, token))]
pub async fn confirm(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    match services::confirm(&state, &token).await {
        Ok(_) => Ok(state.views.render(
            CONFIRM,
            &Page::new("Cuenta confirmada").message("La cuenta se ha confirmado correctamente"),
        )),
        Err(AuthError::Rejected(message)) => Ok(state.views.render(
            CONFIRM,
            &Page::new("Error al confirmar tu cuenta")
                .message(message)
                .failed(),
        )),
        Err(err) => render_failure(&state, CONFIRM, Page::new("Error al confirmar tu cuenta"), err),
    }
}

pub async fn forgot_password_page(State(state): State<AppState>) -> Response {
    state
        .views
        .render(FORGOT, &Page::new("Restablecer Contraseña"))
}

#[instrument(skip(state, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, AppError> {
    match services::request_password_reset(&state, &form).await {
        Ok(_) => Ok(state.views.render(
            MESSAGE,
            &Page::new("Restablecer Contraseña").message(
                "Hemos enviado un correo electrónico con las instrucciones para restablecer tu contraseña",
            ),
        )),
        Err(err) => render_failure(&state, FORGOT, Page::new("Restablecer Contraseña"), err),
    }
}

#[instrument(skip(state, token))]
pub async fn check_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    match services::check_reset_token(&state, &token).await {
        Ok(_) => Ok(state
            .views
            .render(RESET, &Page::new("Restablecer contraseña"))),
        Err(AuthError::Rejected(message)) => Ok(state.views.render(
            CONFIRM,
            &Page::new("Restablecer Contraseña").message(message).failed(),
        )),
        Err(err) => render_failure(&state, CONFIRM, Page::new("Restablecer Contraseña"), err),
    }
}

#[instrument(skip(state, token, form))]
pub async fn new_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<NewPasswordForm>,
) -> Result<Response, AppError> {
    match services::set_new_password(&state, &token, &form).await {
        Ok(_) => Ok(state.views.render(
            CONFIRM,
            &Page::new("Contraseña restablecida").message("La contraseña se cambió correctamente"),
        )),
        Err(AuthError::Rejected(message)) => Ok(state.views.render(
            CONFIRM,
            &Page::new("Restablecer Contraseña").message(message).failed(),
        )),
        Err(err) => render_failure(&state, RESET, Page::new("Restablecer contraseña"), err),
    }
}
