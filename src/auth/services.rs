use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::{ForgotPasswordForm, LoginForm, NewPasswordForm, RegisterForm},
        jwt::JwtKeys,
        password::{generate_token, hash_password, verify_password},
        repo_types::{NewUser, User},
        validation::{
            validate_forgot_password, validate_login, validate_new_password, validate_register,
        },
    },
    mail::{password_reset_email, registration_email},
    state::AppState,
    validation::{normalize_email, FieldError},
};

pub const MSG_UNKNOWN_USER: &str = "El usuario no existe";
pub const MSG_UNCONFIRMED: &str = "Tu cuenta no ha sido confirmada, revisa tu correo electrónico";
pub const MSG_WRONG_PASSWORD: &str = "La contraseña es incorrecta";
pub const MSG_ALREADY_REGISTERED: &str = "El usuario ya esta registrado";
pub const MSG_INVALID_TOKEN: &str = "El token no es valido, solicita uno nuevo";
pub const MSG_UNKNOWN_EMAIL: &str = "El email no pertenece a ningún usuario";
pub const MSG_RESET_TOKEN: &str = "Hubo un error al validar tu información, intenta de nuevo";

/// Why an account operation did not go through.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid form")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    Rejected(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Check credentials and issue a session token for the cookie.
pub async fn authenticate(state: &AppState, form: &LoginForm) -> Result<(User, String), AuthError> {
    let errors = validate_login(form);
    if !errors.is_empty() {
        return Err(AuthError::Validation(errors));
    }

    let email = normalize_email(&form.email);
    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AuthError::Rejected(MSG_UNKNOWN_USER));
    };

    if !user.confirmado {
        warn!(user_id = %user.id, "login on unconfirmed account");
        return Err(AuthError::Rejected(MSG_UNCONFIRMED));
    }

    if !verify_password(&form.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::Rejected(MSG_WRONG_PASSWORD));
    }

    let token = JwtKeys::from_config(&state.config.jwt).issue(user.id, &user.nombre)?;
    info!(user_id = %user.id, "user logged in");
    Ok((user, token))
}

/// Create an unconfirmed account and mail the confirmation link.
pub async fn register(state: &AppState, form: &RegisterForm) -> Result<User, AuthError> {
    let errors = validate_register(form);
    if !errors.is_empty() {
        return Err(AuthError::Validation(errors));
    }

    let email = normalize_email(&form.email);
    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AuthError::Rejected(MSG_ALREADY_REGISTERED));
    }

    let new_user = NewUser {
        nombre: form.nombre.trim().to_string(),
        email,
        password_hash: hash_password(&form.password)?,
        token: generate_token(),
    };
    // A concurrent registration can still win the unique index.
    let Some(user) = state.users.create(new_user).await? else {
        return Err(AuthError::Rejected(MSG_ALREADY_REGISTERED));
    };
    info!(user_id = %user.id, "user registered");

    if let Some(token) = user.token.as_deref() {
        let sent = match registration_email(&state.config.public_origin(), &user.nombre, &user.email, token) {
            Ok(mail) => state.mailer.send(mail).await,
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            error!(error = %e, user_id = %user.id, "confirmation email failed");
        }
    }
    Ok(user)
}

/// Consume a confirmation token.
pub async fn confirm(state: &AppState, token: &str) -> Result<User, AuthError> {
    match state.users.confirm(token).await? {
        Some(user) => {
            info!(user_id = %user.id, "account confirmed");
            Ok(user)
        }
        None => {
            warn!("confirmation with unknown token");
            Err(AuthError::Rejected(MSG_INVALID_TOKEN))
        }
    }
}

/// Issue a reset token and mail the reset link.
pub async fn request_password_reset(
    state: &AppState,
    form: &ForgotPasswordForm,
) -> Result<User, AuthError> {
    let errors = validate_forgot_password(form);
    if !errors.is_empty() {
        return Err(AuthError::Validation(errors));
    }

    let email = normalize_email(&form.email);
    let Some(mut user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "reset for unknown email");
        return Err(AuthError::Rejected(MSG_UNKNOWN_EMAIL));
    };

    let token = generate_token();
    state.users.set_token(user.id, &token).await?;
    info!(user_id = %user.id, "password reset requested");

    let sent = match password_reset_email(&state.config.public_origin(), &user.nombre, &user.email, &token) {
        Ok(mail) => state.mailer.send(mail).await,
        Err(e) => Err(e),
    };
    if let Err(e) = sent {
        error!(error = %e, user_id = %user.id, "reset email failed");
    }
    user.token = Some(token);
    Ok(user)
}

/// Look up a pending reset without consuming it.
pub async fn check_reset_token(state: &AppState, token: &str) -> Result<User, AuthError> {
    state
        .users
        .find_by_token(token)
        .await?
        .ok_or(AuthError::Rejected(MSG_RESET_TOKEN))
}

/// Replace the password of the account holding `token` and consume the token.
///
/// A form that fails validation stops here and leaves the token pending.
pub async fn set_new_password(
    state: &AppState,
    token: &str,
    form: &NewPasswordForm,
) -> Result<User, AuthError> {
    let errors = validate_new_password(form);
    if !errors.is_empty() {
        return Err(AuthError::Validation(errors));
    }

    let hash = hash_password(&form.password)?;
    match state.users.reset_password(token, &hash).await? {
        Some(user) => {
            info!(user_id = %user.id, "password changed");
            Ok(user)
        }
        None => {
            warn!("password change with unknown token");
            Err(AuthError::Rejected(MSG_RESET_TOKEN))
        }
    }
}
