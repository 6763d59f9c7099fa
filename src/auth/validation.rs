//! Per-endpoint form rules for the account pages.
//!
//! Each function is pure and returns every failing field; an empty list means
//! the form is acceptable.

use crate::auth::dto::{ForgotPasswordForm, LoginForm, NewPasswordForm, RegisterForm};
use crate::validation::{is_present, is_valid_email, Errors, FieldError};

pub const MIN_PASSWORD_LEN: usize = 6;

pub const MSG_EMAIL: &str = "El email es obligatorio";
pub const MSG_PASSWORD_REQUIRED: &str = "La contraseña es obligatoria";
pub const MSG_NAME: &str = "El nombre es obligatorio";
pub const MSG_PASSWORD_SHORT: &str = "La contraseña debe tener al menos 6 caracteres";
pub const MSG_PASSWORD_MISMATCH: &str = "Las contraseñas no coinciden";
pub const MSG_NEW_PASSWORD_SHORT: &str = "El password debe ser de al menos 6 caracteres";

pub fn validate_login(form: &LoginForm) -> Vec<FieldError> {
    let mut errors = Errors::default();
    errors
        .check(is_valid_email(&form.email), "email", MSG_EMAIL)
        .check(!form.password.is_empty(), "password", MSG_PASSWORD_REQUIRED);
    errors.into_vec()
}

pub fn validate_register(form: &RegisterForm) -> Vec<FieldError> {
    let mut errors = Errors::default();
    errors
        .check(is_present(&form.nombre), "nombre", MSG_NAME)
        .check(is_valid_email(&form.email), "email", MSG_EMAIL)
        // byte length at registration
        .check(
            form.password.len() >= MIN_PASSWORD_LEN,
            "password",
            MSG_PASSWORD_SHORT,
        )
        .check(
            form.repetir_password == form.password,
            "repetir_password",
            MSG_PASSWORD_MISMATCH,
        );
    errors.into_vec()
}

pub fn validate_forgot_password(form: &ForgotPasswordForm) -> Vec<FieldError> {
    let mut errors = Errors::default();
    errors.check(is_valid_email(&form.email), "email", MSG_EMAIL);
    errors.into_vec()
}

pub fn validate_new_password(form: &NewPasswordForm) -> Vec<FieldError> {
    let mut errors = Errors::default();
    // character length when choosing a new password
    errors.check(
        form.password.chars().count() >= MIN_PASSWORD_LEN,
        "password",
        MSG_NEW_PASSWORD_SHORT,
    );
    errors.into_vec()
}
