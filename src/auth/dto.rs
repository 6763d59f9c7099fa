use serde::{Deserialize, Serialize};

// Every form field defaults to an empty string so missing inputs reach
// validation instead of failing extraction.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub nombre: String,
    pub email: String,
    pub password: String,
    pub repetir_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordForm {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewPasswordForm {
    pub password: String,
}

/// Values echoed back into the registration form after a rejected attempt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormEcho {
    pub nombre: String,
    pub email: String,
}

impl From<&RegisterForm> for FormEcho {
    fn from(form: &RegisterForm) -> Self {
        Self {
            nombre: form.nombre.clone(),
            email: form.email.clone(),
        }
    }
}
