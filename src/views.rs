use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use minijinja::Environment;
use serde::Serialize;
use tracing::error;

use crate::{
    auth::dto::FormEcho,
    properties::dto::{PropertyForm, PropertyView},
    validation::FieldError,
};

macro_rules! template {
    ($name:literal) => {
        ($name, include_str!(concat!("../templates/", $name)))
    };
}

const TEMPLATES: &[(&str, &str)] = &[
    template!("layout.html"),
    template!("auth/login.html"),
    template!("auth/registro.html"),
    template!("auth/confirmar-cuenta.html"),
    template!("auth/olvide-password.html"),
    template!("auth/reset-password.html"),
    template!("templates/mensaje.html"),
    template!("propiedades/admin.html"),
    template!("propiedades/crear.html"),
    template!("propiedades/agregar-imagen.html"),
];

/// Context handed to every template.
#[derive(Debug, Default, Serialize)]
pub struct Page {
    pub pagina: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mensaje: Option<String>,
    pub error: bool,
    pub errores: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usuario: Option<FormEcho>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre_sesion: Option<String>,
    pub propiedades: Vec<PropertyView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propiedad: Option<PropertyView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datos: Option<PropertyForm>,
}

impl Page {
    pub fn new(pagina: impl Into<String>) -> Self {
        Self {
            pagina: pagina.into(),
            ..Self::default()
        }
    }

    pub fn message(mut self, mensaje: impl Into<String>) -> Self {
        self.mensaje = Some(mensaje.into());
        self
    }

    pub fn failed(mut self) -> Self {
        self.error = true;
        self
    }

    pub fn errors(mut self, errores: Vec<FieldError>) -> Self {
        self.errores = errores;
        self
    }

    /// Shorthand for a single form-level error.
    pub fn error_message(self, message: &str) -> Self {
        self.errors(vec![FieldError::new("form", message)])
    }
}

/// Compiled HTML templates.
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> anyhow::Result<Self> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render(&self, template: &str, page: &Page) -> Response {
        let rendered = self
            .env
            .get_template(template)
            .and_then(|tmpl| tmpl.render(page));
        match rendered {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!(error = %e, template, "template render failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error interno").into_response()
            }
        }
    }
}
