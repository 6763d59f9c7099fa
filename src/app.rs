use std::net::SocketAddr;

use axum::{response::Redirect, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{auth, properties, state::AppState};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/auth/login") }))
        .route("/health", get(|| async { "ok" }))
        .nest("/auth", auth::router())
        .merge(properties::router())
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let path = req.uri().path().to_string();
                    tracing::info_span!("http_request", %method, %path, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{jwt::SESSION_COOKIE, services::MSG_WRONG_PASSWORD},
        state::Fake,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, Response, StatusCode},
    };
    use tower::ServiceExt;

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(res: Response<Body>) -> String {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn session_cookie(res: &Response<Body>) -> Option<String> {
        res.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{SESSION_COOKIE}=")))
            .map(str::to_string)
    }

    fn location(res: &Response<Body>) -> &str {
        res.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// Multipart POST carrying a four-byte file in the `imagen` field.
    fn upload(uri: &str, cookie: &str, file_name: &str, content_type: &str) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"imagen\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[0x89, b'P', b'N', b'G']);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Request::post(uri)
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    /// Register and confirm Ana through the HTTP surface; returns the spent token.
    async fn confirmed_account(fake: &Fake) -> String {
        let app = build_app(fake.state.clone());
        let res = app
            .clone()
            .oneshot(form_post(
                "/auth/registro",
                "nombre=Ana&email=ana%40x.com&password=secret1&repetir_password=secret1",
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let token = fake.users.all()[0].token.clone().unwrap();
        let res = app
            .oneshot(get(&format!("/auth/confirmar/{token}")))
            .await
            .unwrap();
        assert!(body_text(res).await.contains("La cuenta se ha confirmado correctamente"));
        token
    }

    /// `name=value` pair of a fresh session cookie for Ana.
    async fn login_cookie(app: &Router) -> String {
        let res = app
            .clone()
            .oneshot(form_post(
                "/auth/login",
                "email=ana%40x.com&password=secret1",
            ))
            .await
            .unwrap();
        let cookie = session_cookie(&res).expect("session cookie");
        cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_and_root() {
        let app = build_app(Fake::new().state);
        let res = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(body_text(res).await, "ok");

        let res = app.oneshot(get("/")).await.unwrap();
        assert_eq!(location(&res), "/auth/login");
    }

    #[tokio::test]
    async fn form_pages_render() {
        let app = build_app(Fake::new().state);
        for (uri, title) in [
            ("/auth/login", "Iniciar sesión"),
            ("/auth/registro", "Crear Cuenta"),
            ("/auth/olvide-password", "Restablecer Contraseña"),
        ] {
            let res = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK, "{uri}");
            assert!(body_text(res).await.contains(title), "{uri}");
        }
    }

    #[tokio::test]
    async fn register_page_shows_check_email_message() {
        let fake = Fake::new();
        let app = build_app(fake.state.clone());
        let res = app
            .oneshot(form_post(
                "/auth/registro",
                "nombre=Ana&email=ana%40x.com&password=secret1&repetir_password=secret1",
            ))
            .await
            .unwrap();
        let html = body_text(res).await;
        assert!(html.contains("Hemos enviado un correo electrónico para confirmar tu cuenta"));
        assert_eq!(fake.mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn register_errors_echo_form_values() {
        let fake = Fake::new();
        let app = build_app(fake.state.clone());
        let res = app
            .oneshot(form_post(
                "/auth/registro",
                "nombre=Ana&email=ana%40x.com&password=123&repetir_password=456",
            ))
            .await
            .unwrap();
        let html = body_text(res).await;
        assert!(html.contains("La contraseña debe tener al menos 6 caracteres"));
        assert!(html.contains("Las contraseñas no coinciden"));
        assert!(html.contains(r#"value="ana@x.com""#));
        assert!(fake.users.all().is_empty());
    }

    #[tokio::test]
    async fn second_confirmation_shows_invalid_token() {
        let fake = Fake::new();
        let token = confirmed_account(&fake).await;

        let res = build_app(fake.state.clone())
            .oneshot(get(&format!("/auth/confirmar/{token}")))
            .await
            .unwrap();
        assert!(body_text(res)
            .await
            .contains("El token no es valido, solicita uno nuevo"));
    }

    #[tokio::test]
    async fn wrong_password_renders_error_without_cookie() {
        let fake = Fake::new();
        confirmed_account(&fake).await;

        let res = build_app(fake.state.clone())
            .oneshot(form_post(
                "/auth/login",
                "email=ana%40x.com&password=wrong",
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(session_cookie(&res).is_none());
        assert!(body_text(res).await.contains(MSG_WRONG_PASSWORD));
    }

    #[tokio::test]
    async fn login_sets_http_only_cookie_and_opens_listings() {
        let fake = Fake::new();
        confirmed_account(&fake).await;
        let app = build_app(fake.state.clone());

        let res = app
            .clone()
            .oneshot(form_post(
                "/auth/login",
                "email=ana%40x.com&password=secret1",
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/mis-propiedades");
        let cookie = session_cookie(&res).expect("session cookie");
        assert!(cookie.contains("HttpOnly"));

        let pair = cookie.split(';').next().unwrap().to_string();
        let res = app
            .oneshot(
                Request::get("/mis-propiedades")
                    .header(header::COOKIE, pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_text(res).await.contains("Mis Propiedades"));
    }

    #[tokio::test]
    async fn listings_require_a_session() {
        let res = build_app(Fake::new().state)
            .oneshot(get("/mis-propiedades"))
            .await
            .unwrap();
        assert_eq!(location(&res), "/auth/login");
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let res = build_app(Fake::new().state)
            .oneshot(
                Request::post("/auth/cerrar-sesion")
                    .header(header::COOKIE, format!("{SESSION_COOKIE}=abc"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(location(&res), "/auth/login");
        let cookie = session_cookie(&res).expect("removal cookie");
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn reset_flow_over_http() {
        let fake = Fake::new();
        confirmed_account(&fake).await;
        let app = build_app(fake.state.clone());

        let res = app
            .clone()
            .oneshot(form_post("/auth/olvide-password", "email=ana%40x.com"))
            .await
            .unwrap();
        assert!(body_text(res).await.contains("instrucciones para restablecer"));
        let token = fake.users.all()[0].token.clone().unwrap();

        let res = app
            .clone()
            .oneshot(get(&format!("/auth/olvide-password/{token}")))
            .await
            .unwrap();
        assert!(body_text(res).await.contains(r#"name="password""#));

        // too short: error shown, token still pending
        let res = app
            .clone()
            .oneshot(form_post(&format!("/auth/olvide-password/{token}"), "password=123"))
            .await
            .unwrap();
        assert!(body_text(res)
            .await
            .contains("El password debe ser de al menos 6 caracteres"));
        assert!(fake.users.all()[0].token.is_some());

        let res = app
            .clone()
            .oneshot(form_post(
                &format!("/auth/olvide-password/{token}"),
                "password=newpass1",
            ))
            .await
            .unwrap();
        assert!(body_text(res)
            .await
            .contains("La contraseña se cambió correctamente"));

        let res = app
            .oneshot(get(&format!("/auth/olvide-password/{token}")))
            .await
            .unwrap();
        assert!(body_text(res)
            .await
            .contains("Hubo un error al validar tu información"));
    }

    #[tokio::test]
    async fn reset_post_with_spent_or_unknown_token_shows_error() {
        let fake = Fake::new();
        confirmed_account(&fake).await;
        let app = build_app(fake.state.clone());

        app.clone()
            .oneshot(form_post("/auth/olvide-password", "email=ana%40x.com"))
            .await
            .unwrap();
        let token = fake.users.all()[0].token.clone().unwrap();
        let res = app
            .clone()
            .oneshot(form_post(
                &format!("/auth/olvide-password/{token}"),
                "password=newpass1",
            ))
            .await
            .unwrap();
        assert!(body_text(res)
            .await
            .contains("La contraseña se cambió correctamente"));

        for uri in [
            format!("/auth/olvide-password/{token}"),
            "/auth/olvide-password/never-issued".to_string(),
        ] {
            let res = app
                .clone()
                .oneshot(form_post(&uri, "password=other123"))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK, "{uri}");
            assert!(
                body_text(res)
                    .await
                    .contains("Hubo un error al validar tu información"),
                "{uri}"
            );
        }

        let res = app
            .clone()
            .oneshot(form_post(
                "/auth/login",
                "email=ana%40x.com&password=newpass1",
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let res = app
            .oneshot(form_post(
                "/auth/login",
                "email=ana%40x.com&password=other123",
            ))
            .await
            .unwrap();
        assert!(session_cookie(&res).is_none());
    }

    #[tokio::test]
    async fn create_listing_and_upload_image() {
        let fake = Fake::new();
        confirmed_account(&fake).await;
        let app = build_app(fake.state.clone());
        let cookie = login_cookie(&app).await;

        let mut req = form_post("/propiedades/crear", "titulo=Casa&descripcion=Bonita&precio=");
        req.headers_mut()
            .insert(header::COOKIE, cookie.parse().unwrap());
        let res = app.clone().oneshot(req).await.unwrap();
        assert!(body_text(res).await.contains("Indica un precio válido"));

        let mut req = form_post(
            "/propiedades/crear",
            "titulo=Casa&descripcion=Bonita&precio=150000",
        );
        req.headers_mut()
            .insert(header::COOKIE, cookie.parse().unwrap());
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let image_page = location(&res).to_string();
        assert!(image_page.starts_with("/propiedades/agregar-imagen/"));

        let res = app
            .clone()
            .oneshot(
                Request::get(&image_page)
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(body_text(res).await.contains(r#"name="imagen""#));

        let res = app
            .clone()
            .oneshot(upload(&image_page, &cookie, "casa.gif", "image/gif"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains("Solo se permiten imágenes .png, .jpg o .jpeg"));
        assert!(html.contains(r#"name="imagen""#));
        assert!(fake.storage.objects().is_empty());

        let res = app
            .clone()
            .oneshot(upload(&image_page, &cookie, "casa.png", "image/png"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/mis-propiedades");
        let objects = fake.storage.objects();
        assert_eq!(objects.len(), 1);
        assert!(objects[0].0.ends_with(".png"));
        assert_eq!(objects[0].2, 4);

        let res = app
            .oneshot(
                Request::get("/mis-propiedades")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let html = body_text(res).await;
        assert!(html.contains("Casa"));
        assert!(html.contains("Publicado"));
        assert!(html.contains("fake.local"));
    }
}
