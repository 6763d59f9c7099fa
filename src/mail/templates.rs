use minijinja::{context, Environment};

use super::OutgoingEmail;

const CONFIRM_HTML: &str = include_str!("../../templates/emails/confirmar-cuenta.html");
const RESET_HTML: &str = include_str!("../../templates/emails/olvide-password.html");

pub fn registration_email(
    origin: &str,
    nombre: &str,
    email: &str,
    token: &str,
) -> anyhow::Result<OutgoingEmail> {
    let url = format!("{origin}/auth/confirmar/{token}");
    Ok(OutgoingEmail {
        to: email.to_string(),
        subject: "Confirma tu cuenta".into(),
        text: format!("Hola {nombre}, confirma tu cuenta en bienesraices.com: {url}"),
        html: render_html("emails/confirmar-cuenta.html", CONFIRM_HTML, nombre, &url)?,
    })
}

pub fn password_reset_email(
    origin: &str,
    nombre: &str,
    email: &str,
    token: &str,
) -> anyhow::Result<OutgoingEmail> {
    let url = format!("{origin}/auth/olvide-password/{token}");
    Ok(OutgoingEmail {
        to: email.to_string(),
        subject: "Restablece tu password".into(),
        text: format!("Hola {nombre}, restablece tu password en bienesraices.com: {url}"),
        html: render_html("emails/olvide-password.html", RESET_HTML, nombre, &url)?,
    })
}

// `.html` names switch on autoescaping for the display name.
fn render_html(name: &str, source: &str, nombre: &str, url: &str) -> anyhow::Result<String> {
    let mut env = Environment::new();
    env.add_template(name, source)?;
    let html = env.get_template(name)?.render(context! { nombre, url })?;
    Ok(html)
}
