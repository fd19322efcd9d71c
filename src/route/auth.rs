use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::serde::json::Json;
use rocket::State;
use utoipa::ToSchema;

use crate::auth::{AuthError, AuthGate};
use crate::data::account::db::problem as account_problem;
use crate::data::account::db::CredentialsData;
use crate::resp::problem::Problem;
use crate::resp::session::{Session, LOGIN_PATH};
use crate::security::Security;
use crate::util::is_filled;

fn registration_problem(e: AuthError) -> Problem {
    match e {
        AuthError::AlreadyRegistered(email) => account_problem::already_registered(email),
        AuthError::MissingFields => account_problem::missing_credentials(),
        other => {
            tracing::error!("registration failed: {}", other);
            account_problem::registration_failed()
        }
    }
}

fn login_problem(e: AuthError) -> Problem {
    match e {
        AuthError::InvalidCredentials => account_problem::bad_login(),
        AuthError::MissingFields => account_problem::missing_credentials(),
        other => {
            tracing::error!("login failed: {}", other);
            account_problem::login_failed()
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub email: Option<String>,
    /// Message left by the previous redirect, shown once.
    pub notice: Option<String>,
}

/// Create an account without a docente record
#[utoipa::path(
    request_body(content = CredentialsData, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account created, continues to the login page"),
        (status = 400, body = Problem),
        (status = 409, body = Problem),
    )
)]
#[post("/register", data = "<credentials>")]
#[tracing::instrument(skip(auth))]
pub async fn register(
    credentials: Form<CredentialsData>,
    auth: &State<AuthGate>,
) -> Result<Flash<Redirect>, Problem> {
    if !is_filled(&credentials.email) || !is_filled(&credentials.password) {
        return Err(registration_problem(AuthError::MissingFields));
    }

    auth.register(&credentials.email, &credentials.password)
        .await
        .map_err(registration_problem)?;

    Ok(Flash::success(
        Redirect::to(LOGIN_PATH),
        "¡Cuenta creada exitosamente! Ahora puede iniciar sesión.",
    ))
}

/// Start a session for valid credentials
#[utoipa::path(
    request_body(content = CredentialsData, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, continues to the landing page"),
        (status = 400, body = Problem),
        (status = 401, body = Problem),
    )
)]
#[post("/login", data = "<credentials>")]
#[tracing::instrument(skip(cookies, auth, security))]
pub async fn login(
    credentials: Form<CredentialsData>,
    mut session: Session,
    cookies: &CookieJar<'_>,
    auth: &State<AuthGate>,
    security: &State<Security>,
) -> Result<Flash<Redirect>, Problem> {
    let email = auth
        .login(&mut session, &credentials.email, &credentials.password)
        .await
        .map_err(login_problem)?;

    session.store(cookies, security.session_key)?;
    tracing::info!("'{}' logged in", email);

    Ok(Flash::success(Redirect::to("/"), "Inicio de sesión exitoso."))
}

#[utoipa::path(responses((status = 303, description = "Session ended, continues to the login page")))]
#[post("/logout")]
#[tracing::instrument(skip(cookies, security))]
pub async fn logout(
    mut session: Session,
    cookies: &CookieJar<'_>,
    security: &State<Security>,
) -> Result<Flash<Redirect>, Problem> {
    session.logout();
    session.store(cookies, security.session_key)?;

    Ok(Flash::success(Redirect::to(LOGIN_PATH), "Sesión cerrada."))
}

#[utoipa::path(responses((status = 200, body = SessionView)))]
#[get("/session")]
#[tracing::instrument(skip(flash))]
pub async fn session_info(session: Session, flash: Option<FlashMessage<'_>>) -> Json<SessionView> {
    Json(SessionView {
        email: session.email().map(str::to_string),
        notice: flash.map(|it| it.message().to_string()),
    })
}
