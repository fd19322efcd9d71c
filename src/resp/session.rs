use std::convert::Infallible;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::request::{self, FromRequest, Request};
use rocket::response::Redirect;
use serde::{Deserialize, Serialize};

use crate::security::Security;

pub static SESSION_COOKIE_NAME: &str = "logged_in_user";
pub static LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    iat: DateTime<Utc>,
}

/// Identity of the browser making a request.
///
/// An empty session is unauthenticated. Sessions don't expire, they end with
/// [`Session::logout`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    email: Option<String>,
}

impl Session {
    pub fn begin(&mut self, email: impl Into<String>) {
        self.email = Some(email.into());
    }

    pub fn logout(&mut self) {
        self.email = None;
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.email.is_some()
    }

    /// Sends anonymous visitors of a protected page to the login page.
    pub fn check_login(&self) -> Result<&str, Redirect> {
        self.email().ok_or_else(|| Redirect::to(LOGIN_PATH))
    }

    pub fn encode_token(&self, key: impl AsRef<[u8]>) -> Result<Option<String>, jsonwebtoken::errors::Error> {
        let email = match &self.email {
            Some(email) => email,
            None => return Ok(None),
        };

        let claims = SessionClaims {
            sub: email.clone(),
            iat: Utc::now(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key.as_ref()),
        )?;
        Ok(Some(token))
    }

    pub fn decode_token(
        token: &str,
        key: impl AsRef<[u8]>,
    ) -> Result<Session, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let claims = decode::<SessionClaims>(token, &DecodingKey::from_secret(key.as_ref()), &validation)?
            .claims;
        Ok(Session {
            email: Some(claims.sub),
        })
    }

    /// Writes the session to the client, or removes it once it's empty.
    pub fn store(
        &self,
        cookies: &CookieJar<'_>,
        key: impl AsRef<[u8]>,
    ) -> Result<(), jsonwebtoken::errors::Error> {
        match self.encode_token(key)? {
            Some(token) => cookies.add(
                Cookie::build((SESSION_COOKIE_NAME, token))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .permanent(),
            ),
            None => cookies.remove(Cookie::from(SESSION_COOKIE_NAME)),
        }
        Ok(())
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session {
    type Error = Infallible;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let security = match req.rocket().state::<Security>() {
            Some(it) => it,
            None => return request::Outcome::Success(Session::default()),
        };

        let session = req
            .cookies()
            .get(SESSION_COOKIE_NAME)
            .and_then(|cookie| match Session::decode_token(cookie.value(), security.session_key) {
                Ok(it) => Some(it),
                Err(e) => {
                    tracing::debug!("ignoring malformed session cookie: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        request::Outcome::Success(session)
    }
}
