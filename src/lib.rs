#[macro_use]
extern crate rocket;
#[macro_use]
extern crate serde;

use std::time::Duration;

use rocket::data::{Limits, ToByteUnit};
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedHeaders, AllowedOrigins};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::auth::AuthGate;
use crate::config::Config;
use crate::data::account::PasswordHasher;
use crate::data::Stores;
use crate::error::{BackendError, ConfigurationError};
use crate::route::form::FormSessions;
use crate::route::mount_api;
use crate::security::Security;
use crate::upload::PhotoStore;

pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod form;
pub mod resp;
pub mod route;
pub mod security;
pub mod upload;
pub mod util;

pub async fn create(log_level: Option<Level>) -> Result<Rocket<Build>, BackendError> {
    if let Some(l) = log_level {
        let subscriber = FmtSubscriber::builder().with_max_level(l).finish();

        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Unable to set global logger: {}", err);
        };
        if let Err(err) = tracing_log::LogTracer::init() {
            eprintln!("Unable to forward log records: {}", err);
        }
    }

    tracing::info!("Reading .env file...");
    if dotenv::dotenv().is_err() {
        tracing::warn!("Unable to load .env file.");
    }

    tracing::info!("Loading configuration...");
    let c = match Config::load() {
        Ok(c) => {
            tracing::info!("Configuration loaded.");
            c
        }
        Err(ConfigurationError::NotFound(_)) => {
            let c = Config::default();
            if c.save().is_err() {
                tracing::warn!("Unable to save generated configuration.");
            }
            c
        }
        Err(other) => {
            tracing::error!("Configuration error: {}", other);
            return Err(other.into());
        }
    };

    tracing::info!("Initializing security information...");
    let security = Security::load()?;

    build(c, security).await
}

/// Assembles the server for an already loaded configuration.
pub async fn build(c: Config, security: Security) -> Result<Rocket<Build>, BackendError> {
    let stores = Stores::connect(&c).await?;
    let auth = AuthGate::new(
        stores.accounts.clone(),
        PasswordHasher::new(security.salt, c.password_cost),
    );
    let photos = PhotoStore::new(c.upload_dir.clone());
    let forms = FormSessions::new(Duration::from_secs(c.form_idle_minutes * 60));

    // photos are sent as multipart forms
    let limits = Limits::default()
        .limit("file", 8.mebibytes())
        .limit("data-form", 10.mebibytes());
    let figment = rocket::Config::figment().merge(("limits", limits));

    tracing::info!("Starting HTTP server...");
    let mut r = rocket::custom(figment)
        .manage(c)
        .manage(security)
        .manage(stores)
        .manage(auth)
        .manage(photos)
        .manage(forms);

    tracing::info!("Setting up CORS...");
    let cors = rocket_cors::CorsOptions {
        allowed_origins: AllowedOrigins::All,
        allowed_methods: vec![Method::Get, Method::Put, Method::Post, Method::Delete]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::All,
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()?;

    r = r.attach(cors);
    r = mount_api(r);

    Ok(r)
}
